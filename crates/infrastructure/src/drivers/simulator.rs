use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use tokio::time::sleep;

use domain::driver::{Sample, Transport, TransportError};
use domain::{DataQuality, DataType, DomainError, PointValue};

#[derive(Debug, Deserialize, Clone, Default)]
pub struct SimulatorConfig {
    /// Reject every connection attempt immediately
    #[serde(default)]
    pub refuse_connections: bool,
    /// Never answer: connects and requests hang until the driver times out
    #[serde(default)]
    pub unresponsive: bool,
    #[serde(default)]
    pub connect_delay_ms: u64,
    #[serde(default)]
    pub response_delay_ms: u64,
    #[serde(default)]
    pub registers: Vec<RegisterConfig>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct RegisterConfig {
    pub address: String,
    pub data_type: DataType,
    pub value: serde_json::Value,
    #[serde(default)]
    pub quality: DataQuality,
    #[serde(default = "default_writable")]
    pub writable: bool,
}

fn default_writable() -> bool {
    true
}

impl RegisterConfig {
    fn to_register(&self) -> Result<Register, DomainError> {
        let value = PointValue::from_json(self.data_type, &self.value).ok_or_else(|| {
            DomainError::InvalidDriverConfig(format!(
                "register {}: {} is not a valid {}",
                self.address, self.value, self.data_type
            ))
        })?;
        Ok(Register {
            value,
            quality: self.quality,
            writable: self.writable,
            fault: None,
        })
    }
}

#[derive(Debug, Clone)]
struct Register {
    value: PointValue,
    quality: DataQuality,
    writable: bool,
    fault: Option<String>,
}

/// Request counters, for asserting on what reached the "wire"
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SimulatorStats {
    pub opens: usize,
    pub closes: usize,
    pub reads: usize,
    pub writes: usize,
}

impl SimulatorStats {
    pub fn open_sessions(&self) -> usize {
        self.opens - self.closes
    }
}

#[derive(Debug, Default)]
struct DeviceImage {
    registers: HashMap<String, Register>,
    refuse_connections: bool,
    unresponsive: bool,
    /// Bumped to invalidate live sessions
    epoch: u64,
    stats: SimulatorStats,
}

/// Shared view of a simulated device, used to inspect it and inject faults
/// while a driver talks to it.
#[derive(Debug, Clone, Default)]
pub struct SimulatorHandle {
    image: Arc<Mutex<DeviceImage>>,
}

impl SimulatorHandle {
    fn lock(&self) -> MutexGuard<'_, DeviceImage> {
        self.image.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Create or replace a register.
    pub fn define_register(&self, address: impl Into<String>, value: PointValue, writable: bool) {
        self.lock().registers.insert(
            address.into(),
            Register {
                value,
                quality: DataQuality::Good,
                writable,
                fault: None,
            },
        );
    }

    /// Overwrite a register's value (device-side update, ignores writability).
    pub fn set_value(&self, address: &str, value: PointValue) -> bool {
        match self.lock().registers.get_mut(address) {
            Some(register) => {
                register.value = value;
                true
            }
            None => false,
        }
    }

    pub fn value(&self, address: &str) -> Option<PointValue> {
        self.lock().registers.get(address).map(|r| r.value.clone())
    }

    pub fn set_quality(&self, address: &str, quality: DataQuality) -> bool {
        match self.lock().registers.get_mut(address) {
            Some(register) => {
                register.quality = quality;
                true
            }
            None => false,
        }
    }

    /// Make every request on `address` fail with a device fault.
    pub fn fail_address(&self, address: &str, message: impl Into<String>) -> bool {
        match self.lock().registers.get_mut(address) {
            Some(register) => {
                register.fault = Some(message.into());
                true
            }
            None => false,
        }
    }

    pub fn clear_fault(&self, address: &str) {
        if let Some(register) = self.lock().registers.get_mut(address) {
            register.fault = None;
        }
    }

    pub fn set_refuse_connections(&self, refuse: bool) {
        self.lock().refuse_connections = refuse;
    }

    pub fn set_unresponsive(&self, unresponsive: bool) {
        self.lock().unresponsive = unresponsive;
    }

    /// Kill the live session; its next request reports a lost connection.
    pub fn drop_connections(&self) {
        self.lock().epoch += 1;
    }

    pub fn stats(&self) -> SimulatorStats {
        self.lock().stats
    }
}

/// In-memory [`Transport`] backed by a register map.
pub struct SimulatorTransport {
    handle: SimulatorHandle,
    connect_delay: Duration,
    response_delay: Duration,
    session: Option<u64>,
}

impl SimulatorTransport {
    pub fn new(config: SimulatorConfig) -> Result<Self, DomainError> {
        let mut registers = HashMap::with_capacity(config.registers.len());
        for register in &config.registers {
            registers.insert(register.address.clone(), register.to_register()?);
        }

        let image = DeviceImage {
            registers,
            refuse_connections: config.refuse_connections,
            unresponsive: config.unresponsive,
            ..DeviceImage::default()
        };

        Ok(Self {
            handle: SimulatorHandle {
                image: Arc::new(Mutex::new(image)),
            },
            connect_delay: Duration::from_millis(config.connect_delay_ms),
            response_delay: Duration::from_millis(config.response_delay_ms),
            session: None,
        })
    }

    pub fn handle(&self) -> SimulatorHandle {
        self.handle.clone()
    }

    /// Common request preamble: session check, hang, latency.
    async fn begin_request(&self) -> Result<(), TransportError> {
        let (epoch, unresponsive) = {
            let image = self.handle.lock();
            (image.epoch, image.unresponsive)
        };
        match self.session {
            None => return Err(TransportError::ConnectionLost("no open session".to_string())),
            Some(session) if session != epoch => {
                return Err(TransportError::ConnectionLost(
                    "connection reset by peer".to_string(),
                ));
            }
            Some(_) => {}
        }
        if unresponsive {
            std::future::pending::<()>().await;
        }
        if !self.response_delay.is_zero() {
            sleep(self.response_delay).await;
        }
        Ok(())
    }
}

#[async_trait]
impl Transport for SimulatorTransport {
    fn kind(&self) -> &str {
        "Simulator"
    }

    async fn open(&mut self) -> Result<(), TransportError> {
        if !self.connect_delay.is_zero() {
            sleep(self.connect_delay).await;
        }
        let (refuse, unresponsive) = {
            let image = self.handle.lock();
            (image.refuse_connections, image.unresponsive)
        };
        if refuse {
            return Err(TransportError::Unreachable("connection refused".to_string()));
        }
        if unresponsive {
            std::future::pending::<()>().await;
        }

        let mut image = self.handle.lock();
        image.stats.opens += 1;
        self.session = Some(image.epoch);
        tracing::debug!("Simulator session opened");
        Ok(())
    }

    async fn close(&mut self) -> Result<(), TransportError> {
        if self.session.take().is_some() {
            self.handle.lock().stats.closes += 1;
            tracing::debug!("Simulator session closed");
        }
        Ok(())
    }

    async fn read(&mut self, address: &str, data_type: DataType) -> Result<Sample, TransportError> {
        self.handle.lock().stats.reads += 1;
        self.begin_request().await?;

        let image = self.handle.lock();
        let register = image
            .registers
            .get(address)
            .ok_or_else(|| TransportError::InvalidAddress(address.to_string()))?;
        if let Some(fault) = &register.fault {
            return Err(TransportError::DeviceFault(fault.clone()));
        }
        if !register.value.is_type(data_type) {
            return Err(TransportError::TypeMismatch {
                address: address.to_string(),
                expected: data_type,
                actual: register.value.data_type(),
            });
        }
        Ok(Sample::new(register.value.clone(), register.quality))
    }

    async fn write(&mut self, address: &str, value: &PointValue) -> Result<(), TransportError> {
        self.handle.lock().stats.writes += 1;
        self.begin_request().await?;

        let mut image = self.handle.lock();
        let register = image
            .registers
            .get_mut(address)
            .ok_or_else(|| TransportError::InvalidAddress(address.to_string()))?;
        if let Some(fault) = &register.fault {
            return Err(TransportError::DeviceFault(fault.clone()));
        }
        if !register.writable {
            return Err(TransportError::ReadOnly(address.to_string()));
        }
        if !value.is_type(register.value.data_type()) {
            return Err(TransportError::TypeMismatch {
                address: address.to_string(),
                expected: register.value.data_type(),
                actual: value.data_type(),
            });
        }
        register.value = value.clone();
        Ok(())
    }
}
