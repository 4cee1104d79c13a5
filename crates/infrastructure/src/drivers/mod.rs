mod simulator;
mod transport_driver;

pub use simulator::{
    RegisterConfig, SimulatorConfig, SimulatorHandle, SimulatorStats, SimulatorTransport,
};
pub use transport_driver::{DriverOptions, TransportDriver};

use domain::DomainError;
use domain::driver::{DeviceDriver, DriverType};

/// Factory for creating device drivers
pub struct DriverFactory;

impl DriverFactory {
    /// Create a driver from type and protocol configuration
    pub fn create_driver(
        name: &str,
        driver_type: DriverType,
        options: DriverOptions,
        config: serde_json::Value,
    ) -> Result<Box<dyn DeviceDriver>, DomainError> {
        match driver_type {
            DriverType::Simulator => {
                let (driver, _handle) = Self::create_simulator(name, options, config)?;
                Ok(Box::new(driver) as Box<dyn DeviceDriver>)
            }
            DriverType::Modbus | DriverType::S7 | DriverType::OPCUA => Err(
                DomainError::InvalidDriverConfig(format!("{driver_type} driver not yet implemented")),
            ),
        }
    }

    /// Create a simulator-backed driver and keep a handle on the device.
    pub fn create_simulator(
        name: &str,
        options: DriverOptions,
        config: serde_json::Value,
    ) -> Result<(TransportDriver<SimulatorTransport>, SimulatorHandle), DomainError> {
        // Absent config means an empty device
        let config = if config.is_null() {
            SimulatorConfig::default()
        } else {
            serde_json::from_value(config).map_err(|e| {
                DomainError::InvalidDriverConfig(format!("Invalid Simulator config: {}", e))
            })?
        };
        let transport = SimulatorTransport::new(config)?;
        let handle = transport.handle();
        Ok((TransportDriver::new(name, transport, options), handle))
    }
}
