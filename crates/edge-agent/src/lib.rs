//! Host loop for the edge agent: one poller per configured device.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use domain::{BatchReadResult, DataPoint, DataQuality, DeviceDriver, DomainError};
use infrastructure::DriverFactory;
use infrastructure::config::{AgentConfig, DeviceConfig};

/// Polls a fixed point set from one driver until cancelled.
pub struct DevicePoller {
    driver: Arc<dyn DeviceDriver>,
    points: Vec<DataPoint>,
    interval: Duration,
}

impl DevicePoller {
    pub fn new(driver: Arc<dyn DeviceDriver>, points: Vec<DataPoint>, interval: Duration) -> Self {
        Self {
            driver,
            points,
            interval,
        }
    }

    pub fn from_config(device: &DeviceConfig, interval: Duration) -> anyhow::Result<Self> {
        let points = device
            .data_points()
            .with_context(|| format!("invalid points for device {}", device.name))?;
        let driver = DriverFactory::create_driver(
            &device.name,
            device.driver,
            device.options,
            device.driver_config.clone(),
        )
        .with_context(|| format!("cannot build driver for device {}", device.name))?;

        Ok(Self::new(Arc::from(driver), points, interval))
    }

    pub fn driver(&self) -> &Arc<dyn DeviceDriver> {
        &self.driver
    }

    pub fn points(&self) -> &[DataPoint] {
        &self.points
    }

    /// Connect if needed, then read every point once.
    ///
    /// Returns `Ok(None)` when the device could not be reached.
    pub async fn poll_once(
        &self,
        cancel: &CancellationToken,
    ) -> Result<Option<BatchReadResult>, DomainError> {
        let name = self.driver.name();

        if !self.driver.is_connected() {
            let result = self.driver.connect(cancel).await?;
            if let Some(reason) = result.error_message() {
                warn!(device = %name, %reason, "Failed to connect");
                return Ok(None);
            }
        }

        let batch = self.driver.read_batch(&self.points, cancel).await?;
        for value in batch.values() {
            match value.quality() {
                DataQuality::Bad => warn!(
                    device = %name,
                    point = %value.name(),
                    error = value.error_message().unwrap_or_default(),
                    "Read failed"
                ),
                quality => debug!(
                    device = %name,
                    point = %value.name(),
                    value = %value.value().map(ToString::to_string).unwrap_or_default(),
                    quality = %quality,
                    "Read"
                ),
            }
        }
        debug!(
            device = %name,
            good = batch.success_count(),
            bad = batch.failure_count(),
            "Poll complete"
        );
        Ok(Some(batch))
    }

    /// Poll on the configured interval until `cancel` fires, then dispose the driver.
    pub async fn run(self, cancel: CancellationToken) {
        let name = self.driver.name().to_string();
        let log_name = name.clone();
        let _subscription = self.driver.state_changes().subscribe(move |change| {
            info!(device = %log_name, "{change}");
        });

        info!(device = %name, interval_ms = self.interval.as_millis() as u64, "Starting poll loop");
        let mut timer = tokio::time::interval(self.interval);
        timer.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    info!(device = %name, "Shutdown signal received");
                    break;
                }
                _ = timer.tick() => {
                    match self.poll_once(&cancel).await {
                        Ok(_) => {}
                        Err(DomainError::Cancelled) => break,
                        Err(e) => warn!(device = %name, error = %e, "Poll failed"),
                    }
                }
            }
        }

        self.driver.dispose().await;
        info!(device = %name, "Poller stopped");
    }
}

/// One poller per enabled device.
pub fn build_pollers(config: &AgentConfig) -> anyhow::Result<Vec<DevicePoller>> {
    let interval = Duration::from_millis(config.poll_interval_ms);
    config
        .enabled_devices()
        .map(|device| DevicePoller::from_config(device, interval))
        .collect()
}
