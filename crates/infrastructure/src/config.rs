use std::collections::{BTreeMap, HashSet};

use config::{Config, ConfigError, Environment, File, FileFormat};
use domain::driver::DriverType;
use domain::{DataPoint, DataType, DomainError, PropertyValue};
use serde::{Deserialize, Serialize};

use crate::drivers::DriverOptions;

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct PointConfig {
    pub name: String,
    pub address: String,
    pub data_type: DataType,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub properties: BTreeMap<String, PropertyValue>,
}

impl PointConfig {
    pub fn to_data_point(&self) -> Result<DataPoint, DomainError> {
        let mut point = DataPoint::new(&self.name, &self.address, self.data_type)?
            .with_properties(self.properties.clone());
        if let Some(description) = &self.description {
            point = point.with_description(description);
        }
        Ok(point)
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct DeviceConfig {
    pub name: String,
    pub driver: DriverType,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    #[serde(default)]
    pub options: DriverOptions,
    #[serde(default)]
    pub driver_config: serde_json::Value,
    #[serde(default)]
    pub points: Vec<PointConfig>,
}

fn default_enabled() -> bool {
    true
}

impl DeviceConfig {
    /// Validated point set; names must be unique within the device.
    pub fn data_points(&self) -> Result<Vec<DataPoint>, DomainError> {
        let mut seen = HashSet::new();
        self.points
            .iter()
            .map(|p| {
                if !seen.insert(p.name.as_str()) {
                    return Err(DomainError::InvalidDriverConfig(format!(
                        "device {}: duplicate point name {}",
                        self.name, p.name
                    )));
                }
                p.to_data_point()
            })
            .collect()
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct AgentConfig {
    pub agent_id: String,
    #[serde(default = "default_poll_interval")]
    pub poll_interval_ms: u64,
    #[serde(default)]
    pub devices: Vec<DeviceConfig>,
}

fn default_poll_interval() -> u64 {
    1000
}

impl AgentConfig {
    pub fn load(config_dir: &str) -> Result<Self, ConfigError> {
        let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let s = Config::builder()
            .set_default("agent_id", "edge-agent")?
            // Base config file, required
            .add_source(File::with_name(&format!("{}/default", config_dir)).required(true))
            // Per-environment overrides
            .add_source(File::with_name(&format!("{}/{}", config_dir, run_mode)).required(false))
            // Environment variables (e.g. EDGE__POLL_INTERVAL_MS=500)
            .add_source(Environment::with_prefix("EDGE").separator("__"))
            .build()?;

        s.try_deserialize()
    }

    /// Parse a TOML document directly, without file or environment layers.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        Config::builder()
            .set_default("agent_id", "edge-agent")?
            .add_source(File::from_str(content, FileFormat::Toml))
            .build()?
            .try_deserialize()
    }

    pub fn enabled_devices(&self) -> impl Iterator<Item = &DeviceConfig> {
        self.devices.iter().filter(|d| d.enabled)
    }
}
