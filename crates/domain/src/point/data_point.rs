use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::DataType;
use crate::error::{DomainError, Result};

/// Protocol-specific metadata attached to a [`DataPoint`].
///
/// Only concrete transports interpret these (register kind, byte order, bit
/// offset, ...). The contract never looks inside.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PropertyValue {
    Bool(bool),
    Integer(i64),
    Float(f64),
    Text(String),
}

impl PropertyValue {
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Integer(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Float(v) => Some(*v),
            Self::Integer(v) => Some(*v as f64),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(v) => Some(v),
            _ => None,
        }
    }
}

impl From<bool> for PropertyValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i64> for PropertyValue {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<f64> for PropertyValue {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<&str> for PropertyValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for PropertyValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

/// One addressable value exposed by a device.
///
/// Rules:
/// - `name` must be non-empty (uniqueness within a point set is the caller's job)
/// - `address` must be non-empty; its grammar belongs to the transport
/// - Immutable once built
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DataPoint {
    name: String,
    address: String,
    data_type: DataType,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<String>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    properties: BTreeMap<String, PropertyValue>,
}

impl DataPoint {
    /// Create a new DataPoint with validation
    pub fn new(
        name: impl Into<String>,
        address: impl Into<String>,
        data_type: DataType,
    ) -> Result<Self> {
        let name = name.into();
        let address = address.into();

        if name.trim().is_empty() {
            return Err(DomainError::invalid_argument("point name cannot be empty"));
        }
        if address.trim().is_empty() {
            return Err(DomainError::invalid_argument(format!(
                "point {name} has an empty address"
            )));
        }

        Ok(Self {
            name,
            address,
            data_type,
            description: None,
            properties: BTreeMap::new(),
        })
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<PropertyValue>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }

    pub fn with_properties(mut self, properties: BTreeMap<String, PropertyValue>) -> Self {
        self.properties.extend(properties);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    pub fn data_type(&self) -> DataType {
        self.data_type
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn properties(&self) -> &BTreeMap<String, PropertyValue> {
        &self.properties
    }

    pub fn property(&self, key: &str) -> Option<&PropertyValue> {
        self.properties.get(key)
    }
}
