use chrono::{DateTime, Utc};
use serde::Serialize;

use super::{ErrorMessage, WriteResult};
use crate::clock;
use crate::error::{DomainError, Result};
use crate::point::{DataValue, PointValue};

/// One entry of a batch write.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WriteItem {
    address: String,
    value: PointValue,
}

impl WriteItem {
    pub fn new(address: impl Into<String>, value: impl Into<PointValue>) -> Result<Self> {
        let address = address.into();
        if address.trim().is_empty() {
            return Err(DomainError::invalid_argument("write item address cannot be empty"));
        }
        Ok(Self {
            address,
            value: value.into(),
        })
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    pub fn value(&self) -> &PointValue {
        &self.value
    }
}

/// Per-item outcome of a batch write.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WriteItemResult {
    address: String,
    error_message: Option<ErrorMessage>,
}

impl WriteItemResult {
    pub fn succeeded(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            error_message: None,
        }
    }

    pub fn failed(address: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            error_message: Some(ErrorMessage::new(error)),
        }
    }

    pub fn from_write(address: impl Into<String>, result: WriteResult) -> Self {
        match result {
            WriteResult::Success { .. } => Self::succeeded(address),
            WriteResult::Failure { error, .. } => Self::failed(address, error),
        }
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    pub fn is_success(&self) -> bool {
        self.error_message.is_none()
    }

    pub fn error_message(&self) -> Option<&str> {
        self.error_message.as_deref()
    }
}

/// Ordered outcomes of a batch read, one per requested point.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BatchReadResult {
    values: Vec<DataValue>,
    timestamp: DateTime<Utc>,
}

impl BatchReadResult {
    pub fn new(values: Vec<DataValue>) -> Self {
        Self {
            values,
            timestamp: clock::now(),
        }
    }

    pub fn values(&self) -> &[DataValue] {
        &self.values
    }

    pub fn into_values(self) -> Vec<DataValue> {
        self.values
    }

    pub fn get(&self, name: &str) -> Option<&DataValue> {
        self.values.iter().find(|v| v.name() == name)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    /// Items with Good or Uncertain quality.
    pub fn success_count(&self) -> usize {
        self.values.iter().filter(|v| v.is_success()).count()
    }

    /// Items with Bad quality.
    pub fn failure_count(&self) -> usize {
        self.values.iter().filter(|v| !v.is_success()).count()
    }
}

/// Ordered outcomes of a batch write, one per requested item.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BatchWriteResult {
    results: Vec<WriteItemResult>,
    timestamp: DateTime<Utc>,
}

impl BatchWriteResult {
    pub fn new(results: Vec<WriteItemResult>) -> Self {
        Self {
            results,
            timestamp: clock::now(),
        }
    }

    pub fn results(&self) -> &[WriteItemResult] {
        &self.results
    }

    pub fn into_results(self) -> Vec<WriteItemResult> {
        self.results
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    pub fn success_count(&self) -> usize {
        self.results.iter().filter(|r| r.is_success()).count()
    }

    pub fn failure_count(&self) -> usize {
        self.results.iter().filter(|r| !r.is_success()).count()
    }
}
