use serde::Serialize;

use super::{DataQuality, PointValue};
use crate::result::{ErrorMessage, ReadResult};

/// Per-point outcome inside a batch read.
///
/// A `Bad` value always carries an error message; it may still carry the last
/// known (stale) value.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DataValue {
    name: String,
    value: Option<PointValue>,
    quality: DataQuality,
    error_message: Option<ErrorMessage>,
}

impl DataValue {
    pub fn good(name: impl Into<String>, value: PointValue) -> Self {
        Self::with_quality(name, value, DataQuality::Good)
    }

    pub fn uncertain(name: impl Into<String>, value: PointValue) -> Self {
        Self::with_quality(name, value, DataQuality::Uncertain)
    }

    pub fn bad(name: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: None,
            quality: DataQuality::Bad,
            error_message: Some(ErrorMessage::new(error)),
        }
    }

    /// A hard failure that still reports the last known value.
    pub fn bad_with_stale(
        name: impl Into<String>,
        stale: PointValue,
        error: impl Into<String>,
    ) -> Self {
        Self {
            value: Some(stale),
            ..Self::bad(name, error)
        }
    }

    /// Successful sample with an explicit quality. A `Bad` quality here is
    /// turned into a bad value with a generic message so the pairing holds.
    pub fn with_quality(name: impl Into<String>, value: PointValue, quality: DataQuality) -> Self {
        match quality {
            DataQuality::Bad => Self::bad_with_stale(name, value, "device reported bad quality"),
            _ => Self {
                name: name.into(),
                value: Some(value),
                quality,
                error_message: None,
            },
        }
    }

    /// Fold a single-read outcome into a batch item.
    pub fn from_read(name: impl Into<String>, result: ReadResult) -> Self {
        match result {
            ReadResult::Success { value, quality, .. } => Self::with_quality(name, value, quality),
            ReadResult::Failure { error, .. } => Self::bad(name, error),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn value(&self) -> Option<&PointValue> {
        self.value.as_ref()
    }

    pub fn quality(&self) -> DataQuality {
        self.quality
    }

    pub fn error_message(&self) -> Option<&str> {
        self.error_message.as_deref()
    }

    pub fn is_success(&self) -> bool {
        self.quality.is_usable()
    }
}
