use chrono::{DateTime, Utc};
use serde::Serialize;

use super::ErrorMessage;
use crate::clock;
use crate::point::{DataQuality, Primitive, PointValue};

/// Outcome of a connect attempt.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome")]
pub enum ConnectResult {
    Success {
        timestamp: DateTime<Utc>,
    },
    Failure {
        error: ErrorMessage,
        timestamp: DateTime<Utc>,
    },
}

impl ConnectResult {
    pub fn success() -> Self {
        Self::Success {
            timestamp: clock::now(),
        }
    }

    pub fn failure(error: impl Into<String>) -> Self {
        Self::Failure {
            error: ErrorMessage::new(error),
            timestamp: clock::now(),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    pub fn error_message(&self) -> Option<&str> {
        match self {
            Self::Success { .. } => None,
            Self::Failure { error, .. } => Some(error.as_str()),
        }
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        match self {
            Self::Success { timestamp } | Self::Failure { timestamp, .. } => *timestamp,
        }
    }
}

/// Outcome of reading one address.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome")]
pub enum ReadResult {
    Success {
        value: PointValue,
        quality: DataQuality,
        timestamp: DateTime<Utc>,
    },
    Failure {
        error: ErrorMessage,
        timestamp: DateTime<Utc>,
    },
}

impl ReadResult {
    /// A `Bad` sample has no trustworthy value and becomes a failure.
    pub fn success(value: PointValue, quality: DataQuality) -> Self {
        if quality == DataQuality::Bad {
            return Self::failure("device reported bad quality");
        }
        Self::Success {
            value,
            quality,
            timestamp: clock::now(),
        }
    }

    pub fn good(value: PointValue) -> Self {
        Self::success(value, DataQuality::Good)
    }

    pub fn failure(error: impl Into<String>) -> Self {
        Self::Failure {
            error: ErrorMessage::new(error),
            timestamp: clock::now(),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    pub fn value(&self) -> Option<&PointValue> {
        match self {
            Self::Success { value, .. } => Some(value),
            Self::Failure { .. } => None,
        }
    }

    /// Typed access; `None` on failure or when the value is not a `T`.
    pub fn value_as<T: Primitive>(&self) -> Option<T> {
        self.value().and_then(T::from_point_value)
    }

    /// Failures report `Bad`.
    pub fn quality(&self) -> DataQuality {
        match self {
            Self::Success { quality, .. } => *quality,
            Self::Failure { .. } => DataQuality::Bad,
        }
    }

    pub fn error_message(&self) -> Option<&str> {
        match self {
            Self::Success { .. } => None,
            Self::Failure { error, .. } => Some(error.as_str()),
        }
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        match self {
            Self::Success { timestamp, .. } | Self::Failure { timestamp, .. } => *timestamp,
        }
    }
}

/// Outcome of writing one address.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome")]
pub enum WriteResult {
    Success {
        timestamp: DateTime<Utc>,
    },
    Failure {
        error: ErrorMessage,
        timestamp: DateTime<Utc>,
    },
}

impl WriteResult {
    pub fn success() -> Self {
        Self::Success {
            timestamp: clock::now(),
        }
    }

    pub fn failure(error: impl Into<String>) -> Self {
        Self::Failure {
            error: ErrorMessage::new(error),
            timestamp: clock::now(),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    pub fn error_message(&self) -> Option<&str> {
        match self {
            Self::Success { .. } => None,
            Self::Failure { error, .. } => Some(error.as_str()),
        }
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        match self {
            Self::Success { timestamp } | Self::Failure { timestamp, .. } => *timestamp,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connect_success_has_no_error() {
        let result = ConnectResult::success();
        assert!(result.is_success());
        assert!(result.error_message().is_none());
    }

    #[test]
    fn test_connect_failure_has_message() {
        let result = ConnectResult::failure("connection refused");
        assert!(!result.is_success());
        assert_eq!(result.error_message(), Some("connection refused"));
    }

    #[test]
    fn test_failure_message_never_empty() {
        assert!(!ConnectResult::failure("").error_message().unwrap().is_empty());
        assert!(!ReadResult::failure("").error_message().unwrap().is_empty());
        assert!(!WriteResult::failure(" ").error_message().unwrap().is_empty());
    }

    #[test]
    fn test_read_success() {
        let result = ReadResult::success(PointValue::UInt16(1200), DataQuality::Uncertain);
        assert!(result.is_success());
        assert_eq!(result.value(), Some(&PointValue::UInt16(1200)));
        assert_eq!(result.value_as::<u16>(), Some(1200));
        assert_eq!(result.value_as::<i16>(), None);
        assert_eq!(result.quality(), DataQuality::Uncertain);
        assert!(result.error_message().is_none());
    }

    #[test]
    fn test_bad_quality_success_becomes_failure() {
        let result = ReadResult::success(PointValue::Int16(1), DataQuality::Bad);
        assert!(!result.is_success());
        assert!(result.value().is_none());
        assert_eq!(result.quality(), DataQuality::Bad);
        assert!(result.error_message().unwrap().contains("bad quality"));
    }

    #[test]
    fn test_read_failure() {
        let result = ReadResult::failure("not connected");
        assert!(!result.is_success());
        assert!(result.value().is_none());
        assert_eq!(result.quality(), DataQuality::Bad);
        assert_eq!(result.error_message(), Some("not connected"));
    }

    #[test]
    fn test_pattern_matching_access() {
        match ReadResult::good(PointValue::Boolean(true)) {
            ReadResult::Success { value, quality, .. } => {
                assert_eq!(value, PointValue::Boolean(true));
                assert_eq!(quality, DataQuality::Good);
            }
            ReadResult::Failure { .. } => panic!("expected success"),
        }
    }

    #[test]
    fn test_timestamps_non_decreasing() {
        let first = WriteResult::success();
        let second = WriteResult::failure("device fault");
        let third = ConnectResult::success();
        assert!(second.timestamp() >= first.timestamp());
        assert!(third.timestamp() >= second.timestamp());
    }

    #[test]
    fn test_serialization_is_tagged() {
        let json = serde_json::to_value(WriteResult::failure("read only")).unwrap();
        assert_eq!(json["outcome"], "Failure");
        assert_eq!(json["error"], "read only");
    }
}
