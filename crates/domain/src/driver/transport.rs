use async_trait::async_trait;
use thiserror::Error;

use crate::point::{DataQuality, DataType, PointValue};

/// A decoded value as reported by the device.
#[derive(Debug, Clone, PartialEq)]
pub struct Sample {
    pub value: PointValue,
    pub quality: DataQuality,
}

impl Sample {
    pub fn new(value: PointValue, quality: DataQuality) -> Self {
        Self { value, quality }
    }

    pub fn good(value: PointValue) -> Self {
        Self::new(value, DataQuality::Good)
    }
}

/// Failures a transport can report.
///
/// `Unreachable` and `Rejected` are connect failures, `ConnectionLost` is a
/// transport fault that ends the session, the rest are per-request failures.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TransportError {
    #[error("device unreachable: {0}")]
    Unreachable(String),

    #[error("handshake rejected: {0}")]
    Rejected(String),

    #[error("connection lost: {0}")]
    ConnectionLost(String),

    #[error("invalid address: {0}")]
    InvalidAddress(String),

    #[error("type mismatch at {address}: expected {expected}, got {actual}")]
    TypeMismatch {
        address: String,
        expected: DataType,
        actual: DataType,
    },

    #[error("address {0} is read-only")]
    ReadOnly(String),

    #[error("device fault: {0}")]
    DeviceFault(String),
}

impl TransportError {
    /// The session can no longer be used after this error.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::ConnectionLost(_))
    }
}

/// The narrow surface a concrete protocol implements.
///
/// Implementations are driven by one caller at a time and never see
/// concurrent calls; state handling, timeouts and cancellation live above
/// this trait.
#[async_trait]
pub trait Transport: Send {
    /// Protocol label used in logs
    fn kind(&self) -> &str;

    /// Establish the session (socket, serial port, handshake).
    async fn open(&mut self) -> Result<(), TransportError>;

    /// Release everything `open` acquired. Called even after a failed or
    /// abandoned `open`, so it must tolerate a half-open session.
    async fn close(&mut self) -> Result<(), TransportError>;

    /// Read and decode the value at `address` as `data_type`.
    async fn read(&mut self, address: &str, data_type: DataType) -> Result<Sample, TransportError>;

    /// Encode and write `value` to `address`. Must reject a value whose type
    /// differs from the target's with [`TransportError::TypeMismatch`].
    async fn write(&mut self, address: &str, value: &PointValue) -> Result<(), TransportError>;
}
