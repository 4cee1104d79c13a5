//! Driver contract for industrial field devices.
//!
//! This crate contains:
//! - Point model (DataPoint, DataType, PointValue, DataQuality, DataValue)
//! - Result model (ConnectResult, ReadResult, WriteResult, batch results)
//! - Connection state machine and state-change notifications
//! - The `DeviceDriver` contract and the `Transport` seam concrete protocols plug into
//!
//! Principles:
//! - No protocol code and no runtime here
//! - Expected failures are values, never panics or `Err`
//! - Invalid result shapes are unrepresentable

pub mod clock;
pub mod driver;
pub mod error;
pub mod point;
pub mod result;

// Re-export commonly used types
pub use driver::{
    ConnectionState, ConnectionStateChanged, DeviceDriver, DeviceDriverExt, DriverType,
    StateNotifier, Subscription,
};
pub use error::DomainError;
pub use point::{DataPoint, DataQuality, DataType, DataValue, PointValue, Primitive, PropertyValue};
pub use result::{
    BatchReadResult, BatchWriteResult, ConnectResult, ErrorMessage, ReadResult, WriteItem,
    WriteItemResult, WriteResult,
};
