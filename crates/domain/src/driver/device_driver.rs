use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use super::{ConnectionState, StateNotifier};
use crate::error::{DomainError, Result};
use crate::point::{DataPoint, DataType, DataValue, PointValue, Primitive};
use crate::result::{
    BatchReadResult, BatchWriteResult, ConnectResult, ReadResult, WriteItem, WriteItemResult,
    WriteResult,
};

/// Contract every field device driver honors.
///
/// Expected failures (unreachable device, bad address, type mismatch, device
/// fault) come back inside the `Ok` result types. `Err` is reserved for
/// [`DomainError::Cancelled`] and argument violations such as an empty
/// address, which are raised before any I/O.
///
/// Operations on one instance are serialized by the implementation; callers
/// may share a driver across tasks.
#[async_trait]
pub trait DeviceDriver: Send + Sync {
    /// Driver instance name, usually the device name
    fn name(&self) -> &str;

    /// Get driver type identifier
    fn driver_type(&self) -> &str;

    /// Get current connection state
    fn connection_state(&self) -> ConnectionState;

    /// Check if currently connected
    fn is_connected(&self) -> bool {
        self.connection_state().is_connected()
    }

    /// State change notifications for this driver
    fn state_changes(&self) -> &StateNotifier;

    /// Establish the session. Succeeds without a transition when already
    /// connected.
    async fn connect(&self, cancel: &CancellationToken) -> Result<ConnectResult>;

    /// Release the session. No-op when already disconnected.
    async fn disconnect(&self, cancel: &CancellationToken) -> Result<()>;

    /// Read one address, decoded as `data_type`.
    async fn read(
        &self,
        address: &str,
        data_type: DataType,
        cancel: &CancellationToken,
    ) -> Result<ReadResult>;

    /// Write one value. The target's type must match the value's variant.
    async fn write(
        &self,
        address: &str,
        value: PointValue,
        cancel: &CancellationToken,
    ) -> Result<WriteResult>;

    /// Read every point in order. One failing point never skips the rest;
    /// cancellation stops before the next point starts.
    async fn read_batch(
        &self,
        points: &[DataPoint],
        cancel: &CancellationToken,
    ) -> Result<BatchReadResult> {
        let mut values = Vec::with_capacity(points.len());
        for point in points {
            if cancel.is_cancelled() {
                return Err(DomainError::Cancelled);
            }
            let result = self
                .read(point.address(), point.data_type(), cancel)
                .await?;
            values.push(DataValue::from_read(point.name(), result));
        }
        Ok(BatchReadResult::new(values))
    }

    /// Write every item in order, with the same independence and
    /// cancellation rules as [`DeviceDriver::read_batch`].
    async fn write_batch(
        &self,
        items: &[WriteItem],
        cancel: &CancellationToken,
    ) -> Result<BatchWriteResult> {
        let mut results = Vec::with_capacity(items.len());
        for item in items {
            if cancel.is_cancelled() {
                return Err(DomainError::Cancelled);
            }
            let result = self
                .write(item.address(), item.value().clone(), cancel)
                .await?;
            results.push(WriteItemResult::from_write(item.address(), result));
        }
        Ok(BatchWriteResult::new(results))
    }

    /// Release every held resource. Safe in any state and safe to repeat.
    async fn dispose(&self);
}

/// Typed helpers over [`DeviceDriver`], keyed by the Rust type's [`DataType`].
#[async_trait]
pub trait DeviceDriverExt: DeviceDriver {
    /// Read `address` as `T`; use [`ReadResult::value_as`] on the result.
    async fn read_as<T: Primitive>(
        &self,
        address: &str,
        cancel: &CancellationToken,
    ) -> Result<ReadResult> {
        self.read(address, T::DATA_TYPE, cancel).await
    }

    async fn write_as<T: Primitive>(
        &self,
        address: &str,
        value: T,
        cancel: &CancellationToken,
    ) -> Result<WriteResult> {
        self.write(address, value.into_point_value(), cancel).await
    }
}

#[async_trait]
impl<D: DeviceDriver + ?Sized> DeviceDriverExt for D {}
