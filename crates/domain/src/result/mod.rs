mod batch;
mod message;
mod outcome;

pub use batch::{BatchReadResult, BatchWriteResult, WriteItem, WriteItemResult};
pub use message::ErrorMessage;
pub use outcome::{ConnectResult, ReadResult, WriteResult};
