use thiserror::Error;

use crate::driver::ConnectionState;

/// Domain-level errors.
///
/// Business failures (unreachable device, bad address, type mismatch) never
/// appear here; they travel inside the result types. These variants cover
/// contract violations at the call boundary and cancellation.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DomainError {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Operation cancelled")]
    Cancelled,

    #[error("Invalid connection state transition: {from} -> {to}")]
    InvalidTransition {
        from: ConnectionState,
        to: ConnectionState,
    },

    #[error("Invalid driver configuration: {0}")]
    InvalidDriverConfig(String),
}

impl DomainError {
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument(message.into())
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}

pub type Result<T> = std::result::Result<T, DomainError>;
