use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::ConnectionState;
use crate::clock;

/// Notification fired on every connection state transition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConnectionStateChanged {
    pub old_state: ConnectionState,
    pub new_state: ConnectionState,
    pub reason: Option<String>,
    pub timestamp: DateTime<Utc>,
}

impl ConnectionStateChanged {
    pub fn new(
        old_state: ConnectionState,
        new_state: ConnectionState,
        reason: Option<String>,
    ) -> Self {
        Self {
            old_state,
            new_state,
            reason,
            timestamp: clock::now(),
        }
    }
}

impl std::fmt::Display for ConnectionStateChanged {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} -> {}", self.old_state, self.new_state)?;
        if let Some(reason) = &self.reason {
            write!(f, " ({reason})")?;
        }
        Ok(())
    }
}
