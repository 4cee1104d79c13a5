use serde::{Deserialize, Serialize};

/// Connection state of a driver instance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum ConnectionState {
    /// Not connected, no active connection attempt
    #[default]
    Disconnected,
    /// Transport handshake in progress
    Connecting,
    /// Session established and operational
    Connected,
    /// Releasing the transport session
    Disconnecting,
    /// Connect failed or the session was lost; a new connect may recover it
    Faulted,
}

impl ConnectionState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Disconnected => "Disconnected",
            Self::Connecting => "Connecting",
            Self::Connected => "Connected",
            Self::Disconnecting => "Disconnecting",
            Self::Faulted => "Faulted",
        }
    }

    /// Check if state allows a connection attempt
    pub fn can_connect(&self) -> bool {
        matches!(self, Self::Disconnected | Self::Faulted)
    }

    /// Check if currently connected
    pub fn is_connected(&self) -> bool {
        matches!(self, Self::Connected)
    }

    /// Check if in a transitional state
    pub fn is_transitioning(&self) -> bool {
        matches!(self, Self::Connecting | Self::Disconnecting)
    }

    /// Whether `self -> next` is a legal edge of the state machine.
    pub fn can_transition_to(&self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Disconnected, Self::Connecting)
                | (Self::Connecting, Self::Connected)
                | (Self::Connecting, Self::Faulted)
                | (Self::Connecting, Self::Disconnected)
                | (Self::Connected, Self::Disconnecting)
                | (Self::Connected, Self::Faulted)
                | (Self::Disconnecting, Self::Disconnected)
                | (Self::Faulted, Self::Connecting)
        )
    }
}

impl std::fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
