mod connection_state;
mod device_driver;
mod driver_type;
mod notifier;
mod state_change;
mod state_machine;
mod transport;

pub use connection_state::ConnectionState;
pub use device_driver::{DeviceDriver, DeviceDriverExt};
pub use driver_type::DriverType;
pub use notifier::{StateNotifier, Subscription};
pub use state_change::ConnectionStateChanged;
pub use state_machine::ConnectionStateMachine;
pub use transport::{Sample, Transport, TransportError};
