//! Infrastructure layer - transports, driver plumbing and configuration

pub mod config;
pub mod drivers;

pub use drivers::{DriverFactory, DriverOptions, TransportDriver};
