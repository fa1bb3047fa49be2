//! Pump output implementations

pub mod relay;

pub use relay::{NoIndicator, RelayPump};
