//! Pump control
//!
//! Reservoir-limited pump state machine.

pub mod controller;
pub mod state;

pub use controller::PumpController;
pub use state::{PumpState, PumpStop};
