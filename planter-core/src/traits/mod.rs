//! Hardware abstraction traits
//!
//! These traits define the interface between the application logic
//! and hardware-specific implementations.

pub mod clock;
pub mod pump;
pub mod sensor;

pub use clock::Clock;
pub use pump::PumpOutput;
pub use sensor::{MoistureSensor, SensorError};
