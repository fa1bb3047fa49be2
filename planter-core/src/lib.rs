//! Board-agnostic core logic for the Planter irrigation controller
//!
//! This crate contains all application logic that does not depend on
//! specific hardware implementations:
//!
//! - Hardware abstraction traits (pump output, moisture probe, clock)
//! - Reservoir-limited pump controller
//! - Raw-to-percent moisture conversion
//! - Tiered moisture and pump history
//! - The [`Planter`] controller tying them together
//! - Configuration type definitions

#![no_std]
#![deny(unsafe_code)]

// Must come first so the logging macros are visible to the other modules
mod fmt;

pub mod config;
pub mod history;
pub mod moisture;
pub mod planter;
pub mod pump;
pub mod traits;

#[cfg(test)]
mod mock;

pub use config::PlanterConfig;
pub use history::{Bucket, HistoryAggregator, Tier};
pub use moisture::MoistureConverter;
pub use planter::{Planter, Status};
pub use pump::{PumpController, PumpState, PumpStop};
pub use traits::{Clock, MoistureSensor, PumpOutput, SensorError};
