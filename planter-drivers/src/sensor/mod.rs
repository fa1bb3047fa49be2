//! Moisture probe implementations

pub mod adc;

pub use adc::{AdcMoistureSensor, AdcReader};
