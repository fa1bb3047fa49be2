//! Hardware driver implementations
//!
//! This crate provides concrete implementations of the traits defined
//! in planter-core for common irrigation hardware:
//!
//! - Pump relay or MOSFET with optional status LED
//! - Analog soil moisture probe on an ADC channel

#![no_std]
#![deny(unsafe_code)]

// Must come first so the logging macros are visible to the other modules
mod fmt;

pub mod pump;
pub mod sensor;
