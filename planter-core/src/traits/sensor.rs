//! Soil moisture sensor trait

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Errors that can occur when sampling the moisture probe
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum SensorError {
    /// Probe disconnected (reading pinned to a rail)
    Disconnected,
    /// ADC conversion error
    ConversionError,
}

/// Trait for raw soil moisture probes
///
/// Capacitive and resistive probes both produce a raw ADC count that
/// falls as the soil gets wetter. Conversion to a percentage happens in
/// [`crate::moisture::MoistureConverter`].
pub trait MoistureSensor {
    /// Read one raw sample (0..=[`crate::config::ANALOG_MAX`])
    ///
    /// Takes `&mut self` because ADC reads typically require mutable access.
    fn read_raw(&mut self) -> Result<u16, SensorError>;
}
