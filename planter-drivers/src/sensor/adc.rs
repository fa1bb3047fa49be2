//! Analog soil moisture probe
//!
//! Capacitive and resistive probes on a 12-bit ADC channel. Readings are
//! averaged over a few conversions; failed conversions are discarded.
//!
//! A probe with a broken wire floats to one of the ADC rails, which no
//! calibrated soil reading comes close to, so readings within
//! [`RAIL_MARGIN`] of either rail are reported as a disconnected probe.

use planter_core::config::ANALOG_MAX;
use planter_core::traits::{MoistureSensor, SensorError};

/// Distance from either ADC rail that counts as a disconnected probe
pub const RAIL_MARGIN: u16 = 10;

/// Most conversions averaged into one sample
pub const MAX_OVERSAMPLE: u8 = 16;

/// ADC reading trait for platform abstraction
pub trait AdcReader {
    /// Read ADC value (12-bit, 0-4095)
    #[allow(clippy::result_unit_err)]
    fn read(&mut self) -> Result<u16, ()>;
}

/// Moisture probe on an ADC channel
pub struct AdcMoistureSensor<ADC> {
    adc: ADC,
    /// Conversions averaged per sample
    oversample: u8,
    /// Report rail readings as disconnected
    rail_check: bool,
}

impl<ADC> AdcMoistureSensor<ADC> {
    /// Create a probe taking one conversion per sample, with rail checks
    pub fn new(adc: ADC) -> Self {
        Self {
            adc,
            oversample: 1,
            rail_check: true,
        }
    }

    /// Average `count` conversions per sample (1..=[`MAX_OVERSAMPLE`])
    pub fn with_oversample(mut self, count: u8) -> Self {
        self.oversample = count.clamp(1, MAX_OVERSAMPLE);
        self
    }

    /// Enable or disable the disconnected-probe check
    pub fn with_rail_check(mut self, enabled: bool) -> Self {
        self.rail_check = enabled;
        self
    }

    /// Conversions averaged per sample
    pub fn oversample(&self) -> u8 {
        self.oversample
    }

    /// Release the ADC channel
    pub fn release(self) -> ADC {
        self.adc
    }

    /// Check if a reading sits on an ADC rail
    pub fn is_rail(raw: u16) -> bool {
        raw < RAIL_MARGIN || raw > ANALOG_MAX - RAIL_MARGIN
    }
}

impl<ADC: AdcReader> MoistureSensor for AdcMoistureSensor<ADC> {
    fn read_raw(&mut self) -> Result<u16, SensorError> {
        let mut acc: u32 = 0;
        let mut count: u32 = 0;

        for _ in 0..self.oversample {
            if let Ok(raw) = self.adc.read() {
                acc += raw.min(ANALOG_MAX) as u32;
                count += 1;
            }
        }

        if count == 0 {
            return Err(SensorError::ConversionError);
        }

        let raw = (acc / count) as u16;
        if self.rail_check && Self::is_rail(raw) {
            debug!("moisture probe reads {} at ADC rail", raw);
            return Err(SensorError::Disconnected);
        }

        Ok(raw)
    }
}
