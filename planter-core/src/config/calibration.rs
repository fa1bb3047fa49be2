//! Moisture probe calibration
//!
//! Two raw ADC readings pin the conversion: one taken in dry soil and one
//! with the probe in saturated soil. Capacitive probes read lower when wet,
//! so normally `sat_raw < dry_raw`, but the converter works either way.

/// Largest raw reading of the 12-bit ADC
pub const ANALOG_MAX: u16 = 4095;

/// Raw reading of the reference probe in dry soil
pub const DEFAULT_DRY_RAW: u16 = 3500;

/// Raw reading of the reference probe in saturated soil
pub const DEFAULT_SAT_RAW: u16 = 1000;

/// Moisture probe calibration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct CalibrationConfig {
    dry_raw: u16,
    sat_raw: u16,
    clamp: bool,
}

impl Default for CalibrationConfig {
    fn default() -> Self {
        Self::new(DEFAULT_DRY_RAW, DEFAULT_SAT_RAW)
    }
}

impl CalibrationConfig {
    /// Create a calibration from two raw points
    ///
    /// Values above [`ANALOG_MAX`] are limited to it. Clamping of the
    /// converted percentage is off.
    pub const fn new(dry_raw: u16, sat_raw: u16) -> Self {
        Self {
            dry_raw: if dry_raw > ANALOG_MAX { ANALOG_MAX } else { dry_raw },
            sat_raw: if sat_raw > ANALOG_MAX { ANALOG_MAX } else { sat_raw },
            clamp: false,
        }
    }

    /// Raw reading at 0 %
    pub const fn dry_raw(&self) -> u16 {
        self.dry_raw
    }

    /// Raw reading at 100 %
    pub const fn sat_raw(&self) -> u16 {
        self.sat_raw
    }

    /// Whether percentages are clamped to `[0, 100]`
    pub const fn clamp(&self) -> bool {
        self.clamp
    }

    /// Set the dry calibration point
    ///
    /// Accepts `[0, ANALOG_MAX]`.
    pub fn set_dry_raw(&mut self, raw: i32) -> bool {
        match Self::checked_raw(raw) {
            Some(raw) => {
                self.dry_raw = raw;
                true
            }
            None => false,
        }
    }

    /// Set the saturated calibration point
    ///
    /// Accepts `[0, ANALOG_MAX]`.
    pub fn set_sat_raw(&mut self, raw: i32) -> bool {
        match Self::checked_raw(raw) {
            Some(raw) => {
                self.sat_raw = raw;
                true
            }
            None => false,
        }
    }

    /// Enable or disable clamping of converted percentages
    pub fn set_clamp(&mut self, clamp: bool) {
        self.clamp = clamp;
    }

    fn checked_raw(raw: i32) -> Option<u16> {
        if (0..=ANALOG_MAX as i32).contains(&raw) {
            Some(raw as u16)
        } else {
            None
        }
    }
}
