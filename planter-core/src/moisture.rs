//! Raw probe reading to moisture percentage
//!
//! Linear interpolation between the dry (0 %) and saturated (100 %)
//! calibration points. Readings outside the calibrated span extrapolate
//! beyond 0–100 unless clamping is enabled on the calibration.

use crate::config::CalibrationConfig;

/// Moisture converter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct MoistureConverter {
    calibration: CalibrationConfig,
}

impl MoistureConverter {
    /// Create a converter for the given calibration
    pub const fn new(calibration: CalibrationConfig) -> Self {
        Self { calibration }
    }

    /// Current calibration
    pub fn calibration(&self) -> &CalibrationConfig {
        &self.calibration
    }

    /// Mutable access for the validated calibration setters
    pub fn calibration_mut(&mut self) -> &mut CalibrationConfig {
        &mut self.calibration
    }

    /// Convert a raw sample to percent
    ///
    /// Integer math, truncating toward zero. A degenerate calibration
    /// (`dry_raw == sat_raw`) yields 0.
    pub fn percent(&self, raw: u16) -> i32 {
        let dry = self.calibration.dry_raw() as i64;
        let sat = self.calibration.sat_raw() as i64;
        let span = sat - dry;

        if span == 0 {
            return 0;
        }

        let percent = ((raw as i64 - dry) * 100 / span) as i32;

        if self.calibration.clamp() {
            percent.clamp(0, 100)
        } else {
            percent
        }
    }
}
