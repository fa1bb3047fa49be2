//! Configuration types
//!
//! Board-agnostic configuration structures. Every tunable is bounded and
//! can only change through a validated setter that reports success.

pub mod calibration;
pub mod types;

pub use calibration::*;
pub use types::*;

/// Complete controller configuration
#[derive(Debug, Clone, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PlanterConfig {
    /// Reservoir capacity and default pulse
    pub reservoir: ReservoirConfig,
    /// Moisture probe calibration
    pub calibration: CalibrationConfig,
    /// Sensor sampling cadence
    pub sampling: SamplingConfig,
    /// Automatic watering trigger
    pub auto_water: AutoWaterConfig,
    /// History tier periods
    pub history: HistoryConfig,
}
