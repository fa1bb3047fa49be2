//! Configuration type definitions
//!
//! Reservoir, sampling, auto-watering and history settings. Fields are
//! private so that the bounds below always hold.

/// Minimum pump pulse (ms); also the smallest accepted reservoir capacity
pub const MIN_PULSE_MS: u32 = 500;

/// Maximum pump pulse (ms)
pub const MAX_PULSE_MS: u32 = 5_000;

/// Maximum reservoir capacity (ms of pump runtime)
pub const MAX_RESERVOIR_MS: u32 = 300_000;

/// Reservoir runs dry after 90 seconds of pumping
pub const DEFAULT_CAPACITY_MS: u32 = 90_000;

/// Default pulse length
pub const DEFAULT_PULSE_MS: u32 = 1_500;

/// Shortest accepted interval between moisture samples
pub const MIN_SAMPLE_INTERVAL_MS: u32 = 100;

/// Longest accepted interval between moisture samples
pub const MAX_SAMPLE_INTERVAL_MS: u32 = 3_600_000;

/// Check sensors every second
pub const DEFAULT_SAMPLE_INTERVAL_MS: u32 = 1_000;

/// Minimum pause between automatic pulses
pub const DEFAULT_AUTO_COOLDOWN_MS: u32 = 300_000;

/// Longest accepted pause between automatic pulses (one day)
pub const MAX_AUTO_COOLDOWN_MS: u32 = 86_400_000;

/// One hour in milliseconds
pub const ONE_HOUR_MS: u64 = 3_600_000;

/// One day in milliseconds
pub const ONE_DAY_MS: u64 = 86_400_000;

/// Fine tier entries kept (one day of hourly buckets)
pub const FINE_LOG_SIZE: usize = 24;

/// Coarse tier entries kept (eight days)
pub const COARSE_LOG_SIZE: usize = 8;

/// Fine closures per coarse closure (24 hours make a day)
pub const DEFAULT_ROLLUP_EVERY: u16 = 24;

/// Reservoir configuration
///
/// `capacity_ms` is the total pump runtime the reservoir supports before
/// it is presumed empty. `pulse_ms` is the duration of a default pulse.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ReservoirConfig {
    capacity_ms: u32,
    pulse_ms: u32,
}

impl Default for ReservoirConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl ReservoirConfig {
    /// Create a reservoir config with default values
    pub const fn new() -> Self {
        Self {
            capacity_ms: DEFAULT_CAPACITY_MS,
            pulse_ms: DEFAULT_PULSE_MS,
        }
    }

    /// Reservoir capacity in ms of pump runtime
    pub const fn capacity_ms(&self) -> u32 {
        self.capacity_ms
    }

    /// Default pulse duration in ms
    pub const fn pulse_ms(&self) -> u32 {
        self.pulse_ms
    }

    /// Set the reservoir capacity
    ///
    /// Accepts `[MIN_PULSE_MS, MAX_RESERVOIR_MS]`. Returns false and leaves
    /// the value unchanged otherwise.
    pub fn set_capacity_ms(&mut self, capacity_ms: u32) -> bool {
        if (MIN_PULSE_MS..=MAX_RESERVOIR_MS).contains(&capacity_ms) {
            self.capacity_ms = capacity_ms;
            true
        } else {
            false
        }
    }

    /// Set the default pulse duration
    ///
    /// Accepts `[MIN_PULSE_MS, MAX_PULSE_MS]`.
    pub fn set_pulse_ms(&mut self, pulse_ms: u32) -> bool {
        if (MIN_PULSE_MS..=MAX_PULSE_MS).contains(&pulse_ms) {
            self.pulse_ms = pulse_ms;
            true
        } else {
            false
        }
    }

    /// Clamp a requested pulse to the supported range
    pub const fn clamp_pulse(duration_ms: u32) -> u32 {
        if duration_ms < MIN_PULSE_MS {
            MIN_PULSE_MS
        } else if duration_ms > MAX_PULSE_MS {
            MAX_PULSE_MS
        } else {
            duration_ms
        }
    }
}

/// Sensor sampling cadence
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SamplingConfig {
    interval_ms: u32,
}

impl Default for SamplingConfig {
    fn default() -> Self {
        Self {
            interval_ms: DEFAULT_SAMPLE_INTERVAL_MS,
        }
    }
}

impl SamplingConfig {
    /// Minimum time between two samples
    pub const fn interval_ms(&self) -> u32 {
        self.interval_ms
    }

    /// Set the sampling interval
    ///
    /// Accepts `[MIN_SAMPLE_INTERVAL_MS, MAX_SAMPLE_INTERVAL_MS]`.
    pub fn set_interval_ms(&mut self, interval_ms: u32) -> bool {
        if (MIN_SAMPLE_INTERVAL_MS..=MAX_SAMPLE_INTERVAL_MS).contains(&interval_ms) {
            self.interval_ms = interval_ms;
            true
        } else {
            false
        }
    }
}

/// Automatic watering
///
/// When a trigger is set, a default pulse is armed whenever the latest
/// moisture sample is at or below the trigger and the cooldown since the
/// last pump stop has elapsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct AutoWaterConfig {
    trigger_percent: Option<i32>,
    cooldown_ms: u32,
}

impl Default for AutoWaterConfig {
    fn default() -> Self {
        Self {
            trigger_percent: None,
            cooldown_ms: DEFAULT_AUTO_COOLDOWN_MS,
        }
    }
}

impl AutoWaterConfig {
    /// Moisture percentage at or below which watering starts
    pub const fn trigger_percent(&self) -> Option<i32> {
        self.trigger_percent
    }

    /// Minimum pause between the last stop and an automatic pulse
    pub const fn cooldown_ms(&self) -> u32 {
        self.cooldown_ms
    }

    /// Set or clear the trigger
    ///
    /// Accepts `None` or a percentage in `[0, 100]`.
    pub fn set_trigger_percent(&mut self, trigger: Option<i32>) -> bool {
        match trigger {
            Some(percent) if !(0..=100).contains(&percent) => false,
            _ => {
                self.trigger_percent = trigger;
                true
            }
        }
    }

    /// Set the cooldown
    ///
    /// Accepts anything up to `MAX_AUTO_COOLDOWN_MS`.
    pub fn set_cooldown_ms(&mut self, cooldown_ms: u32) -> bool {
        if cooldown_ms <= MAX_AUTO_COOLDOWN_MS {
            self.cooldown_ms = cooldown_ms;
            true
        } else {
            false
        }
    }
}

/// History tiers
///
/// The fine tier closes a bucket every `period_ms`. When `rollup_every` is
/// non-zero, every `rollup_every` fine closures are merged into one coarse
/// bucket. Ring capacities are chosen at the type level on
/// [`crate::history::HistoryAggregator`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct HistoryConfig {
    period_ms: u64,
    rollup_every: u16,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self::new(ONE_HOUR_MS, DEFAULT_ROLLUP_EVERY)
    }
}

impl HistoryConfig {
    /// Create a two-tier history config
    ///
    /// A zero period is raised to 1 ms.
    pub const fn new(period_ms: u64, rollup_every: u16) -> Self {
        Self {
            period_ms: if period_ms == 0 { 1 } else { period_ms },
            rollup_every,
        }
    }

    /// Create a history with only the fine tier
    pub const fn single_tier(period_ms: u64) -> Self {
        Self::new(period_ms, 0)
    }

    /// Fine tier period
    pub const fn period_ms(&self) -> u64 {
        self.period_ms
    }

    /// Fine closures per coarse closure (0 = no coarse tier)
    pub const fn rollup_every(&self) -> u16 {
        self.rollup_every
    }

    /// Whether the coarse tier is active
    pub const fn has_coarse_tier(&self) -> bool {
        self.rollup_every > 0
    }
}
