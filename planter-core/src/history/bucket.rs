//! Time-windowed activity bucket
//!
//! A bucket aggregates moisture samples and pump activity over one window.
//! Extremes start at sentinels (`i32::MAX` / `i32::MIN`) so the first
//! sample always replaces them.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Aggregate of one history window
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Bucket {
    /// Window start (ms)
    pub begin_ts: u64,
    /// Time of the last update (ms)
    pub end_ts: u64,
    /// Number of moisture samples
    pub sample_count: u32,
    /// Most recent moisture sample (%)
    pub latest: Option<i32>,
    /// Mean of all samples (%)
    pub running_average: f32,
    /// Lowest sample (%), `i32::MAX` while empty
    pub min_value: i32,
    /// Highest sample (%), `i32::MIN` while empty
    pub max_value: i32,
    /// Pump sessions that ended in this window
    pub pump_starts: u32,
    /// Pump runtime of those sessions (ms)
    pub pump_run_ms: u64,
}

impl Bucket {
    /// Open an empty bucket at `now_ms`
    pub const fn open(now_ms: u64) -> Self {
        Self {
            begin_ts: now_ms,
            end_ts: now_ms,
            sample_count: 0,
            latest: None,
            running_average: 0.0,
            min_value: i32::MAX,
            max_value: i32::MIN,
            pump_starts: 0,
            pump_run_ms: 0,
        }
    }

    /// Check if no moisture sample has been recorded
    pub fn is_empty(&self) -> bool {
        self.sample_count == 0
    }

    /// Lowest sample, if any
    pub fn min(&self) -> Option<i32> {
        (!self.is_empty()).then_some(self.min_value)
    }

    /// Highest sample, if any
    pub fn max(&self) -> Option<i32> {
        (!self.is_empty()).then_some(self.max_value)
    }

    /// Record a moisture sample
    ///
    /// The average is the exact cumulative mean:
    /// `avg_n = (avg_{n-1} * (n - 1) + sample) / n`.
    pub fn record_sample(&mut self, percent: i32, now_ms: u64) {
        self.sample_count = self.sample_count.saturating_add(1);
        let n = self.sample_count as f32;

        self.running_average = (self.running_average * (n - 1.0) + percent as f32) / n;
        self.latest = Some(percent);
        self.min_value = self.min_value.min(percent);
        self.max_value = self.max_value.max(percent);
        self.end_ts = self.end_ts.max(now_ms);
    }

    /// Record a finished pump session
    pub fn record_pump_stop(&mut self, run_ms: u64, now_ms: u64) {
        self.pump_starts = self.pump_starts.saturating_add(1);
        self.pump_run_ms = self.pump_run_ms.saturating_add(run_ms);
        self.end_ts = self.end_ts.max(now_ms);
    }

    /// Combine with a later bucket
    ///
    /// The average is weighted by sample count; extremes and pump counters
    /// combine over both windows. `later` supplies the end time and, when it
    /// has samples, the latest reading.
    pub fn merged(&self, later: &Bucket) -> Bucket {
        let count = self.sample_count.saturating_add(later.sample_count);
        let running_average = if count == 0 {
            0.0
        } else {
            (self.running_average * self.sample_count as f32
                + later.running_average * later.sample_count as f32)
                / count as f32
        };

        Bucket {
            begin_ts: self.begin_ts.min(later.begin_ts),
            end_ts: self.end_ts.max(later.end_ts),
            sample_count: count,
            latest: later.latest.or(self.latest),
            running_average,
            min_value: self.min_value.min(later.min_value),
            max_value: self.max_value.max(later.max_value),
            pump_starts: self.pump_starts.saturating_add(later.pump_starts),
            pump_run_ms: self.pump_run_ms.saturating_add(later.pump_run_ms),
        }
    }
}
