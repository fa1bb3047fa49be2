//! Tiered history aggregator
//!
//! Samples and pump stops land in the open bucket. When the open bucket
//! is older than the fine period, [`HistoryAggregator::tick`] pushes it into
//! the fine ring log and opens a fresh one.
//!
//! With a coarse tier configured, every closed fine bucket is also merged
//! into a pending rollup. After `rollup_every` fine closures the rollup is
//! pushed into the coarse ring log. The rollup re-aggregates the whole
//! window: sample-weighted average, min of mins, max of maxes, summed pump
//! counters.

use core::fmt::{self, Write};

use super::bucket::Bucket;
use super::report;
use super::ring::RingLog;
use crate::config::HistoryConfig;

/// History tier
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Tier {
    /// Buckets closed every period
    Fine,
    /// Rollups of several fine buckets
    Coarse,
}

/// Which tiers closed a bucket during a tick
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Closures {
    /// A fine bucket was closed
    pub fine: bool,
    /// A coarse rollup was closed
    pub coarse: bool,
}

impl Closures {
    /// Check if any tier closed
    pub fn any(&self) -> bool {
        self.fine || self.coarse
    }
}

/// History aggregator with `FINE` fine entries and `COARSE` coarse entries
#[derive(Debug, Clone)]
pub struct HistoryAggregator<const FINE: usize, const COARSE: usize> {
    config: HistoryConfig,
    /// Bucket currently collecting
    open: Bucket,
    /// Closed fine buckets
    fine: RingLog<Bucket, FINE>,
    /// Closed coarse rollups
    coarse: RingLog<Bucket, COARSE>,
    /// Coarse rollup in progress
    pending: Option<Bucket>,
    /// Fine closures merged into `pending`
    pending_closures: u16,
}

impl<const FINE: usize, const COARSE: usize> HistoryAggregator<FINE, COARSE> {
    /// Create an aggregator whose first bucket opens at `now_ms`
    pub fn new(config: HistoryConfig, now_ms: u64) -> Self {
        Self {
            config,
            open: Bucket::open(now_ms),
            fine: RingLog::new(),
            coarse: RingLog::new(),
            pending: None,
            pending_closures: 0,
        }
    }

    /// History configuration
    pub fn config(&self) -> &HistoryConfig {
        &self.config
    }

    /// Bucket currently collecting
    pub fn open_bucket(&self) -> &Bucket {
        &self.open
    }

    /// Closed fine buckets
    pub fn fine(&self) -> &RingLog<Bucket, FINE> {
        &self.fine
    }

    /// Closed coarse rollups
    pub fn coarse(&self) -> &RingLog<Bucket, COARSE> {
        &self.coarse
    }

    /// Coarse rollup in progress, without the open bucket
    pub fn pending_rollup(&self) -> Option<&Bucket> {
        self.pending.as_ref()
    }

    /// Most recent moisture sample in the open bucket
    pub fn latest_percent(&self) -> Option<i32> {
        self.open.latest
    }

    /// Record a moisture sample in the open bucket
    pub fn record_sample(&mut self, percent: i32, now_ms: u64) {
        self.open.record_sample(percent, now_ms);
    }

    /// Record a finished pump session in the open bucket
    pub fn record_pump_stop(&mut self, run_ms: u64, now_ms: u64) {
        self.open.record_pump_stop(run_ms, now_ms);
    }

    /// Close the open bucket if its period has passed
    ///
    /// Closes at most one bucket per call; after a long gap the fresh bucket
    /// simply starts at `now_ms`.
    pub fn tick(&mut self, now_ms: u64) -> Closures {
        if now_ms.saturating_sub(self.open.begin_ts) <= self.config.period_ms() {
            return Closures::default();
        }

        let closed = core::mem::replace(&mut self.open, Bucket::open(now_ms));
        self.fine.push(closed);
        debug!(
            "history bucket closed: {} samples, {} pump runs",
            closed.sample_count,
            closed.pump_starts
        );

        let mut closures = Closures {
            fine: true,
            coarse: false,
        };

        if self.config.has_coarse_tier() {
            let rollup = match self.pending {
                Some(pending) => pending.merged(&closed),
                None => closed,
            };
            self.pending_closures += 1;

            if self.pending_closures >= self.config.rollup_every() {
                self.coarse.push(rollup);
                self.pending = None;
                self.pending_closures = 0;
                closures.coarse = true;
                info!(
                    "history rollup closed: {} samples, {} pump runs",
                    rollup.sample_count,
                    rollup.pump_starts
                );
            } else {
                self.pending = Some(rollup);
            }
        }

        closures
    }

    /// Current picture of a tier's open window
    ///
    /// For the fine tier this is the open bucket. For the coarse tier it is
    /// the pending rollup merged with the open bucket.
    pub fn current(&self, tier: Tier) -> Bucket {
        match (tier, self.pending) {
            (Tier::Coarse, Some(pending)) => pending.merged(&self.open),
            _ => self.open,
        }
    }

    /// Closed bucket of a tier by age (0 = newest)
    pub fn peek(&self, tier: Tier, age: usize) -> Option<&Bucket> {
        match tier {
            Tier::Fine => self.fine.peek(age),
            Tier::Coarse => self.coarse.peek(age),
        }
    }

    /// Render a tier as a text table
    ///
    /// Row 0 is the tier's open window, followed by up to `n_most_recent`
    /// closed buckets, newest first. The coarse tier renders only the
    /// heading when it is disabled.
    pub fn render_report<W: Write>(
        &self,
        tier: Tier,
        n_most_recent: usize,
        out: &mut W,
    ) -> fmt::Result {
        report::write_header(out)?;

        if tier == Tier::Coarse && !self.config.has_coarse_tier() {
            return Ok(());
        }

        report::write_row(out, 0, &self.current(tier))?;

        match tier {
            Tier::Fine => Self::write_rows(out, self.fine.iter_newest_first(), n_most_recent),
            Tier::Coarse => Self::write_rows(out, self.coarse.iter_newest_first(), n_most_recent),
        }
    }

    fn write_rows<'a, W: Write>(
        out: &mut W,
        buckets: impl Iterator<Item = &'a Bucket>,
        n_most_recent: usize,
    ) -> fmt::Result {
        for (age, bucket) in buckets.take(n_most_recent).enumerate() {
            report::write_row(out, age + 1, bucket)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ONE_DAY_MS, ONE_HOUR_MS};

    extern crate std;
    use std::string::String;

    const MINUTE_MS: u64 = 60_000;

    #[test]
    fn test_day_bucket_closes_once() {
        let mut history: HistoryAggregator<8, 1> =
            HistoryAggregator::new(HistoryConfig::single_tier(ONE_DAY_MS), 0);

        let mut closures = 0;
        let mut now = 0;
        while now <= ONE_DAY_MS + 10 * MINUTE_MS {
            history.record_sample(50, now);
            if history.tick(now).fine {
                closures += 1;
            }
            now += 10 * MINUTE_MS;
        }

        assert_eq!(closures, 1);
        assert_eq!(history.fine().len(), 1);

        let fresh = history.open_bucket();
        assert_eq!(fresh.min_value, i32::MAX);
        assert_eq!(fresh.max_value, i32::MIN);
        assert_eq!(fresh.sample_count, 0);
        assert_eq!(fresh.running_average, 0.0);
    }

    #[test]
    fn test_exact_period_does_not_close() {
        let mut history: HistoryAggregator<4, 1> =
            HistoryAggregator::new(HistoryConfig::single_tier(ONE_HOUR_MS), 1_000);

        assert!(!history.tick(1_000 + ONE_HOUR_MS).any());
        assert!(history.tick(1_001 + ONE_HOUR_MS).fine);
        assert_eq!(history.open_bucket().begin_ts, 1_001 + ONE_HOUR_MS);
    }

    #[test]
    fn test_closed_bucket_keeps_aggregates() {
        let mut history: HistoryAggregator<4, 1> =
            HistoryAggregator::new(HistoryConfig::single_tier(ONE_HOUR_MS), 0);

        history.record_sample(20, 10);
        history.record_sample(40, 20);
        history.record_sample(60, 30);
        history.record_pump_stop(1_500, 40);
        history.tick(ONE_HOUR_MS + 1);

        let closed = history.peek(Tier::Fine, 0).unwrap();
        assert_eq!(closed.running_average, 40.0);
        assert_eq!(closed.min_value, 20);
        assert_eq!(closed.max_value, 60);
        assert_eq!(closed.pump_starts, 1);
        assert_eq!(closed.pump_run_ms, 1_500);
        assert_eq!(history.latest_percent(), None);
    }

    #[test]
    fn test_fine_tier_evicts_oldest() {
        let mut history: HistoryAggregator<3, 1> =
            HistoryAggregator::new(HistoryConfig::single_tier(ONE_HOUR_MS), 0);

        for hour in 1..=5u64 {
            history.record_sample(hour as i32, hour * ONE_HOUR_MS);
            history.tick(hour * (ONE_HOUR_MS + 1));
        }

        assert_eq!(history.fine().len(), 3);
        assert_eq!(history.peek(Tier::Fine, 0).unwrap().latest, Some(5));
        assert_eq!(history.peek(Tier::Fine, 2).unwrap().latest, Some(3));
        assert!(history.coarse().is_empty());
    }

    #[test]
    fn test_rollup_every_k_closures() {
        let mut history: HistoryAggregator<8, 4> =
            HistoryAggregator::new(HistoryConfig::new(ONE_HOUR_MS, 3), 0);

        let mut now = 0;
        let mut coarse_closures = 0;
        for (i, percent) in [10, 20, 30, 40, 50, 60].into_iter().enumerate() {
            history.record_sample(percent, now + 1);
            history.record_pump_stop(1_000 * (i as u64 + 1), now + 2);
            now += ONE_HOUR_MS + 1;
            if history.tick(now).coarse {
                coarse_closures += 1;
            }
        }

        assert_eq!(coarse_closures, 2);
        assert_eq!(history.coarse().len(), 2);
        assert!(history.pending_rollup().is_none());

        let newest = history.peek(Tier::Coarse, 0).unwrap();
        assert_eq!(newest.sample_count, 3);
        assert_eq!(newest.running_average, 50.0);
        assert_eq!(newest.min_value, 40);
        assert_eq!(newest.max_value, 60);
        assert_eq!(newest.latest, Some(60));
        assert_eq!(newest.pump_starts, 3);
        assert_eq!(newest.pump_run_ms, 4_000 + 5_000 + 6_000);

        let oldest = history.peek(Tier::Coarse, 1).unwrap();
        assert_eq!(oldest.begin_ts, 0);
        assert_eq!(oldest.running_average, 20.0);
    }

    #[test]
    fn test_pending_rollup_between_closures() {
        let mut history: HistoryAggregator<8, 4> =
            HistoryAggregator::new(HistoryConfig::new(ONE_HOUR_MS, 3), 0);

        history.record_sample(30, 1);
        history.tick(ONE_HOUR_MS + 1);
        history.record_sample(50, ONE_HOUR_MS + 2);

        assert_eq!(history.pending_rollup().unwrap().sample_count, 1);

        let current = history.current(Tier::Coarse);
        assert_eq!(current.sample_count, 2);
        assert_eq!(current.running_average, 40.0);
        assert_eq!(current.latest, Some(50));

        assert_eq!(history.current(Tier::Fine).sample_count, 1);
    }

    #[test]
    fn test_render_fine_report() {
        let mut history: HistoryAggregator<4, 1> =
            HistoryAggregator::new(HistoryConfig::single_tier(ONE_HOUR_MS), 0);

        history.record_sample(20, 1);
        history.tick(ONE_HOUR_MS + 1);
        history.record_sample(40, ONE_HOUR_MS + 2);
        history.tick(2 * ONE_HOUR_MS + 3);
        history.record_sample(60, 2 * ONE_HOUR_MS + 4);

        let mut out = String::new();
        history.render_report(Tier::Fine, 8, &mut out).unwrap();
        let lines: std::vec::Vec<&str> = out.lines().collect();

        assert_eq!(lines.len(), 5);
        assert!(lines[2].starts_with("0\t60\t"));
        assert!(lines[3].starts_with("1\t40\t"));
        assert!(lines[4].starts_with("2\t20\t"));
    }

    #[test]
    fn test_render_limits_rows() {
        let mut history: HistoryAggregator<4, 1> =
            HistoryAggregator::new(HistoryConfig::single_tier(ONE_HOUR_MS), 0);
        for hour in 1..=4u64 {
            history.tick(hour * (ONE_HOUR_MS + 1));
        }

        let mut out = String::new();
        history.render_report(Tier::Fine, 2, &mut out).unwrap();
        assert_eq!(out.lines().count(), 2 + 1 + 2);
    }

    #[test]
    fn test_render_disabled_coarse_tier() {
        let history: HistoryAggregator<4, 1> =
            HistoryAggregator::new(HistoryConfig::single_tier(ONE_HOUR_MS), 0);

        let mut out = String::new();
        history.render_report(Tier::Coarse, 8, &mut out).unwrap();
        assert_eq!(out.lines().count(), 2);
    }
}
