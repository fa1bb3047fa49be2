//! Moisture and pump history
//!
//! Time-windowed buckets kept in fixed-capacity ring logs, with an
//! optional coarse tier fed by rollups of the fine tier.

pub mod aggregator;
pub mod bucket;
pub mod report;
pub mod ring;

pub use aggregator::{Closures, HistoryAggregator, Tier};
pub use bucket::Bucket;
pub use ring::RingLog;
