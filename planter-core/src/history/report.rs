//! Text rendering of history tables
//!
//! Tab-separated rows, one per bucket:
//!
//! ```text
//! Age     Last    Avg     Min     Max     Runs    Run_s
//! -----   -----   -----   -----   -----   -----   -----
//! 0       41      43      39      47      2       3
//! 1       48      52      45      60      0       0
//! ```
//!
//! Fields without samples render as `-`.

use core::fmt::{self, Write};

use super::bucket::Bucket;

/// Column headings
const HEADER: &str = "Age\tLast\tAvg\tMin\tMax\tRuns\tRun_s\n";

/// Heading underline
const RULE: &str = "-----\t-----\t-----\t-----\t-----\t-----\t-----\n";

/// Optional value that renders as `-` when absent
struct Field(Option<i32>);

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Some(value) => write!(f, "{}", value),
            None => f.write_str("-"),
        }
    }
}

/// Write the table heading
pub fn write_header<W: Write>(out: &mut W) -> fmt::Result {
    out.write_str(HEADER)?;
    out.write_str(RULE)
}

/// Write one bucket as a table row
pub fn write_row<W: Write>(out: &mut W, age: usize, bucket: &Bucket) -> fmt::Result {
    let average = (!bucket.is_empty()).then_some(bucket.running_average as i32);

    writeln!(
        out,
        "{}\t{}\t{}\t{}\t{}\t{}\t{}",
        age,
        Field(bucket.latest),
        Field(average),
        Field(bucket.min()),
        Field(bucket.max()),
        bucket.pump_starts,
        bucket.pump_run_ms / 1000,
    )
}
