// SPDX-License-Identifier: Apache-2.0

//! Metric extraction from captured child output.
//!
//! The target prints one comma-separated line of exactly six fields whose
//! last three are the timing metrics (total, communication, computation).
//! Anything else - headers, launcher chatter, diagnostic text, malformed
//! lines - is skipped without error. A miss is a reduced sample count for
//! the configuration, never a failure.

/// Field count of the metric line.
const METRIC_FIELD_COUNT: usize = 6;

/// Timing values parsed from one successful repetition.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MetricSample {
    /// Total wall time, seconds.
    pub total: f64,
    /// Time spent in communication, seconds.
    pub comm: f64,
    /// Time spent in computation, seconds.
    pub comp: f64,
}

/// Scan captured stdout for the first metric line.
pub fn extract_sample(stdout: &str) -> Option<MetricSample> {
    stdout.lines().find_map(parse_line)
}

fn parse_line(line: &str) -> Option<MetricSample> {
    let fields: Vec<&str> = line.trim().split(',').collect();
    if fields.len() != METRIC_FIELD_COUNT {
        return None;
    }

    let total = fields[3].trim().parse::<f64>().ok()?;
    let comm = fields[4].trim().parse::<f64>().ok()?;
    let comp = fields[5].trim().parse::<f64>().ok()?;

    Some(MetricSample { total, comm, comp })
}
