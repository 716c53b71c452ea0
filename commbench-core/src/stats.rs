// SPDX-License-Identifier: Apache-2.0

//! Statistical aggregation across repetitions.

use crate::sweep::Configuration;

/// Mean and sample standard deviation for one metric.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MetricSummary {
    pub mean: f64,
    pub std_dev: f64,
}

/// Summarize one metric's samples.
///
/// Mean is the arithmetic average, 0 for an empty slice. Standard
/// deviation is the unbiased sample estimator (divisor n-1), defined as
/// exactly 0 for fewer than two samples.
pub fn summarize(samples: &[f64]) -> MetricSummary {
    if samples.is_empty() {
        return MetricSummary {
            mean: 0.0,
            std_dev: 0.0,
        };
    }

    let n = samples.len() as f64;
    let mean = samples.iter().sum::<f64>() / n;

    let std_dev = if samples.len() < 2 {
        0.0
    } else {
        let variance = samples
            .iter()
            .map(|&x| {
                let diff = x - mean;
                diff * diff
            })
            .sum::<f64>()
            / (n - 1.0);
        variance.sqrt()
    };

    MetricSummary { mean, std_dev }
}

/// The persisted statistical summary for one configuration.
///
/// Emitted only when at least one repetition produced a parseable sample;
/// `samples` may fall short of `repetitions` when some repetitions failed.
#[derive(Debug, Clone)]
pub struct AggregateRow {
    pub configuration: Configuration,
    pub environment: String,
    pub total_time: MetricSummary,
    pub comm_time: MetricSummary,
    pub comp_time: MetricSummary,
    /// Repetitions that yielded a parseable sample.
    pub samples: usize,
    /// The declared repetition target.
    pub repetitions: u32,
}
