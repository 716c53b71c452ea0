// SPDX-License-Identifier: Apache-2.0

//! The sweep driver.
//!
//! A single control thread walks the configuration space; nothing runs
//! concurrently with the child being measured. Per-repetition failures
//! are absorbed here: non-zero exits, timeouts, and unparseable output
//! cost one sample and the loop continues, while a spawn failure abandons
//! the configuration's remaining repetitions - if the launcher cannot
//! start, repeating the attempt measures nothing. Only persistence
//! failures propagate.

use crate::command::CommandBuilder;
use crate::config::SweepPlan;
use crate::parse::extract_sample;
use crate::runner::{ExecutionOutcome, ProcessRunner};
use crate::sink::CsvSink;
use crate::stats::{summarize, AggregateRow};
use crate::sweep::configurations;

/// Counters reported after a completed sweep.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SweepSummary {
    /// Valid configurations attempted.
    pub configurations: usize,
    /// Rows persisted (configurations with at least one sample).
    pub rows_written: usize,
    /// Configurations that produced no usable sample at all.
    pub empty_configurations: usize,
    /// Individual repetitions that failed or were malformed.
    pub failed_repetitions: usize,
}

/// Run the full sweep described by `plan`, appending rows to `sink`.
///
/// Returns the summary on completion; partial per-configuration failures
/// are not errors. Only a persistence failure aborts the run.
pub fn run_sweep(
    plan: &SweepPlan,
    builder: &CommandBuilder,
    sink: &mut CsvSink,
    environment_label: &str,
) -> crate::error::SweepResult<SweepSummary> {
    let runner = ProcessRunner::new(plan.timeout);
    let mut summary = SweepSummary::default();

    for config in configurations(&plan.axes) {
        summary.configurations += 1;
        let invocation = builder.build(&config);
        tracing::info!(config = %config, command = %invocation, "Benchmarking configuration");

        let mut totals = Vec::with_capacity(plan.repetitions as usize);
        let mut comms = Vec::with_capacity(plan.repetitions as usize);
        let mut comps = Vec::with_capacity(plan.repetitions as usize);

        for repetition in 0..plan.repetitions {
            match runner.run(&invocation) {
                ExecutionOutcome::Success { stdout } => match extract_sample(&stdout) {
                    Some(sample) => {
                        totals.push(sample.total);
                        comms.push(sample.comm);
                        comps.push(sample.comp);
                    }
                    None => {
                        summary.failed_repetitions += 1;
                        tracing::debug!(
                            config = %config,
                            repetition,
                            "No metric line in child output"
                        );
                    }
                },
                ExecutionOutcome::NonZeroExit { stderr } => {
                    summary.failed_repetitions += 1;
                    tracing::warn!(
                        config = %config,
                        repetition,
                        stderr = stderr.trim(),
                        "Child reported failure"
                    );
                }
                ExecutionOutcome::Timeout => {
                    summary.failed_repetitions += 1;
                    tracing::warn!(config = %config, repetition, "Repetition timed out");
                }
                ExecutionOutcome::SpawnFailure { reason } => {
                    // Abandon the remaining repetitions of this
                    // configuration; the launcher itself is broken here.
                    let abandoned = plan.repetitions - repetition;
                    summary.failed_repetitions += abandoned as usize;
                    tracing::warn!(
                        config = %config,
                        repetition,
                        reason = %reason,
                        abandoned,
                        "Failed to launch child; abandoning configuration"
                    );
                    break;
                }
            }
        }

        if totals.is_empty() {
            summary.empty_configurations += 1;
            tracing::warn!(config = %config, "Configuration produced no data; skipping row");
            continue;
        }

        let row = AggregateRow {
            environment: environment_label.to_string(),
            total_time: summarize(&totals),
            comm_time: summarize(&comms),
            comp_time: summarize(&comps),
            samples: totals.len(),
            repetitions: plan.repetitions,
            configuration: config,
        };
        sink.write_row(&row)?;
        summary.rows_written += 1;
        tracing::info!(
            total_mean_secs = row.total_time.mean,
            samples = row.samples,
            "Row written"
        );
    }

    Ok(summary)
}
