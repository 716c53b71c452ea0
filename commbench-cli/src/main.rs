// SPDX-License-Identifier: Apache-2.0

//! Commbench CLI
//!
//! Drives a benchmark sweep over an externally built compute executable:
//! enumerate configurations, run each one N times under the configured
//! launcher, aggregate the timing metrics, and append one CSV row per
//! configuration.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::error::ErrorKind;
use clap::{Parser, ValueEnum};
use sysinfo::System;

use commbench_core::{
    run_sweep, CommandBuilder, CsvSink, ExecutionEnvironment, ExistingFilePolicy, SweepConfig,
    SweepError, SweepResult,
};

/// Commbench - benchmark sweep orchestrator for MPI-launched kernels
#[derive(Parser)]
#[command(name = "commbench")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Executable under test
    target: PathBuf,

    /// Machine/host list file (required on a scheduler-managed cluster,
    /// rejected elsewhere)
    machinefile: Option<PathBuf>,

    /// Sweep definition file (YAML); built-in defaults when omitted
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Result artifact path (default: results_<environment>.csv)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// What to do when the result artifact already exists
    #[arg(long, value_enum, default_value_t = OnExisting::Overwrite)]
    on_existing: OnExisting,

    /// Override the configured repetition count
    #[arg(short, long)]
    repetitions: Option<u32>,

    /// Override the configured per-repetition time bound
    #[arg(long)]
    timeout_secs: Option<u64>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OnExisting {
    /// Truncate any prior content (reference behavior)
    Overwrite,
    /// Refuse to run if the artifact exists
    Fail,
    /// Write to the first unused versioned sibling
    Version,
}

impl std::fmt::Display for OnExisting {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let token = match self {
            OnExisting::Overwrite => "overwrite",
            OnExisting::Fail => "fail",
            OnExisting::Version => "version",
        };
        write!(f, "{}", token)
    }
}

impl From<OnExisting> for ExistingFilePolicy {
    fn from(policy: OnExisting) -> Self {
        match policy {
            OnExisting::Overwrite => ExistingFilePolicy::Overwrite,
            OnExisting::Fail => ExistingFilePolicy::Fail,
            OnExisting::Version => ExistingFilePolicy::Version,
        }
    }
}

fn main() -> ExitCode {
    // Argument-count and parse errors exit 1 with usage, not clap's
    // default exit code; --help and --version keep their usual behavior.
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) if matches!(e.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => {
            let _ = e.print();
            return ExitCode::SUCCESS;
        }
        Err(e) => {
            let _ = e.print();
            return ExitCode::FAILURE;
        }
    };

    let log_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt().with_env_filter(log_level).init();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "Sweep aborted");
            eprintln!("Usage: commbench <target> [machinefile] [options]");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> SweepResult<()> {
    let environment = ExecutionEnvironment::detect();

    // Positional-argument shape must match the environment.
    if !environment.is_cluster() {
        if let Some(machinefile) = &cli.machinefile {
            return Err(SweepError::InvalidField {
                field: "machinefile",
                value: machinefile.display().to_string(),
                reason: "a machine list is only meaningful in cluster mode".to_string(),
            });
        }
    }

    if !cli.target.is_file() {
        return Err(SweepError::TargetNotFound {
            path: cli.target.clone(),
        });
    }

    let mut config = match &cli.config {
        Some(path) => SweepConfig::load_file(path)?,
        None => SweepConfig::default(),
    };
    if let Some(repetitions) = cli.repetitions {
        if repetitions == 0 {
            return Err(SweepError::InvalidField {
                field: "repetitions",
                value: "0".to_string(),
                reason: "must be at least 1".to_string(),
            });
        }
        config.repetitions = repetitions;
    }
    if let Some(secs) = cli.timeout_secs {
        if secs == 0 {
            return Err(SweepError::InvalidField {
                field: "timeout_secs",
                value: "0".to_string(),
                reason: "must be at least 1".to_string(),
            });
        }
        config.timeout = Some(std::time::Duration::from_secs(secs));
    }

    let plan = config.resolve(&environment);
    let builder = CommandBuilder::new(
        &plan.launcher,
        &cli.target,
        &environment,
        cli.machinefile.clone(),
    )?;

    let output = cli
        .output
        .clone()
        .unwrap_or_else(|| PathBuf::from(format!("results_{}.csv", environment.label())));
    let mut sink = CsvSink::create(&output, cli.on_existing.into())?;

    log_banner(&environment, &plan, &cli.target, sink.path());

    let summary = run_sweep(&plan, &builder, &mut sink, environment.label())?;

    tracing::info!(
        configurations = summary.configurations,
        rows_written = summary.rows_written,
        empty_configurations = summary.empty_configurations,
        failed_repetitions = summary.failed_repetitions,
        artifact = %sink.path().display(),
        "Sweep complete"
    );

    // Partial per-configuration failures are non-fatal by design.
    Ok(())
}

/// One-time startup banner: environment, host, and the resolved sweep.
fn log_banner(
    environment: &ExecutionEnvironment,
    plan: &commbench_core::SweepPlan,
    target: &std::path::Path,
    artifact: &std::path::Path,
) {
    let mut sys = System::new_all();
    sys.refresh_all();

    tracing::info!(
        started = %chrono::Utc::now().to_rfc3339(),
        environment = %environment,
        host = %System::host_name().unwrap_or_else(|| "unknown".to_string()),
        cpu = %sys
            .cpus()
            .first()
            .map(|cpu| cpu.brand().to_string())
            .unwrap_or_else(|| "unknown".to_string()),
        cpu_cores = sys.cpus().len(),
        memory_bytes = sys.total_memory(),
        "Starting benchmark sweep"
    );

    tracing::info!(
        target = %target.display(),
        launcher = %plan.launcher,
        repetitions = plan.repetitions,
        timeout_secs = plan.timeout.map(|t| t.as_secs()),
        cross_product = plan.axes.cross_product_size(),
        artifact = %artifact.display(),
        "Sweep plan resolved"
    );
    for (axis, values) in plan.axes.describe() {
        tracing::info!(axis, values = %values, "Axis");
    }
}
