//! Commbench Core Library
//!
//! Sweep-execute-aggregate pipeline for benchmarking externally built
//! compute executables: configuration enumeration with validity filtering,
//! environment-aware invocation construction, resilient process execution,
//! tolerant metric parsing, mean/stddev aggregation, and an incrementally
//! flushed CSV result sink.

pub mod command;
pub mod config;
pub mod environment;
pub mod error;
pub mod orchestrator;
pub mod parse;
pub mod runner;
pub mod sink;
pub mod stats;
pub mod sweep;

// Re-export commonly used types
pub use command::{CommandBuilder, Invocation};
pub use config::{SweepConfig, SweepPlan};
pub use environment::ExecutionEnvironment;
pub use error::{SweepError, SweepResult};
pub use orchestrator::{run_sweep, SweepSummary};
pub use runner::{ExecutionOutcome, ProcessRunner};
pub use sink::{CsvSink, ExistingFilePolicy};
pub use stats::{AggregateRow, MetricSummary};
pub use sweep::{configurations, Configuration, SweepAxes};
