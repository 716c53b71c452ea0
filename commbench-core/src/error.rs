//! Custom error types for commbench.
//!
//! Explicit enum error types throughout - no `Box<dyn Error>`, no
//! `anyhow::Result` in the library. Per-repetition child failures are not
//! errors at all; they are [`crate::runner::ExecutionOutcome`] variants
//! absorbed by the repetition loop. Only invalid startup state and
//! persistence failures terminate a run.

use std::path::PathBuf;

use thiserror::Error;

/// Top-level error type for the sweep orchestrator.
#[derive(Debug, Error)]
pub enum SweepError {
    // =========================================================================
    // Startup Errors - Fail-Fast Before Any Configuration Runs
    // =========================================================================
    #[error("Sweep configuration file not found: {path}")]
    ConfigNotFound { path: PathBuf },

    #[error("Sweep configuration parse error: {message}")]
    ConfigParse { message: String },

    #[error("Invalid sweep configuration: {field} = {value} - {reason}")]
    InvalidField {
        field: &'static str,
        value: String,
        reason: String,
    },

    #[error("Target executable not found: {path}")]
    TargetNotFound { path: PathBuf },

    #[error("Machine list file is required in cluster mode")]
    MachinefileRequired,

    #[error("Machine list file not found: {path}")]
    MachinefileNotFound { path: PathBuf },

    // =========================================================================
    // Persistence Errors - Fatal, Result Integrity Cannot Be Guaranteed
    // =========================================================================
    #[error("Result artifact already exists: {path}")]
    OutputExists { path: PathBuf },

    #[error("Persistence failure: {context} - {source}")]
    Persistence {
        context: &'static str,
        #[source]
        source: std::io::Error,
    },
}

/// Result type alias using SweepError.
pub type SweepResult<T> = Result<T, SweepError>;
