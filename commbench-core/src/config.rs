// SPDX-License-Identifier: Apache-2.0

//! Sweep-plan configuration with strict schema validation.
//!
//! The sweep definition can come from a YAML file or from the built-in
//! defaults, which reproduce the reference batch sweep. Any invalid field
//! is a hard error that prevents startup; nothing is validated lazily
//! per-configuration.

use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

use crate::environment::ExecutionEnvironment;
use crate::error::{SweepError, SweepResult};
use crate::sweep::SweepAxes;

/// Raw configuration as parsed from YAML (before validation).
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawSweepConfig {
    #[serde(default = "default_launcher")]
    launcher: String,
    #[serde(default = "default_comm_strategies")]
    comm_strategies: Vec<String>,
    #[serde(default = "default_matrix_sizes")]
    matrix_sizes: Vec<u64>,
    /// Omitted = resolved from the execution environment.
    #[serde(default)]
    process_counts: Option<Vec<u32>>,
    #[serde(default = "default_thread_counts")]
    thread_counts: Vec<u32>,
    #[serde(default = "default_repetitions")]
    repetitions: u32,
    #[serde(default = "default_timeout_secs")]
    timeout_secs: Option<u64>,
}

fn default_launcher() -> String {
    "mpirun".to_string()
}

fn default_comm_strategies() -> Vec<String> {
    ["collective", "sync", "async_naive", "async"]
        .into_iter()
        .map(str::to_string)
        .collect()
}

fn default_matrix_sizes() -> Vec<u64> {
    vec![128, 256, 512, 1024]
}

fn default_thread_counts() -> Vec<u32> {
    vec![1]
}

fn default_repetitions() -> u32 {
    5
}

fn default_timeout_secs() -> Option<u64> {
    Some(300)
}

impl Default for RawSweepConfig {
    fn default() -> Self {
        Self {
            launcher: default_launcher(),
            comm_strategies: default_comm_strategies(),
            matrix_sizes: default_matrix_sizes(),
            process_counts: None,
            thread_counts: default_thread_counts(),
            repetitions: default_repetitions(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// Validated sweep configuration.
#[derive(Debug, Clone)]
pub struct SweepConfig {
    pub launcher: String,
    pub comm_strategies: Vec<String>,
    pub matrix_sizes: Vec<u64>,
    /// Explicit process-count axis; `None` resolves from the environment.
    pub process_counts: Option<Vec<u32>>,
    pub thread_counts: Vec<u32>,
    pub repetitions: u32,
    pub timeout: Option<Duration>,
}

/// A sweep configuration resolved against a concrete environment:
/// every axis has concrete values and enumeration can begin.
#[derive(Debug, Clone)]
pub struct SweepPlan {
    pub launcher: String,
    pub axes: SweepAxes,
    pub repetitions: u32,
    pub timeout: Option<Duration>,
}

impl Default for SweepConfig {
    /// The built-in sweep: the reference batch constants.
    fn default() -> Self {
        let raw = RawSweepConfig::default();
        Self {
            launcher: raw.launcher,
            comm_strategies: raw.comm_strategies,
            matrix_sizes: raw.matrix_sizes,
            process_counts: raw.process_counts,
            thread_counts: raw.thread_counts,
            repetitions: raw.repetitions,
            timeout: raw.timeout_secs.map(Duration::from_secs),
        }
    }
}

impl SweepConfig {
    /// Load and validate a sweep configuration from a YAML file.
    pub fn load_file(path: impl AsRef<Path>) -> SweepResult<Self> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(SweepError::ConfigNotFound {
                path: path.to_path_buf(),
            });
        }

        let content = std::fs::read_to_string(path).map_err(|e| SweepError::ConfigParse {
            message: format!("cannot read {}: {}", path.display(), e),
        })?;

        Self::load_string(&content)
    }

    /// Load and validate a sweep configuration from a YAML string.
    pub fn load_string(content: &str) -> SweepResult<Self> {
        let raw: RawSweepConfig =
            serde_yaml::from_str(content).map_err(|e| SweepError::ConfigParse {
                message: format!("YAML parse error: {}", e),
            })?;

        validate(raw)
    }

    /// Resolve the configuration against a detected environment, producing
    /// concrete axes. An explicit `process_counts` list bypasses resolution;
    /// otherwise the environment's allocation cap defines the legal ladder.
    pub fn resolve(&self, environment: &ExecutionEnvironment) -> SweepPlan {
        let process_counts = self
            .process_counts
            .clone()
            .unwrap_or_else(|| environment.process_count_axis());

        SweepPlan {
            launcher: self.launcher.clone(),
            axes: SweepAxes {
                comm_strategies: self.comm_strategies.clone(),
                matrix_sizes: self.matrix_sizes.clone(),
                process_counts,
                thread_counts: self.thread_counts.clone(),
            },
            repetitions: self.repetitions,
            timeout: self.timeout,
        }
    }
}

/// Validate raw fields and convert to the validated form.
fn validate(raw: RawSweepConfig) -> SweepResult<SweepConfig> {
    if raw.launcher.trim().is_empty() {
        return Err(SweepError::InvalidField {
            field: "launcher",
            value: raw.launcher,
            reason: "launcher program cannot be empty".to_string(),
        });
    }

    if raw.comm_strategies.is_empty() {
        return Err(SweepError::InvalidField {
            field: "comm_strategies",
            value: "[]".to_string(),
            reason: "at least one communication strategy is required".to_string(),
        });
    }
    for strategy in &raw.comm_strategies {
        if strategy.trim().is_empty() || strategy.contains(char::is_whitespace) {
            return Err(SweepError::InvalidField {
                field: "comm_strategies",
                value: format!("{:?}", strategy),
                reason: "strategy tokens must be non-empty and whitespace-free".to_string(),
            });
        }
    }

    if raw.matrix_sizes.is_empty() {
        return Err(SweepError::InvalidField {
            field: "matrix_sizes",
            value: "[]".to_string(),
            reason: "at least one matrix size is required".to_string(),
        });
    }
    if let Some(&zero) = raw.matrix_sizes.iter().find(|&&n| n == 0) {
        return Err(SweepError::InvalidField {
            field: "matrix_sizes",
            value: zero.to_string(),
            reason: "matrix sizes must be non-zero".to_string(),
        });
    }

    if let Some(counts) = &raw.process_counts {
        if counts.is_empty() || counts.contains(&0) {
            return Err(SweepError::InvalidField {
                field: "process_counts",
                value: format!("{:?}", counts),
                reason: "explicit process counts must be a non-empty list of non-zero values"
                    .to_string(),
            });
        }
    }

    if raw.thread_counts.is_empty() || raw.thread_counts.contains(&0) {
        return Err(SweepError::InvalidField {
            field: "thread_counts",
            value: format!("{:?}", raw.thread_counts),
            reason: "thread counts must be a non-empty list of non-zero values".to_string(),
        });
    }

    if raw.repetitions == 0 {
        return Err(SweepError::InvalidField {
            field: "repetitions",
            value: "0".to_string(),
            reason: "must be at least 1".to_string(),
        });
    }

    if raw.timeout_secs == Some(0) {
        return Err(SweepError::InvalidField {
            field: "timeout_secs",
            value: "0".to_string(),
            reason: "omit the field for an unbounded wait instead of 0".to_string(),
        });
    }

    Ok(SweepConfig {
        launcher: raw.launcher,
        comm_strategies: raw.comm_strategies,
        matrix_sizes: raw.matrix_sizes,
        process_counts: raw.process_counts,
        thread_counts: raw.thread_counts,
        repetitions: raw.repetitions,
        timeout: raw.timeout_secs.map(Duration::from_secs),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::environment::ExecutionEnvironment;

    #[test]
    fn test_defaults_match_reference_sweep() {
        let config = SweepConfig::default();
        assert_eq!(config.launcher, "mpirun");
        assert_eq!(
            config.comm_strategies,
            vec!["collective", "sync", "async_naive", "async"]
        );
        assert_eq!(config.matrix_sizes, vec![128, 256, 512, 1024]);
        assert_eq!(config.repetitions, 5);
        assert_eq!(config.timeout, Some(Duration::from_secs(300)));
        assert!(config.process_counts.is_none());
    }

    #[test]
    fn test_partial_yaml_applies_defaults() {
        let config = SweepConfig::load_string("matrix_sizes: [64]\n").unwrap();
        assert_eq!(config.matrix_sizes, vec![64]);
        assert_eq!(config.repetitions, 5);
        assert_eq!(config.launcher, "mpirun");
    }

    #[test]
    fn test_explicit_process_counts() {
        let yaml = "process_counts: [2, 4, 8]\n";
        let config = SweepConfig::load_string(yaml).unwrap();
        let env = ExecutionEnvironment::from_vars(None, None, Some(2));
        let plan = config.resolve(&env);
        // An explicit axis bypasses environment resolution.
        assert_eq!(plan.axes.process_counts, vec![2, 4, 8]);
    }

    #[test]
    fn test_resolve_from_environment() {
        let config = SweepConfig::default();
        let env = ExecutionEnvironment::from_vars(Some("42"), Some("6"), None);
        let plan = config.resolve(&env);
        assert_eq!(plan.axes.process_counts, vec![2, 4, 6]);
    }

    #[test]
    fn test_zero_repetitions_rejected() {
        let result = SweepConfig::load_string("repetitions: 0\n");
        assert!(matches!(
            result,
            Err(SweepError::InvalidField {
                field: "repetitions",
                ..
            })
        ));
    }

    #[test]
    fn test_empty_strategy_list_rejected() {
        let result = SweepConfig::load_string("comm_strategies: []\n");
        assert!(result.is_err());
    }

    #[test]
    fn test_whitespace_strategy_rejected() {
        let result = SweepConfig::load_string("comm_strategies: [\"a b\"]\n");
        assert!(result.is_err());
    }

    #[test]
    fn test_zero_matrix_size_rejected() {
        let result = SweepConfig::load_string("matrix_sizes: [128, 0]\n");
        assert!(result.is_err());
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let result = SweepConfig::load_string("timeout_secs: 0\n");
        assert!(result.is_err());
    }

    #[test]
    fn test_unknown_field_rejected() {
        let result = SweepConfig::load_string("repetitionz: 3\n");
        assert!(matches!(result, Err(SweepError::ConfigParse { .. })));
    }

    #[test]
    fn test_missing_file() {
        let result = SweepConfig::load_file("/nonexistent/sweep.yaml");
        assert!(matches!(result, Err(SweepError::ConfigNotFound { .. })));
    }
}
