// SPDX-License-Identifier: Apache-2.0

//! Invocation construction.
//!
//! Turns a [`Configuration`] and the detected [`ExecutionEnvironment`]
//! into a concrete child-process invocation: launcher, ordered argument
//! list, and per-spawn environment overrides. Malformed environment state
//! (a missing machine list on a cluster) is rejected once, when the
//! builder is constructed - building an invocation itself never fails.

use std::path::{Path, PathBuf};

use crate::environment::ExecutionEnvironment;
use crate::error::{SweepError, SweepResult};
use crate::sweep::Configuration;

/// Environment variable consumed by the target's parallel runtime.
const THREAD_COUNT_VAR: &str = "OMP_NUM_THREADS";

/// Transport-exclusion flags for the cluster's network fabric. Constants
/// of the environment, never derived from a configuration.
const CLUSTER_TRANSPORT_FLAGS: &[&str] = &[
    "--mca",
    "btl",
    "^openib",
    "--mca",
    "btl_tcp_if_include",
    "eno2",
];

/// Binding policy on cluster nodes.
const CLUSTER_BIND_FLAGS: &[&str] = &["--bind-to", "none"];

/// A fully explicit description of one child spawn.
///
/// The environment overrides are merged into the child's context at spawn
/// time; process-global state is never mutated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub program: String,
    pub args: Vec<String>,
    pub env: Vec<(String, String)>,
}

impl std::fmt::Display for Invocation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.program, self.args.join(" "))
    }
}

/// Builds invocations for one target executable in one environment.
pub struct CommandBuilder {
    launcher: String,
    target: PathBuf,
    machinefile: Option<PathBuf>,
    cluster: bool,
}

impl CommandBuilder {
    /// Create a builder, validating environment state up front.
    ///
    /// # Errors
    /// `MachinefileRequired` when the environment is a cluster and no
    /// machine list was supplied; `MachinefileNotFound` when the supplied
    /// list does not exist.
    pub fn new(
        launcher: impl Into<String>,
        target: impl AsRef<Path>,
        environment: &ExecutionEnvironment,
        machinefile: Option<PathBuf>,
    ) -> SweepResult<Self> {
        let cluster = environment.is_cluster();

        if cluster {
            match &machinefile {
                None => return Err(SweepError::MachinefileRequired),
                Some(path) if !path.exists() => {
                    return Err(SweepError::MachinefileNotFound { path: path.clone() });
                }
                Some(_) => {}
            }
        }

        Ok(Self {
            launcher: launcher.into(),
            target: target.as_ref().to_path_buf(),
            machinefile,
            cluster,
        })
    }

    /// Build the invocation for one configuration. Never fails.
    pub fn build(&self, config: &Configuration) -> Invocation {
        let mut args = vec!["-np".to_string(), config.num_procs.to_string()];

        if self.cluster {
            if let Some(machinefile) = &self.machinefile {
                args.push("-machinefile".to_string());
                args.push(machinefile.display().to_string());
            }
            args.extend(CLUSTER_TRANSPORT_FLAGS.iter().map(|s| s.to_string()));
            args.extend(CLUSTER_BIND_FLAGS.iter().map(|s| s.to_string()));
        }

        args.push(self.target.display().to_string());
        args.push(config.matrix_size.to_string());
        args.push(config.comm_strategy.clone());

        Invocation {
            program: self.launcher.clone(),
            args,
            env: vec![(THREAD_COUNT_VAR.to_string(), config.num_threads.to_string())],
        }
    }
}
