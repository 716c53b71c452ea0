// SPDX-License-Identifier: Apache-2.0

//! Execution environment detection.
//!
//! The sweep behaves differently on a standalone workstation and on a
//! scheduler-managed cluster node: the scheduler fixes the process
//! allocation and labels the run, and cluster invocations need extra
//! transport flags. Detection happens once at startup; everything
//! downstream consumes the closed variant instead of re-reading the
//! process environment.

use std::env;

/// Scheduler job identifier variable. Its presence selects cluster mode.
const JOB_ID_VAR: &str = "SLURM_JOB_ID";

/// Scheduler-provided task allocation for the job.
const NTASKS_VAR: &str = "SLURM_NTASKS";

/// Process-count cap when the local CPU count cannot be detected.
const LOCAL_CPU_FALLBACK: u32 = 4;

/// The detected execution context.
///
/// Consumed by axis resolution (which process counts are legal) and by the
/// command builder (which launcher wrapping to emit).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExecutionEnvironment {
    /// Standalone machine; the cap is the number of available CPUs.
    Local { available_cpus: u32 },
    /// Scheduler-managed node; the cap is the job's task allocation.
    Cluster {
        job_id: String,
        allocated_tasks: u32,
    },
}

impl ExecutionEnvironment {
    /// Detect the environment from the real process environment.
    pub fn detect() -> Self {
        let cpus = std::thread::available_parallelism()
            .map(|n| n.get() as u32)
            .ok();
        Self::from_vars(
            env::var(JOB_ID_VAR).ok().as_deref(),
            env::var(NTASKS_VAR).ok().as_deref(),
            cpus,
        )
    }

    /// Build the environment from explicit values.
    ///
    /// Split out from [`detect`](Self::detect) so the selection logic is
    /// testable without touching process-global state.
    pub fn from_vars(
        job_id: Option<&str>,
        ntasks: Option<&str>,
        available_cpus: Option<u32>,
    ) -> Self {
        match job_id {
            Some(id) if !id.is_empty() => {
                let allocated_tasks = ntasks
                    .and_then(|v| v.trim().parse::<u32>().ok())
                    .filter(|&n| n > 0)
                    .unwrap_or(1);
                ExecutionEnvironment::Cluster {
                    job_id: id.to_string(),
                    allocated_tasks,
                }
            }
            _ => ExecutionEnvironment::Local {
                available_cpus: available_cpus.unwrap_or(LOCAL_CPU_FALLBACK),
            },
        }
    }

    /// Label used in output rows and default artifact names: the scheduler
    /// job id on a cluster, `"local"` otherwise.
    pub fn label(&self) -> &str {
        match self {
            ExecutionEnvironment::Local { .. } => "local",
            ExecutionEnvironment::Cluster { job_id, .. } => job_id,
        }
    }

    /// Upper bound for the process-count axis in this environment.
    pub fn allocation_cap(&self) -> u32 {
        match self {
            ExecutionEnvironment::Local { available_cpus } => *available_cpus,
            ExecutionEnvironment::Cluster {
                allocated_tasks, ..
            } => *allocated_tasks,
        }
    }

    pub fn is_cluster(&self) -> bool {
        matches!(self, ExecutionEnvironment::Cluster { .. })
    }

    /// Legal process-count axis values for this environment: powers of two
    /// up to the allocation cap, with the cap appended when it is not
    /// itself a power of two.
    pub fn process_count_axis(&self) -> Vec<u32> {
        process_count_ladder(self.allocation_cap())
    }
}

impl std::fmt::Display for ExecutionEnvironment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExecutionEnvironment::Local { available_cpus } => {
                write!(f, "local ({} cpus)", available_cpus)
            }
            ExecutionEnvironment::Cluster {
                job_id,
                allocated_tasks,
            } => write!(f, "cluster (job {}, {} tasks)", job_id, allocated_tasks),
        }
    }
}

/// Powers of two `2, 4, 8, ...` not exceeding `cap`, then `cap` itself if
/// it was not already included. A cap of 0 or 1 yields `[1]` / `[cap]`.
pub fn process_count_ladder(cap: u32) -> Vec<u32> {
    let cap = cap.max(1);
    let mut counts: Vec<u32> = (1..32)
        .map(|i| 1u32 << i)
        .take_while(|&p| p <= cap)
        .collect();
    if counts.last() != Some(&cap) {
        counts.push(cap);
    }
    counts
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cluster_detected_from_job_id() {
        let env = ExecutionEnvironment::from_vars(Some("91234"), Some("16"), Some(8));
        assert!(env.is_cluster());
        assert_eq!(env.label(), "91234");
        assert_eq!(env.allocation_cap(), 16);
    }

    #[test]
    fn test_cluster_ntasks_fallback() {
        let env = ExecutionEnvironment::from_vars(Some("7"), None, None);
        assert_eq!(env.allocation_cap(), 1);

        let env = ExecutionEnvironment::from_vars(Some("7"), Some("garbage"), None);
        assert_eq!(env.allocation_cap(), 1);
    }

    #[test]
    fn test_local_uses_cpu_count() {
        let env = ExecutionEnvironment::from_vars(None, Some("16"), Some(12));
        assert!(!env.is_cluster());
        assert_eq!(env.label(), "local");
        assert_eq!(env.allocation_cap(), 12);
    }

    #[test]
    fn test_local_fallback_when_undetectable() {
        let env = ExecutionEnvironment::from_vars(None, None, None);
        assert_eq!(env.allocation_cap(), LOCAL_CPU_FALLBACK);
    }

    #[test]
    fn test_empty_job_id_is_local() {
        let env = ExecutionEnvironment::from_vars(Some(""), None, Some(2));
        assert!(!env.is_cluster());
    }

    #[test]
    fn test_ladder_power_of_two_cap() {
        assert_eq!(process_count_ladder(8), vec![2, 4, 8]);
    }

    #[test]
    fn test_ladder_appends_non_power_cap() {
        assert_eq!(process_count_ladder(6), vec![2, 4, 6]);
        assert_eq!(process_count_ladder(3), vec![2, 3]);
    }

    #[test]
    fn test_ladder_single_task() {
        assert_eq!(process_count_ladder(1), vec![1]);
        assert_eq!(process_count_ladder(0), vec![1]);
    }
}
