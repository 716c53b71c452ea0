// SPDX-License-Identifier: Apache-2.0

//! Child-process execution.
//!
//! Spawns one invocation at a time, captures both output streams in full,
//! and classifies the result. A bounded wait is enforced by polling the
//! child against a deadline and killing it when the deadline passes. The
//! runner never retries; the repetition loop owns continuation policy.

use std::io::Read;
use std::process::{Child, Command, Stdio};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crate::command::Invocation;

/// Interval between child exit polls while a time bound is active.
const WAIT_POLL_INTERVAL: Duration = Duration::from_millis(25);

/// Classified result of one repetition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExecutionOutcome {
    /// Child exited zero; carries the full captured stdout.
    Success { stdout: String },
    /// Child exited non-zero; carries the full captured stderr.
    NonZeroExit { stderr: String },
    /// Child exceeded the time bound and was killed.
    Timeout,
    /// The process could not be started at all.
    SpawnFailure { reason: String },
}

impl ExecutionOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, ExecutionOutcome::Success { .. })
    }
}

/// Executes invocations with an optional bounded wait.
pub struct ProcessRunner {
    timeout: Option<Duration>,
}

impl ProcessRunner {
    pub fn new(timeout: Option<Duration>) -> Self {
        Self { timeout }
    }

    /// Run one invocation to completion and classify the outcome.
    ///
    /// The child receives an explicit, freshly constructed environment
    /// overlay for each spawn; process-global state is never touched.
    pub fn run(&self, invocation: &Invocation) -> ExecutionOutcome {
        let mut command = Command::new(&invocation.program);
        command
            .args(&invocation.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        for (key, value) in &invocation.env {
            command.env(key, value);
        }

        let mut child = match command.spawn() {
            Ok(child) => child,
            Err(e) => {
                return ExecutionOutcome::SpawnFailure {
                    reason: format!("{}: {}", invocation.program, e),
                };
            }
        };

        // Drain both pipes off-thread so a chatty child cannot deadlock
        // against a full pipe buffer while we wait for it to exit.
        let stdout_reader = drain(child.stdout.take());
        let stderr_reader = drain(child.stderr.take());

        let status = match self.wait(&mut child) {
            Some(status) => status,
            None => {
                // Deadline passed: kill and reap, then report the timeout.
                let _ = child.kill();
                let _ = child.wait();
                tracing::warn!(
                    program = %invocation.program,
                    timeout_secs = self.timeout.map(|t| t.as_secs()),
                    "Child exceeded time bound and was killed"
                );
                return ExecutionOutcome::Timeout;
            }
        };

        let stdout = join_drained(stdout_reader);
        let stderr = join_drained(stderr_reader);

        if status.success() {
            ExecutionOutcome::Success { stdout }
        } else {
            ExecutionOutcome::NonZeroExit { stderr }
        }
    }

    /// Wait for the child, bounded by the configured timeout.
    /// Returns `None` when the deadline passes first.
    fn wait(&self, child: &mut Child) -> Option<std::process::ExitStatus> {
        let Some(timeout) = self.timeout else {
            return child.wait().ok();
        };

        let deadline = Instant::now() + timeout;
        loop {
            match child.try_wait() {
                Ok(Some(status)) => return Some(status),
                Ok(None) => {
                    if Instant::now() >= deadline {
                        return None;
                    }
                    thread::sleep(WAIT_POLL_INTERVAL);
                }
                Err(_) => return None,
            }
        }
    }
}

/// Read a pipe to EOF on a collector thread.
fn drain<R: Read + Send + 'static>(pipe: Option<R>) -> Option<JoinHandle<String>> {
    pipe.map(|mut reader| {
        thread::spawn(move || {
            let mut buf = String::new();
            let _ = reader.read_to_string(&mut buf);
            buf
        })
    })
}

fn join_drained(handle: Option<JoinHandle<String>>) -> String {
    handle
        .and_then(|h| h.join().ok())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn invocation(args: &[&str]) -> Invocation {
        Invocation {
            program: "/bin/sh".to_string(),
            args: args.iter().map(|s| s.to_string()).collect(),
            env: Vec::new(),
        }
    }

    #[test]
    fn test_success_captures_stdout() {
        let runner = ProcessRunner::new(None);
        let outcome = runner.run(&invocation(&["-c", "echo hello"]));
        match outcome {
            ExecutionOutcome::Success { stdout } => assert_eq!(stdout.trim(), "hello"),
            other => panic!("expected success, got {:?}", other),
        }
    }

    #[test]
    fn test_nonzero_exit_captures_stderr() {
        let runner = ProcessRunner::new(None);
        let outcome = runner.run(&invocation(&["-c", "echo boom >&2; exit 3"]));
        match outcome {
            ExecutionOutcome::NonZeroExit { stderr } => assert_eq!(stderr.trim(), "boom"),
            other => panic!("expected non-zero exit, got {:?}", other),
        }
    }

    #[test]
    fn test_timeout_kills_child() {
        let runner = ProcessRunner::new(Some(Duration::from_millis(200)));
        let start = Instant::now();
        let outcome = runner.run(&invocation(&["-c", "sleep 30"]));
        assert_eq!(outcome, ExecutionOutcome::Timeout);
        // The child must be dead well before its natural runtime.
        assert!(start.elapsed() < Duration::from_secs(5));
    }

    #[test]
    fn test_spawn_failure() {
        let runner = ProcessRunner::new(None);
        let outcome = runner.run(&Invocation {
            program: "/nonexistent/binary".to_string(),
            args: Vec::new(),
            env: Vec::new(),
        });
        assert!(matches!(outcome, ExecutionOutcome::SpawnFailure { .. }));
    }

    #[test]
    fn test_env_override_reaches_child() {
        let runner = ProcessRunner::new(None);
        let outcome = runner.run(&Invocation {
            program: "/bin/sh".to_string(),
            args: vec!["-c".to_string(), "printf '%s' \"$OMP_NUM_THREADS\"".to_string()],
            env: vec![("OMP_NUM_THREADS".to_string(), "7".to_string())],
        });
        match outcome {
            ExecutionOutcome::Success { stdout } => assert_eq!(stdout, "7"),
            other => panic!("expected success, got {:?}", other),
        }
    }
}
