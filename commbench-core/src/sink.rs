// SPDX-License-Identifier: Apache-2.0

//! Durable CSV result sink.
//!
//! One header row, then one row per configuration that produced at least
//! one valid sample. Every row is flushed to stable storage immediately,
//! so a crash mid-sweep loses at most the in-flight configuration. Any
//! write or flush failure is fatal to the run: once the artifact can no
//! longer be trusted there is nothing worth continuing for.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::error::{SweepError, SweepResult};
use crate::stats::AggregateRow;

/// Fixed schema header.
const HEADER: &str = "comm_strategy,matrix_size,num_procs,num_threads,environment,\
                      total_time_mean,total_time_std,comm_time_mean,comm_time_std,\
                      comp_time_mean,comp_time_std,samples,repetitions";

/// What to do when the output path already exists.
///
/// The reference behavior truncated silently; here the choice is explicit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExistingFilePolicy {
    /// Truncate any prior content (the reference behavior).
    Overwrite,
    /// Refuse to run.
    Fail,
    /// Write to the first unused `name.N.ext` sibling instead.
    Version,
}

/// Append-only CSV writer over the result artifact.
pub struct CsvSink {
    writer: BufWriter<File>,
    path: PathBuf,
    rows_written: usize,
}

impl CsvSink {
    /// Open the artifact according to `policy` and write the header row.
    pub fn create(path: impl AsRef<Path>, policy: ExistingFilePolicy) -> SweepResult<Self> {
        let requested = path.as_ref().to_path_buf();

        let path = match policy {
            ExistingFilePolicy::Overwrite => requested,
            ExistingFilePolicy::Fail => {
                if requested.exists() {
                    return Err(SweepError::OutputExists { path: requested });
                }
                requested
            }
            ExistingFilePolicy::Version => versioned_sibling(&requested),
        };

        let file = File::create(&path).map_err(|e| SweepError::Persistence {
            context: "creating result artifact",
            source: e,
        })?;

        let mut sink = Self {
            writer: BufWriter::new(file),
            path,
            rows_written: 0,
        };
        sink.write_line(HEADER)?;
        Ok(sink)
    }

    /// Append one aggregate row and flush it to stable storage.
    pub fn write_row(&mut self, row: &AggregateRow) -> SweepResult<()> {
        let config = &row.configuration;
        let line = format!(
            "{},{},{},{},{},{:.6},{:.6},{:.6},{:.6},{:.6},{:.6},{},{}",
            config.comm_strategy,
            config.matrix_size,
            config.num_procs,
            config.num_threads,
            row.environment,
            row.total_time.mean,
            row.total_time.std_dev,
            row.comm_time.mean,
            row.comm_time.std_dev,
            row.comp_time.mean,
            row.comp_time.std_dev,
            row.samples,
            row.repetitions,
        );
        self.write_line(&line)?;
        self.rows_written += 1;
        Ok(())
    }

    /// Path actually written to (differs from the requested path under the
    /// versioning policy).
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn rows_written(&self) -> usize {
        self.rows_written
    }

    fn write_line(&mut self, line: &str) -> SweepResult<()> {
        writeln!(self.writer, "{}", line).map_err(|e| SweepError::Persistence {
            context: "writing result row",
            source: e,
        })?;
        self.writer.flush().map_err(|e| SweepError::Persistence {
            context: "flushing result artifact",
            source: e,
        })?;
        self.writer
            .get_ref()
            .sync_data()
            .map_err(|e| SweepError::Persistence {
                context: "syncing result artifact",
                source: e,
            })
    }
}

/// First unused `name.N.ext` next to `path`, starting at N=1.
fn versioned_sibling(path: &Path) -> PathBuf {
    if !path.exists() {
        return path.to_path_buf();
    }

    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let extension = path.extension().map(|e| e.to_string_lossy().into_owned());

    for n in 1.. {
        let name = match &extension {
            Some(ext) => format!("{}.{}.{}", stem, n, ext),
            None => format!("{}.{}", stem, n),
        };
        let candidate = path.with_file_name(name);
        if !candidate.exists() {
            return candidate;
        }
    }
    unreachable!("exhausted version numbers")
}
