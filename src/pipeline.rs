//! Per-file processing shared by the three tools.
//!
//! Every tool does the same thing at the top level: take the discovered
//! files, do one unit of work per file, and hand the outcomes back in input
//! order. What differs is what a failing file means, which is captured by
//! [`ErrorPolicy`].

use std::path::{Path, PathBuf};

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Result, ZddxError};

/// What a failing file does to the run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorPolicy {
    /// Report the file, leave it out of the output, carry on
    SkipAndContinue,
    /// Stop at the first failing file
    AbortRun,
}

impl ErrorPolicy {
    /// Turn a file's error into a reportable failure, or into the error that
    /// ends the run.
    pub fn settle(self, path: &Path, error: ZddxError) -> Result<FileFailure> {
        match self {
            ErrorPolicy::SkipAndContinue => {
                debug!("Skipping {}: {}", path.display(), error);
                Ok(FileFailure {
                    path: path.to_path_buf(),
                    error,
                })
            }
            ErrorPolicy::AbortRun => Err(error),
        }
    }
}

/// A file left out of the run's output
#[derive(Debug)]
pub struct FileFailure {
    pub path: PathBuf,
    pub error: ZddxError,
}

/// Result of one unit of work
#[derive(Debug)]
pub struct FileOutcome<T> {
    pub path: PathBuf,
    pub result: Result<T>,
}

/// Runs one unit of work per file, sequentially or on a rayon pool
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileProcessor {
    jobs: usize,
}

impl FileProcessor {
    /// `jobs == 0` uses one worker per CPU; `1` processes files in turn.
    pub fn new(jobs: usize) -> Self {
        let jobs = if jobs == 0 { num_cpus::get() } else { jobs };
        Self { jobs }
    }

    pub fn sequential() -> Self {
        Self { jobs: 1 }
    }

    pub fn jobs(&self) -> usize {
        self.jobs
    }

    /// Apply `work` to every file and return the outcomes in input order.
    ///
    /// Under [`ErrorPolicy::AbortRun`] the outcomes end with the first
    /// failure; later files are not processed (sequential) or their results
    /// are discarded (parallel).
    pub fn process<T, F>(
        &self,
        files: &[PathBuf],
        policy: ErrorPolicy,
        work: F,
    ) -> Result<Vec<FileOutcome<T>>>
    where
        T: Send,
        F: Fn(&Path) -> Result<T> + Sync,
    {
        if self.jobs <= 1 || files.len() <= 1 {
            return Ok(Self::process_sequential(files, policy, work));
        }

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.jobs)
            .build()
            .map_err(|e| ZddxError::Config(format!("Failed to start worker pool: {}", e)))?;

        let mut outcomes: Vec<FileOutcome<T>> = pool.install(|| {
            files
                .par_iter()
                .map(|path| FileOutcome {
                    path: path.clone(),
                    result: work(path),
                })
                .collect()
        });

        if policy == ErrorPolicy::AbortRun
            && let Some(first_failure) = outcomes.iter().position(|o| o.result.is_err())
        {
            outcomes.truncate(first_failure + 1);
        }

        Ok(outcomes)
    }

    fn process_sequential<T, F>(
        files: &[PathBuf],
        policy: ErrorPolicy,
        work: F,
    ) -> Vec<FileOutcome<T>>
    where
        F: Fn(&Path) -> Result<T>,
    {
        let mut outcomes = Vec::with_capacity(files.len());
        for path in files {
            let result = work(path);
            let failed = result.is_err();
            outcomes.push(FileOutcome {
                path: path.clone(),
                result,
            });
            if failed && policy == ErrorPolicy::AbortRun {
                break;
            }
        }
        outcomes
    }
}

impl Default for FileProcessor {
    fn default() -> Self {
        Self::sequential()
    }
}
