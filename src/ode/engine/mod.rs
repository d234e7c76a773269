//! The boundary to the external symbolic engine.
//!
//! An engine receives an [`AnalysisJob`] and, on success, leaves its artifacts
//! in the job's output directory. Engines never interpret the artifacts.

use std::fmt;
use std::time::Duration;

use super::job::AnalysisJob;

pub mod canned;
pub use canned::{CannedEngine, ReplayEngine};

pub mod subprocess;
pub use subprocess::SubprocessEngine;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobOutcome {
    Succeeded { output: String },
    Failed { diagnostic: String },
    TimedOut { after: Duration, output: String },
}

impl JobOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, JobOutcome::Succeeded { .. })
    }
}

impl fmt::Display for JobOutcome {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            JobOutcome::Succeeded { .. } => write!(f, "succeeded"),
            JobOutcome::Failed { diagnostic } => write!(f, "failed: {diagnostic}"),
            JobOutcome::TimedOut { after, .. } => write!(f, "timed out after {after:?}"),
        }
    }
}

pub trait SymbolicEngine {
    fn name(&self) -> &str;

    /// Runs `job` to completion. Called at most once per job, with no retry.
    fn execute(&self, job: &AnalysisJob) -> JobOutcome;
}
