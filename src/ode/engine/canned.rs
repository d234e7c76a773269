use std::cell::{Cell, RefCell};
use std::fs;
use std::path::{Path, PathBuf};

use super::{JobOutcome, SymbolicEngine};
use crate::ode::artifacts::Artifact;
use crate::ode::job::AnalysisJob;

/// Engine that writes fixed artifact contents instead of running anything.
#[derive(Debug, Default)]
pub struct CannedEngine {
    artifacts: Vec<(Artifact, String)>,
    failure: Option<String>,
    calls: Cell<usize>,
    scripts: RefCell<Vec<String>>,
}

impl CannedEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// An engine that finds no closed form.
    pub fn numeric() -> Self {
        Self::new().with_artifact(Artifact::SolverType, "numeric\n")
    }

    /// An engine that reports an exact solution. Each slice holds the lines of
    /// one artifact.
    pub fn exact(propagator: &[&str], initial_values: &[&str], state: &[&str], updates: &[&str]) -> Self {
        fn lines(items: &[&str]) -> String {
            items.iter().map(|item| format!("{item}\n")).collect()
        }
        Self::new()
            .with_artifact(Artifact::SolverType, "exact\n")
            .with_artifact(Artifact::Propagator, lines(propagator))
            .with_artifact(Artifact::InitialValues, lines(initial_values))
            .with_artifact(Artifact::StateVector, lines(state))
            .with_artifact(Artifact::UpdateStep, lines(updates))
    }

    /// Replaces any previous content for `artifact`.
    pub fn with_artifact(mut self, artifact: Artifact, content: impl Into<String>) -> Self {
        self.artifacts.retain(|(a, _)| *a != artifact);
        self.artifacts.push((artifact, content.into()));
        self
    }

    /// Artifacts are still written, but the run reports failure.
    pub fn failing(mut self, diagnostic: impl Into<String>) -> Self {
        self.failure = Some(diagnostic.into());
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.get()
    }

    /// Scripts of every job this engine has been given.
    pub fn scripts(&self) -> Vec<String> {
        self.scripts.borrow().clone()
    }
}

impl SymbolicEngine for CannedEngine {
    fn name(&self) -> &str {
        "canned"
    }

    fn execute(&self, job: &AnalysisJob) -> JobOutcome {
        self.calls.set(self.calls.get() + 1);
        self.scripts.borrow_mut().push(job.script.clone());
        for (artifact, content) in self.artifacts.iter() {
            if let Err(err) = fs::write(artifact.path(job.output_dir()), content) {
                return JobOutcome::Failed {
                    diagnostic: format!("could not write {artifact}: {err}"),
                };
            }
        }
        match &self.failure {
            Some(diagnostic) => JobOutcome::Failed {
                diagnostic: diagnostic.clone(),
            },
            None => JobOutcome::Succeeded {
                output: String::new(),
            },
        }
    }
}

/// Engine that copies the artifacts of an earlier run from `source`.
#[derive(Debug, Clone)]
pub struct ReplayEngine {
    source: PathBuf,
    name: String,
}

impl ReplayEngine {
    pub fn new(source: impl AsRef<Path>) -> Self {
        let source = source.as_ref().to_path_buf();
        let name = format!("replay of {}", source.display());
        Self { source, name }
    }
}

impl SymbolicEngine for ReplayEngine {
    fn name(&self) -> &str {
        self.name.as_str()
    }

    fn execute(&self, job: &AnalysisJob) -> JobOutcome {
        if !Artifact::SolverType.path(&self.source).exists() {
            return JobOutcome::Failed {
                diagnostic: format!(
                    "{} has no {}",
                    self.source.display(),
                    Artifact::SolverType
                ),
            };
        }
        let mut copied = Vec::new();
        for artifact in Artifact::ALL {
            let from = artifact.path(&self.source);
            if !from.exists() {
                continue;
            }
            if let Err(err) = fs::copy(&from, artifact.path(job.output_dir())) {
                return JobOutcome::Failed {
                    diagnostic: format!("could not copy {}: {}", from.display(), err),
                };
            }
            copied.push(artifact.file_name());
        }
        JobOutcome::Succeeded {
            output: format!("copied {}", copied.join(", ")),
        }
    }
}
