use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// The stages of ODE resolution, in the order they run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    Accessor,
    Synthesis,
    Engine,
    Classification,
    Rewrite,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            Stage::Accessor => "ode lookup",
            Stage::Synthesis => "analysis job synthesis",
            Stage::Engine => "symbolic engine",
            Stage::Classification => "solution classification",
            Stage::Rewrite => "model rewrite",
        };
        write!(f, "{name}")
    }
}

#[derive(Error, Debug)]
pub enum OdeError {
    #[error("model has no ode declaration")]
    Precondition,
    #[error("ode declaration has no equations")]
    EmptyOde,
    #[error("variable {name} does not resolve to a declared variable")]
    UnresolvedReference { name: String },
    #[error("symbolic engine failed: {diagnostic}")]
    EngineFailure { diagnostic: String },
    #[error("symbolic engine did not finish within {after:?}")]
    EngineTimeout { after: Duration },
    #[error("malformed artifact {artifact}: {reason}")]
    ProtocolViolation { artifact: String, reason: String },
    #[error("exact solution does not match the ode declaration: {0}")]
    InconsistentSolution(String),
    #[error("i/o error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl OdeError {
    pub fn protocol(artifact: impl Into<String>, reason: impl Into<String>) -> Self {
        OdeError::ProtocolViolation {
            artifact: artifact.into(),
            reason: reason.into(),
        }
    }

    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        OdeError::Io {
            path: path.into(),
            source,
        }
    }
}

/// A stage failure for one neuron. Other neurons of the same batch are
/// unaffected.
#[derive(Error, Debug)]
#[error("neuron {model}: {stage} failed: {source}")]
pub struct PipelineError {
    pub model: String,
    pub stage: Stage,
    #[source]
    pub source: OdeError,
}

impl PipelineError {
    pub fn new(model: &str, stage: Stage, source: OdeError) -> Self {
        Self {
            model: model.to_owned(),
            stage,
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{OdeError, PipelineError, Stage};

    #[test]
    fn pipeline_error_names_model_and_stage() {
        let err = PipelineError::new(
            "iaf",
            Stage::Classification,
            OdeError::protocol("solver_type.tmp", "unknown solution type \"exactish\""),
        );
        assert_eq!(
            err.to_string(),
            "neuron iaf: solution classification failed: malformed artifact solver_type.tmp: unknown solution type \"exactish\""
        );
    }
}
