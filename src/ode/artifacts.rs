//! File protocol shared with the symbolic engine.
//!
//! All files live in one output directory that belongs to a single pipeline
//! invocation.

use std::fmt;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use super::error::OdeError;

/// Name of the job description written by the synthesizer.
pub const JOB_FILE: &str = "ode_analysis.py";

/// Symbol the engine uses for the integration step size.
pub const STEP_SYMBOL: &str = "__h";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Artifact {
    SolverType,
    Propagator,
    InitialValues,
    StateVector,
    UpdateStep,
}

impl Artifact {
    pub const ALL: [Artifact; 5] = [
        Artifact::SolverType,
        Artifact::Propagator,
        Artifact::InitialValues,
        Artifact::StateVector,
        Artifact::UpdateStep,
    ];

    pub fn file_name(&self) -> &'static str {
        match self {
            Artifact::SolverType => "solver_type.tmp",
            Artifact::Propagator => "propagator.tmp",
            Artifact::InitialValues => "initial_values.tmp",
            Artifact::StateVector => "state_vector.tmp",
            Artifact::UpdateStep => "update_step.tmp",
        }
    }

    pub fn path(&self, dir: &Path) -> PathBuf {
        dir.join(self.file_name())
    }

    /// Reads the artifact; a missing file violates the protocol.
    pub fn read(&self, dir: &Path) -> Result<String, OdeError> {
        let path = self.path(dir);
        fs::read_to_string(&path).map_err(|err| match err.kind() {
            ErrorKind::NotFound => OdeError::protocol(self.file_name(), "file is missing"),
            _ => OdeError::io(path, err),
        })
    }

    /// Non blank lines with their 1-based line numbers.
    pub fn read_lines(&self, dir: &Path) -> Result<Vec<(usize, String)>, OdeError> {
        let text = self.read(dir)?;
        Ok(text
            .lines()
            .enumerate()
            .map(|(i, line)| (i + 1, line.trim()))
            .filter(|(_, line)| !line.is_empty())
            .map(|(i, line)| (i, line.to_owned()))
            .collect())
    }
}

impl fmt::Display for Artifact {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.file_name())
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::Artifact;
    use crate::ode::OdeError;
    use crate::utils::scratch_dir;

    #[test]
    fn missing_artifact_is_a_protocol_violation() {
        let dir = scratch_dir("missing_artifact").unwrap();
        let err = Artifact::Propagator.read(&dir).unwrap_err();
        assert!(
            matches!(err, OdeError::ProtocolViolation { ref artifact, .. } if artifact == "propagator.tmp")
        );
    }

    #[test]
    fn read_lines_skips_blanks() {
        let dir = scratch_dir("read_lines").unwrap();
        fs::write(Artifact::StateVector.path(&dir), "V\n\n  W \n").unwrap();
        let lines = Artifact::StateVector.read_lines(&dir).unwrap();
        assert_eq!(lines, vec![(1, "V".to_owned()), (3, "W".to_owned())]);
    }
}
