use std::fmt;
use std::path::Path;
use std::str::FromStr;

use super::artifacts::Artifact;
use super::diagnostics::Diagnostics;
use super::error::{OdeError, Stage};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SolutionType {
    Exact,
    Numeric,
}

impl FromStr for SolutionType {
    type Err = OdeError;

    /// Only the exact tokens `exact` and `numeric` are accepted.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "exact" => Ok(SolutionType::Exact),
            "numeric" => Ok(SolutionType::Numeric),
            other => Err(OdeError::protocol(
                Artifact::SolverType.file_name(),
                format!("unknown solution type {other:?}"),
            )),
        }
    }
}

impl fmt::Display for SolutionType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            SolutionType::Exact => write!(f, "exact"),
            SolutionType::Numeric => write!(f, "numeric"),
        }
    }
}

/// Parses the content of the marker artifact, which must be exactly one line.
pub fn parse_marker(text: &str) -> Result<SolutionType, OdeError> {
    let lines = text.lines().collect::<Vec<_>>();
    match lines.as_slice() {
        [token] => token.parse(),
        _ => Err(OdeError::protocol(
            Artifact::SolverType.file_name(),
            format!("expected exactly one line, found {}", lines.len()),
        )),
    }
}

pub fn classify(output_dir: &Path, diags: &mut Diagnostics) -> Result<SolutionType, OdeError> {
    diags.info(
        Stage::Classification,
        format!("reading {}", Artifact::SolverType),
    );
    let solution = parse_marker(&Artifact::SolverType.read(output_dir)?)?;
    match solution {
        SolutionType::Exact => diags.info(Stage::Classification, "ODE is solved exactly."),
        SolutionType::Numeric => diags.info(Stage::Classification, "ODE is solved numerically."),
    }
    Ok(solution)
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::{classify, parse_marker, SolutionType};
    use crate::ode::artifacts::Artifact;
    use crate::ode::{Diagnostics, OdeError};
    use crate::utils::scratch_dir;

    #[test]
    fn accepts_both_tokens() {
        assert_eq!(parse_marker("exact").unwrap(), SolutionType::Exact);
        assert_eq!(parse_marker("exact\n").unwrap(), SolutionType::Exact);
        assert_eq!(parse_marker("numeric\r\n").unwrap(), SolutionType::Numeric);
    }

    #[test]
    fn rejects_everything_else() {
        for text in [
            "",
            "\n",
            "exact\nnumeric\n",
            "exact\n\n",
            "Exact",
            "NUMERIC",
            " exact",
            "exactish",
            "garbage",
        ] {
            assert!(
                matches!(parse_marker(text), Err(OdeError::ProtocolViolation { .. })),
                "accepted {text:?}"
            );
        }
    }

    #[test]
    fn classify_reads_marker() {
        let dir = scratch_dir("classify").unwrap();
        let mut diags = Diagnostics::new();
        fs::write(Artifact::SolverType.path(&dir), "numeric\n").unwrap();
        assert_eq!(classify(&dir, &mut diags).unwrap(), SolutionType::Numeric);
        assert!(diags
            .entries()
            .iter()
            .any(|d| d.message == "ODE is solved numerically."));
    }

    #[test]
    fn missing_marker_is_an_error() {
        let dir = scratch_dir("classify_missing").unwrap();
        let err = classify(&dir, &mut Diagnostics::new()).unwrap_err();
        assert!(matches!(err, OdeError::ProtocolViolation { .. }));
    }
}
