//! Synthesis of the analysis job handed to the symbolic engine.
//!
//! The job is a self-contained SymPy program. It decides whether the system
//! `x' = f(x)` is affine in the state, `x' = A x + b` with `A` and `b` free of
//! the state, and if so writes the discrete update
//! `x[n+1] = P x[n] + c` with `P = exp(A h)` and `c = (integral of exp(A s)
//! over [0, h]) b`. Otherwise it only reports `numeric`.

use std::collections::BTreeSet;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use itertools::Itertools;
use log::debug;

use crate::ast::OdeDeclaration;
use crate::semantic::Scope;

use super::artifacts::{Artifact, JOB_FILE, STEP_SYMBOL};
use super::error::OdeError;

/// A synthesized job, consumed once by an engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalysisJob {
    pub script: String,
    pub path: PathBuf,
    pub output_dir: PathBuf,
}

impl AnalysisJob {
    pub fn output_dir(&self) -> &Path {
        self.output_dir.as_path()
    }
}

/// Names of every variable `ode` mentions, checked against `scope`.
pub fn referenced_variables<'a>(
    ode: &'a OdeDeclaration,
    scope: &Scope,
) -> Result<BTreeSet<&'a str>, OdeError> {
    let mut names = BTreeSet::new();
    for eq in ode.equations.iter() {
        names.insert(eq.lhs.as_str());
        names.extend(eq.rhs.names());
    }
    if let Some(name) = names.iter().find(|name| scope.resolve(name).is_none()) {
        return Err(OdeError::UnresolvedReference {
            name: name.to_string(),
        });
    }
    Ok(names)
}

/// Renders the job script. Equal inputs give byte-identical scripts; the
/// output directory is not part of the text.
pub fn render_script(ode: &OdeDeclaration, scope: &Scope) -> Result<String, OdeError> {
    if ode.equations.is_empty() {
        return Err(OdeError::EmptyOde);
    }
    let variables = referenced_variables(ode, scope)?;
    let symbols = variables
        .iter()
        .map(|name| format!("    \"{name}\": sympy.Symbol(\"{name}\"),"))
        .join("\n");
    let state = ode
        .state_names()
        .map(|name| format!("    \"{name}\","))
        .join("\n");
    let rhs = ode
        .equations
        .iter()
        .map(|eq| format!("    \"{}\",", eq.rhs))
        .join("\n");

    Ok(format!(
        r#"#!/usr/bin/env python3
# ode analysis job, generated. writes its artifacts next to this file.
import os
import sys

import sympy

OUTPUT_DIR = os.path.dirname(os.path.abspath(__file__))
STEP = sympy.Symbol("{step}")

SYMBOLS = {{
{symbols}
}}

STATE = [
{state}
]

RHS = [
{rhs}
]


def write_artifact(name, lines):
    with open(os.path.join(OUTPUT_DIR, name), "w") as f:
        for line in lines:
            f.write(line + "\n")


def main():
    n = len(STATE)
    x = sympy.Matrix([SYMBOLS[name] for name in STATE])
    f = sympy.Matrix([sympy.sympify(rhs, locals=SYMBOLS) for rhs in RHS])
    A = f.jacobian(x)
    b = sympy.simplify(f - A * x)
    state = set(x)
    if A.free_symbols & state or b.free_symbols & state:
        write_artifact("{solver_type}", ["numeric"])
        return 0

    P = sympy.simplify((A * STEP).exp())
    if A.det() != 0:
        c = sympy.simplify(A.inv() * (P - sympy.eye(n)) * b)
    else:
        s = sympy.Symbol("__s")
        c = sympy.simplify(sympy.integrate((A * s).exp(), (s, 0, STEP)) * b)

    propagator = []
    constants = []
    updates = []
    for i in range(n):
        terms = []
        for j in range(n):
            if P[i, j] != 0:
                propagator.append("__P_%d_%d = %s" % (i, j, sympy.sstr(P[i, j])))
                terms.append("__P_%d_%d * %s" % (i, j, STATE[j]))
        if c[i] != 0:
            constants.append("__c_%d = %s" % (i, sympy.sstr(c[i])))
            terms.append("__c_%d" % i)
        updates.append(" + ".join(terms) if terms else "0")

    write_artifact("{propagator}", propagator)
    write_artifact("{initial_values}", constants)
    write_artifact("{state_vector}", STATE)
    write_artifact("{update_step}", updates)
    write_artifact("{solver_type}", ["exact"])
    return 0


if __name__ == "__main__":
    sys.exit(main())
"#,
        step = STEP_SYMBOL,
        solver_type = Artifact::SolverType.file_name(),
        propagator = Artifact::Propagator.file_name(),
        initial_values = Artifact::InitialValues.file_name(),
        state_vector = Artifact::StateVector.file_name(),
        update_step = Artifact::UpdateStep.file_name(),
    ))
}

/// Writes the job for `ode` into `output_dir`, creating the directory if
/// needed. Artifacts left by an earlier run are removed first so they are
/// never read back as this run's results. Nothing is written when the
/// declaration is rejected.
pub fn synthesize(
    ode: &OdeDeclaration,
    scope: &Scope,
    output_dir: &Path,
) -> Result<AnalysisJob, OdeError> {
    let script = render_script(ode, scope)?;
    fs::create_dir_all(output_dir).map_err(|err| OdeError::io(output_dir, err))?;
    for artifact in Artifact::ALL {
        let stale = artifact.path(output_dir);
        match fs::remove_file(&stale) {
            Ok(()) => debug!("removed stale {}", stale.display()),
            Err(err) if err.kind() == ErrorKind::NotFound => {}
            Err(err) => return Err(OdeError::io(&stale, err)),
        }
    }
    let path = output_dir.join(JOB_FILE);
    fs::write(&path, script.as_bytes()).map_err(|err| OdeError::io(&path, err))?;
    debug!("wrote analysis job {}", path.display());
    Ok(AnalysisJob {
        script,
        path,
        output_dir: output_dir.to_path_buf(),
    })
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::{render_script, synthesize};
    use crate::ast::OdeDeclaration;
    use crate::ode::artifacts::{Artifact, JOB_FILE};
    use crate::ode::OdeError;
    use crate::parser::parse_neuron_string;
    use crate::semantic::{check_neuron, Scope, VariableKind};
    use crate::utils::scratch_dir;

    const IAF: &str = "
        neuron iaf {
            state { V }
            parameters { a = -0.1 b = 2 unused = 3 }
            equations { V' = a * V + b }
        }
    ";

    fn iaf() -> (OdeDeclaration, Scope) {
        let model = parse_neuron_string(IAF).unwrap();
        let scope = check_neuron(&model.neurons[0]).unwrap();
        (model.neurons[0].body.ode().unwrap().clone(), scope)
    }

    #[test]
    fn script_declares_referenced_variables() {
        let (ode, scope) = iaf();
        let script = render_script(&ode, &scope).unwrap();
        assert!(script.contains("\"a\": sympy.Symbol(\"a\"),"));
        assert!(script.contains("\"V\": sympy.Symbol(\"V\"),"));
        assert!(!script.contains("unused"));
        assert!(script.contains("    \"a * V + b\","));
        assert!(script.contains("write_artifact(\"solver_type.tmp\", [\"exact\"])"));
    }

    #[test]
    fn script_is_deterministic() {
        let (ode, scope) = iaf();
        let first = synthesize(&ode, &scope, &scratch_dir("job_a").unwrap()).unwrap();
        let second = synthesize(&ode, &scope, &scratch_dir("job_b").unwrap()).unwrap();
        assert_ne!(first.path, second.path);
        assert_eq!(
            fs::read(&first.path).unwrap(),
            fs::read(&second.path).unwrap()
        );
    }

    #[test]
    fn every_equation_is_in_the_job() {
        let model = parse_neuron_string(include_str!("../../models/two_compartment.nestml")).unwrap();
        let scope = check_neuron(&model.neurons[0]).unwrap();
        let ode = model.neurons[0].body.ode().unwrap();
        let script = render_script(ode, &scope).unwrap();
        for eq in ode.equations.iter() {
            assert!(script.contains(&format!("    \"{}\",", eq.rhs)));
            assert!(script.contains(&format!("    \"{}\",", eq.lhs)));
        }
    }

    #[test]
    fn empty_ode_is_rejected_without_writing() {
        let dir = scratch_dir("empty_job").unwrap();
        let ode = OdeDeclaration {
            equations: vec![],
            span: None,
        };
        let err = synthesize(&ode, &Scope::new(), &dir).unwrap_err();
        assert!(matches!(err, OdeError::EmptyOde));
        assert!(!dir.join(super::JOB_FILE).exists());
    }

    #[test]
    fn unresolved_reference() {
        let (ode, _) = iaf();
        let mut scope = Scope::new();
        scope.declare("V", VariableKind::State);
        scope.declare("a", VariableKind::Parameter);
        let err = render_script(&ode, &scope).unwrap_err();
        assert!(matches!(err, OdeError::UnresolvedReference { ref name } if name == "b"));
    }

    #[test]
    fn creates_missing_output_dir() {
        let (ode, scope) = iaf();
        let dir = scratch_dir("nested_job").unwrap().join("deeper");
        let job = synthesize(&ode, &scope, &dir).unwrap();
        assert!(job.path.exists());
        assert_eq!(job.output_dir(), dir.as_path());
    }

    #[test]
    fn stale_artifacts_are_removed() {
        let (ode, scope) = iaf();
        let dir = scratch_dir("stale_job").unwrap();
        fs::write(Artifact::SolverType.path(&dir), "exact\n").unwrap();
        fs::write(Artifact::UpdateStep.path(&dir), "V\n").unwrap();
        synthesize(&ode, &scope, &dir).unwrap();
        for artifact in Artifact::ALL {
            assert!(!artifact.path(&dir).exists(), "{}", artifact.file_name());
        }
        assert!(dir.join(JOB_FILE).exists());
    }
}
