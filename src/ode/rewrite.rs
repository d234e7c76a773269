//! Splices an exact solution into the model tree.

use std::borrow::Cow;
use std::collections::{BTreeSet, HashMap};
use std::path::Path;

use itertools::Itertools;

use crate::ast::{Assignment, Ast, AstKind, Block, Model, OdeDeclaration, UpdateStepBlock};
use crate::parser::{parse_definition, parse_expression};

use super::accessor::get_ode;
use super::artifacts::{Artifact, STEP_SYMBOL};
use super::classify::SolutionType;
use super::diagnostics::Diagnostics;
use super::error::{OdeError, Stage};

/// The four exact-solution artifacts, parsed.
#[derive(Debug, Clone, PartialEq)]
pub struct ExactSolution {
    pub propagator: Vec<Assignment>,
    pub initial_values: Vec<Assignment>,
    pub state: Vec<String>,
    pub updates: Vec<Ast>,
}

fn read_definitions(dir: &Path, artifact: Artifact) -> Result<Vec<Assignment>, OdeError> {
    artifact
        .read_lines(dir)?
        .into_iter()
        .map(|(number, line)| {
            parse_definition(&line).map_err(|err| {
                OdeError::protocol(
                    artifact.file_name(),
                    format!("line {number} is not a definition: {err}"),
                )
            })
        })
        .collect()
}

fn read_expressions(dir: &Path, artifact: Artifact) -> Result<Vec<Ast>, OdeError> {
    artifact
        .read_lines(dir)?
        .into_iter()
        .map(|(number, line)| {
            parse_expression(&line).map_err(|err| {
                OdeError::protocol(
                    artifact.file_name(),
                    format!("line {number} is not an expression: {err}"),
                )
            })
        })
        .collect()
}

impl ExactSolution {
    pub fn read(output_dir: &Path) -> Result<Self, OdeError> {
        let propagator = read_definitions(output_dir, Artifact::Propagator)?;
        let initial_values = read_definitions(output_dir, Artifact::InitialValues)?;
        let state = Artifact::StateVector
            .read_lines(output_dir)?
            .into_iter()
            .map(|(number, line)| match parse_expression(&line) {
                Ok(Ast {
                    kind: AstKind::Name(name),
                    ..
                }) => Ok(name),
                _ => Err(OdeError::protocol(
                    Artifact::StateVector.file_name(),
                    format!("line {number} is not a variable name: {line:?}"),
                )),
            })
            .collect::<Result<Vec<_>, _>>()?;
        let updates = read_expressions(output_dir, Artifact::UpdateStep)?;
        Ok(Self {
            propagator,
            initial_values,
            state,
            updates,
        })
    }

    /// The state ordering must name exactly the variables `ode` defines, once
    /// each, with one update expression per variable.
    pub fn check_consistency(&self, ode: &OdeDeclaration) -> Result<(), OdeError> {
        if self.state.len() != ode.equations.len() {
            return Err(OdeError::InconsistentSolution(format!(
                "state vector lists {} variables but the ode declaration has {} equations",
                self.state.len(),
                ode.equations.len()
            )));
        }
        if let Some(name) = self.state.iter().duplicates().next() {
            return Err(OdeError::InconsistentSolution(format!(
                "state vector lists {name} more than once"
            )));
        }
        let expected = ode.state_names().collect::<BTreeSet<_>>();
        let found = self.state.iter().map(String::as_str).collect::<BTreeSet<_>>();
        if expected != found {
            return Err(OdeError::InconsistentSolution(format!(
                "state vector [{}] does not match the ode variables [{}]",
                found.iter().join(", "),
                expected.iter().join(", ")
            )));
        }
        if self.updates.len() != self.state.len() {
            return Err(OdeError::InconsistentSolution(format!(
                "{} update expressions for {} state variables",
                self.updates.len(),
                self.state.len()
            )));
        }
        Ok(())
    }

    /// One assignment per state variable, in the order of `ode`.
    pub fn update_step_block(&self, ode: &OdeDeclaration) -> UpdateStepBlock {
        let updates = self
            .state
            .iter()
            .map(String::as_str)
            .zip(self.updates.iter())
            .collect::<HashMap<_, _>>();
        let step = Assignment {
            name: STEP_SYMBOL.to_owned(),
            expr: Ast::call("resolution", vec![]),
        };
        let constants = std::iter::once(step)
            .chain(self.propagator.iter().cloned())
            .chain(self.initial_values.iter().cloned())
            .collect();
        let assignments = ode
            .state_names()
            .filter_map(|name| {
                updates.get(name).map(|expr| Assignment {
                    name: name.to_owned(),
                    expr: (*expr).clone(),
                })
            })
            .collect();
        UpdateStepBlock {
            constants,
            assignments,
        }
    }
}

/// Copy of `model` whose ODE declaration is replaced by `step`.
fn replace_ode(model: &Model, step: UpdateStepBlock) -> Model {
    let mut rewritten = model.clone();
    if let Some(neuron) = rewritten.neurons.first_mut() {
        if let Some(block) = neuron
            .body
            .blocks
            .iter_mut()
            .find(|block| matches!(block, Block::Equations(_)))
        {
            *block = Block::UpdateStep(step);
        }
    }
    rewritten
}

/// Applies `solution` to `model`. A numeric solution hands back the input; an
/// exact one yields an independent copy with the ODE replaced. Nothing is
/// produced unless every artifact is consistent with the ODE declaration.
pub fn rewrite<'m>(
    model: &'m Model,
    solution: SolutionType,
    output_dir: &Path,
    diags: &mut Diagnostics,
) -> Result<Cow<'m, Model>, OdeError> {
    if solution == SolutionType::Numeric {
        diags.info(Stage::Rewrite, "keeping the ode for numeric integration");
        return Ok(Cow::Borrowed(model));
    }
    let ode = get_ode(model)?;
    let exact = ExactSolution::read(output_dir)?;
    exact.check_consistency(ode)?;
    let step = exact.update_step_block(ode);
    diags.info(
        Stage::Rewrite,
        format!(
            "replacing {} equations with an update step of {} constants",
            step.assignments.len(),
            step.constants.len()
        ),
    );
    Ok(Cow::Owned(replace_ode(model, step)))
}
