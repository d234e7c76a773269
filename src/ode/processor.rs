//! Orchestration of one ODE resolution: lookup, job synthesis, engine run,
//! classification and rewrite, strictly in that order.

use std::borrow::Cow;
use std::path::Path;
use std::time::Duration;

use crate::ast::Model;
use crate::semantic::Scope;

use super::accessor::{get_ode, has_ode, target_neuron};
use super::classify::{classify, SolutionType};
use super::diagnostics::Diagnostics;
use super::engine::{JobOutcome, SymbolicEngine};
use super::error::{OdeError, PipelineError, Stage};
use super::job::synthesize;
use super::rewrite::rewrite;

/// Settings for running the pipeline with a real interpreter.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PipelineOptions {
    /// Interpreter used to run the job, found on `PATH` when unset.
    pub interpreter: Option<String>,
    /// Upper bound on a single engine run.
    pub timeout: Option<Duration>,
    /// Keep the job and its artifacts after the run.
    pub keep_artifacts: bool,
}

/// What became of a model.
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution<'m> {
    /// The model has no ODE declaration and was not looked at further.
    NoOde(&'m Model),
    /// No closed form exists; the model is kept for numeric integration.
    Numeric(&'m Model),
    /// The ODE was replaced by an update step in a new model.
    Exact(Model),
}

impl Resolution<'_> {
    pub fn model(&self) -> &Model {
        match self {
            Resolution::NoOde(model) | Resolution::Numeric(model) => *model,
            Resolution::Exact(model) => model,
        }
    }

    pub fn solution(&self) -> Option<SolutionType> {
        match self {
            Resolution::NoOde(_) => None,
            Resolution::Numeric(_) => Some(SolutionType::Numeric),
            Resolution::Exact(_) => Some(SolutionType::Exact),
        }
    }

    pub fn into_model(self) -> Model {
        match self {
            Resolution::NoOde(model) | Resolution::Numeric(model) => model.clone(),
            Resolution::Exact(model) => model,
        }
    }
}

pub struct OdeProcessor<E> {
    engine: E,
}

impl<E: SymbolicEngine> OdeProcessor<E> {
    pub fn new(engine: E) -> Self {
        Self { engine }
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    /// Resolves the ODE of the first neuron of `model`, writing the job and
    /// its artifacts to `output_dir`. `model` is never modified. Any stage
    /// failure stops the run; later stages are not entered.
    pub fn process<'m>(
        &self,
        model: &'m Model,
        scope: &Scope,
        output_dir: &Path,
        diags: &mut Diagnostics,
    ) -> Result<Resolution<'m>, PipelineError> {
        let name = target_neuron(model)
            .map(|neuron| neuron.name.as_str())
            .unwrap_or("<empty>");
        let fail = |stage: Stage, diags: &mut Diagnostics, err: OdeError| {
            diags.error(stage, err.to_string());
            PipelineError::new(name, stage, err)
        };

        if !has_ode(model) {
            diags.info(Stage::Accessor, format!("{name} has no ode, nothing to do"));
            return Ok(Resolution::NoOde(model));
        }
        let ode = get_ode(model).map_err(|err| fail(Stage::Accessor, diags, err))?;

        let job = synthesize(ode, scope, output_dir)
            .map_err(|err| fail(Stage::Synthesis, diags, err))?;
        diags.info(
            Stage::Synthesis,
            format!("wrote {} for {} equations", job.path.display(), ode.equations.len()),
        );

        diags.info(Stage::Engine, format!("running {}", self.engine.name()));
        match self.engine.execute(&job) {
            JobOutcome::Succeeded { .. } => (),
            JobOutcome::Failed { diagnostic } => {
                return Err(fail(
                    Stage::Engine,
                    diags,
                    OdeError::EngineFailure { diagnostic },
                ))
            }
            JobOutcome::TimedOut { after, .. } => {
                return Err(fail(Stage::Engine, diags, OdeError::EngineTimeout { after }))
            }
        }

        let solution =
            classify(output_dir, diags).map_err(|err| fail(Stage::Classification, diags, err))?;

        match rewrite(model, solution, output_dir, diags)
            .map_err(|err| fail(Stage::Rewrite, diags, err))?
        {
            Cow::Borrowed(model) => Ok(Resolution::Numeric(model)),
            Cow::Owned(model) => Ok(Resolution::Exact(model)),
        }
    }
}
