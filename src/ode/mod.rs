//! Resolution of a neuron's ODE declaration into an exact update step.
//!
//! [`OdeProcessor`] drives the stages in order: [`accessor`] finds the ODE,
//! [`job`] writes an analysis job, an [`engine::SymbolicEngine`] runs it,
//! [`classify`] reads the verdict and [`rewrite`] splices an exact solution
//! into a copy of the model. Stages exchange data only through the files
//! described in [`artifacts`].

pub mod accessor;
pub use accessor::{get_ode, has_ode};

pub mod artifacts;
pub use artifacts::{Artifact, JOB_FILE, STEP_SYMBOL};

pub mod classify;
pub use classify::{classify, SolutionType};

pub mod diagnostics;
pub use diagnostics::{Diagnostic, Diagnostics, Level};

pub mod engine;
pub use engine::{CannedEngine, JobOutcome, ReplayEngine, SubprocessEngine, SymbolicEngine};

pub mod error;
pub use error::{OdeError, PipelineError, Stage};

pub mod job;
pub use job::{synthesize, AnalysisJob};

pub mod processor;
pub use processor::{OdeProcessor, PipelineOptions, Resolution};

pub mod rewrite;
pub use rewrite::{rewrite, ExactSolution};
