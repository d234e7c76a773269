extern crate pest;
#[macro_use]
extern crate pest_derive;

pub mod ast;
pub mod ode;
pub mod parser;
pub mod semantic;
pub mod utils;

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Result};
use log::{info, warn};

use ast::Model;
use ode::{Diagnostics, OdeProcessor, ReplayEngine, SubprocessEngine, SymbolicEngine};
use parser::parse_neuron_string;
use semantic::{check_neuron, Scope};
use utils::{find_interpreter, unique_dir};

pub use ode::{PipelineOptions, Resolution};

/// Parses `text` and checks its first neuron.
pub fn check_string(text: &str) -> Result<(Model, Scope)> {
    let model = parse_neuron_string(text).map_err(|e| anyhow!(e.to_string()))?;
    if model.neurons.len() > 1 {
        warn!(
            "{} neurons found, only {} is resolved",
            model.neurons.len(),
            model.neurons[0].name
        );
    }
    let scope = match model.first_neuron() {
        Some(neuron) => check_neuron(neuron).map_err(|e| anyhow!(e.as_error_message(text)))?,
        None => Scope::new(),
    };
    Ok((model, scope))
}

/// Runs the pipeline on `model` with `engine`, using `output_dir` for the job
/// and its artifacts.
pub fn resolve_model<E: SymbolicEngine>(
    engine: E,
    model: &Model,
    scope: &Scope,
    output_dir: &Path,
    diags: &mut Diagnostics,
) -> Result<Model> {
    let processor = OdeProcessor::new(engine);
    let resolution = processor.process(model, scope, output_dir, diags)?;
    Ok(resolution.into_model())
}

/// Resolves the model in `input` and writes the result to `out`, or stdout.
/// With `replay` set, artifacts are copied from that directory instead of
/// running an interpreter.
pub fn resolve_file(
    input: &str,
    out: Option<&str>,
    work_dir: Option<&str>,
    replay: Option<&str>,
    options: PipelineOptions,
) -> Result<()> {
    let text = fs::read_to_string(input).map_err(|e| anyhow!("{}: {}", input, e))?;
    let (model, scope) = check_string(text.as_str())?;

    let base = work_dir.map(PathBuf::from).unwrap_or_else(env::temp_dir);
    let output_dir = unique_dir(&base, "neurode")?;
    info!("working in {}", output_dir.display());

    let mut diags = Diagnostics::new();
    let resolved = match replay {
        Some(source) => resolve_model(
            ReplayEngine::new(source),
            &model,
            &scope,
            &output_dir,
            &mut diags,
        )?,
        None => {
            let engine = SubprocessEngine::new(find_interpreter(&options)?)
                .with_timeout(options.timeout);
            resolve_model(engine, &model, &scope, &output_dir, &mut diags)?
        }
    };

    match out {
        Some(out) => fs::write(out, resolved.to_string())?,
        None => print!("{resolved}"),
    }
    if !options.keep_artifacts {
        fs::remove_dir_all(&output_dir)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::check_string;

    #[test]
    fn check_reports_source_location() {
        let err = check_string("neuron n {\n  state { V }\n  equations { V' = k * V }\n}\n")
            .unwrap_err();
        let message = err.to_string();
        assert!(message.contains("The variable k is not defined in n"), "{message}");
        assert!(message.contains("Line 3"), "{message}");
    }

    #[test]
    fn check_accepts_empty_unit() {
        let (model, scope) = check_string("# nothing here\n").unwrap();
        assert!(model.neurons.is_empty());
        assert!(scope.is_empty());
    }
}
