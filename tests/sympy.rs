use std::path::Path;
use std::process::{Command, Stdio};
use std::time::Duration;

use neurode::ast::Model;
use neurode::ode::{Diagnostics, OdeProcessor, PipelineOptions, Resolution, SubprocessEngine};
use neurode::parser::parse_neuron_string;
use neurode::semantic::check_neuron;
use neurode::utils::{find_interpreter, unique_dir};

/// An interpreter that can import sympy, or `None` when the machine has none.
fn sympy_interpreter() -> Option<String> {
    let interpreter = match find_interpreter(&PipelineOptions::default()) {
        Ok(interpreter) => interpreter,
        Err(err) => {
            eprintln!("skipping: {err}");
            return None;
        }
    };
    let imported = Command::new(&interpreter)
        .args(["-c", "import sympy"])
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .is_ok_and(|status| status.success());
    if !imported {
        eprintln!("skipping: {interpreter} cannot import sympy");
        return None;
    }
    Some(interpreter)
}

fn resolve<'m>(interpreter: &str, name: &str, model: &'m Model) -> Resolution<'m> {
    let _ = env_logger::builder().is_test(true).try_init();
    let scope = check_neuron(&model.neurons[0]).unwrap();
    let engine =
        SubprocessEngine::new(interpreter).with_timeout(Some(Duration::from_secs(300)));
    let processor = OdeProcessor::new(engine);
    let dir = unique_dir(Path::new("test_output"), name).unwrap();
    let mut diags = Diagnostics::new();
    processor
        .process(model, &scope, &dir, &mut diags)
        .unwrap_or_else(|err| {
            let log = diags.entries().iter().map(|d| d.to_string()).collect::<Vec<_>>();
            panic!("{name}: {err}\n{}", log.join("\n"))
        })
}

fn assert_exact(name: &str, text: &str, interpreter: &str) {
    let model = parse_neuron_string(text).unwrap();
    let expected = model.neurons[0]
        .body
        .ode()
        .unwrap()
        .state_names()
        .collect::<Vec<_>>();

    let resolution = resolve(interpreter, name, &model);
    let Resolution::Exact(rewritten) = &resolution else {
        panic!("{name}: expected an exact solution, got {:?}", resolution.solution());
    };
    let body = &rewritten.neurons[0].body;
    assert!(body.ode().is_none(), "{name}");
    let step = body.update_step().unwrap();
    let names = step
        .assignments
        .iter()
        .map(|a| a.name.as_str())
        .collect::<Vec<_>>();
    assert_eq!(names, expected, "{name}");
    assert_eq!(step.constants[0].to_string(), "__h = resolution()");
}

#[test]
fn iaf_psc_exp_is_exact() {
    let Some(interpreter) = sympy_interpreter() else {
        return;
    };
    assert_exact(
        "sympy_iaf_psc_exp",
        include_str!("../models/iaf_psc_exp.nestml"),
        &interpreter,
    );
}

#[test]
fn two_compartment_is_exact() {
    let Some(interpreter) = sympy_interpreter() else {
        return;
    };
    assert_exact(
        "sympy_two_compartment",
        include_str!("../models/two_compartment.nestml"),
        &interpreter,
    );
}

#[test]
fn quadratic_is_numeric() {
    let Some(interpreter) = sympy_interpreter() else {
        return;
    };
    let model = parse_neuron_string(include_str!("../models/quadratic.nestml")).unwrap();
    let resolution = resolve(&interpreter, "sympy_quadratic", &model);
    assert!(matches!(resolution, Resolution::Numeric(_)), "{:?}", resolution.solution());
}
