//! Read-only access to the dynamics of a compilation unit.
//!
//! Only the first neuron of a [`Model`] is ever inspected; any further neurons
//! in the same unit are ignored by ODE resolution.

use crate::ast::{Model, Neuron, OdeDeclaration};

use super::error::OdeError;

pub fn target_neuron(model: &Model) -> Option<&Neuron> {
    model.first_neuron()
}

pub fn has_ode(model: &Model) -> bool {
    target_neuron(model)
        .and_then(|neuron| neuron.body.ode())
        .is_some()
}

pub fn get_ode(model: &Model) -> Result<&OdeDeclaration, OdeError> {
    target_neuron(model)
        .and_then(|neuron| neuron.body.ode())
        .ok_or(OdeError::Precondition)
}

#[cfg(test)]
mod tests {
    use super::{get_ode, has_ode};
    use crate::ode::OdeError;
    use crate::parser::parse_neuron_string;

    #[test]
    fn finds_ode_in_first_neuron() {
        let model = parse_neuron_string(
            "neuron a { state { x } equations { x' = -x } } neuron b { state { y } }",
        )
        .unwrap();
        assert!(has_ode(&model));
        assert_eq!(get_ode(&model).unwrap().equations.len(), 1);
    }

    #[test]
    fn later_neurons_are_ignored() {
        let model = parse_neuron_string(
            "neuron a { state { x } } neuron b { state { y } equations { y' = -y } }",
        )
        .unwrap();
        assert!(!has_ode(&model));
        assert!(matches!(get_ode(&model), Err(OdeError::Precondition)));
    }

    #[test]
    fn empty_unit_has_no_ode() {
        let model = parse_neuron_string("").unwrap();
        assert!(!has_ode(&model));
        assert!(matches!(get_ode(&model), Err(OdeError::Precondition)));
    }
}
