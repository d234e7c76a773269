//! Name resolution for a single neuron.
//!
//! The ODE pipeline relies on [`check_neuron`] having passed: every variable an
//! ODE declaration mentions must resolve in the neuron's [`Scope`].

pub mod error;
pub use error::{ValidationError, ValidationErrors};

use std::collections::{BTreeMap, HashSet};

use crate::ast::{Block, Neuron};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VariableKind {
    State,
    Parameter,
    Internal,
}

/// Variables declared by one neuron. Iteration order is by name, so anything
/// derived from a scope is deterministic.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Scope {
    variables: BTreeMap<String, VariableKind>,
}

impl Scope {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_neuron(neuron: &Neuron) -> Self {
        let mut scope = Self::new();
        for (block, decl) in neuron.body.declarations() {
            let kind = match block {
                Block::State(_) => VariableKind::State,
                Block::Parameters(_) => VariableKind::Parameter,
                Block::Internals(_) => VariableKind::Internal,
                Block::Equations(_) | Block::UpdateStep(_) | Block::Update(_) => unreachable!(),
            };
            scope.declare(decl.name.as_str(), kind);
        }
        scope
    }

    /// Declares `name`; the first declaration wins.
    pub fn declare(&mut self, name: &str, kind: VariableKind) {
        self.variables.entry(name.to_owned()).or_insert(kind);
    }

    pub fn resolve(&self, name: &str) -> Option<VariableKind> {
        self.variables.get(name).copied()
    }

    pub fn len(&self) -> usize {
        self.variables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.variables.is_empty()
    }
}

/// Checks that the ODE declaration of `neuron` only refers to declared
/// variables, that every equation defines a state variable, and that no state
/// variable is defined twice.
pub fn check_neuron(neuron: &Neuron) -> Result<Scope, ValidationErrors> {
    let scope = Scope::from_neuron(neuron);
    let mut errors = ValidationErrors::new();
    let mut seen = HashSet::new();
    // only one ode declaration is ever resolved
    for ode in neuron
        .body
        .blocks
        .iter()
        .filter_map(|block| match block {
            Block::Equations(ode) => Some(ode),
            _ => None,
        })
        .skip(1)
    {
        errors.push(ValidationError::new(
            format!("{} has more than one equations block", neuron.name),
            ode.span,
        ));
    }
    if let Some(ode) = neuron.body.ode() {
        for eq in ode.equations.iter() {
            match scope.resolve(eq.lhs.as_str()) {
                Some(VariableKind::State) => (),
                Some(_) => errors.push(ValidationError::new(
                    format!("{} is not a state variable and cannot have an ode", eq.lhs),
                    eq.span,
                )),
                None => errors.push(ValidationError::new(
                    format!("The variable {} is not defined in {}", eq.lhs, neuron.name),
                    eq.span,
                )),
            }
            if !seen.insert(eq.lhs.as_str()) {
                errors.push(ValidationError::new(
                    format!("{} has more than one ode", eq.lhs),
                    eq.span,
                ));
            }
            for name in eq.rhs.names() {
                if scope.resolve(name).is_none() {
                    errors.push(ValidationError::new(
                        format!("The variable {} is not defined in {}", name, neuron.name),
                        eq.rhs.span,
                    ));
                }
            }
        }
    }
    if errors.is_empty() {
        Ok(scope)
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::{check_neuron, VariableKind};
    use crate::parser::parse_neuron_string;

    #[test]
    fn scope_collects_declarations() {
        let model = parse_neuron_string(
            "neuron n { state { V } parameters { a = 1 } internals { h = resolution() } }",
        )
        .unwrap();
        let scope = check_neuron(&model.neurons[0]).unwrap();
        assert_eq!(scope.len(), 3);
        assert_eq!(scope.resolve("V"), Some(VariableKind::State));
        assert_eq!(scope.resolve("a"), Some(VariableKind::Parameter));
        assert_eq!(scope.resolve("h"), Some(VariableKind::Internal));
        assert_eq!(scope.resolve("t"), None);
    }

    #[test]
    fn undefined_variable_in_ode() {
        let text = "
            neuron n {
                state { V }
                equations {
                    V' = a * V
                }
            }
        ";
        let model = parse_neuron_string(text).unwrap();
        let errors = check_neuron(&model.neurons[0]).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert!(errors.has_error_contains("The variable a is not defined in n"));
        let message = errors.as_error_message(text);
        assert!(message.contains("Line 5, Column 26"), "{message}");
    }

    #[test]
    fn ode_must_define_state_once() {
        let model = parse_neuron_string(
            "neuron n { state { V } parameters { a } equations { a' = V V' = a V' = 1 } }",
        )
        .unwrap();
        let errors = check_neuron(&model.neurons[0]).unwrap_err();
        assert_eq!(errors.len(), 2);
        assert!(errors.has_error_contains("a is not a state variable"));
        assert!(errors.has_error_contains("V has more than one ode"));
    }

    #[test]
    fn single_equations_block() {
        let text = "neuron n {\n  state { x y }\n  equations { x' = -x }\n  equations { y' = -y }\n}";
        let model = parse_neuron_string(text).unwrap();
        let errors = check_neuron(&model.neurons[0]).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert!(errors.has_error_contains("n has more than one equations block"));
        assert!(errors.as_error_message(text).contains("Line 4"));
    }
}
