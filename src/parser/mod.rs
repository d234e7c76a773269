use pest::error::Error;

pub mod neuron_parser;
pub use neuron_parser::NeuronParser;
pub use neuron_parser::Rule as NeuronRule;
pub use neuron_parser::{parse_definition, parse_expression};

pub fn parse_neuron_string(text: &str) -> Result<Model, Box<Error<NeuronRule>>> {
    neuron_parser::parse_string(text)
}

use crate::ast::Model;
