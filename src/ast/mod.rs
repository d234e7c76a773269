pub mod expr;
pub use expr::{Ast, AstKind, Binop, Call, Monop, StringSpan};

pub mod model;
pub use model::{
    Assignment, Block, Body, Declaration, Model, Neuron, OdeDeclaration, OdeEquation, Statement,
    UpdateStepBlock,
};
