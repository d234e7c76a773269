use std::fmt;

use super::expr::{Ast, Call, StringSpan};

/// A compilation unit: every neuron defined in one source file.
#[derive(Debug, Clone, PartialEq)]
pub struct Model {
    pub neurons: Vec<Neuron>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Neuron {
    pub name: String,
    pub body: Body,
    pub span: Option<StringSpan>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Body {
    pub blocks: Vec<Block>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Block {
    State(Vec<Declaration>),
    Parameters(Vec<Declaration>),
    Internals(Vec<Declaration>),
    Equations(OdeDeclaration),
    UpdateStep(UpdateStepBlock),
    Update(Vec<Statement>),
}

/// `name` or `name = value` inside a state, parameters or internals block.
#[derive(Debug, Clone, PartialEq)]
pub struct Declaration {
    pub name: String,
    pub value: Option<Ast>,
    pub span: Option<StringSpan>,
}

/// First order equation `lhs' = rhs`.
#[derive(Debug, Clone, PartialEq)]
pub struct OdeEquation {
    pub lhs: String,
    pub rhs: Ast,
    pub span: Option<StringSpan>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OdeDeclaration {
    pub equations: Vec<OdeEquation>,
    pub span: Option<StringSpan>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Assignment {
    pub name: String,
    pub expr: Ast,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    Assignment(Assignment),
    Call(Call),
}

/// Exact replacement of an [`OdeDeclaration`].
///
/// `constants` are evaluated once, in order, before any state update. The
/// `assignments` are simultaneous: every right hand side reads the state as it
/// was before the step.
#[derive(Debug, Clone, PartialEq)]
pub struct UpdateStepBlock {
    pub constants: Vec<Assignment>,
    pub assignments: Vec<Assignment>,
}

impl OdeDeclaration {
    /// Left hand side variable names, in declaration order.
    pub fn state_names(&self) -> impl Iterator<Item = &str> {
        self.equations.iter().map(|eq| eq.lhs.as_str())
    }
}

impl Body {
    pub fn ode(&self) -> Option<&OdeDeclaration> {
        self.blocks.iter().find_map(|block| match block {
            Block::Equations(ode) => Some(ode),
            _ => None,
        })
    }

    pub fn update_step(&self) -> Option<&UpdateStepBlock> {
        self.blocks.iter().find_map(|block| match block {
            Block::UpdateStep(step) => Some(step),
            _ => None,
        })
    }

    /// Declarations of every state, parameters and internals block, together
    /// with the block they come from.
    pub fn declarations(&self) -> impl Iterator<Item = (&Block, &Declaration)> {
        self.blocks.iter().flat_map(|block| {
            let decls: &[Declaration] = match block {
                Block::State(decls) | Block::Parameters(decls) | Block::Internals(decls) => decls,
                Block::Equations(_) | Block::UpdateStep(_) | Block::Update(_) => &[],
            };
            decls.iter().map(move |decl| (block, decl))
        })
    }
}

impl Model {
    pub fn first_neuron(&self) -> Option<&Neuron> {
        self.neurons.first()
    }
}

fn fmt_declarations(
    f: &mut fmt::Formatter,
    keyword: &str,
    decls: &[Declaration],
) -> fmt::Result {
    writeln!(f, "  {keyword} {{")?;
    for decl in decls {
        writeln!(f, "    {decl}")?;
    }
    writeln!(f, "  }}")
}

impl fmt::Display for Declaration {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match &self.value {
            Some(value) => write!(f, "{} = {}", self.name, value),
            None => write!(f, "{}", self.name),
        }
    }
}

impl fmt::Display for OdeEquation {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}' = {}", self.lhs, self.rhs)
    }
}

impl fmt::Display for Assignment {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{} = {}", self.name, self.expr)
    }
}

impl fmt::Display for Statement {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Statement::Assignment(assignment) => write!(f, "{assignment}"),
            Statement::Call(call) => write!(f, "{call}"),
        }
    }
}

impl fmt::Display for Block {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Block::State(decls) => fmt_declarations(f, "state", decls),
            Block::Parameters(decls) => fmt_declarations(f, "parameters", decls),
            Block::Internals(decls) => fmt_declarations(f, "internals", decls),
            Block::Equations(ode) => {
                writeln!(f, "  equations {{")?;
                for eq in ode.equations.iter() {
                    writeln!(f, "    {eq}")?;
                }
                writeln!(f, "  }}")
            }
            Block::UpdateStep(step) => {
                writeln!(f, "  update_step {{")?;
                for constant in step.constants.iter() {
                    writeln!(f, "    let {constant}")?;
                }
                for assignment in step.assignments.iter() {
                    writeln!(f, "    {assignment}")?;
                }
                writeln!(f, "  }}")
            }
            Block::Update(stmts) => {
                writeln!(f, "  update {{")?;
                for stmt in stmts {
                    writeln!(f, "    {stmt}")?;
                }
                writeln!(f, "  }}")
            }
        }
    }
}

impl fmt::Display for Neuron {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(f, "neuron {} {{", self.name)?;
        for block in self.body.blocks.iter() {
            write!(f, "{block}")?;
        }
        writeln!(f, "}}")
    }
}

impl fmt::Display for Model {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for (i, neuron) in self.neurons.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{neuron}")?;
        }
        Ok(())
    }
}
