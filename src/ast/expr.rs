use std::collections::BTreeSet;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StringSpan {
    pub pos_start: usize,
    pub pos_end: usize,
}

impl fmt::Display for StringSpan {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "({}, {})", self.pos_start, self.pos_end)
    }
}

/// Binary operation. `op` is one of `+`, `-`, `*`, `/` or `^` (printed as `**`).
#[derive(Debug, Clone, PartialEq)]
pub struct Binop {
    pub op: char,
    pub left: Box<Ast>,
    pub right: Box<Ast>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Monop {
    pub op: char,
    pub child: Box<Ast>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Call {
    pub fn_name: String,
    pub args: Vec<Ast>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum AstKind {
    Binop(Binop),
    Monop(Monop),
    Call(Call),
    Number(f64),
    Name(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Ast {
    pub kind: AstKind,
    pub span: Option<StringSpan>,
}

impl AstKind {
    pub fn as_number(&self) -> Option<f64> {
        match self {
            AstKind::Number(value) => Some(*value),
            _ => None,
        }
    }
}

impl Ast {
    pub fn new(kind: AstKind) -> Self {
        Self { kind, span: None }
    }

    pub fn name(name: &str) -> Self {
        Self::new(AstKind::Name(name.to_owned()))
    }

    pub fn number(value: f64) -> Self {
        Self::new(AstKind::Number(value))
    }

    pub fn call(fn_name: &str, args: Vec<Ast>) -> Self {
        Self::new(AstKind::Call(Call {
            fn_name: fn_name.to_owned(),
            args,
        }))
    }

    pub fn binop(op: char, left: Ast, right: Ast) -> Self {
        Self::new(AstKind::Binop(Binop {
            op,
            left: Box::new(left),
            right: Box::new(right),
        }))
    }

    /// Variable names referenced by this expression, in order of first
    /// appearance. Function names of calls are not variables.
    pub fn names(&self) -> Vec<&str> {
        let mut seen = BTreeSet::new();
        let mut names = Vec::new();
        self.collect_names(&mut seen, &mut names);
        names
    }

    fn collect_names<'a>(&'a self, seen: &mut BTreeSet<&'a str>, names: &mut Vec<&'a str>) {
        match &self.kind {
            AstKind::Name(name) => {
                if seen.insert(name.as_str()) {
                    names.push(name.as_str());
                }
            }
            AstKind::Binop(binop) => {
                binop.left.collect_names(seen, names);
                binop.right.collect_names(seen, names);
            }
            AstKind::Monop(monop) => monop.child.collect_names(seen, names),
            AstKind::Call(call) => {
                for arg in call.args.iter() {
                    arg.collect_names(seen, names);
                }
            }
            AstKind::Number(_) => (),
        }
    }

    /// Binding strength used when printing; atoms bind tightest.
    fn precedence(&self) -> u8 {
        match &self.kind {
            // a leading sign is only accepted at the start of an expression
            AstKind::Binop(Binop { op: '+' | '-', .. }) | AstKind::Monop(_) => 1,
            AstKind::Number(value) if *value < 0.0 => 1,
            AstKind::Binop(Binop { op: '*' | '/', .. }) => 2,
            AstKind::Binop(_) => 4,
            _ => 5,
        }
    }

    fn fmt_operand(&self, f: &mut fmt::Formatter, wrap: bool) -> fmt::Result {
        if wrap {
            write!(f, "({self})")
        } else {
            write!(f, "{self}")
        }
    }
}

impl fmt::Display for Call {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}(", self.fn_name)?;
        for (i, arg) in self.args.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{arg}")?;
        }
        write!(f, ")")
    }
}

impl fmt::Display for Ast {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match &self.kind {
            AstKind::Binop(binop) => {
                let prec = self.precedence();
                // `**` is right associative, the others are left associative
                let (wrap_left, wrap_right) = if binop.op == '^' {
                    (
                        binop.left.precedence() <= prec,
                        binop.right.precedence() < prec,
                    )
                } else {
                    (
                        binop.left.precedence() < prec,
                        binop.right.precedence() <= prec,
                    )
                };
                binop.left.fmt_operand(f, wrap_left)?;
                match binop.op {
                    '^' => write!(f, "**")?,
                    op => write!(f, " {op} ")?,
                }
                binop.right.fmt_operand(f, wrap_right)
            }
            AstKind::Monop(monop) => {
                write!(f, "{}", monop.op)?;
                monop.child.fmt_operand(f, monop.child.precedence() < 2)
            }
            AstKind::Call(call) => write!(f, "{call}"),
            AstKind::Number(value) => write!(f, "{value}"),
            AstKind::Name(name) => write!(f, "{name}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::Ast;

    #[test]
    fn display_keeps_precedence() {
        // (a + b) * c
        let expr = Ast::binop(
            '*',
            Ast::binop('+', Ast::name("a"), Ast::name("b")),
            Ast::name("c"),
        );
        assert_eq!(expr.to_string(), "(a + b) * c");

        // a - (b - c)
        let expr = Ast::binop(
            '-',
            Ast::name("a"),
            Ast::binop('-', Ast::name("b"), Ast::name("c")),
        );
        assert_eq!(expr.to_string(), "a - (b - c)");

        // a * b + c needs no parentheses
        let expr = Ast::binop(
            '+',
            Ast::binop('*', Ast::name("a"), Ast::name("b")),
            Ast::name("c"),
        );
        assert_eq!(expr.to_string(), "a * b + c");
    }

    #[test]
    fn display_power_and_calls() {
        let expr = Ast::binop(
            '^',
            Ast::call("exp", vec![Ast::name("x")]),
            Ast::binop('^', Ast::name("y"), Ast::number(2.0)),
        );
        assert_eq!(expr.to_string(), "exp(x)**y**2");
    }

    #[test]
    fn names_skip_functions_and_duplicates() {
        let expr = Ast::binop(
            '+',
            Ast::binop('*', Ast::name("a"), Ast::name("V")),
            Ast::call("exp", vec![Ast::name("V"), Ast::name("tau")]),
        );
        assert_eq!(expr.names(), vec!["a", "V", "tau"]);
    }
}
