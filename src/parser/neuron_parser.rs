#![allow(clippy::empty_docs)]
#[derive(Parser)]
#[grammar = "parser/neuron_grammar.pest"] // relative to src
pub struct NeuronParser;

use pest::error::{Error, ErrorVariant};
use pest::iterators::{Pair, Pairs};
use pest::Parser;
use std::boxed::Box;

use crate::ast;
use crate::ast::{Ast, AstKind, Block, StringSpan};

fn span_of(pair: &Pair<Rule>) -> Option<StringSpan> {
    Some(StringSpan {
        pos_start: pair.as_span().start(),
        pos_end: pair.as_span().end(),
    })
}

//sign       = @{ "-" | "+" }
//factor_op  = @{ ("*" ~ !"*") | "/" }
fn parse_sign(pair: Pair<Rule>) -> char {
    *pair
        .as_str()
        .chars()
        .collect::<Vec<char>>()
        .first()
        .unwrap()
}

// name       = @{ ("_" | ASCII_ALPHA) ~ ("_" | ASCII_ALPHANUMERIC)* }
fn parse_name(pair: Pair<Rule>) -> String {
    pair.as_str().to_owned()
}

fn parse_expr(pair: Pair<Rule>) -> Ast {
    let span = span_of(&pair);
    match pair.as_rule() {
        Rule::name => Ast {
            kind: AstKind::Name(parse_name(pair)),
            span,
        },

        // number     = @{ ASCII_DIGIT+ ~ ("." ~ ASCII_DIGIT*)? ~ (^"e" ~ ("+" | "-")? ~ ASCII_DIGIT+)? }
        Rule::number => Ast {
            kind: AstKind::Number(pair.as_str().parse().unwrap()),
            span,
        },

        // call       = { name ~ "(" ~ (expression ~ ("," ~ expression)*)? ~ ")" }
        Rule::call => Ast {
            kind: AstKind::Call(parse_call(pair)),
            span,
        },

        //expression = { sign? ~ term ~ (term_op ~ term)* }
        Rule::expression => {
            let mut inner = pair.into_inner();
            let sign = if inner.peek().unwrap().as_rule() == Rule::sign {
                Some(parse_sign(inner.next().unwrap()))
            } else {
                None
            };
            let mut head_term = match sign {
                Some(s) => {
                    let child = parse_expr(inner.next().unwrap());
                    let subspan = Some(StringSpan {
                        pos_start: span.unwrap().pos_start,
                        pos_end: child.span.unwrap().pos_end,
                    });
                    Ast {
                        kind: AstKind::Monop(ast::Monop {
                            op: s,
                            child: Box::new(child),
                        }),
                        span: subspan,
                    }
                }
                None => parse_expr(inner.next().unwrap()),
            };
            while inner.peek().is_some() {
                //term_op    = @{ "-"|"+" }
                let term_op = parse_sign(inner.next().unwrap());
                let rhs_term = parse_expr(inner.next().unwrap());
                head_term = join(term_op, head_term, rhs_term);
            }
            head_term
        }

        //term       = { factor ~ (factor_op ~ factor)* }
        Rule::term => {
            let mut inner = pair.into_inner();
            let mut head_factor = parse_expr(inner.next().unwrap());
            while inner.peek().is_some() {
                let factor_op = parse_sign(inner.next().unwrap());
                let rhs_factor = parse_expr(inner.next().unwrap());
                head_factor = join(factor_op, head_factor, rhs_factor);
            }
            head_factor
        }

        // factor     = { atom ~ (pow_op ~ factor)? }
        Rule::factor => {
            let mut inner = pair.into_inner();
            let base = parse_expr(inner.next().unwrap());
            if inner.next().is_some() {
                let exponent = parse_expr(inner.next().unwrap());
                join('^', base, exponent)
            } else {
                base
            }
        }

        _ => unreachable!("{:?}", pair.to_string()),
    }
}

fn join(op: char, left: Ast, right: Ast) -> Ast {
    let span = Some(StringSpan {
        pos_start: left.span.unwrap().pos_start,
        pos_end: right.span.unwrap().pos_end,
    });
    Ast {
        kind: AstKind::Binop(ast::Binop {
            op,
            left: Box::new(left),
            right: Box::new(right),
        }),
        span,
    }
}

fn parse_call(pair: Pair<Rule>) -> ast::Call {
    let mut inner = pair.into_inner();
    ast::Call {
        fn_name: parse_name(inner.next().unwrap()),
        args: inner.map(parse_expr).collect(),
    }
}

// assignment   = { name ~ "=" ~ expression }
fn parse_assignment(pair: Pair<Rule>) -> ast::Assignment {
    let mut inner = pair.into_inner();
    ast::Assignment {
        name: parse_name(inner.next().unwrap()),
        expr: parse_expr(inner.next().unwrap()),
    }
}

// declaration  = { name ~ ("=" ~ expression)? }
fn parse_declaration(pair: Pair<Rule>) -> ast::Declaration {
    let span = span_of(&pair);
    let mut inner = pair.into_inner();
    ast::Declaration {
        name: parse_name(inner.next().unwrap()),
        value: inner.next().map(parse_expr),
        span,
    }
}

// statement    = { call | assignment }
fn parse_statement(pair: Pair<Rule>) -> ast::Statement {
    let inner = pair.into_inner().next().unwrap();
    match inner.as_rule() {
        Rule::call => ast::Statement::Call(parse_call(inner)),
        Rule::assignment => ast::Statement::Assignment(parse_assignment(inner)),
        _ => unreachable!("{:?}", inner.to_string()),
    }
}

// block      = { state | parameters | internals | equations | update_step | update }
fn parse_block(pair: Pair<Rule>) -> Block {
    let pair = pair.into_inner().next().unwrap();
    let span = span_of(&pair);
    match pair.as_rule() {
        Rule::state => Block::State(pair.into_inner().map(parse_declaration).collect()),
        Rule::parameters => Block::Parameters(pair.into_inner().map(parse_declaration).collect()),
        Rule::internals => Block::Internals(pair.into_inner().map(parse_declaration).collect()),

        // ode_equation = { name ~ "'" ~ "=" ~ expression }
        Rule::equations => {
            let equations = pair
                .into_inner()
                .map(|eq| {
                    let span = span_of(&eq);
                    let mut inner = eq.into_inner();
                    ast::OdeEquation {
                        lhs: parse_name(inner.next().unwrap()),
                        rhs: parse_expr(inner.next().unwrap()),
                        span,
                    }
                })
                .collect();
            Block::Equations(ast::OdeDeclaration { equations, span })
        }

        // update_step = { "update_step" ~ "{" ~ constant* ~ assignment* ~ "}" }
        // constant     = { let_kw ~ assignment }
        Rule::update_step => {
            let mut constants = Vec::new();
            let mut assignments = Vec::new();
            for item in pair.into_inner() {
                match item.as_rule() {
                    Rule::constant => {
                        constants.push(parse_assignment(item.into_inner().nth(1).unwrap()))
                    }
                    Rule::assignment => assignments.push(parse_assignment(item)),
                    _ => unreachable!("{:?}", item.to_string()),
                }
            }
            Block::UpdateStep(ast::UpdateStepBlock {
                constants,
                assignments,
            })
        }

        Rule::update => Block::Update(pair.into_inner().map(parse_statement).collect()),
        _ => unreachable!("{:?}", pair.to_string()),
    }
}

// neuron     = { "neuron" ~ name ~ "{" ~ block* ~ "}" }
fn parse_neuron(pair: Pair<Rule>) -> ast::Neuron {
    let span = span_of(&pair);
    let mut inner = pair.into_inner();
    let name = parse_name(inner.next().unwrap());
    let blocks = inner.map(parse_block).collect();
    ast::Neuron {
        name,
        body: ast::Body { blocks },
        span,
    }
}

// literals such as 1e999 match the grammar but overflow an f64
fn check_numbers(pairs: &Pairs<Rule>) -> Result<(), Box<Error<Rule>>> {
    for pair in pairs.clone().flatten() {
        let finite = pair.as_str().parse::<f64>().is_ok_and(f64::is_finite);
        if pair.as_rule() == Rule::number && !finite {
            return Err(Box::new(Error::new_from_span(
                ErrorVariant::CustomError {
                    message: format!("number {} is out of range", pair.as_str()),
                },
                pair.as_span(),
            )));
        }
    }
    Ok(())
}

pub fn parse_string(text: &str) -> Result<ast::Model, Box<Error<Rule>>> {
    let mut pairs = NeuronParser::parse(Rule::main, text)?;
    check_numbers(&pairs)?;
    let main = pairs.next().unwrap();
    let neurons = main
        .into_inner()
        .take_while(|pair| pair.as_rule() != Rule::EOI)
        .map(parse_neuron)
        .collect();
    Ok(ast::Model { neurons })
}

pub fn parse_expression(text: &str) -> Result<Ast, Box<Error<Rule>>> {
    let mut pairs = NeuronParser::parse(Rule::lone_expression, text)?;
    check_numbers(&pairs)?;
    let main = pairs.next().unwrap();
    Ok(parse_expr(main.into_inner().next().unwrap()))
}

pub fn parse_definition(text: &str) -> Result<ast::Assignment, Box<Error<Rule>>> {
    let mut pairs = NeuronParser::parse(Rule::definition, text)?;
    check_numbers(&pairs)?;
    let main = pairs.next().unwrap();
    Ok(parse_assignment(main.into_inner().next().unwrap()))
}
