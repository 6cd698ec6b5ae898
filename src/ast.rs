use serde::{Deserialize, Serialize};

/// An expression in a rule body.
///
/// The set of variants is closed: the generator matches on every one of them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Expr {
    /// Items expanded in order and concatenated
    Sequence(Vec<Expr>),
    /// Exactly one alternative, picked uniformly at random.
    ///
    /// Must hold at least one alternative; the parser never builds an empty one.
    Choice(Vec<Expr>),
    /// The inner expression or nothing, each with probability 1/2
    Optional(Box<Expr>),
    /// The inner expression repeated between `min` and `max` times (inclusive)
    Repetition { min: u32, max: u32, inner: Box<Expr> },
    /// A reference to another rule, resolved during generation
    NonTerminal(String),
    /// Quoted literal text
    String(String),
    /// A bare digit run used as literal text
    Digit(String),
}

impl Expr {
    pub fn non_terminal(name: &str) -> Self {
        Expr::NonTerminal(name.to_string())
    }

    pub fn string(text: &str) -> Self {
        Expr::String(text.to_string())
    }

    pub fn optional(inner: Expr) -> Self {
        Expr::Optional(Box::new(inner))
    }

    pub fn repetition(min: u32, max: u32, inner: Expr) -> Self {
        Expr::Repetition {
            min,
            max,
            inner: Box::new(inner),
        }
    }
}

/// A production rule: `<head> ::= body`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rule {
    pub head: String,
    pub body: Expr,
}

impl Rule {
    pub fn new(head: &str, body: Expr) -> Self {
        Rule {
            head: head.to_string(),
            body,
        }
    }
}
