//! bnf-gen compiles a small EBNF-like grammar into a rule table and randomly
//! expands a start symbol into concrete text.
//!
//! Each grammar line holds one rule. A line is lexed into tokens, the body is
//! parsed into an [`Expr`] tree, and the rule is stored in a [`Grammar`].
//! Generation walks the tree with a caller-supplied random number generator.
//!
//! # Example
//!
//! ```rust
//! use bnf_gen::{Grammar, GrammarConfig};
//! use rand::SeedableRng;
//! use rand::rngs::StdRng;
//!
//! let source = r#"
//! <greeting> ::= ("Hello" | "Hi") " " <name> ["!"]
//! <name>     ::= "world" | "Rust"
//! "#;
//! let grammar = Grammar::parse_str(source, "greeting", GrammarConfig::default()).unwrap();
//!
//! let mut rng = StdRng::seed_from_u64(1);
//! let text = grammar.generate(&mut rng).unwrap();
//! assert!(text.starts_with("Hello ") || text.starts_with("Hi "));
//! ```

pub mod ast;
pub mod grammar;
pub mod lexer;
pub mod parser;
pub mod utils;

pub use ast::{Expr, Rule};
pub use grammar::{Grammar, GrammarConfig};
pub use lexer::{Lexer, Token, TokenKind};
pub use parser::Parser;
pub use utils::{GrammarError, LexError, ParseError, Result};
