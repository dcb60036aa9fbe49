//! Mixfix - Configurable Mixed-Fix Expression Parsing
//!
//! This is a generic expression parser driven by a declarative
//! precedence/associativity table. It provides:
//! - An operator algebra of prefix, postfix, infix, ternary and bracketed
//!   shapes, grouped into ordered precedence levels
//! - A grammar builder that compiles the levels into an immutable lookup
//!   table keyed by operator spelling
//! - A shunting-yard driver producing an unambiguous expression tree
//! - An independent window-reduction parser used as a differential oracle
//! - Flat (n-ary) associativity, implicit concatenation, and transparent
//!   grouping brackets
//! - A fixture corpus for comparing the two parsers case by case
//!
//! ## Quick Start
//!
//! ```rust
//! use mixfix::{lexer, reference, shunting_yard, GrammarBuilder, Op};
//!
//! // Levels are handed over tightest-binding first.
//! let grammar = GrammarBuilder::new()
//!     .level_ltr("mul", vec![Op::infix("*"), Op::infix("/")])
//!     .level_flat("add", vec![Op::infix("+"), Op::infix("-")])
//!     .finish()
//!     .unwrap();
//!
//! let tokens = lexer::tokenize("1 + 2 * 3 + 4").unwrap();
//! let tree = shunting_yard::parse(&grammar, &tokens).unwrap();
//! assert_eq!(tree.render(), "add{ 1 + mul{ 2 * 3 } + 4 }");
//!
//! // The reference parser agrees on every input.
//! let oracle = reference::parse(&grammar, &tokens).unwrap();
//! assert_eq!(oracle.render(), tree.render());
//! ```
//!
//! ## Defining Grammars as JSON
//!
//! ```rust
//! use mixfix::GrammarBuilder;
//!
//! let grammar_json = r#"{
//!     "levels": [
//!         { "name": "neg", "assoc": "RightToLeft",
//!           "ops": [ { "Prefix": { "name": "-" } } ] },
//!         { "name": "add", "assoc": "Flat",
//!           "ops": [ { "Infix": { "name": "+" } } ] }
//!     ]
//! }"#;
//!
//! let grammar = GrammarBuilder::from_json(grammar_json).unwrap().finish().unwrap();
//! assert!(grammar.lookup("-").is_some());
//! ```
//!
//! ## Feature Flags
//!
//! - `logging` - Enable debug logging of collapses using the `log` crate
//! - `parallel` - Parse batches of token streams in parallel via rayon

// Lint configuration for production quality
#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]
#![warn(clippy::all)]
#![allow(clippy::new_without_default)]

pub mod error;
pub mod grammar;
pub mod lexer;
pub mod operator;
pub mod parallel;
pub mod reference;
pub mod shunting_yard;
pub mod testset;
pub mod token;
pub mod tree;

/// Re-export commonly used types for convenience
pub use error::{LexError, ParseError};
pub use grammar::{
    Grammar, GrammarBuilder, GrammarError, GrammarSpec, LevelSpec, LookupEntry, OpBinding,
};
pub use lexer::Lexer;
pub use operator::{Assoc, Level, Op};
pub use parallel::parse_batch_parallel;
pub use token::{Token, TokenKind};
pub use tree::Node;
