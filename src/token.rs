//! Token model
//!
//! The parsers consume a flat, pre-tokenized stream. Each token is either
//! an atom (a leaf in the result tree) or an operator spelling to be
//! resolved against the grammar's lookup table. Tokens carry no source
//! positions of their own; the parsers address them by index into the
//! stream.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Classification of a token as produced by the lexer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TokenKind {
    /// A leaf operand (identifier, number, ...)
    Atom,
    /// An operator spelling to be resolved against the grammar
    Oper,
}

/// One element of the input stream
///
/// Immutable once produced; the parsers only ever read tokens and refer to
/// them by their index in the stream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    /// Whether this is an operand or an operator spelling
    pub kind: TokenKind,
    /// The textual form of the token
    pub text: String,
}

impl Token {
    /// Create an atom token
    #[inline]
    pub fn atom(text: impl Into<String>) -> Self {
        Self {
            kind: TokenKind::Atom,
            text: text.into(),
        }
    }

    /// Create an operator token
    #[inline]
    pub fn oper(text: impl Into<String>) -> Self {
        Self {
            kind: TokenKind::Oper,
            text: text.into(),
        }
    }

    /// Whether this token is an atom
    #[inline]
    pub fn is_atom(&self) -> bool {
        self.kind == TokenKind::Atom
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.text)
    }
}
