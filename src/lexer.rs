//! Fixed word lexer
//!
//! The test harness feeds the parsers through this deliberately simple
//! lexer: the input is a whitespace-separated sequence of words, a word
//! starting with `_`, a digit or `a`–`o` is an atom and anything else is
//! an operator spelling. Two consecutive spaces are a tokenization error.
//! Real embedders supply their own token streams.

use crate::error::LexError;
use crate::token::Token;
use memchr::memmem;
use regex::Regex;

/// Character class that opens an atom word
const ATOM_START: &str = "^[_0-9a-o]";

/// Word lexer with its compiled atom classifier
#[derive(Debug, Clone)]
pub struct Lexer {
    atom_start: Regex,
}

impl Lexer {
    /// Create a lexer
    pub fn new() -> Self {
        // Fixed literal pattern; compilation cannot fail.
        let atom_start = Regex::new(ATOM_START).expect("fixed pattern compiles");
        Self { atom_start }
    }

    /// Tokenize one input line
    pub fn tokenize(&self, input: &str) -> Result<Vec<Token>, LexError> {
        if let Some(offset) = memmem::find(input.as_bytes(), b"  ") {
            return Err(LexError::DoubleSpace { offset });
        }
        Ok(input
            .split_whitespace()
            .map(|word| {
                if self.atom_start.is_match(word) {
                    Token::atom(word)
                } else {
                    Token::oper(word)
                }
            })
            .collect())
    }
}

impl Default for Lexer {
    fn default() -> Self {
        Self::new()
    }
}

/// One-shot convenience around [`Lexer::tokenize`]
pub fn tokenize(input: &str) -> Result<Vec<Token>, LexError> {
    Lexer::new().tokenize(input)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token::TokenKind;

    #[test]
    fn test_atom_vs_oper() {
        let tokens = tokenize("1 + abc * _x q").unwrap();
        let kinds: Vec<TokenKind> = tokens.iter().map(|t| t.kind).collect();
        assert_eq!(
            kinds,
            vec![
                TokenKind::Atom,
                TokenKind::Oper,
                TokenKind::Atom,
                TokenKind::Oper,
                TokenKind::Atom,
                TokenKind::Oper,
            ]
        );
    }

    #[test]
    fn test_word_classified_by_first_char() {
        // `p1` starts with p (outside a-o): operator. `aaa` is an atom.
        let tokens = tokenize("p1 aaa q3").unwrap();
        assert_eq!(tokens[0].kind, TokenKind::Oper);
        assert_eq!(tokens[1].kind, TokenKind::Atom);
        assert_eq!(tokens[2].kind, TokenKind::Oper);
    }

    #[test]
    fn test_multi_char_operators_survive() {
        let tokens = tokenize("x <=> sizeof (..").unwrap();
        assert_eq!(tokens[1].text, "<=>");
        assert_eq!(tokens[2].text, "sizeof");
        assert_eq!(tokens[3].text, "(..");
    }

    #[test]
    fn test_double_space_fails() {
        let err = tokenize("a  b").unwrap_err();
        assert_eq!(err, LexError::DoubleSpace { offset: 1 });
    }

    #[test]
    fn test_empty_input() {
        assert!(tokenize("").unwrap().is_empty());
    }
}
