//! Parallel batch parsing
//!
//! A compiled [`Grammar`](crate::grammar::Grammar) is immutable and holds
//! no per-parse state, so independent token streams can be parsed
//! concurrently against one grammar. With the `parallel` feature enabled
//! this uses rayon's work-stealing pool; without it the same function
//! parses sequentially.
//!
//! ```toml
//! [dependencies]
//! mixfix = { version = "0.1", features = ["parallel"] }
//! ```

use crate::error::ParseError;
use crate::grammar::Grammar;
use crate::shunting_yard;
use crate::token::Token;
use crate::tree::Node;

#[cfg(feature = "rayon")]
use rayon::prelude::*;

/// Parse multiple token streams against one grammar
///
/// Results come back in input order, one per stream.
#[cfg(feature = "rayon")]
pub fn parse_batch_parallel(
    grammar: &Grammar,
    streams: &[Vec<Token>],
) -> Vec<Result<Node, ParseError>> {
    streams
        .par_iter()
        .map(|tokens| shunting_yard::parse(grammar, tokens))
        .collect()
}

/// Parse multiple token streams against one grammar
///
/// Sequential fallback used when the `parallel` feature is not enabled.
#[cfg(not(feature = "rayon"))]
pub fn parse_batch_parallel(
    grammar: &Grammar,
    streams: &[Vec<Token>],
) -> Vec<Result<Node, ParseError>> {
    streams
        .iter()
        .map(|tokens| shunting_yard::parse(grammar, tokens))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grammar::GrammarBuilder;
    use crate::lexer::tokenize;
    use crate::operator::Op;

    #[test]
    fn test_batch_preserves_order() {
        let grammar = GrammarBuilder::new()
            .level_flat(
                "add",
                vec![Op::Infix {
                    name: Some("+".to_string()),
                }],
            )
            .finish()
            .unwrap();

        let streams: Vec<Vec<Token>> = ["1", "1 + 2", "1 +", "1 + 2 + 3"]
            .iter()
            .map(|input| tokenize(input).unwrap())
            .collect();

        let results = parse_batch_parallel(&grammar, &streams);
        assert_eq!(results.len(), 4);
        assert_eq!(results[0].as_ref().unwrap().render(), "1");
        assert_eq!(results[1].as_ref().unwrap().render(), "add{ 1 + 2 }");
        assert!(results[2].is_err());
        assert_eq!(
            results[3].as_ref().unwrap().render(),
            "add{ 1 + 2 + 3 }"
        );
    }
}
