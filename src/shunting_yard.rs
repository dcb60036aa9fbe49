//! Shunting-yard driver
//!
//! The main expression parser: a two-stack state machine over two modes
//! (operand expected / operator expected) with recursive descent into
//! bracketed sub-expressions. Deferred operators wait on the operator
//! stack until an arriving level collapses them; completed sub-expressions
//! carry their source-token span so every collapse can verify that the
//! operator's own tokens and its operands tile one contiguous range.
//! Ill-formed chains that mix postfix and prefix across a level surface as
//! span or bound violations instead of silently mis-parsing.

use crate::error::ParseError;
use crate::grammar::Grammar;
use crate::operator::{Assoc, Level, Op, CONCAT_OP};
use crate::token::{Token, TokenKind};
use crate::tree::Node;

#[cfg(not(feature = "logging"))]
macro_rules! log_debug {
    ($($arg:tt)*) => {};
}

#[cfg(feature = "logging")]
macro_rules! log_debug {
    ($($arg:tt)*) => { log::debug!($($arg)*) };
}

/// Parse mode of the driver
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ParseMode {
    /// An atom is naturally expected; a prefix operator may also appear.
    Atom,
    /// An infix operator is naturally expected; a postfix operator may
    /// also appear. With a concat level, an atom or prefix may appear too,
    /// in which case a concat operator is hallucinated.
    Infix,
}

/// A deferred operator awaiting its operands
struct OperFrame<'g> {
    op: &'g Op,
    level: &'g Level,
    /// Positions of the operator's own tokens
    token_indices: Vec<usize>,
    /// Lower bound on the combined span, when the shape implies one
    min_token_index: Option<usize>,
    /// Upper bound on the combined span, when the shape implies one
    max_token_index: Option<usize>,
}

/// A completed sub-expression with its source-token span
#[derive(Debug, Clone)]
struct AtomFrame {
    node: Node,
    /// Whether the node may still be extended by a FLAT merge
    flat: bool,
    token_begin: usize,
    token_end: usize,
}

/// Merge operator token positions and operand spans into one range
///
/// Fails unless the sorted pieces tile a contiguous `[begin, end)`.
fn consistent_range(
    indices: &[usize],
    spans: &[(usize, usize)],
    position: usize,
) -> Result<(usize, usize), ParseError> {
    let mut ranges: Vec<(usize, usize)> = indices.iter().map(|&k| (k, k + 1)).collect();
    ranges.extend_from_slice(spans);
    ranges.sort_unstable();
    let (first, last) = match (ranges.first(), ranges.last()) {
        (Some(first), Some(last)) => (first.0, last.1),
        _ => return Err(ParseError::inconsistent("empty token range", position)),
    };
    for pair in ranges.windows(2) {
        if pair[0].1 != pair[1].0 {
            return Err(ParseError::inconsistent(
                format!(
                    "non-adjacent token spans [{}, {}) and [{}, {})",
                    pair[0].0, pair[0].1, pair[1].0, pair[1].1
                ),
                position,
            ));
        }
    }
    Ok((first, last))
}

struct ExprParser<'g, 't> {
    grammar: &'g Grammar,
    tokens: &'t [Token],
    oper_stack: Vec<OperFrame<'g>>,
    atom_stack: Vec<AtomFrame>,
    mode: ParseMode,
    index: usize,
}

impl<'g, 't> ExprParser<'g, 't> {
    fn new(grammar: &'g Grammar, tokens: &'t [Token], begin: usize) -> Self {
        Self {
            grammar,
            tokens,
            oper_stack: Vec::new(),
            atom_stack: Vec::new(),
            mode: ParseMode::Atom,
            index: begin,
        }
    }

    /// Collapse the operator stack against an arriving level
    ///
    /// Pops every deferred operator that does not bind strictly looser
    /// than `target`, materializing its subtree and re-checking the span
    /// invariants on the way.
    fn stack_pop(&mut self, target: &Level) -> Result<(), ParseError> {
        while self
            .oper_stack
            .last()
            .is_some_and(|top| !top.level.binds_looser_than(target))
        {
            let frame = match self.oper_stack.pop() {
                Some(frame) => frame,
                None => break,
            };
            log_debug!(
                "collapse {} against {}",
                frame.level.name,
                target.name
            );

            let arity = frame.op.arity();
            if self.atom_stack.len() < arity {
                return Err(ParseError::UnexpectedEnd {
                    position: self.index,
                });
            }
            let split = self.atom_stack.len() - arity;
            let spans: Vec<(usize, usize)> = self.atom_stack[split..]
                .iter()
                .map(|atom| (atom.token_begin, atom.token_end))
                .collect();
            let (begin, end) = consistent_range(&frame.token_indices, &spans, self.index)?;
            if frame.min_token_index.is_some_and(|min| min > begin) {
                return Err(ParseError::inconsistent(
                    "operand extends left of its prefix operator",
                    begin,
                ));
            }
            if frame.max_token_index.is_some_and(|max| end > max) {
                return Err(ParseError::inconsistent(
                    "operand extends right of its postfix operator",
                    end,
                ));
            }

            let mut operands = self.atom_stack.split_off(split);
            let flat_merge = frame.level.assoc == Assoc::Flat
                && operands.first().is_some_and(|atom| atom.flat);
            let (node, flat) = match (frame.op, flat_merge) {
                // The merge applies only to a binary infix whose left
                // operand may still be extended.
                (Op::Infix { name }, true) => {
                    let add = operands.pop().map(|atom| atom.node).unwrap_or_default();
                    let base = operands.pop().map(|atom| atom.node).unwrap_or_default();
                    let node = if base.children.is_empty() {
                        Node::branch(vec![base, Node::from_label(name.clone()), add])
                    } else {
                        // An existing chain interleaves operands and
                        // operator tokens: odd child count >= 3.
                        let mut base = base;
                        if base.children.len() < 3 || base.children.len() % 2 == 0 {
                            return Err(ParseError::inconsistent(
                                "malformed flat chain",
                                begin,
                            ));
                        }
                        base.children.push(Node::from_label(name.clone()));
                        base.children.push(add);
                        base
                    };
                    (node, true)
                }
                _ => {
                    let args: Vec<Node> = operands.into_iter().map(|atom| atom.node).collect();
                    (frame.op.to_node(args), false)
                }
            };

            let mut node = node;
            node.name = Some(frame.level.name.clone());
            self.atom_stack.push(AtomFrame {
                node,
                flat,
                token_begin: begin,
                token_end: end,
            });
        }
        Ok(())
    }

    /// Insert an implicit concat operator without consuming a token
    fn hallucinate_concat(&mut self) -> Result<(), ParseError> {
        let level = match self.grammar.concat_level() {
            Some(level) => level,
            None => {
                return Err(ParseError::inconsistent(
                    "concat hallucinated without a concat level",
                    self.index,
                ))
            }
        };
        log_debug!("hallucinate concat at token {}", self.index);
        self.stack_pop(level)?;
        self.oper_stack.push(OperFrame {
            op: &CONCAT_OP,
            level,
            token_indices: Vec::new(),
            min_token_index: None,
            max_token_index: None,
        });
        self.mode = ParseMode::Atom;
        Ok(())
    }

    /// Parse a bracketed sub-expression
    ///
    /// The cursor sits on the left bracket. The recursion must stop
    /// exactly on the matching right spelling; the returned span is
    /// widened by one on each side to cover the brackets.
    fn handle_bracketed(&mut self, left: &str, right: &str) -> Result<AtomFrame, ParseError> {
        debug_assert_eq!(self.tokens[self.index].text, left);
        let inner = ExprParser::new(self.grammar, self.tokens, self.index + 1).run()?;
        match self.tokens.get(inner.token_end) {
            Some(token) if token.text == right => {}
            found => {
                return Err(ParseError::BracketMismatch {
                    expected: right.to_string(),
                    found: found.map(|token| token.text.clone()),
                    position: inner.token_end,
                })
            }
        }
        if inner.token_begin == 0 {
            return Err(ParseError::inconsistent(
                "bracketed span cannot include the left bracket",
                self.index,
            ));
        }
        self.index = inner.token_end + 1;
        Ok(AtomFrame {
            token_begin: inner.token_begin - 1,
            token_end: inner.token_end + 1,
            ..inner
        })
    }

    fn run(mut self) -> Result<AtomFrame, ParseError> {
        while self.index < self.tokens.len() {
            let token = &self.tokens[self.index];
            match token.kind {
                TokenKind::Atom => {
                    if self.mode == ParseMode::Atom {
                        self.atom_stack.push(AtomFrame {
                            node: Node::leaf(&token.text),
                            flat: true,
                            token_begin: self.index,
                            token_end: self.index + 1,
                        });
                        self.mode = ParseMode::Infix;
                        self.index += 1;
                        continue;
                    }
                    if self.grammar.has_concat() {
                        self.hallucinate_concat()?;
                        continue;
                    }
                    return Err(ParseError::UnexpectedToken {
                        text: token.text.clone(),
                        position: self.index,
                    });
                }
                TokenKind::Oper => {
                    let entry = self.grammar.lookup(&token.text).ok_or_else(|| {
                        ParseError::UnknownOperator {
                            spelling: token.text.clone(),
                            position: self.index,
                        }
                    })?;

                    if entry.is_right_bracket {
                        break;
                    }

                    if self.mode == ParseMode::Infix && self.grammar.has_concat() {
                        let purely_prefix = entry.prefix.is_some() && entry.regular.is_none();
                        if purely_prefix || entry.transparent_brackets().is_some() {
                            self.hallucinate_concat()?;
                            continue;
                        }
                    }

                    if self.mode == ParseMode::Atom {
                        if let Some((left, right)) = entry.transparent_brackets() {
                            let atom = self.handle_bracketed(left, right)?;
                            self.atom_stack.push(atom);
                            self.mode = ParseMode::Infix;
                            continue;
                        }

                        let binding = entry.prefix.as_ref().ok_or_else(|| {
                            ParseError::UnexpectedToken {
                                text: token.text.clone(),
                                position: self.index,
                            }
                        })?;
                        let level = self.grammar.level(binding.level);
                        self.stack_pop(level)?;

                        match &binding.op {
                            Op::Prefix { .. } => {
                                self.oper_stack.push(OperFrame {
                                    op: &binding.op,
                                    level,
                                    token_indices: vec![self.index],
                                    min_token_index: Some(self.index),
                                    max_token_index: None,
                                });
                                self.index += 1;
                            }
                            Op::PrefixBracketed { left, right } => {
                                let atom = self.handle_bracketed(left, right)?;
                                let min = Some(atom.token_begin);
                                self.atom_stack.push(atom);
                                self.oper_stack.push(OperFrame {
                                    op: &binding.op,
                                    level,
                                    token_indices: Vec::new(),
                                    min_token_index: min,
                                    max_token_index: None,
                                });
                            }
                            _ => {
                                return Err(ParseError::inconsistent(
                                    "non-prefix shape registered in prefix position",
                                    self.index,
                                ))
                            }
                        }
                    } else {
                        let binding = entry.regular.as_ref().ok_or_else(|| {
                            ParseError::UnexpectedToken {
                                text: token.text.clone(),
                                position: self.index,
                            }
                        })?;
                        let level = self.grammar.level(binding.level);
                        self.stack_pop(level)?;

                        match &binding.op {
                            Op::Postfix { .. } => {
                                self.oper_stack.push(OperFrame {
                                    op: &binding.op,
                                    level,
                                    token_indices: vec![self.index],
                                    min_token_index: None,
                                    max_token_index: Some(self.index + 1),
                                });
                                self.index += 1;
                            }
                            Op::PostfixBracketed { left, right } => {
                                let atom = self.handle_bracketed(left, right)?;
                                let max = Some(atom.token_end);
                                self.atom_stack.push(atom);
                                self.oper_stack.push(OperFrame {
                                    op: &binding.op,
                                    level,
                                    token_indices: Vec::new(),
                                    min_token_index: None,
                                    max_token_index: max,
                                });
                            }
                            Op::Infix { .. } => {
                                self.oper_stack.push(OperFrame {
                                    op: &binding.op,
                                    level,
                                    token_indices: vec![self.index],
                                    min_token_index: None,
                                    max_token_index: None,
                                });
                                self.mode = ParseMode::Atom;
                                self.index += 1;
                            }
                            Op::Ternary { first, second } => {
                                let atom = self.handle_bracketed(first, second)?;
                                self.atom_stack.push(atom);
                                self.oper_stack.push(OperFrame {
                                    op: &binding.op,
                                    level,
                                    token_indices: Vec::new(),
                                    min_token_index: None,
                                    max_token_index: None,
                                });
                                self.mode = ParseMode::Atom;
                            }
                            _ => {
                                return Err(ParseError::inconsistent(
                                    "prefix shape registered in infix position",
                                    self.index,
                                ))
                            }
                        }
                    }
                }
            }
        }

        let end_level = Level::new("END", -1, Assoc::None);
        self.stack_pop(&end_level)?;
        if !self.oper_stack.is_empty() {
            return Err(ParseError::inconsistent(
                "operator stack not empty after final collapse",
                self.index,
            ));
        }
        let atom = match self.atom_stack.pop() {
            Some(atom) => atom,
            None => {
                return Err(ParseError::UnexpectedEnd {
                    position: self.index,
                })
            }
        };
        if !self.atom_stack.is_empty() {
            return Err(ParseError::inconsistent(
                "atom stack not a singleton after final collapse",
                self.index,
            ));
        }
        Ok(atom)
    }
}

/// Parse a token stream into a result tree
///
/// The whole stream must be consumed; a parse that stops early (for
/// example on an unmatched right bracket) is an error.
///
/// # Example
///
/// ```rust
/// use mixfix::{lexer, shunting_yard, GrammarBuilder, Op};
///
/// let grammar = GrammarBuilder::new()
///     .level_ltr("mul", vec![Op::infix("*")])
///     .level_flat("add", vec![Op::infix("+")])
///     .finish()
///     .unwrap();
/// let tokens = lexer::tokenize("1 + 2 * 3 + 4").unwrap();
/// let tree = shunting_yard::parse(&grammar, &tokens).unwrap();
/// assert_eq!(tree.render(), "add{ 1 + mul{ 2 * 3 } + 4 }");
/// ```
pub fn parse(grammar: &Grammar, tokens: &[Token]) -> Result<Node, ParseError> {
    let atom = ExprParser::new(grammar, tokens, 0).run()?;
    if atom.token_begin != 0 || atom.token_end != tokens.len() {
        return Err(ParseError::UnexpectedToken {
            text: tokens
                .get(atom.token_end)
                .map(|token| token.text.clone())
                .unwrap_or_default(),
            position: atom.token_end,
        });
    }
    Ok(atom.node)
}
