//! Reference parser
//!
//! An independent implementation of the same operator language, used as a
//! differential oracle for the shunting-yard driver. It first classifies
//! the token stream into primaries and operator items (resolving every
//! bracketed form recursively), then reduces the item list one precedence
//! level at a time, from tightest-binding to loosest, by firing small
//! fixed-width windows in the direction given by the level's
//! associativity. Every reduction strictly shrinks the list; the input is
//! accepted exactly when a single primary remains.

use crate::error::ParseError;
use crate::grammar::Grammar;
use crate::operator::{Assoc, Level, Op, CONCAT_OP};
use crate::token::{Token, TokenKind};
use crate::tree::Node;

/// A completed sub-expression
#[derive(Debug, Clone)]
struct Primary {
    node: Node,
    /// Whether a FLAT merge may still extend the node
    flat: bool,
    /// Token index the sub-expression starts at, for diagnostics
    pos: usize,
}

/// An unresolved operator, with any embedded sub-expression already reduced
struct OperItem<'g> {
    op: &'g Op,
    level: &'g Level,
    /// Inner tree of a bracketed shape or ternary middle
    inner: Option<Node>,
    /// Spelling for diagnostics; empty for hallucinated concat
    text: String,
    /// Token index of the operator's first token
    pos: usize,
}

enum Item<'g> {
    Primary(Primary),
    Oper(OperItem<'g>),
}

struct Reducer<'g, 't> {
    grammar: &'g Grammar,
    tokens: &'t [Token],
    index: usize,
}

impl<'g, 't> Reducer<'g, 't> {
    fn new(grammar: &'g Grammar, tokens: &'t [Token]) -> Self {
        Self {
            grammar,
            tokens,
            index: 0,
        }
    }

    /// Classify and fully reduce one expression, stopping before any
    /// right-bracket token
    fn parse_expr(&mut self) -> Result<Primary, ParseError> {
        let items = self.classify_run()?;
        reduce_items(self.grammar, items, self.index)
    }

    /// Reduce a bracketed sub-expression; the cursor is already past the
    /// left bracket and ends up past the right one
    fn bracketed(&mut self, right: &str) -> Result<Primary, ParseError> {
        let inner = self.parse_expr()?;
        match self.tokens.get(self.index) {
            Some(token) if token.text == right => {
                self.index += 1;
                Ok(inner)
            }
            found => Err(ParseError::BracketMismatch {
                expected: right.to_string(),
                found: found.map(|token| token.text.clone()),
                position: self.index,
            }),
        }
    }

    /// Turn tokens into an item list, resolving bracketed forms
    ///
    /// The running `postfix_mode` flag plays the role of the driver's
    /// parse mode: false while an operand is expected, true once one is
    /// complete.
    fn classify_run(&mut self) -> Result<Vec<Item<'g>>, ParseError> {
        let mut items: Vec<Item<'g>> = Vec::new();
        let mut postfix_mode = false;

        while self.index < self.tokens.len() {
            let token = &self.tokens[self.index];
            match token.kind {
                TokenKind::Atom => {
                    if !postfix_mode {
                        items.push(Item::Primary(Primary {
                            node: Node::leaf(&token.text),
                            flat: true,
                            pos: self.index,
                        }));
                        postfix_mode = true;
                        self.index += 1;
                        continue;
                    }
                    if let Some(level) = self.grammar.concat_level() {
                        items.push(Item::Oper(OperItem {
                            op: &CONCAT_OP,
                            level,
                            inner: None,
                            text: String::new(),
                            pos: self.index,
                        }));
                        postfix_mode = false;
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

                    if postfix_mode {
                        if let Some(level) = self.grammar.concat_level() {
                            let purely_prefix = entry.prefix.is_some() && entry.regular.is_none();
                            if purely_prefix || entry.transparent_brackets().is_some() {
                                items.push(Item::Oper(OperItem {
                                    op: &CONCAT_OP,
                                    level,
                                    inner: None,
                                    text: String::new(),
                                    pos: self.index,
                                }));
                                postfix_mode = false;
                                continue;
                            }
                        }
                    }

                    if !postfix_mode {
                        if let Some((_, right)) = entry.transparent_brackets() {
                            self.index += 1;
                            let inner = self.bracketed(right)?;
                            items.push(Item::Primary(inner));
                            postfix_mode = true;
                            continue;
                        }

                        let binding = entry.prefix.as_ref().ok_or_else(|| {
                            ParseError::UnexpectedToken {
                                text: token.text.clone(),
                                position: self.index,
                            }
                        })?;
                        let level = self.grammar.level(binding.level);
                        let pos = self.index;
                        match &binding.op {
                            Op::Prefix { .. } => {
                                self.index += 1;
                                items.push(Item::Oper(OperItem {
                                    op: &binding.op,
                                    level,
                                    inner: None,
                                    text: token.text.clone(),
                                    pos,
                                }));
                            }
                            Op::PrefixBracketed { right, .. } => {
                                self.index += 1;
                                let inner = self.bracketed(right)?;
                                items.push(Item::Oper(OperItem {
                                    op: &binding.op,
                                    level,
                                    inner: Some(inner.node),
                                    text: token.text.clone(),
                                    pos,
                                }));
                            }
                            _ => {
                                return Err(ParseError::inconsistent(
                                    "non-prefix shape registered in prefix position",
                                    pos,
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
                        let pos = self.index;
                        match &binding.op {
                            Op::Postfix { .. } => {
                                self.index += 1;
                                items.push(Item::Oper(OperItem {
                                    op: &binding.op,
                                    level,
                                    inner: None,
                                    text: token.text.clone(),
                                    pos,
                                }));
                            }
                            Op::PostfixBracketed { right, .. } => {
                                self.index += 1;
                                let inner = self.bracketed(right)?;
                                items.push(Item::Oper(OperItem {
                                    op: &binding.op,
                                    level,
                                    inner: Some(inner.node),
                                    text: token.text.clone(),
                                    pos,
                                }));
                            }
                            Op::Infix { .. } => {
                                self.index += 1;
                                items.push(Item::Oper(OperItem {
                                    op: &binding.op,
                                    level,
                                    inner: None,
                                    text: token.text.clone(),
                                    pos,
                                }));
                                postfix_mode = false;
                            }
                            Op::Ternary { second, .. } => {
                                self.index += 1;
                                let middle = self.bracketed(second)?;
                                items.push(Item::Oper(OperItem {
                                    op: &binding.op,
                                    level,
                                    inner: Some(middle.node),
                                    text: token.text.clone(),
                                    pos,
                                }));
                                postfix_mode = false;
                            }
                            _ => {
                                return Err(ParseError::inconsistent(
                                    "prefix shape registered in infix position",
                                    pos,
                                ))
                            }
                        }
                    }
                }
            }
        }

        Ok(items)
    }
}

/// One firing window
struct Firing {
    start: usize,
    width: usize,
    result: Primary,
}

/// Try the windows starting at `start` for the given level
fn try_window(items: &[Item<'_>], start: usize, level: &Level) -> Result<Option<Firing>, ParseError> {
    match &items[start] {
        Item::Oper(oper) => {
            // 2-wide prefix window: operator then a complete operand.
            if oper.level.prec != level.prec
                || !matches!(oper.op, Op::Prefix { .. } | Op::PrefixBracketed { .. })
            {
                return Ok(None);
            }
            let operand = match items.get(start + 1) {
                Some(Item::Primary(primary)) => primary,
                _ => return Ok(None),
            };
            let mut args = Vec::with_capacity(2);
            if let Some(inner) = &oper.inner {
                args.push(inner.clone());
            }
            args.push(operand.node.clone());
            let mut node = oper.op.to_node(args);
            node.name = Some(level.name.clone());
            Ok(Some(Firing {
                start,
                width: 2,
                result: Primary {
                    node,
                    flat: false,
                    pos: oper.pos,
                },
            }))
        }
        Item::Primary(lhs) => {
            let oper = match items.get(start + 1) {
                Some(Item::Oper(oper)) if oper.level.prec == level.prec => oper,
                _ => return Ok(None),
            };
            match oper.op {
                // 2-wide postfix window.
                Op::Postfix { .. } | Op::PostfixBracketed { .. } => {
                    let mut args = Vec::with_capacity(2);
                    args.push(lhs.node.clone());
                    if let Some(inner) = &oper.inner {
                        args.push(inner.clone());
                    }
                    let mut node = oper.op.to_node(args);
                    node.name = Some(level.name.clone());
                    Ok(Some(Firing {
                        start,
                        width: 2,
                        result: Primary {
                            node,
                            flat: false,
                            pos: lhs.pos,
                        },
                    }))
                }
                // 3-wide infix and ternary windows.
                Op::Infix { name } => {
                    let rhs = match items.get(start + 2) {
                        Some(Item::Primary(primary)) => primary,
                        _ => return Ok(None),
                    };
                    let (node, flat) = if level.assoc == Assoc::Flat && lhs.flat {
                        let mut base = lhs.node.clone();
                        let node = if base.children.is_empty() {
                            Node::branch(vec![
                                base,
                                Node::from_label(name.clone()),
                                rhs.node.clone(),
                            ])
                        } else {
                            if base.children.len() < 3 || base.children.len() % 2 == 0 {
                                return Err(ParseError::inconsistent(
                                    "malformed flat chain",
                                    lhs.pos,
                                ));
                            }
                            base.children.push(Node::from_label(name.clone()));
                            base.children.push(rhs.node.clone());
                            base
                        };
                        (node, true)
                    } else {
                        (
                            oper.op.to_node(vec![lhs.node.clone(), rhs.node.clone()]),
                            false,
                        )
                    };
                    let mut node = node;
                    node.name = Some(level.name.clone());
                    Ok(Some(Firing {
                        start,
                        width: 3,
                        result: Primary {
                            node,
                            flat,
                            pos: lhs.pos,
                        },
                    }))
                }
                Op::Ternary { .. } => {
                    let rhs = match items.get(start + 2) {
                        Some(Item::Primary(primary)) => primary,
                        _ => return Ok(None),
                    };
                    let middle = oper.inner.clone().unwrap_or_default();
                    let mut node =
                        oper.op
                            .to_node(vec![lhs.node.clone(), middle, rhs.node.clone()]);
                    node.name = Some(level.name.clone());
                    Ok(Some(Firing {
                        start,
                        width: 3,
                        result: Primary {
                            node,
                            flat: false,
                            pos: lhs.pos,
                        },
                    }))
                }
                _ => Ok(None),
            }
        }
    }
}

/// Run every window of one level to exhaustion
fn reduce_level(items: &mut Vec<Item<'_>>, level: &Level) -> Result<(), ParseError> {
    loop {
        let mut firing = None;
        if level.assoc == Assoc::RightToLeft {
            for start in (0..items.len()).rev() {
                if let Some(found) = try_window(items, start, level)? {
                    firing = Some(found);
                    break;
                }
            }
        } else {
            for start in 0..items.len() {
                if let Some(found) = try_window(items, start, level)? {
                    firing = Some(found);
                    break;
                }
            }
        }
        match firing {
            Some(firing) => {
                items.splice(
                    firing.start..firing.start + firing.width,
                    std::iter::once(Item::Primary(firing.result)),
                );
            }
            None => return Ok(()),
        }
    }
}

/// Reduce an item list to a single primary
fn reduce_items<'g>(
    grammar: &'g Grammar,
    mut items: Vec<Item<'g>>,
    end_position: usize,
) -> Result<Primary, ParseError> {
    // Tightest-binding level first; the sentinel never reduces anything.
    let mut order: Vec<&Level> = grammar
        .levels()
        .iter()
        .filter(|level| level.assoc != Assoc::None)
        .collect();
    order.sort_by(|a, b| b.prec.cmp(&a.prec));

    for level in order {
        reduce_level(&mut items, level)?;
    }

    let mut drain = items.into_iter();
    match (drain.next(), drain.next()) {
        (Some(Item::Primary(primary)), None) => Ok(primary),
        (None, _) => Err(ParseError::UnexpectedEnd {
            position: end_position,
        }),
        (first, second) => {
            // Report the first surviving operator item.
            for item in [first, second].into_iter().flatten().chain(drain) {
                if let Item::Oper(oper) = item {
                    return Err(ParseError::UnexpectedToken {
                        text: oper.text,
                        position: oper.pos,
                    });
                }
            }
            Err(ParseError::inconsistent(
                "window reduction left multiple primaries",
                end_position,
            ))
        }
    }
}

/// Parse a token stream by iterated window reduction
///
/// Accepts and rejects the same inputs as [`crate::shunting_yard::parse`]
/// and produces an identically rendered tree on every accepted input.
pub fn parse(grammar: &Grammar, tokens: &[Token]) -> Result<Node, ParseError> {
    let mut reducer = Reducer::new(grammar, tokens);
    let primary = reducer.parse_expr()?;
    if reducer.index != tokens.len() {
        return Err(ParseError::UnexpectedToken {
            text: tokens
                .get(reducer.index)
                .map(|token| token.text.clone())
                .unwrap_or_default(),
            position: reducer.index,
        });
    }
    Ok(primary.node)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grammar::GrammarBuilder;
    use crate::lexer::tokenize;

    fn infix(name: &str) -> Op {
        Op::Infix {
            name: Some(name.to_string()),
        }
    }

    fn render(grammar: &Grammar, input: &str) -> Result<String, ParseError> {
        let tokens = tokenize(input).unwrap();
        parse(grammar, &tokens).map(|node| node.render())
    }

    #[test]
    fn test_single_atom() {
        let grammar = GrammarBuilder::new().finish().unwrap();
        assert_eq!(render(&grammar, "1").unwrap(), "1");
    }

    #[test]
    fn test_precedence_and_flat() {
        let grammar = GrammarBuilder::new()
            .level_ltr("mul", vec![infix("*")])
            .level_flat("add", vec![infix("+")])
            .finish()
            .unwrap();
        assert_eq!(
            render(&grammar, "1 + 2 * 3 + 4").unwrap(),
            "add{ 1 + mul{ 2 * 3 } + 4 }"
        );
    }

    #[test]
    fn test_rtl_infix() {
        let grammar = GrammarBuilder::new()
            .level_rtl("cal", vec![infix(".")])
            .finish()
            .unwrap();
        assert_eq!(
            render(&grammar, "f . g . h").unwrap(),
            "cal{ f . cal{ g . h } }"
        );
    }

    #[test]
    fn test_ltr_ternary_chains_left() {
        let grammar = GrammarBuilder::new()
            .level_ltr(
                "ter",
                vec![Op::Ternary {
                    first: "?".to_string(),
                    second: ":".to_string(),
                }],
            )
            .finish()
            .unwrap();
        assert_eq!(
            render(&grammar, "a ? b : c ? d : e").unwrap(),
            "ter{ ter{ a ? b : c } ? d : e }"
        );
        assert_eq!(
            render(&grammar, "a ? b ? c : d : e").unwrap(),
            "ter{ a ? ter{ b ? c : d } : e }"
        );
    }

    #[test]
    fn test_mismatched_prefix_postfix_levels_rejected() {
        let grammar = GrammarBuilder::new()
            .level_ltr(
                "l1",
                vec![Op::Postfix {
                    name: "q2".to_string(),
                }],
            )
            .level_ltr(
                "l2",
                vec![Op::Postfix {
                    name: "q1".to_string(),
                }],
            )
            .finish()
            .unwrap();
        assert_eq!(render(&grammar, "a q2 q1").unwrap(), "l2{ l1{ a q2 } q1 }");
        assert!(render(&grammar, "a q1 q2").is_err());
    }

    #[test]
    fn test_trailing_right_bracket_rejected() {
        let grammar = GrammarBuilder::new().finish().unwrap();
        assert!(matches!(
            render(&grammar, "a )").unwrap_err(),
            ParseError::UnexpectedToken { position: 1, .. }
        ));
    }

    #[test]
    fn test_concat_classification() {
        let grammar = GrammarBuilder::new()
            .level_rtl(
                "prf",
                vec![Op::PrefixBracketed {
                    left: "(".to_string(),
                    right: ")".to_string(),
                }],
            )
            .level_ltr("cat", vec![Op::Infix { name: None }])
            .finish();
        // `( )` collides with the default transparent pair.
        assert!(grammar.is_err());

        let grammar = GrammarBuilder::with_brackets("(..", "..)")
            .level_rtl(
                "prf",
                vec![Op::PrefixBracketed {
                    left: "(".to_string(),
                    right: ")".to_string(),
                }],
            )
            .level_ltr("cat", vec![Op::Infix { name: None }])
            .finish()
            .unwrap();
        assert_eq!(
            render(&grammar, "a ( b ) c").unwrap(),
            "cat{ a CONCAT prf{ ( b ) c } }"
        );
    }
}
