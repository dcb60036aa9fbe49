//! Operator algebra
//!
//! Operator shapes are a closed set, modeled as a tagged enum with
//! exhaustive case analysis. Each shape has a fixed arity and a pure
//! tree-building rule; the parsers branch on the variant tag only.
//!
//! Shapes are grouped into precedence [`Level`]s by the grammar builder.
//! Levels are totally ordered by their integer precedence, with
//! right-to-left associativity breaking the (self-)tie.

use crate::tree::Node;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Shared instance of the unnamed infix, used for hallucinated frames
pub(crate) static CONCAT_OP: Op = Op::Infix { name: None };

/// Associativity of a precedence level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Assoc {
    /// No associativity (sentinel levels only)
    None,
    /// `a + b + c` parses as `(a + b) + c`
    LeftToRight,
    /// `a . b . c` parses as `a . (b . c)`
    RightToLeft,
    /// `a + b + c` parses as one n-ary node `a + b + c`
    Flat,
}

/// An operator shape
///
/// The `to_node` rule of each variant determines the children it
/// contributes before the result is renamed to its level's name:
///
/// | Variant             | Arity | Children produced              |
/// |---------------------|-------|--------------------------------|
/// | `Prefix`            | 1     | `[name, arg]`                  |
/// | `PrefixBracketed`   | 2     | `[left, inner, right, arg]`    |
/// | `TransparentBrackets` | 0   | none (inner atom passes through) |
/// | `Infix`             | 2     | `[arg1, name, arg2]`           |
/// | `Postfix`           | 1     | `[arg, name]`                  |
/// | `PostfixBracketed`  | 2     | `[arg1, left, arg2, right]`    |
/// | `Ternary`           | 3     | `[arg1, first, arg2, second, arg3]` |
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Op {
    /// `- x`
    Prefix {
        /// Operator spelling
        name: String,
    },

    /// `( t ) x`: a bracketed head applied to a following operand
    PrefixBracketed {
        /// Left bracket spelling
        left: String,
        /// Right bracket spelling
        right: String,
    },

    /// `( x )`: grouping that leaves no node in the tree
    TransparentBrackets {
        /// Left bracket spelling
        left: String,
        /// Right bracket spelling
        right: String,
    },

    /// `x + y`; an unnamed infix is the implicit-concatenation operator
    Infix {
        /// Operator spelling; `None` for implicit concatenation
        name: Option<String>,
    },

    /// `x !`
    Postfix {
        /// Operator spelling
        name: String,
    },

    /// `x [ i ]`: a bracketed tail applied to a preceding operand
    PostfixBracketed {
        /// Left bracket spelling
        left: String,
        /// Right bracket spelling
        right: String,
    },

    /// `c ? x : y`
    Ternary {
        /// Spelling opening the middle operand
        first: String,
        /// Spelling closing the middle operand
        second: String,
    },
}

impl Op {
    /// Shorthand for a [`Op::Prefix`]
    pub fn prefix(name: impl Into<String>) -> Self {
        Op::Prefix { name: name.into() }
    }

    /// Shorthand for a [`Op::PrefixBracketed`]
    pub fn prefix_bracketed(left: impl Into<String>, right: impl Into<String>) -> Self {
        Op::PrefixBracketed {
            left: left.into(),
            right: right.into(),
        }
    }

    /// Shorthand for a named [`Op::Infix`]
    pub fn infix(name: impl Into<String>) -> Self {
        Op::Infix {
            name: Some(name.into()),
        }
    }

    /// Shorthand for the unnamed [`Op::Infix`] (implicit concatenation)
    pub fn concat() -> Self {
        Op::Infix { name: None }
    }

    /// Shorthand for a [`Op::Postfix`]
    pub fn postfix(name: impl Into<String>) -> Self {
        Op::Postfix { name: name.into() }
    }

    /// Shorthand for a [`Op::PostfixBracketed`]
    pub fn postfix_bracketed(left: impl Into<String>, right: impl Into<String>) -> Self {
        Op::PostfixBracketed {
            left: left.into(),
            right: right.into(),
        }
    }

    /// Shorthand for a [`Op::Ternary`]
    pub fn ternary(first: impl Into<String>, second: impl Into<String>) -> Self {
        Op::Ternary {
            first: first.into(),
            second: second.into(),
        }
    }

    /// Number of operands the shape consumes from the atom stack
    #[inline]
    pub fn arity(&self) -> usize {
        match self {
            Op::Prefix { .. } | Op::Postfix { .. } => 1,
            Op::PrefixBracketed { .. } | Op::Infix { .. } | Op::PostfixBracketed { .. } => 2,
            Op::TransparentBrackets { .. } => 0,
            Op::Ternary { .. } => 3,
        }
    }

    /// Whether this shape may appear in prefix (operand) position
    #[inline]
    pub fn is_prefix_shape(&self) -> bool {
        matches!(
            self,
            Op::Prefix { .. } | Op::PrefixBracketed { .. } | Op::TransparentBrackets { .. }
        )
    }

    /// The spelling this shape is looked up under, if it has one
    ///
    /// Bracketed shapes are looked up under their left spelling; the
    /// unnamed infix has no spelling at all.
    pub fn lookup_spelling(&self) -> Option<&str> {
        match self {
            Op::Prefix { name } | Op::Postfix { name } => Some(name),
            Op::PrefixBracketed { left, .. }
            | Op::TransparentBrackets { left, .. }
            | Op::PostfixBracketed { left, .. } => Some(left),
            Op::Infix { name } => name.as_deref(),
            Op::Ternary { first, .. } => Some(first),
        }
    }

    /// The closing spelling this shape registers as a right bracket
    pub fn right_bracket(&self) -> Option<&str> {
        match self {
            Op::PrefixBracketed { right, .. }
            | Op::TransparentBrackets { right, .. }
            | Op::PostfixBracketed { right, .. } => Some(right),
            Op::Ternary { second, .. } => Some(second),
            _ => None,
        }
    }

    /// Build the (still unnamed) result node over exactly `arity` operands
    ///
    /// The caller renames the result to the level name afterwards. The
    /// operand count is validated by the parsers before this is invoked.
    pub fn to_node(&self, args: Vec<Node>) -> Node {
        debug_assert_eq!(args.len(), self.arity(), "operand count must match arity");
        let mut args = args.into_iter();
        let mut arg = move || args.next().unwrap_or_default();
        match self {
            Op::Prefix { name } => Node::branch(vec![Node::leaf(name), arg()]),
            Op::PrefixBracketed { left, right } => {
                let inner = arg();
                let operand = arg();
                Node::branch(vec![Node::leaf(left), inner, Node::leaf(right), operand])
            }
            Op::TransparentBrackets { .. } => {
                debug_assert!(false, "transparent brackets build no node");
                Node::default()
            }
            Op::Infix { name } => {
                let lhs = arg();
                let rhs = arg();
                Node::branch(vec![lhs, Node::from_label(name.clone()), rhs])
            }
            Op::Postfix { name } => Node::branch(vec![arg(), Node::leaf(name)]),
            Op::PostfixBracketed { left, right } => {
                let operand = arg();
                let inner = arg();
                Node::branch(vec![operand, Node::leaf(left), inner, Node::leaf(right)])
            }
            Op::Ternary { first, second } => {
                let lhs = arg();
                let mid = arg();
                let rhs = arg();
                Node::branch(vec![
                    lhs,
                    Node::leaf(first),
                    mid,
                    Node::leaf(second),
                    rhs,
                ])
            }
        }
    }
}

/// A precedence/associativity class of operators
///
/// Produced by the grammar builder; larger `prec` binds tighter. The
/// transparent-bracket sentinel sits above every user level.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Level {
    /// Level name; composite nodes built at this level carry it
    pub name: String,
    /// Integer precedence assigned by the builder
    pub prec: i32,
    /// Associativity shared by all operators of the level
    pub assoc: Assoc,
}

impl Level {
    /// Create a level descriptor
    #[inline]
    pub fn new(name: impl Into<String>, prec: i32, assoc: Assoc) -> Self {
        Self {
            name: name.into(),
            prec,
            assoc,
        }
    }

    /// The strict order used by the collapse rule
    ///
    /// `self` binds looser than `other` iff its precedence is smaller, or
    /// the precedences are equal and the shared associativity is
    /// right-to-left (so an equal right-to-left operator does not collapse
    /// the one already on the stack).
    pub fn binds_looser_than(&self, other: &Level) -> bool {
        if self.prec != other.prec {
            return self.prec < other.prec;
        }
        debug_assert_eq!(
            self.assoc, other.assoc,
            "equal-precedence levels must share associativity"
        );
        self.assoc == Assoc::RightToLeft
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.name, self.prec)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_arity() {
        assert_eq!(Op::Prefix { name: "-".into() }.arity(), 1);
        assert_eq!(Op::Infix { name: None }.arity(), 2);
        assert_eq!(
            Op::Ternary {
                first: "?".into(),
                second: ":".into()
            }
            .arity(),
            3
        );
        assert_eq!(
            Op::TransparentBrackets {
                left: "(".into(),
                right: ")".into()
            }
            .arity(),
            0
        );
    }

    #[test]
    fn test_prefix_to_node() {
        let op = Op::Prefix { name: "-".into() };
        let node = op.to_node(vec![Node::leaf("9")]);
        assert_eq!(node.children.len(), 2);
        assert_eq!(node.children[0], Node::leaf("-"));
    }

    #[test]
    fn test_infix_to_node_unnamed() {
        let op = Op::Infix { name: None };
        let node = op.to_node(vec![Node::leaf("a"), Node::leaf("b")]);
        assert_eq!(node.children[1], Node::concat_sentinel());
    }

    #[test]
    fn test_postfix_bracketed_to_node() {
        let op = Op::PostfixBracketed {
            left: "[".into(),
            right: "]".into(),
        };
        let node = op.to_node(vec![Node::leaf("a"), Node::leaf("0")]);
        let mut named = node;
        named.name = Some("sqb".to_string());
        assert_eq!(named.render(), "sqb{ a [ 0 ] }");
    }

    #[test]
    fn test_ternary_to_node() {
        let op = Op::Ternary {
            first: "?".into(),
            second: ":".into(),
        };
        let mut node = op.to_node(vec![Node::leaf("a"), Node::leaf("b"), Node::leaf("c")]);
        node.name = Some("ter".to_string());
        assert_eq!(node.render(), "ter{ a ? b : c }");
    }

    #[test]
    fn test_lookup_spelling_and_right_bracket() {
        let op = Op::Ternary {
            first: "?".into(),
            second: ":".into(),
        };
        assert_eq!(op.lookup_spelling(), Some("?"));
        assert_eq!(op.right_bracket(), Some(":"));

        let cat = Op::Infix { name: None };
        assert_eq!(cat.lookup_spelling(), None);
        assert_eq!(cat.right_bracket(), None);
    }

    #[test]
    fn test_level_ordering() {
        let lo = Level::new("add", 1, Assoc::LeftToRight);
        let hi = Level::new("mul", 2, Assoc::LeftToRight);
        assert!(lo.binds_looser_than(&hi));
        assert!(!hi.binds_looser_than(&lo));
    }

    #[test]
    fn test_level_equal_rtl_is_looser() {
        let a = Level::new("cal", 3, Assoc::RightToLeft);
        assert!(a.binds_looser_than(&a));

        let b = Level::new("add", 3, Assoc::LeftToRight);
        assert!(!b.binds_looser_than(&b));

        let c = Level::new("add", 3, Assoc::Flat);
        assert!(!c.binds_looser_than(&c));
    }
}
