//! Grammar definition and lookup
//!
//! A [`GrammarBuilder`] collects precedence levels, tightest-binding
//! first, and compiles them into an immutable [`Grammar`]: a lookup table
//! keyed by operator spelling plus the optional implicit-concatenation
//! level. The compiled grammar is shared read-only by all parses.
//!
//! Grammars can also be defined declaratively as JSON via [`GrammarSpec`]
//! and handed to [`GrammarBuilder::from_spec`].

use crate::operator::{Assoc, Level, Op};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Map type used for the spelling table
type LookupMap = hashbrown::HashMap<String, LookupEntry, ahash::RandomState>;

/// Errors detected while compiling a grammar
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GrammarError {
    /// A spelling was claimed twice in prefix position
    DuplicatePrefix {
        /// The contested spelling
        spelling: String,
    },

    /// A spelling was claimed twice in non-prefix position
    DuplicateRegular {
        /// The contested spelling
        spelling: String,
    },

    /// A right-bracket spelling collides with an operator role
    RightBracketConflict {
        /// The contested spelling
        spelling: String,
    },

    /// More than one unnamed infix across the grammar
    DuplicateConcat,

    /// A level was declared with the sentinel associativity
    SentinelAssociativity {
        /// Name of the offending level
        level: String,
    },
}

impl fmt::Display for GrammarError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GrammarError::DuplicatePrefix { spelling } => {
                write!(f, "spelling `{}` registered twice as prefix", spelling)
            }
            GrammarError::DuplicateRegular { spelling } => {
                write!(f, "spelling `{}` registered twice as infix/postfix", spelling)
            }
            GrammarError::RightBracketConflict { spelling } => {
                write!(
                    f,
                    "right bracket `{}` collides with an operator registration",
                    spelling
                )
            }
            GrammarError::DuplicateConcat => {
                write!(f, "more than one unnamed infix in the grammar")
            }
            GrammarError::SentinelAssociativity { level } => {
                write!(f, "level `{}` declared with sentinel associativity", level)
            }
        }
    }
}

impl std::error::Error for GrammarError {}

/// An operator together with the level it was registered at
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpBinding {
    /// The operator shape
    pub op: Op,
    /// Index of its level in the grammar's level table
    pub level: usize,
}

/// Everything the parsers need to know about one spelling
///
/// At most one of `regular` and `is_right_bracket` is set; `prefix` may
/// coexist with `regular` (`-` as both prefix and infix) but never with
/// `is_right_bracket`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LookupEntry {
    /// Binding used when the spelling appears in operand position
    pub prefix: Option<OpBinding>,
    /// Binding used when the spelling appears after a complete operand
    pub regular: Option<OpBinding>,
    /// Whether the spelling closes some bracketed form
    pub is_right_bracket: bool,
}

impl LookupEntry {
    /// The transparent bracket pair, if this spelling opens one
    pub fn transparent_brackets(&self) -> Option<(&str, &str)> {
        match &self.prefix {
            Some(OpBinding {
                op: Op::TransparentBrackets { left, right },
                ..
            }) => Some((left, right)),
            _ => None,
        }
    }

    fn register(&mut self, op: Op, level: usize, spelling: &str) -> Result<(), GrammarError> {
        if self.is_right_bracket {
            return Err(GrammarError::RightBracketConflict {
                spelling: spelling.to_string(),
            });
        }
        let slot = if op.is_prefix_shape() {
            &mut self.prefix
        } else {
            &mut self.regular
        };
        if slot.is_some() {
            return Err(if op.is_prefix_shape() {
                GrammarError::DuplicatePrefix {
                    spelling: spelling.to_string(),
                }
            } else {
                GrammarError::DuplicateRegular {
                    spelling: spelling.to_string(),
                }
            });
        }
        *slot = Some(OpBinding { op, level });
        Ok(())
    }

    fn register_right_bracket(&mut self, spelling: &str) -> Result<(), GrammarError> {
        if self.prefix.is_some() || self.regular.is_some() {
            return Err(GrammarError::RightBracketConflict {
                spelling: spelling.to_string(),
            });
        }
        self.is_right_bracket = true;
        Ok(())
    }
}

/// A compiled operator grammar
///
/// Immutable after [`GrammarBuilder::finish`]; safe to share read-only
/// across threads, so independent parses may run concurrently against one
/// value.
#[derive(Debug, Clone)]
pub struct Grammar {
    entries: LookupMap,
    levels: Vec<Level>,
    concat: Option<usize>,
}

impl Grammar {
    /// Look up a spelling; `None` means the spelling is unknown
    #[inline]
    pub fn lookup(&self, spelling: &str) -> Option<&LookupEntry> {
        self.entries.get(spelling)
    }

    /// The level a binding was registered at
    #[inline]
    pub fn level(&self, index: usize) -> &Level {
        &self.levels[index]
    }

    /// All levels, tightest-binding last in precedence value order
    #[inline]
    pub fn levels(&self) -> &[Level] {
        &self.levels
    }

    /// The implicit-concatenation level, if the grammar declares one
    #[inline]
    pub fn concat_level(&self) -> Option<&Level> {
        self.concat.map(|idx| &self.levels[idx])
    }

    /// Whether implicit concatenation is available
    #[inline]
    pub fn has_concat(&self) -> bool {
        self.concat.is_some()
    }

    fn add_op(&mut self, op: Op, level: usize) -> Result<(), GrammarError> {
        if let Op::Infix { name: None } = op {
            if self.concat.is_some() {
                return Err(GrammarError::DuplicateConcat);
            }
            self.concat = Some(level);
            return Ok(());
        }
        let right = op.right_bracket().map(str::to_string);
        let spelling = op.lookup_spelling().map(str::to_string);
        if let Some(spelling) = spelling {
            self.entries
                .entry(spelling.clone())
                .or_default()
                .register(op, level, &spelling)?;
        }
        if let Some(right) = right {
            self.entries
                .entry(right.clone())
                .or_default()
                .register_right_bracket(&right)?;
        }
        Ok(())
    }
}

/// A level as collected by the builder, before precedence assignment
#[derive(Debug, Clone)]
struct PendingLevel {
    name: String,
    assoc: Assoc,
    ops: Vec<Op>,
}

/// Builder for [`Grammar`] values
///
/// Levels are handed over tightest-binding first; `finish` numbers them in
/// reverse insertion order starting at 1, so an earlier level always
/// compares as binding tighter. The transparent-bracket pair is fixed at
/// construction and sits on a sentinel level above every user level.
///
/// # Example
///
/// ```rust
/// use mixfix::{GrammarBuilder, Op};
///
/// let grammar = GrammarBuilder::new()
///     .level_ltr("mul", vec![Op::infix("*")])
///     .level_flat("add", vec![Op::infix("+")])
///     .finish()
///     .unwrap();
/// assert!(grammar.lookup("*").is_some());
/// ```
#[derive(Debug, Clone)]
pub struct GrammarBuilder {
    levels: Vec<PendingLevel>,
    transparent: (String, String),
}

impl GrammarBuilder {
    /// Create a builder with the default `(` `)` transparent pair
    pub fn new() -> Self {
        Self::with_brackets("(", ")")
    }

    /// Create a builder with a custom transparent-bracket pair
    pub fn with_brackets(left: impl Into<String>, right: impl Into<String>) -> Self {
        Self {
            levels: Vec::new(),
            transparent: (left.into(), right.into()),
        }
    }

    /// Build a builder from a declarative [`GrammarSpec`]
    pub fn from_spec(spec: GrammarSpec) -> Self {
        let (left, right) = spec.transparent_brackets;
        let mut builder = Self::with_brackets(left, right);
        for level in spec.levels {
            builder.levels.push(PendingLevel {
                name: level.name,
                assoc: level.assoc,
                ops: level.ops,
            });
        }
        builder
    }

    /// Build a builder from the JSON form of a [`GrammarSpec`]
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str::<GrammarSpec>(json).map(Self::from_spec)
    }

    /// Add a left-to-right associative level
    pub fn level_ltr(self, name: impl Into<String>, ops: Vec<Op>) -> Self {
        self.level(name, Assoc::LeftToRight, ops)
    }

    /// Add a right-to-left associative level
    pub fn level_rtl(self, name: impl Into<String>, ops: Vec<Op>) -> Self {
        self.level(name, Assoc::RightToLeft, ops)
    }

    /// Add a flat (n-ary chaining) level
    pub fn level_flat(self, name: impl Into<String>, ops: Vec<Op>) -> Self {
        self.level(name, Assoc::Flat, ops)
    }

    fn level(mut self, name: impl Into<String>, assoc: Assoc, ops: Vec<Op>) -> Self {
        self.levels.push(PendingLevel {
            name: name.into(),
            assoc,
            ops,
        });
        self
    }

    /// Compile the collected levels into an immutable [`Grammar`]
    ///
    /// Fails on duplicate spelling roles, right-bracket collisions, a
    /// second unnamed infix, or a level declared with the sentinel
    /// associativity.
    pub fn finish(self) -> Result<Grammar, GrammarError> {
        let mut grammar = Grammar {
            entries: LookupMap::default(),
            levels: Vec::new(),
            concat: None,
        };

        let (left, right) = self.transparent;
        grammar
            .levels
            .push(Level::new("trn", i32::MAX, Assoc::None));
        grammar.add_op(Op::TransparentBrackets { left, right }, 0)?;

        // Reverse insertion order: the last level handed in gets prec 1,
        // the first gets the largest value and so binds tightest.
        for (i, pending) in self.levels.into_iter().rev().enumerate() {
            if pending.assoc == Assoc::None {
                return Err(GrammarError::SentinelAssociativity {
                    level: pending.name,
                });
            }
            let index = grammar.levels.len();
            grammar
                .levels
                .push(Level::new(pending.name, (i + 1) as i32, pending.assoc));
            for op in pending.ops {
                grammar.add_op(op, index)?;
            }
        }

        Ok(grammar)
    }
}

impl Default for GrammarBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Declarative, serializable form of a grammar
///
/// Mirrors the builder intake: levels tightest-binding first, each with a
/// name, an associativity and its operators.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GrammarSpec {
    /// The transparent-bracket pair
    #[serde(default = "default_transparent")]
    pub transparent_brackets: (String, String),
    /// Levels in intake order (tightest-binding first)
    pub levels: Vec<LevelSpec>,
}

/// One level of a [`GrammarSpec`]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LevelSpec {
    /// Level name
    pub name: String,
    /// Level associativity
    pub assoc: Assoc,
    /// Operators registered at this level
    pub ops: Vec<Op>,
}

fn default_transparent() -> (String, String) {
    ("(".to_string(), ")".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn infix(name: &str) -> Op {
        Op::Infix {
            name: Some(name.to_string()),
        }
    }

    #[test]
    fn test_builder_assigns_precedence_in_reverse() {
        let grammar = GrammarBuilder::new()
            .level_ltr("mul", vec![infix("*")])
            .level_flat("add", vec![infix("+")])
            .finish()
            .unwrap();

        let mul = grammar.lookup("*").unwrap().regular.as_ref().unwrap();
        let add = grammar.lookup("+").unwrap().regular.as_ref().unwrap();
        assert!(grammar
            .level(add.level)
            .binds_looser_than(grammar.level(mul.level)));
    }

    #[test]
    fn test_transparent_sentinel_outranks_user_levels() {
        let grammar = GrammarBuilder::new()
            .level_ltr("mul", vec![infix("*")])
            .finish()
            .unwrap();

        let entry = grammar.lookup("(").unwrap();
        let (left, right) = entry.transparent_brackets().unwrap();
        assert_eq!((left, right), ("(", ")"));

        let trn = entry.prefix.as_ref().unwrap();
        let mul = grammar.lookup("*").unwrap().regular.as_ref().unwrap();
        assert!(grammar
            .level(mul.level)
            .binds_looser_than(grammar.level(trn.level)));
        assert!(grammar.lookup(")").unwrap().is_right_bracket);
    }

    #[test]
    fn test_prefix_and_infix_share_spelling() {
        let grammar = GrammarBuilder::new()
            .level_rtl(
                "prf",
                vec![Op::Prefix {
                    name: "-".to_string(),
                }],
            )
            .level_ltr("add", vec![infix("-")])
            .finish()
            .unwrap();

        let entry = grammar.lookup("-").unwrap();
        assert!(entry.prefix.is_some());
        assert!(entry.regular.is_some());
        assert!(!entry.is_right_bracket);
    }

    #[test]
    fn test_duplicate_prefix_rejected() {
        let result = GrammarBuilder::new()
            .level_rtl(
                "a",
                vec![Op::Prefix {
                    name: "~".to_string(),
                }],
            )
            .level_rtl(
                "b",
                vec![Op::Prefix {
                    name: "~".to_string(),
                }],
            )
            .finish();
        assert_eq!(
            result.unwrap_err(),
            GrammarError::DuplicatePrefix {
                spelling: "~".to_string()
            }
        );
    }

    #[test]
    fn test_right_bracket_collision_with_transparent_pair() {
        // `( )` both as transparent pair and as a bracketed operator.
        let result = GrammarBuilder::new()
            .level_rtl(
                "prf",
                vec![Op::PrefixBracketed {
                    left: "(".to_string(),
                    right: ")".to_string(),
                }],
            )
            .finish();
        assert!(result.is_err());
    }

    #[test]
    fn test_right_bracket_collision_with_operator() {
        let result = GrammarBuilder::with_brackets("(..", "..)")
            .level_ltr(
                "ter",
                vec![Op::Ternary {
                    first: "(".to_string(),
                    second: ")".to_string(),
                }],
            )
            .level_ltr(
                "pst",
                vec![Op::PostfixBracketed {
                    left: "(".to_string(),
                    right: ")".to_string(),
                }],
            )
            .finish();
        assert!(result.is_err());
    }

    #[test]
    fn test_shared_right_bracket_is_idempotent() {
        // Two bracketed operators may close on the same spelling.
        let grammar = GrammarBuilder::with_brackets("(..", "..)")
            .level_ltr(
                "pst",
                vec![
                    Op::PostfixBracketed {
                        left: "(".to_string(),
                        right: ")".to_string(),
                    },
                    Op::PostfixBracketed {
                        left: "[".to_string(),
                        right: "]".to_string(),
                    },
                ],
            )
            .finish()
            .unwrap();
        assert!(grammar.lookup(")").unwrap().is_right_bracket);
        assert!(grammar.lookup("]").unwrap().is_right_bracket);
    }

    #[test]
    fn test_single_concat_level() {
        let grammar = GrammarBuilder::new()
            .level_ltr("cat", vec![Op::Infix { name: None }])
            .finish()
            .unwrap();
        assert!(grammar.has_concat());
        assert_eq!(grammar.concat_level().unwrap().name, "cat");

        let result = GrammarBuilder::new()
            .level_ltr("cat", vec![Op::Infix { name: None }])
            .level_ltr("cat2", vec![Op::Infix { name: None }])
            .finish();
        assert_eq!(result.unwrap_err(), GrammarError::DuplicateConcat);
    }

    #[test]
    fn test_spec_json_roundtrip() {
        let spec = GrammarSpec {
            transparent_brackets: ("(".to_string(), ")".to_string()),
            levels: vec![LevelSpec {
                name: "add".to_string(),
                assoc: Assoc::Flat,
                ops: vec![infix("+"), infix("-")],
            }],
        };
        let json = serde_json::to_string(&spec).unwrap();
        let grammar = GrammarBuilder::from_json(&json).unwrap().finish().unwrap();
        assert!(grammar.lookup("+").is_some());
        assert!(grammar.lookup("-").is_some());
    }

    #[test]
    fn test_spec_default_brackets() {
        let json = r#"{ "levels": [] }"#;
        let grammar = GrammarBuilder::from_json(json).unwrap().finish().unwrap();
        assert!(grammar.lookup("(").is_some());
    }

    #[test]
    fn test_sentinel_assoc_rejected() {
        let builder = GrammarBuilder::from_spec(GrammarSpec {
            transparent_brackets: default_transparent(),
            levels: vec![LevelSpec {
                name: "bad".to_string(),
                assoc: Assoc::None,
                ops: vec![],
            }],
        });
        assert_eq!(
            builder.finish().unwrap_err(),
            GrammarError::SentinelAssociativity {
                level: "bad".to_string()
            }
        );
    }

    #[test]
    fn test_unknown_spelling_lookup() {
        let grammar = GrammarBuilder::new().finish().unwrap();
        assert!(grammar.lookup("%").is_none());
    }
}
