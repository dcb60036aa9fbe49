//! Result tree
//!
//! Parses produce a [`Node`] tree whose shape encodes the intended binding
//! without ambiguity. A node with a name and no children is a leaf; a node
//! with a name and children is a subtree; a node with neither is the
//! implicit-concatenation sentinel. The canonical rendering is what golden
//! tests and the differential harness compare.

use std::fmt;

/// A node of the result tree
///
/// Nodes are built bottom-up by the parsers and are never mutated after
/// being attached to a parent. The single exception is the FLAT merge in
/// the shunting-yard driver, which appends to a node while it still sits
/// on the atom stack.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Node {
    /// Node label; `None` only for the concatenation sentinel
    pub name: Option<String>,
    /// Ordered child nodes
    pub children: Vec<Node>,
}

impl Node {
    /// Create a leaf node with the given name
    #[inline]
    pub fn leaf(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            children: Vec::new(),
        }
    }

    /// Create the concatenation sentinel (no name, no children)
    #[inline]
    pub fn concat_sentinel() -> Self {
        Self::default()
    }

    /// Create a node from an optional label, as operators carry one
    #[inline]
    pub fn from_label(name: Option<String>) -> Self {
        Self {
            name,
            children: Vec::new(),
        }
    }

    /// Create an unnamed node over the given children
    ///
    /// The caller is expected to assign the level name before the node is
    /// rendered; only the sentinel stays nameless.
    #[inline]
    pub fn branch(children: Vec<Node>) -> Self {
        Self {
            name: None,
            children,
        }
    }

    /// Render the canonical string form
    ///
    /// - sentinel (no name, no children) renders as `CONCAT`
    /// - a leaf renders as its name
    /// - a composite renders as `name{ c1 c2 ... }` with single spaces
    pub fn render(&self) -> String {
        let mut out = String::new();
        self.render_into(&mut out);
        out
    }

    fn render_into(&self, out: &mut String) {
        match &self.name {
            None if self.children.is_empty() => out.push_str("CONCAT"),
            name => {
                debug_assert!(name.is_some(), "composite node left unnamed");
                if let Some(name) = name {
                    out.push_str(name);
                }
                if !self.children.is_empty() {
                    out.push('{');
                    for child in &self.children {
                        out.push(' ');
                        child.render_into(out);
                    }
                    out.push_str(" }");
                }
            }
        }
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.render())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_leaf() {
        assert_eq!(Node::leaf("x").render(), "x");
    }

    #[test]
    fn test_render_sentinel() {
        assert_eq!(Node::concat_sentinel().render(), "CONCAT");
    }

    #[test]
    fn test_render_composite() {
        let node = Node {
            name: Some("add".to_string()),
            children: vec![Node::leaf("1"), Node::leaf("+"), Node::leaf("2")],
        };
        assert_eq!(node.render(), "add{ 1 + 2 }");
    }

    #[test]
    fn test_render_nested() {
        let inner = Node {
            name: Some("mul".to_string()),
            children: vec![Node::leaf("2"), Node::leaf("*"), Node::leaf("3")],
        };
        let outer = Node {
            name: Some("add".to_string()),
            children: vec![Node::leaf("1"), Node::leaf("+"), inner],
        };
        assert_eq!(outer.render(), "add{ 1 + mul{ 2 * 3 } }");
    }

    #[test]
    fn test_render_sentinel_child() {
        let node = Node {
            name: Some("cat".to_string()),
            children: vec![Node::leaf("a"), Node::concat_sentinel(), Node::leaf("b")],
        };
        assert_eq!(node.render(), "cat{ a CONCAT b }");
    }

    #[test]
    fn test_display_matches_render() {
        let node = Node::leaf("q");
        assert_eq!(node.to_string(), node.render());
    }
}
