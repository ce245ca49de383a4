//! Labelled plan trees for visualization.

use std::fmt::Write as _;

/// One node of a visualized plan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
    pub name: String,
    pub fields: Vec<(String, String)>,
    pub children: Vec<(String, Node)>,
}

impl Node {
    pub fn new(name: impl Into<String>) -> Self {
        Node {
            name: name.into(),
            fields: Vec::new(),
            children: Vec::new(),
        }
    }

    pub fn field(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.push((key.into(), value.into()));
        self
    }

    pub fn child(mut self, label: impl Into<String>, node: Node) -> Self {
        self.children.push((label.into(), node));
        self
    }

    /// Indented text rendering, two spaces per level.
    ///
    /// ```text
    /// group_by
    ///   field_0 = sum(amount) as total
    ///   source:
    ///     scan
    ///       name = input
    /// ```
    pub fn render(&self) -> String {
        let mut out = String::new();
        self.render_into(&mut out, 0);
        out
    }

    fn render_into(&self, out: &mut String, depth: usize) {
        let pad = "  ".repeat(depth);
        let _ = writeln!(out, "{pad}{}", self.name);
        for (key, value) in &self.fields {
            let _ = writeln!(out, "{pad}  {key} = {value}");
        }
        for (label, child) in &self.children {
            let _ = writeln!(out, "{pad}  {label}:");
            child.render_into(out, depth + 2);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_nested() {
        let tree = Node::new("filter")
            .field("note", "x")
            .child("source", Node::new("scan").field("name", "t"));
        assert_eq!(
            tree.render(),
            "filter\n  note = x\n  source:\n    scan\n      name = t\n"
        );
    }
}
