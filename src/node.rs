//! Position-tagged document nodes, as produced by the document adapter.

use std::fmt;
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub kind: NodeKind,
    pub mark: Mark,
}

#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    Scalar(Scalar),
    Sequence(Vec<Node>),
    /// Entries in document order; duplicate keys are kept here.
    Mapping(Vec<(Node, Node)>),
}

/// A resolved scalar plus the text it was read from.
#[derive(Debug, Clone, PartialEq)]
pub struct Scalar {
    pub value: ScalarValue,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ScalarValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
}

/// Source position. `line` and `column` are 1-based; 0 means "not from a document".
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mark {
    pub source: Arc<str>,
    pub line: usize,
    pub column: usize,
}

// ————————————————————————————————————————————————————————————————————————————
// IMPLEMENTATION
// ————————————————————————————————————————————————————————————————————————————

impl Node {
    pub fn new(kind: NodeKind, mark: Mark) -> Self {
        Self { kind, mark }
    }

    pub fn scalar(value: ScalarValue, text: impl Into<String>, mark: Mark) -> Self {
        Self::new(NodeKind::Scalar(Scalar { value, text: text.into() }), mark)
    }

    /// Short kind label used in "... found" diagnostics.
    pub fn kind_name(&self) -> &'static str {
        match self.kind {
            NodeKind::Scalar(_) => "scalar",
            NodeKind::Sequence(_) => "sequence",
            NodeKind::Mapping(_) => "mapping",
        }
    }

    pub fn as_scalar(&self) -> Option<&Scalar> {
        match &self.kind {
            NodeKind::Scalar(s) => Some(s),
            _ => None,
        }
    }
}

impl Scalar {
    /// Rendering of the scalar in a "found" position: strings are quoted,
    /// null is `None` however it was written.
    pub fn describe(&self) -> String {
        match &self.value {
            ScalarValue::Str(s) => format!("'{}'", s.replace('\\', "\\\\").replace('\'', "\\'")),
            ScalarValue::Null => "None".to_string(),
            _ => self.text.clone(),
        }
    }
}

impl Mark {
    pub fn new(source: Arc<str>, line: usize, column: usize) -> Self {
        Self { source, line, column }
    }

    /// Mark for nodes built in memory (encoder output).
    pub fn detached() -> Self {
        Self { source: Arc::from("<value>"), line: 0, column: 0 }
    }
}

impl fmt::Display for Mark {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "in \"{}\", line {}, column {}", self.source, self.line, self.column)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn describes_string_scalars_quoted() {
        let mark = Mark::new(Arc::from("<unicode string>"), 1, 1);
        let node = Node::scalar(ScalarValue::Str("aaa".into()), "aaa", mark.clone());
        assert_eq!(node.as_scalar().map(Scalar::describe).as_deref(), Some("'aaa'"));

        let node = Node::scalar(ScalarValue::Int(12), "12", mark.clone());
        assert_eq!(node.as_scalar().map(Scalar::describe).as_deref(), Some("12"));
        assert_eq!(mark.to_string(), "in \"<unicode string>\", line 1, column 1");

        for text in ["", "~", "null"] {
            let node = Node::scalar(ScalarValue::Null, text, mark.clone());
            assert_eq!(node.as_scalar().map(Scalar::describe).as_deref(), Some("None"));
        }
    }
}
