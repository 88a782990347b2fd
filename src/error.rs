//! Error taxonomy and diagnostic rendering.

use std::fmt;

use thiserror::Error;

use crate::node::Mark;

/// Crate-wide result type.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Type(#[from] TypeError),
    #[error(transparent)]
    Decode(#[from] DecodeError),
    #[error(transparent)]
    Document(#[from] DocumentError),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

// ————————————————————————————————————————————————————————————————————————————
// TYPE ERRORS (fatal, raised by the interpreter)
// ————————————————————————————————————————————————————————————————————————————

/// A textual type expression that does not follow the grammar.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid type expression {input:?}: {message} (at offset {offset})")]
pub struct TypeSyntaxError {
    pub input: String,
    /// Byte offset into `input`.
    pub offset: usize,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TypeResolutionError {
    #[error("unknown type name `{name}`")]
    UnknownName { name: String },
    #[error("type `{name}` is substituted by `{replacement}`, which is not a known record type")]
    UnknownReplacement { name: String, replacement: String },
    #[error("type alias `{name}` refers to itself")]
    RecursiveAlias { name: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TypeError {
    #[error(transparent)]
    Syntax(#[from] TypeSyntaxError),
    #[error(transparent)]
    Resolution(#[from] TypeResolutionError),
    #[error("record `{record}` declares field `{field}` more than once")]
    DuplicateField { record: String, field: String },
    #[error("a union needs at least one alternative")]
    EmptyUnion,
}

// ————————————————————————————————————————————————————————————————————————————
// DECODE ERRORS
// ————————————————————————————————————————————————————————————————————————————

/// A mismatch between a descriptor and a document node, located at the node.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodeError {
    pub kind: DecodeErrorKind,
    pub mark: Mark,
}

#[derive(Debug, Clone, PartialEq)]
pub enum DecodeErrorKind {
    Mismatch { expected: String, found: String },
    Length { expected: String, expected_len: usize, found_len: usize },
    MissingField { record: String, field: String },
    UnknownField { record: String, field: String },
    Convert { record: String, field: String, message: String },
    Union(UnionDecodeError),
    /// Internal: a back-reference without a registry entry.
    Unresolved { name: String },
}

/// Every alternative of a union failed; one entry per alternative, in
/// declaration order.
#[derive(Debug, Clone, PartialEq)]
pub struct UnionDecodeError {
    pub alternatives: Vec<(String, DecodeError)>,
}

#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("failed to parse yaml: {message}\n  in \"{label}\", line {line}, column {column}")]
    Parse {
        message: String,
        label: String,
        line: usize,
        column: usize,
    },
    #[error("expected a single document in the stream, found {count}\n  {mark}")]
    MultipleDocuments { count: usize, mark: Mark },
    #[error("found undefined alias\n  {mark}")]
    UnknownAlias { mark: Mark },
    #[error("failed to render yaml: {0}")]
    Render(#[from] serde_yaml::Error),
    #[error("failed to escape string scalar: {0}")]
    Escape(#[from] serde_json::Error),
}

// ————————————————————————————————————————————————————————————————————————————
// RENDERING
// ————————————————————————————————————————————————————————————————————————————

impl DecodeError {
    pub fn new(kind: DecodeErrorKind, mark: Mark) -> Self {
        Self { kind, mark }
    }

    pub fn mismatch(expected: impl Into<String>, found: impl Into<String>, mark: Mark) -> Self {
        Self::new(DecodeErrorKind::Mismatch { expected: expected.into(), found: found.into() }, mark)
    }

    pub fn as_union(&self) -> Option<&UnionDecodeError> {
        match &self.kind {
            DecodeErrorKind::Union(u) => Some(u),
            _ => None,
        }
    }

    /// Message without the trailing position line.
    fn headline(&self) -> String {
        match &self.kind {
            DecodeErrorKind::Mismatch { expected, found } => format!("expected {expected}, {found} found"),
            DecodeErrorKind::Length { expected, expected_len, found_len } => format!(
                "expected {expected}, sequence of length {found_len} found (need {expected_len})"
            ),
            DecodeErrorKind::MissingField { record, field } => {
                format!("missing required field '{field}' for {record}")
            }
            DecodeErrorKind::UnknownField { record, field } => {
                format!("unknown field '{field}' for {record}")
            }
            DecodeErrorKind::Convert { record, field, message } => {
                format!("failed to convert field '{field}' of {record}: {message}")
            }
            DecodeErrorKind::Unresolved { name } => {
                format!("internal error: type `{name}` was never resolved")
            }
            DecodeErrorKind::Union(u) => u.headline(),
        }
    }
}

impl UnionDecodeError {
    fn headline(&self) -> String {
        let names = self
            .alternatives
            .iter()
            .map(|(name, _)| name.as_str())
            .collect::<Vec<_>>()
            .join(", ");
        let mut lines = vec![
            format!("failed to parse yaml. expected one of ({names})"),
            "errors for each type:".to_string(),
        ];
        for (name, err) in &self.alternatives {
            lines.push(format!("type: {name}"));
            lines.extend(err.to_string().lines().map(|l| format!("    {l}")));
        }
        lines.join("\n")
    }
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}\n  {}", self.headline(), self.mark)
    }
}

impl std::error::Error for DecodeError {}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn at(line: usize, column: usize) -> Mark {
        Mark::new(Arc::from("<unicode string>"), line, column)
    }

    #[test]
    fn single_mismatch_message() {
        let err = DecodeError::mismatch("int", "'aaa'", at(1, 1));
        assert_eq!(
            err.to_string(),
            "expected int, 'aaa' found\n  in \"<unicode string>\", line 1, column 1"
        );
    }

    #[test]
    fn union_message_indents_each_alternative() {
        let err = DecodeError::new(
            DecodeErrorKind::Union(UnionDecodeError {
                alternatives: vec![
                    ("int".into(), DecodeError::mismatch("int", "'aaa'", at(1, 1))),
                    ("list[Any]".into(), DecodeError::mismatch("list[Any]", "scalar", at(1, 1))),
                ],
            }),
            at(1, 1),
        );
        let expected = "failed to parse yaml. expected one of (int, list[Any])\n\
                        errors for each type:\n\
                        type: int\n    \
                        expected int, 'aaa' found\n      \
                        in \"<unicode string>\", line 1, column 1\n\
                        type: list[Any]\n    \
                        expected list[Any], scalar found\n      \
                        in \"<unicode string>\", line 1, column 1\n  \
                        in \"<unicode string>\", line 1, column 1";
        assert_eq!(err.to_string(), expected);
    }
}
