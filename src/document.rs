//! Document adapter: YAML text ⇄ position-tagged `Node` trees.
//!
//! Parsing collects `saphyr-parser` events up front (with their spans) and
//! folds them into one `Node` per document. Rendering writes block-style
//! YAML one document at a time, with `serde_yaml` deciding which strings can
//! stay plain.
pub mod resolve;

use std::collections::HashMap;
use std::sync::Arc;

use log::{debug, trace};
use saphyr_parser::{Event, Parser, ScalarStyle, Span, SpannedEventReceiver};

use crate::error::DocumentError;
use crate::node::{Mark, Node, NodeKind, ScalarValue};

/// Source label used when the caller does not name the input.
pub const DEFAULT_SOURCE: &str = "<unicode string>";

const CORE_TAG_PREFIXES: [&str; 2] = ["!!", "tag:yaml.org,2002:"];

// ————————————————————————————————————————————————————————————————————————————
// PARSE
// ————————————————————————————————————————————————————————————————————————————

/// Split a stream into its documents. An empty stream yields no documents.
pub fn parse(text: &str, source: &str) -> Result<Vec<Node>, DocumentError> {
    let mut collector = EventCollector::default();
    Parser::new_from_str(text)
        .load(&mut collector, true)
        .map_err(|e| DocumentError::Parse {
            message: e.info().to_string(),
            label: source.to_string(),
            line: e.marker().line(),
            column: e.marker().col() + 1,
        })?;

    let mut builder = Builder {
        events: &collector.events,
        pos: 0,
        anchors: HashMap::new(),
        source: Arc::from(source),
    };
    let docs = builder.stream()?;
    debug!("parsed {} document(s) from {source}", docs.len());
    Ok(docs)
}

/// Exactly one document; an empty stream is a single null document.
pub fn parse_single(text: &str, source: &str) -> Result<Node, DocumentError> {
    let mut docs = parse(text, source)?;
    match docs.len() {
        0 => Ok(Node::scalar(ScalarValue::Null, "", Mark::new(Arc::from(source), 1, 1))),
        1 => Ok(docs.remove(0)),
        count => Err(DocumentError::MultipleDocuments { count, mark: docs.swap_remove(1).mark }),
    }
}

#[derive(Debug, Clone)]
enum OwnedEvent {
    StreamStart,
    StreamEnd,
    DocumentStart,
    DocumentEnd,
    Alias(usize),
    Scalar {
        value: String,
        style: ScalarStyle,
        anchor: usize,
        core_tag: Option<String>,
    },
    SequenceStart { anchor: usize },
    SequenceEnd,
    MappingStart { anchor: usize },
    MappingEnd,
}

#[derive(Debug, Clone)]
struct SpannedEvent {
    event: OwnedEvent,
    line: usize,
    column: usize,
}

#[derive(Default)]
struct EventCollector {
    events: Vec<SpannedEvent>,
}

impl SpannedEventReceiver<'_> for EventCollector {
    fn on_event(&mut self, event: Event<'_>, span: Span) {
        let owned = match event {
            Event::StreamStart => OwnedEvent::StreamStart,
            Event::StreamEnd => OwnedEvent::StreamEnd,
            Event::DocumentStart(_) => OwnedEvent::DocumentStart,
            Event::DocumentEnd => OwnedEvent::DocumentEnd,
            Event::Alias(id) => OwnedEvent::Alias(id),
            Event::Scalar(value, style, anchor, tag) => OwnedEvent::Scalar {
                value: value.into_owned(),
                style,
                anchor,
                core_tag: tag.as_ref().and_then(|t| {
                    CORE_TAG_PREFIXES
                        .contains(&t.handle.as_str())
                        .then(|| t.suffix.clone())
                }),
            },
            Event::SequenceStart(anchor, _tag) => OwnedEvent::SequenceStart { anchor },
            Event::SequenceEnd => OwnedEvent::SequenceEnd,
            Event::MappingStart(anchor, _tag) => OwnedEvent::MappingStart { anchor },
            Event::MappingEnd => OwnedEvent::MappingEnd,
            Event::Nothing => return,
        };
        trace!("yaml event {owned:?} at {}:{}", span.start.line(), span.start.col());
        self.events.push(SpannedEvent {
            event: owned,
            line: span.start.line(),
            column: span.start.col() + 1,
        });
    }
}

struct Builder<'e> {
    events: &'e [SpannedEvent],
    pos: usize,
    anchors: HashMap<usize, Node>,
    source: Arc<str>,
}

impl<'e> Builder<'e> {
    fn mark(&self, ev: &SpannedEvent) -> Mark {
        Mark::new(Arc::clone(&self.source), ev.line, ev.column)
    }

    fn unexpected(&self, ev: Option<&SpannedEvent>, what: &str) -> DocumentError {
        let (line, column) = ev.map_or((0, 0), |e| (e.line, e.column));
        DocumentError::Parse {
            message: format!("unexpected {what}"),
            label: self.source.to_string(),
            line,
            column,
        }
    }

    fn next(&mut self) -> Option<&'e SpannedEvent> {
        let ev = self.events.get(self.pos);
        self.pos += 1;
        ev
    }

    fn peek(&self) -> Option<&'e SpannedEvent> {
        self.events.get(self.pos)
    }

    fn stream(&mut self) -> Result<Vec<Node>, DocumentError> {
        let mut docs = Vec::new();
        loop {
            let events = self.events;
            let Some(ev) = events.get(self.pos) else { return Ok(docs) };
            self.pos += 1;
            match &ev.event {
                OwnedEvent::StreamStart => {}
                OwnedEvent::StreamEnd => return Ok(docs),
                OwnedEvent::DocumentStart => {
                    // anchors do not carry across documents
                    self.anchors.clear();
                    let doc = match self.peek().map(|e| &e.event) {
                        Some(OwnedEvent::DocumentEnd) => {
                            Node::scalar(ScalarValue::Null, "", self.mark(ev))
                        }
                        _ => self.node()?,
                    };
                    match self.next().map(|e| &e.event) {
                        Some(OwnedEvent::DocumentEnd) => {}
                        _ => {
                            let bad = self.events.get(self.pos.saturating_sub(1));
                            return Err(self.unexpected(bad, "content after document"));
                        }
                    }
                    docs.push(doc);
                }
                _ => return Err(self.unexpected(Some(ev), "event outside of a document")),
            }
        }
    }

    fn node(&mut self) -> Result<Node, DocumentError> {
        let events = self.events;
        let Some(ev) = events.get(self.pos) else {
            return Err(self.unexpected(None, "end of stream"));
        };
        self.pos += 1;
        let mark = self.mark(ev);

        let (node, anchor) = match &ev.event {
            OwnedEvent::Scalar { value, style, anchor, core_tag } => {
                let resolved = match core_tag.as_deref().and_then(|t| resolve::resolve_tagged(value, t)) {
                    Some(v) => v,
                    None if matches!(style, ScalarStyle::Plain) && core_tag.is_none() => {
                        resolve::resolve_plain(value)
                    }
                    None => ScalarValue::Str(value.clone()),
                };
                (Node::scalar(resolved, value.clone(), mark), *anchor)
            }
            OwnedEvent::SequenceStart { anchor } => {
                let mut items = Vec::new();
                loop {
                    if matches!(self.peek().map(|e| &e.event), Some(OwnedEvent::SequenceEnd)) {
                        self.pos += 1;
                        break;
                    }
                    items.push(self.node()?);
                }
                (Node::new(NodeKind::Sequence(items), mark), *anchor)
            }
            OwnedEvent::MappingStart { anchor } => {
                let mut entries = Vec::new();
                loop {
                    if matches!(self.peek().map(|e| &e.event), Some(OwnedEvent::MappingEnd)) {
                        self.pos += 1;
                        break;
                    }
                    let key = self.node()?;
                    let value = self.node()?;
                    entries.push((key, value));
                }
                (Node::new(NodeKind::Mapping(entries), mark), *anchor)
            }
            OwnedEvent::Alias(id) => {
                let Some(target) = self.anchors.get(id) else {
                    return Err(DocumentError::UnknownAlias { mark });
                };
                // the copy reports where the alias was written
                let node = Node::new(target.kind.clone(), mark);
                return Ok(node);
            }
            _ => return Err(self.unexpected(Some(ev), "event inside a node")),
        };

        if anchor != 0 {
            self.anchors.insert(anchor, node.clone());
        }
        Ok(node)
    }
}

// ————————————————————————————————————————————————————————————————————————————
// RENDER
// ————————————————————————————————————————————————————————————————————————————

/// Render a single document in block style. A top-level scalar is closed
/// with `...`.
///
/// String scalars that the parser above would resolve to something other
/// than a string are quoted, so rendered text always reads back as the same
/// node kinds.
pub fn render(node: &Node) -> Result<String, DocumentError> {
    let mut out = String::new();
    match &node.kind {
        NodeKind::Scalar(s) => {
            out.push_str(&scalar_text(&s.value, false)?);
            out.push_str("\n...\n");
        }
        _ if is_empty_collection(node) => {
            out.push_str(&flow_text(node)?);
            out.push('\n');
        }
        _ => {
            for line in block_lines(node)? {
                out.push_str(&line);
                out.push('\n');
            }
        }
    }
    Ok(out)
}

fn is_empty_collection(node: &Node) -> bool {
    match &node.kind {
        NodeKind::Sequence(items) => items.is_empty(),
        NodeKind::Mapping(entries) => entries.is_empty(),
        NodeKind::Scalar(_) => false,
    }
}

/// Lines of a non-empty collection, relative to its own indentation.
fn block_lines(node: &Node) -> Result<Vec<String>, DocumentError> {
    let mut lines = Vec::new();
    match &node.kind {
        NodeKind::Sequence(items) => {
            for item in items {
                if matches!(item.kind, NodeKind::Scalar(_)) || is_empty_collection(item) {
                    lines.push(format!("- {}", flow_text(item)?));
                    continue;
                }
                // nested collections start on the dash line
                for (i, line) in block_lines(item)?.into_iter().enumerate() {
                    lines.push(if i == 0 { format!("- {line}") } else { format!("  {line}") });
                }
            }
        }
        NodeKind::Mapping(entries) => {
            for (key, value) in entries {
                let key = flow_text(key)?;
                if matches!(value.kind, NodeKind::Scalar(_)) || is_empty_collection(value) {
                    lines.push(format!("{key}: {}", flow_text(value)?));
                    continue;
                }
                lines.push(format!("{key}:"));
                lines.extend(block_lines(value)?.into_iter().map(|line| format!("  {line}")));
            }
        }
        NodeKind::Scalar(s) => lines.push(scalar_text(&s.value, false)?),
    }
    Ok(lines)
}

/// Single-line rendering, used for scalars, empty collections and
/// collection keys.
fn flow_text(node: &Node) -> Result<String, DocumentError> {
    Ok(match &node.kind {
        NodeKind::Scalar(s) => scalar_text(&s.value, false)?,
        NodeKind::Sequence(items) => {
            let items = items.iter().map(flow_item).collect::<Result<Vec<_>, _>>()?;
            format!("[{}]", items.join(", "))
        }
        NodeKind::Mapping(entries) => {
            let entries = entries
                .iter()
                .map(|(k, v)| Ok(format!("{}: {}", flow_item(k)?, flow_item(v)?)))
                .collect::<Result<Vec<_>, DocumentError>>()?;
            format!("{{{}}}", entries.join(", "))
        }
    })
}

fn flow_item(node: &Node) -> Result<String, DocumentError> {
    match &node.kind {
        NodeKind::Scalar(s) => scalar_text(&s.value, true),
        _ => flow_text(node),
    }
}

fn scalar_text(value: &ScalarValue, in_flow: bool) -> Result<String, DocumentError> {
    Ok(match value {
        ScalarValue::Null => "null".to_string(),
        ScalarValue::Bool(b) => b.to_string(),
        ScalarValue::Int(i) => i.to_string(),
        ScalarValue::Float(x) => resolve::float_text(*x),
        ScalarValue::Str(text) => string_text(text, in_flow)?,
    })
}

fn string_text(text: &str, in_flow: bool) -> Result<String, DocumentError> {
    if text.chars().any(char::is_control) {
        // JSON string escapes are valid YAML double-quoted escapes
        return Ok(serde_json::to_string(text)?);
    }
    if plain_safe(text, in_flow)? {
        Ok(text.to_string())
    } else {
        Ok(format!("'{}'", text.replace('\'', "''")))
    }
}

fn plain_safe(text: &str, in_flow: bool) -> Result<bool, DocumentError> {
    if !matches!(resolve::resolve_plain(text), ScalarValue::Str(_)) {
        return Ok(false);
    }
    if in_flow && text.contains([',', '[', ']', '{', '}']) {
        return Ok(false);
    }
    // indicators, comments and edge whitespace: serde_yaml quotes what it cannot emit plain
    Ok(serde_yaml::to_string(text)?.strip_suffix('\n') == Some(text))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scalar_of(node: &Node) -> &ScalarValue {
        &node.as_scalar().expect("scalar node").value
    }

    #[test]
    fn flow_sequence_positions() {
        let node = parse_single("[1, yes, 'x']", DEFAULT_SOURCE).unwrap();
        let NodeKind::Sequence(items) = &node.kind else { panic!("expected sequence") };
        assert_eq!(scalar_of(&items[0]), &ScalarValue::Int(1));
        assert_eq!(scalar_of(&items[1]), &ScalarValue::Bool(true));
        assert_eq!(scalar_of(&items[2]), &ScalarValue::Str("x".into()));
        assert_eq!((node.mark.line, node.mark.column), (1, 1));
    }

    #[test]
    fn plain_scalar_at_origin() {
        let node = parse_single("aaa", DEFAULT_SOURCE).unwrap();
        assert_eq!(scalar_of(&node), &ScalarValue::Str("aaa".into()));
        assert_eq!(node.mark.to_string(), "in \"<unicode string>\", line 1, column 1");
    }

    #[test]
    fn quoted_scalars_stay_strings() {
        let node = parse_single("\"12\"", DEFAULT_SOURCE).unwrap();
        assert_eq!(scalar_of(&node), &ScalarValue::Str("12".into()));
    }

    #[test]
    fn splits_multi_document_streams() {
        let docs = parse("---\nx: 1\n---\nx: 2\n", DEFAULT_SOURCE).unwrap();
        assert_eq!(docs.len(), 2);
        assert!(matches!(docs[1].kind, NodeKind::Mapping(_)));

        let err = parse_single("---\na\n---\nb\n", DEFAULT_SOURCE).unwrap_err();
        assert!(matches!(err, DocumentError::MultipleDocuments { count: 2, .. }));
    }

    #[test]
    fn empty_stream_is_null() {
        let node = parse_single("", DEFAULT_SOURCE).unwrap();
        assert_eq!(scalar_of(&node), &ScalarValue::Null);
    }

    #[test]
    fn aliases_copy_anchored_nodes() {
        let node = parse_single("a: &p [1, 2]\nb: *p\n", DEFAULT_SOURCE).unwrap();
        let NodeKind::Mapping(entries) = &node.kind else { panic!("expected mapping") };
        assert_eq!(entries[0].1.kind, entries[1].1.kind);
    }

    #[test]
    fn quotes_strings_that_resolve_otherwise() {
        let str_node = |s: &str| Node::scalar(ScalarValue::Str(s.into()), s, Mark::detached());
        let seq = Node::new(
            NodeKind::Sequence(["plain", "yes", "12", "null", "", "a: b", "x'y z", "a\tb"].into_iter().map(str_node).collect()),
            Mark::detached(),
        );
        assert_eq!(
            render(&seq).unwrap(),
            "- plain\n- 'yes'\n- '12'\n- 'null'\n- ''\n- 'a: b'\n- x'y z\n- \"a\\tb\"\n"
        );

        let reparsed = parse_single(&render(&seq).unwrap(), DEFAULT_SOURCE).unwrap();
        let NodeKind::Sequence(items) = &reparsed.kind else { panic!("expected sequence") };
        assert!(items.iter().all(|item| matches!(scalar_of(item), ScalarValue::Str(_))));
    }

    #[test]
    fn nested_collections_indent_and_flow_when_empty() {
        let int = |i: i64| Node::scalar(ScalarValue::Int(i), i.to_string(), Mark::detached());
        let key = |s: &str| Node::scalar(ScalarValue::Str(s.into()), s, Mark::detached());
        let inner = Node::new(NodeKind::Sequence(vec![int(1), int(2)]), Mark::detached());
        let node = Node::new(
            NodeKind::Mapping(vec![
                (key("a"), Node::new(NodeKind::Sequence(vec![inner.clone(), int(3)]), Mark::detached())),
                (key("b"), Node::new(NodeKind::Mapping(vec![]), Mark::detached())),
                (inner, int(4)),
            ]),
            Mark::detached(),
        );
        assert_eq!(render(&node).unwrap(), "a:\n  - - 1\n    - 2\n  - 3\nb: {}\n[1, 2]: 4\n");
        assert_eq!(render(&Node::new(NodeKind::Sequence(vec![]), Mark::detached())).unwrap(), "[]\n");
    }

    #[test]
    fn reports_scanner_errors() {
        let err = parse("[1, 2", DEFAULT_SOURCE).unwrap_err();
        assert!(matches!(err, DocumentError::Parse { .. }));
    }
}
