//! `Value` → `Node`: the inverse direction of the decoder. Nodes built here
//! carry detached marks.
//!
//! [`encode`] follows the value's own shape. [`Schema::encode`] also walks the
//! descriptor, so records come out in declared field order with absent fields
//! filled from their declared defaults.

use crate::document::resolve;
use crate::interp::Schema;
use crate::node::{Mark, Node, NodeKind, ScalarValue};
use crate::ty::{Prim, RecordTy, Ty};
use crate::value::{RecordValue, Value};

/// Shape-only encoding. Record fields are emitted in the value's own order.
pub fn encode(value: &Value) -> Node {
    let mark = Mark::detached();
    match value {
        Value::Null => Node::scalar(ScalarValue::Null, "null", mark),
        Value::Bool(b) => Node::scalar(ScalarValue::Bool(*b), b.to_string(), mark),
        Value::Int(i) => Node::scalar(ScalarValue::Int(*i), i.to_string(), mark),
        Value::Float(x) => Node::scalar(ScalarValue::Float(x.0), resolve::float_text(x.0), mark),
        Value::Str(s) => Node::scalar(ScalarValue::Str(s.clone()), s.clone(), mark),
        Value::List(xs) | Value::Tuple(xs) => {
            Node::new(NodeKind::Sequence(xs.iter().map(encode).collect()), mark)
        }
        Value::Set(xs) => Node::new(NodeKind::Sequence(xs.iter().map(encode).collect()), mark),
        Value::Map(m) => Node::new(
            NodeKind::Mapping(m.iter().map(|(k, v)| (encode(k), encode(v))).collect()),
            mark,
        ),
        Value::Record(r) => Node::new(
            NodeKind::Mapping(
                r.fields
                    .iter()
                    .map(|(name, v)| (encode(&Value::str(name.as_str())), encode(v)))
                    .collect(),
            ),
            mark,
        ),
    }
}

impl Schema {
    /// Encode `value` as the root descriptor describes it.
    pub fn encode(&self, value: &Value) -> Node {
        self.encode_as(&self.root, value)
    }

    /// Parts of `value` the descriptor does not describe fall back to
    /// [`encode`].
    pub fn encode_as(&self, ty: &Ty, value: &Value) -> Node {
        let seq = |items: Vec<Node>| Node::new(NodeKind::Sequence(items), Mark::detached());
        match (ty, value) {
            (Ty::Record(rec), Value::Record(r)) => self.encode_record(rec, r),
            (Ty::Unresolved(name), Value::Record(r)) => match self.record(name) {
                Some(rec) => self.encode_record(rec, r),
                None => encode(value),
            },
            (Ty::List(item) | Ty::Set(item) | Ty::VarTuple(item), Value::List(xs) | Value::Tuple(xs)) => {
                seq(xs.iter().map(|x| self.encode_as(item, x)).collect())
            }
            (Ty::List(item) | Ty::Set(item) | Ty::VarTuple(item), Value::Set(xs)) => {
                seq(xs.iter().map(|x| self.encode_as(item, x)).collect())
            }
            (Ty::Tuple(elems), Value::List(xs) | Value::Tuple(xs)) if elems.len() == xs.len() => {
                seq(elems.iter().zip(xs).map(|(t, x)| self.encode_as(t, x)).collect())
            }
            (Ty::Mapping { key, value: val }, Value::Map(m)) => Node::new(
                NodeKind::Mapping(
                    m.iter()
                        .map(|(k, v)| (self.encode_as(key, k), self.encode_as(val, v)))
                        .collect(),
                ),
                Mark::detached(),
            ),
            (Ty::Union(alts), _) => match alts.iter().find(|alt| self.fits(alt, value)) {
                Some(alt) => self.encode_as(alt, value),
                None => encode(value),
            },
            _ => encode(value),
        }
    }

    fn encode_record(&self, rec: &RecordTy, value: &RecordValue) -> Node {
        let mut entries = Vec::with_capacity(rec.fields.len());
        for field in &rec.fields {
            // undeclared keys are dropped; a field with neither value nor default is omitted
            let Some(v) = value.get(&field.name).or(field.default.as_ref()) else { continue };
            entries.push((encode(&Value::str(field.name.as_str())), self.encode_as(&field.ty, v)));
        }
        Node::new(NodeKind::Mapping(entries), Mark::detached())
    }

    /// Shallow shape check used to pick a union alternative for a value.
    fn fits(&self, ty: &Ty, value: &Value) -> bool {
        match (ty, value) {
            (Ty::Any, _) => true,
            (Ty::Primitive(p), v) => matches!(
                (p, v),
                (Prim::Null, Value::Null)
                    | (Prim::Bool, Value::Bool(_))
                    | (Prim::Int, Value::Int(_))
                    | (Prim::Float, Value::Float(_) | Value::Int(_))
                    | (Prim::Str, Value::Str(_))
            ),
            (Ty::List(_) | Ty::VarTuple(_), Value::List(_) | Value::Tuple(_)) => true,
            (Ty::Set(_), Value::Set(_) | Value::List(_)) => true,
            (Ty::Tuple(elems), Value::List(xs) | Value::Tuple(xs)) => elems.len() == xs.len(),
            (Ty::Mapping { .. }, Value::Map(_)) => true,
            (Ty::Record(rec), Value::Record(r)) => rec.name == r.name,
            (Ty::Unresolved(name), Value::Record(r)) => *name == r.name,
            (Ty::Union(alts), v) => alts.iter().any(|alt| self.fits(alt, v)),
            _ => false,
        }
    }
}
