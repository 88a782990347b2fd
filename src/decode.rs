//! Type-directed decoding: `Ty` + `Node` → `Value`.
//!
//! Non-union descriptors fail closed at the first incompatible node. Unions
//! try every alternative in declaration order and, when all fail, report
//! each alternative's error under one diagnostic at the outer node.

use std::collections::HashMap;

use indexmap::IndexMap;
use log::trace;

use crate::document::resolve;
use crate::error::{DecodeError, DecodeErrorKind, UnionDecodeError};
use crate::interp::Schema;
use crate::node::{Node, NodeKind, ScalarValue};
use crate::ty::{Prim, RecordTy, Ty};
use crate::value::{RecordValue, Value};

/// What to do with mapping keys that name no field of the record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UnknownKeys {
    #[default]
    Ignore,
    Deny,
}

pub struct Decoder<'s> {
    schema: &'s Schema,
    unknown_keys: UnknownKeys,
}

// ————————————————————————————————————————————————————————————————————————————
// IMPLEMENTATION
// ————————————————————————————————————————————————————————————————————————————

impl Schema {
    /// Decode `node` against the root descriptor with default policies.
    pub fn decode(&self, node: &Node) -> Result<Value, DecodeError> {
        Decoder::new(self).decode_root(node)
    }
}

impl<'s> Decoder<'s> {
    pub fn new(schema: &'s Schema) -> Self {
        Self { schema, unknown_keys: UnknownKeys::default() }
    }

    pub fn unknown_keys(mut self, policy: UnknownKeys) -> Self {
        self.unknown_keys = policy;
        self
    }

    pub fn decode_root(&self, node: &Node) -> Result<Value, DecodeError> {
        self.decode(&self.schema.root, node)
    }

    pub fn decode(&self, ty: &Ty, node: &Node) -> Result<Value, DecodeError> {
        match ty {
            Ty::Any => Ok(natural(node)),
            Ty::Primitive(p) => primitive(*p, node),
            Ty::List(item) => Ok(Value::List(self.items(ty, item, node)?)),
            Ty::Set(item) => Ok(Value::Set(self.items(ty, item, node)?.into_iter().collect())),
            Ty::VarTuple(item) => Ok(Value::Tuple(self.items(ty, item, node)?)),
            Ty::Tuple(elems) => {
                let items = sequence(ty, node)?;
                if items.len() != elems.len() {
                    return Err(DecodeError::new(
                        DecodeErrorKind::Length {
                            expected: ty.to_string(),
                            expected_len: elems.len(),
                            found_len: items.len(),
                        },
                        node.mark.clone(),
                    ));
                }
                let values = elems
                    .iter()
                    .zip(items)
                    .map(|(elem, item)| self.decode(elem, item))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(Value::Tuple(values))
            }
            Ty::Mapping { key, value } => {
                let NodeKind::Mapping(entries) = &node.kind else {
                    return Err(DecodeError::mismatch(ty.to_string(), node.kind_name(), node.mark.clone()));
                };
                let mut out = IndexMap::with_capacity(entries.len());
                for (k, v) in entries {
                    // duplicate keys after decoding: last write wins
                    out.insert(self.decode(key, k)?, self.decode(value, v)?);
                }
                Ok(Value::Map(out))
            }
            Ty::Union(alts) => self.union(alts, node),
            Ty::Record(rec) => self.record(rec, node),
            Ty::Unresolved(name) => match self.schema.record(name) {
                Some(rec) => self.record(rec, node),
                None => Err(DecodeError::new(
                    DecodeErrorKind::Unresolved { name: name.clone() },
                    node.mark.clone(),
                )),
            },
        }
    }

    fn items(&self, ty: &Ty, item: &Ty, node: &Node) -> Result<Vec<Value>, DecodeError> {
        sequence(ty, node)?.iter().map(|child| self.decode(item, child)).collect()
    }

    fn union(&self, alts: &[Ty], node: &Node) -> Result<Value, DecodeError> {
        let mut failures = Vec::with_capacity(alts.len());
        for alt in alts {
            match self.decode(alt, node) {
                Ok(value) => {
                    trace!("union alternative `{alt}` matched at line {}", node.mark.line);
                    return Ok(value);
                }
                Err(err) => {
                    trace!("union alternative `{alt}` rejected at line {}", node.mark.line);
                    failures.push((alt.to_string(), err));
                }
            }
        }
        Err(DecodeError::new(
            DecodeErrorKind::Union(UnionDecodeError { alternatives: failures }),
            node.mark.clone(),
        ))
    }

    fn record(&self, rec: &RecordTy, node: &Node) -> Result<Value, DecodeError> {
        let NodeKind::Mapping(entries) = &node.kind else {
            return Err(DecodeError::mismatch(rec.name.clone(), node.kind_name(), node.mark.clone()));
        };

        let mut present: HashMap<&str, &Node> = HashMap::with_capacity(entries.len());
        for (k, v) in entries {
            let name = k.as_scalar().map(|s| s.text.as_str());
            match name {
                Some(name) if rec.field(name).is_some() => {
                    present.insert(name, v);
                }
                _ if self.unknown_keys == UnknownKeys::Deny => {
                    let field = name.map_or_else(|| format!("<{}>", k.kind_name()), str::to_string);
                    return Err(DecodeError::new(
                        DecodeErrorKind::UnknownField { record: rec.name.clone(), field },
                        k.mark.clone(),
                    ));
                }
                _ => {}
            }
        }

        let mut out = RecordValue::new(rec.name.clone());
        for field in &rec.fields {
            let value = match present.get(field.name.as_str()) {
                Some(child) => {
                    let decoded = self.decode(&field.ty, child)?;
                    match &field.converter {
                        None => decoded,
                        Some(conv) => conv.apply(decoded).map_err(|e| {
                            DecodeError::new(
                                DecodeErrorKind::Convert {
                                    record: rec.name.clone(),
                                    field: field.name.clone(),
                                    message: format!("{e:#}"),
                                },
                                child.mark.clone(),
                            )
                        })?,
                    }
                }
                None => match &field.default {
                    Some(default) => default.clone(),
                    None => {
                        return Err(DecodeError::new(
                            DecodeErrorKind::MissingField {
                                record: rec.name.clone(),
                                field: field.name.clone(),
                            },
                            node.mark.clone(),
                        ));
                    }
                },
            };
            out.fields.insert(field.name.clone(), value);
        }
        Ok(Value::Record(out))
    }
}

fn sequence<'n>(ty: &Ty, node: &'n Node) -> Result<&'n [Node], DecodeError> {
    match &node.kind {
        NodeKind::Sequence(items) => Ok(items),
        _ => Err(DecodeError::mismatch(ty.to_string(), node.kind_name(), node.mark.clone())),
    }
}

/// `Any`: the node's own shape, applied recursively.
fn natural(node: &Node) -> Value {
    match &node.kind {
        NodeKind::Scalar(s) => match &s.value {
            ScalarValue::Null => Value::Null,
            ScalarValue::Bool(b) => Value::Bool(*b),
            ScalarValue::Int(i) => Value::Int(*i),
            ScalarValue::Float(x) => Value::float(*x),
            ScalarValue::Str(text) => Value::Str(text.clone()),
        },
        NodeKind::Sequence(items) => Value::List(items.iter().map(natural).collect()),
        NodeKind::Mapping(entries) => {
            Value::Map(entries.iter().map(|(k, v)| (natural(k), natural(v))).collect())
        }
    }
}

fn primitive(prim: Prim, node: &Node) -> Result<Value, DecodeError> {
    let Some(scalar) = node.as_scalar() else {
        return Err(DecodeError::mismatch(prim.name(), node.kind_name(), node.mark.clone()));
    };
    let value = match (prim, &scalar.value) {
        (Prim::Null, ScalarValue::Null) => Some(Value::Null),

        (Prim::Bool, ScalarValue::Bool(b)) => Some(Value::Bool(*b)),
        (Prim::Bool, ScalarValue::Int(i @ (0 | 1))) => Some(Value::Bool(*i == 1)),
        (Prim::Bool, ScalarValue::Str(s)) => resolve::parse_bool(s.trim()).map(Value::Bool),

        (Prim::Int, ScalarValue::Int(i)) => Some(Value::Int(*i)),
        (Prim::Int, ScalarValue::Str(s)) => resolve::parse_int(s).map(Value::Int),

        (Prim::Float, ScalarValue::Float(x)) => Some(Value::float(*x)),
        (Prim::Float, ScalarValue::Int(i)) => Some(Value::float(*i as f64)),
        (Prim::Float, ScalarValue::Str(s)) => resolve::parse_float(s).map(Value::float),

        // any scalar, as written
        (Prim::Str, _) => Some(Value::Str(scalar.text.clone())),
        _ => None,
    };
    value.ok_or_else(|| DecodeError::mismatch(prim.name(), scalar.describe(), node.mark.clone()))
}
