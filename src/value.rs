//! Decoded value tree. Owned entirely by the caller.

use std::collections::hash_map::DefaultHasher;
use std::fmt;
use std::hash::{Hash, Hasher};

use indexmap::{IndexMap, IndexSet};
use ordered_float::OrderedFloat;
use serde::ser::{Serialize, SerializeMap, SerializeSeq, Serializer};

use crate::interp::env::RecordDef;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(OrderedFloat<f64>),
    Str(String),
    List(Vec<Value>),
    Tuple(Vec<Value>),
    Set(IndexSet<Value>),
    Map(IndexMap<Value, Value>),
    Record(RecordValue),
}

/// Instance of a record type; `fields` follow the declared field order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordValue {
    pub name: String,
    pub fields: IndexMap<String, Value>,
}

// ————————————————————————————————————————————————————————————————————————————
// IMPLEMENTATION
// ————————————————————————————————————————————————————————————————————————————

impl Value {
    pub fn float(x: f64) -> Self {
        Value::Float(OrderedFloat(x))
    }

    pub fn str(s: impl Into<String>) -> Self {
        Value::Str(s.into())
    }

    pub fn list<I, V>(items: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        Value::List(items.into_iter().map(Into::into).collect())
    }

    pub fn tuple<I, V>(items: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        Value::Tuple(items.into_iter().map(Into::into).collect())
    }

    pub fn set<I, V>(items: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        Value::Set(items.into_iter().map(Into::into).collect())
    }

    pub fn map<I, K, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<Value>,
        V: Into<Value>,
    {
        Value::Map(entries.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_record(&self) -> Option<&RecordValue> {
        match self {
            Value::Record(r) => Some(r),
            _ => None,
        }
    }
}

impl RecordValue {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(), fields: IndexMap::new() }
    }

    /// Instance in declared field order: given `values` first, declared
    /// defaults for the rest. Fields with neither are left out, and so are
    /// keys the record does not declare.
    pub fn of<I, K, V>(def: &RecordDef, values: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        let mut given: IndexMap<String, Value> =
            values.into_iter().map(|(k, v)| (k.into(), v.into())).collect();
        let mut out = Self::new(def.name.clone());
        for field in &def.fields {
            if let Some(value) = given.shift_remove(&field.name).or_else(|| field.default.clone()) {
                out.fields.insert(field.name.clone(), value);
            }
        }
        out
    }

    /// Set a field; an existing key keeps its position.
    pub fn with(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(field.into(), value.into());
        self
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }
}

// order-insensitive, to agree with IndexMap/IndexSet equality
fn unordered_hash<T: Hash>(items: impl Iterator<Item = T>) -> u64 {
    items
        .map(|item| {
            let mut h = DefaultHasher::new();
            item.hash(&mut h);
            h.finish()
        })
        .fold(0u64, u64::wrapping_add)
}

impl Hash for Value {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            Value::Null => {}
            Value::Bool(b) => b.hash(state),
            Value::Int(i) => i.hash(state),
            Value::Float(x) => x.hash(state),
            Value::Str(s) => s.hash(state),
            Value::List(xs) | Value::Tuple(xs) => xs.hash(state),
            Value::Set(xs) => unordered_hash(xs.iter()).hash(state),
            Value::Map(m) => unordered_hash(m.iter()).hash(state),
            Value::Record(r) => r.hash(state),
        }
    }
}

impl Hash for RecordValue {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.name.hash(state);
        unordered_hash(self.fields.iter()).hash(state);
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn seq<'a>(
            f: &mut fmt::Formatter<'_>,
            open: &str,
            close: &str,
            items: impl Iterator<Item = &'a Value>,
        ) -> fmt::Result {
            f.write_str(open)?;
            for (i, item) in items.enumerate() {
                if i > 0 { f.write_str(", ")?; }
                write!(f, "{item}")?;
            }
            f.write_str(close)
        }

        match self {
            Value::Null => f.write_str("null"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Int(i) => write!(f, "{i}"),
            Value::Float(x) => write!(f, "{:?}", x.0),
            Value::Str(s) => f.write_str(s),
            Value::List(xs) => seq(f, "[", "]", xs.iter()),
            Value::Tuple(xs) => seq(f, "(", ")", xs.iter()),
            Value::Set(xs) => seq(f, "{", "}", xs.iter()),
            Value::Map(m) => {
                f.write_str("{")?;
                for (i, (k, v)) in m.iter().enumerate() {
                    if i > 0 { f.write_str(", ")?; }
                    write!(f, "{k}: {v}")?;
                }
                f.write_str("}")
            }
            Value::Record(r) => write!(f, "{r}"),
        }
    }
}

impl fmt::Display for RecordValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}(", self.name)?;
        for (i, (k, v)) in self.fields.iter().enumerate() {
            if i > 0 { f.write_str(", ")?; }
            write!(f, "{k}={v}")?;
        }
        f.write_str(")")
    }
}

// -------------------- serde: JSON view for the CLI --------------------

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Value::Null => serializer.serialize_unit(),
            Value::Bool(b) => serializer.serialize_bool(*b),
            Value::Int(i) => serializer.serialize_i64(*i),
            Value::Float(x) => serializer.serialize_f64(x.0),
            Value::Str(s) => serializer.serialize_str(s),
            Value::List(xs) | Value::Tuple(xs) => {
                let mut seq = serializer.serialize_seq(Some(xs.len()))?;
                for x in xs { seq.serialize_element(x)?; }
                seq.end()
            }
            Value::Set(xs) => {
                let mut seq = serializer.serialize_seq(Some(xs.len()))?;
                for x in xs { seq.serialize_element(x)?; }
                seq.end()
            }
            Value::Map(m) => {
                let mut map = serializer.serialize_map(Some(m.len()))?;
                for (k, v) in m {
                    // JSON keys are strings; non-string keys use their display form
                    match k {
                        Value::Str(s) => map.serialize_entry(s, v)?,
                        other => map.serialize_entry(&other.to_string(), v)?,
                    }
                }
                map.end()
            }
            Value::Record(r) => r.serialize(serializer),
        }
    }
}

impl Serialize for RecordValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for (k, v) in &self.fields {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}

// -------------------- conversions --------------------

impl From<bool> for Value {
    fn from(b: bool) -> Self { Value::Bool(b) }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self { Value::Int(i) }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self { Value::Int(i64::from(i)) }
}

impl From<f64> for Value {
    fn from(x: f64) -> Self { Value::float(x) }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self { Value::Str(s.to_string()) }
}

impl From<String> for Value {
    fn from(s: String) -> Self { Value::Str(s) }
}

impl From<RecordValue> for Value {
    fn from(r: RecordValue) -> Self { Value::Record(r) }
}

impl From<Vec<Value>> for Value {
    fn from(xs: Vec<Value>) -> Self { Value::List(xs) }
}

impl From<serde_json::Value> for Value {
    fn from(v: serde_json::Value) -> Self {
        match v {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => Value::Int(i),
                None => Value::float(n.as_f64().unwrap_or(f64::NAN)),
            },
            serde_json::Value::String(s) => Value::Str(s),
            serde_json::Value::Array(xs) => Value::List(xs.into_iter().map(Value::from).collect()),
            serde_json::Value::Object(m) => Value::Map(
                m.into_iter().map(|(k, v)| (Value::Str(k), Value::from(v))).collect(),
            ),
        }
    }
}
