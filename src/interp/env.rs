//! Inputs to the interpreter: type expressions, record declarations and the
//! caller-supplied name environment.

use std::collections::HashMap;
use std::sync::Arc;

use crate::ty::{Converter, Prim};
use crate::value::Value;

/// A type expression, either literal or textual. Textual parts may appear at
/// any depth (`list` of `"Person"`).
#[derive(Debug, Clone)]
pub enum TypeLike {
    /// Parsed with the type-expression grammar.
    Text(String),
    /// Resolved through the name environment.
    Named(String),
    Any,
    Primitive(Prim),
    /// `None` element means the bare container (`list` → `list[Any]`).
    List(Option<Box<TypeLike>>),
    Set(Option<Box<TypeLike>>),
    Tuple(Option<Vec<TypeLike>>),
    VarTuple(Box<TypeLike>),
    Dict(Option<Box<(TypeLike, TypeLike)>>),
    Union(Vec<TypeLike>),
    Record(Arc<RecordDef>),
}

/// Declared record type: ordered, uniquely named fields.
#[derive(Debug, Clone)]
pub struct RecordDef {
    pub name: String,
    pub fields: Vec<FieldDef>,
}

#[derive(Debug, Clone)]
pub struct FieldDef {
    pub name: String,
    /// Type the document value is decoded against, before any converter.
    pub ty: TypeLike,
    pub default: Option<Value>,
    pub converter: Option<Converter>,
}

#[derive(Debug, Clone)]
pub enum Definition {
    Alias(TypeLike),
    Record(Arc<RecordDef>),
}

/// Maps type names appearing in expressions to definitions. Supplied per call.
#[derive(Debug, Clone, Default)]
pub struct NameEnv {
    defs: HashMap<String, Definition>,
}

/// Declared record name → replacement record name.
pub type Substitution = HashMap<String, String>;

// ————————————————————————————————————————————————————————————————————————————
// IMPLEMENTATION
// ————————————————————————————————————————————————————————————————————————————

impl TypeLike {
    pub fn text(s: impl Into<String>) -> Self { TypeLike::Text(s.into()) }
    pub fn named(s: impl Into<String>) -> Self { TypeLike::Named(s.into()) }
    pub fn list(item: impl Into<TypeLike>) -> Self { TypeLike::List(Some(Box::new(item.into()))) }
    pub fn set(item: impl Into<TypeLike>) -> Self { TypeLike::Set(Some(Box::new(item.into()))) }
    pub fn var_tuple(item: impl Into<TypeLike>) -> Self { TypeLike::VarTuple(Box::new(item.into())) }
    pub fn dict(key: impl Into<TypeLike>, value: impl Into<TypeLike>) -> Self {
        TypeLike::Dict(Some(Box::new((key.into(), value.into()))))
    }
    pub fn tuple<I>(elems: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<TypeLike>,
    {
        TypeLike::Tuple(Some(elems.into_iter().map(Into::into).collect()))
    }
    pub fn union<I>(alts: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<TypeLike>,
    {
        TypeLike::Union(alts.into_iter().map(Into::into).collect())
    }
    pub fn optional(inner: impl Into<TypeLike>) -> Self {
        TypeLike::Union(vec![inner.into(), TypeLike::Primitive(Prim::Null)])
    }
}

impl From<&str> for TypeLike {
    fn from(s: &str) -> Self { TypeLike::Text(s.to_string()) }
}

impl From<String> for TypeLike {
    fn from(s: String) -> Self { TypeLike::Text(s) }
}

impl From<Prim> for TypeLike {
    fn from(p: Prim) -> Self { TypeLike::Primitive(p) }
}

impl From<Arc<RecordDef>> for TypeLike {
    fn from(def: Arc<RecordDef>) -> Self { TypeLike::Record(def) }
}

impl From<&Arc<RecordDef>> for TypeLike {
    fn from(def: &Arc<RecordDef>) -> Self { TypeLike::Record(Arc::clone(def)) }
}

impl From<RecordDef> for TypeLike {
    fn from(def: RecordDef) -> Self { TypeLike::Record(Arc::new(def)) }
}

impl RecordDef {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(), fields: Vec::new() }
    }

    /// Append a required field.
    pub fn field(self, name: impl Into<String>, ty: impl Into<TypeLike>) -> Self {
        self.with_field(FieldDef::new(name, ty))
    }

    pub fn with_field(mut self, field: FieldDef) -> Self {
        self.fields.push(field);
        self
    }

    pub fn into_arc(self) -> Arc<RecordDef> {
        Arc::new(self)
    }
}

impl FieldDef {
    pub fn new(name: impl Into<String>, ty: impl Into<TypeLike>) -> Self {
        Self { name: name.into(), ty: ty.into(), default: None, converter: None }
    }

    pub fn default(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(value.into());
        self
    }

    pub fn convert<F>(mut self, f: F) -> Self
    where
        F: Fn(Value) -> anyhow::Result<Value> + Send + Sync + 'static,
    {
        self.converter = Some(Converter::new(f));
        self
    }
}

impl NameEnv {
    pub fn new() -> Self { Self::default() }

    pub fn insert(&mut self, name: impl Into<String>, def: Definition) {
        self.defs.insert(name.into(), def);
    }

    /// Register a record under its declared name.
    pub fn with_record(mut self, def: impl Into<Arc<RecordDef>>) -> Self {
        let def = def.into();
        self.defs.insert(def.name.clone(), Definition::Record(def));
        self
    }

    pub fn with_alias(mut self, name: impl Into<String>, ty: impl Into<TypeLike>) -> Self {
        self.defs.insert(name.into(), Definition::Alias(ty.into()));
        self
    }

    pub fn get(&self, name: &str) -> Option<&Definition> {
        self.defs.get(name)
    }

    pub fn is_record(&self, name: &str) -> bool {
        matches!(self.defs.get(name), Some(Definition::Record(_)))
    }
}
