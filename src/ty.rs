//! Canonical type descriptors. Built once by the interpreter, read-only after.

use std::fmt;
use std::sync::Arc;

use crate::value::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Prim {
    Bool,
    Int,
    Float,
    Str,
    Null,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Ty {
    Any,
    Primitive(Prim),
    List(Box<Ty>),
    Set(Box<Ty>),
    Tuple(Vec<Ty>),          // fixed arity
    VarTuple(Box<Ty>),       // tuple[T, ...]
    Mapping { key: Box<Ty>, value: Box<Ty> },
    Union(Vec<Ty>),          // attempt order == declaration order, never empty
    Record(Arc<RecordTy>),
    /// Back-reference to a record still being interpreted; looked up in the
    /// schema registry at decode time.
    Unresolved(String),
}

#[derive(Debug, PartialEq)]
pub struct RecordTy {
    pub name: String,
    pub fields: Vec<FieldTy>,
}

#[derive(Debug)]
pub struct FieldTy {
    pub name: String,
    pub ty: Ty,
    pub default: Option<Value>,
    pub converter: Option<Converter>,
}

/// Field-level hook applied to the structurally decoded value.
#[derive(Clone)]
pub struct Converter(Arc<dyn Fn(Value) -> anyhow::Result<Value> + Send + Sync>);

// ————————————————————————————————————————————————————————————————————————————
// IMPLEMENTATION
// ————————————————————————————————————————————————————————————————————————————

impl Prim {
    pub fn name(self) -> &'static str {
        match self {
            Prim::Bool => "bool",
            Prim::Int => "int",
            Prim::Float => "float",
            Prim::Str => "str",
            Prim::Null => "None",
        }
    }
}

impl Ty {
    pub fn list(item: Ty) -> Self { Ty::List(Box::new(item)) }
    pub fn set(item: Ty) -> Self { Ty::Set(Box::new(item)) }
    pub fn var_tuple(item: Ty) -> Self { Ty::VarTuple(Box::new(item)) }
    pub fn mapping(key: Ty, value: Ty) -> Self {
        Ty::Mapping { key: Box::new(key), value: Box::new(value) }
    }

    /// Containers whose document form is a sequence node.
    pub fn is_sequence_shaped(&self) -> bool {
        matches!(self, Ty::List(_) | Ty::Set(_) | Ty::Tuple(_) | Ty::VarTuple(_))
    }

    /// Canonical lowercase notation, e.g. `list[int]`, `tuple[int, ...]`.
    pub fn type_to_str(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Ty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Ty::Any => f.write_str("Any"),
            Ty::Primitive(p) => f.write_str(p.name()),
            Ty::List(item) => write!(f, "list[{item}]"),
            Ty::Set(item) => write!(f, "set[{item}]"),
            Ty::VarTuple(item) => write!(f, "tuple[{item}, ...]"),
            Ty::Tuple(elems) if elems.is_empty() => f.write_str("tuple[()]"),
            Ty::Tuple(elems) => {
                f.write_str("tuple[")?;
                write_joined(f, elems, ", ")?;
                f.write_str("]")
            }
            Ty::Mapping { key, value } => write!(f, "dict[{key}, {value}]"),
            Ty::Union(alts) => write_joined(f, alts, " | "),
            Ty::Record(rec) => f.write_str(&rec.name),
            Ty::Unresolved(name) => f.write_str(name),
        }
    }
}

fn write_joined(f: &mut fmt::Formatter<'_>, tys: &[Ty], sep: &str) -> fmt::Result {
    for (i, ty) in tys.iter().enumerate() {
        if i > 0 {
            f.write_str(sep)?;
        }
        write!(f, "{ty}")?;
    }
    Ok(())
}

impl RecordTy {
    pub fn field(&self, name: &str) -> Option<&FieldTy> {
        self.fields.iter().find(|f| f.name == name)
    }
}

impl PartialEq for FieldTy {
    // closures have no identity worth comparing; presence is enough
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
            && self.ty == other.ty
            && self.default == other.default
            && self.converter.is_some() == other.converter.is_some()
    }
}

impl Converter {
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(Value) -> anyhow::Result<Value> + Send + Sync + 'static,
    {
        Self(Arc::new(f))
    }

    pub fn apply(&self, value: Value) -> anyhow::Result<Value> {
        (self.0)(value)
    }
}

impl fmt::Debug for Converter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Converter(..)")
    }
}
