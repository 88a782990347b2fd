//! Type-directed YAML loading and dumping.
//!
//! A type expression (literal `TypeLike` or text such as `"dict[str, list[Point]]"`)
//! is interpreted into a [`Schema`]; documents are parsed into position-tagged
//! nodes and decoded against it. Failures point at the offending node, and a
//! failed union reports why each alternative was rejected.
//!
//! ```no_run
//! use type_yaml::{loads, LoadOptions, Value};
//!
//! let v = loads("list[int]", "[1, 2, 3]", &LoadOptions::default())?;
//! assert_eq!(v, Value::list([1, 2, 3]));
//! # Ok::<(), type_yaml::Error>(())
//! ```
pub mod config;
pub mod decode;
pub mod document;
pub mod encode;
pub mod error;
pub mod interp;
pub mod node;
pub mod ty;
pub mod value;

use std::io::{Read, Write};
use std::sync::Arc;

pub use config::LoadOptions;
pub use decode::{Decoder, UnknownKeys};
pub use encode::encode;
pub use error::{
    DecodeError, DecodeErrorKind, DocumentError, Error, Result, TypeError, TypeResolutionError,
    TypeSyntaxError, UnionDecodeError,
};
pub use interp::{interpret, Definition, FieldDef, NameEnv, RecordDef, Schema, Substitution, TypeLike};
pub use node::{Mark, Node, NodeKind};
pub use ty::{Prim, RecordTy, Ty};
pub use value::{RecordValue, Value};

/// Decode `text` against `type_expr`.
///
/// With `multi_document`, a sequence-shaped type takes the documents as its
/// elements; any other type is applied per document and the results come back
/// as a list.
pub fn loads(type_expr: impl Into<TypeLike>, text: &str, opts: &LoadOptions) -> Result<Value> {
    let schema = interpret(&type_expr.into(), &opts.name_env, &opts.name_substitution)?;
    load_with(&schema, text, opts)
}

pub fn load(type_expr: impl Into<TypeLike>, mut reader: impl Read, opts: &LoadOptions) -> Result<Value> {
    let mut text = String::new();
    reader.read_to_string(&mut text)?;
    loads(type_expr, &text, opts)
}

/// Decode against an already interpreted schema. `opts.name_env` and
/// `opts.name_substitution` are not consulted.
pub fn load_with(schema: &Schema, text: &str, opts: &LoadOptions) -> Result<Value> {
    let decoder = Decoder::new(schema).unknown_keys(opts.unknown_keys);
    if !opts.multi_document {
        let node = document::parse_single(text, &opts.source)?;
        return Ok(decoder.decode_root(&node)?);
    }

    let docs = document::parse(text, &opts.source)?;
    if schema.root.is_sequence_shaped() {
        let mark = docs
            .first()
            .map_or_else(|| Mark::new(Arc::from(opts.source.as_str()), 1, 1), |doc| doc.mark.clone());
        let stream = Node::new(NodeKind::Sequence(docs), mark);
        return Ok(decoder.decode_root(&stream)?);
    }
    let values = docs
        .iter()
        .map(|doc| decoder.decode_root(doc))
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(Value::List(values))
}

/// Render `value` by its own shape. See [`dumps_as`] to lay records out as
/// declared.
pub fn dumps(value: &Value) -> Result<String> {
    Ok(document::render(&encode(value))?)
}

/// Render `value` as `type_expr` describes it: records in declared field
/// order, absent fields as their declared defaults.
pub fn dumps_as(type_expr: impl Into<TypeLike>, value: &Value, opts: &LoadOptions) -> Result<String> {
    let schema = interpret(&type_expr.into(), &opts.name_env, &opts.name_substitution)?;
    dumps_with(&schema, value)
}

pub fn dumps_with(schema: &Schema, value: &Value) -> Result<String> {
    Ok(document::render(&schema.encode(value))?)
}

pub fn dump(value: &Value, mut writer: impl Write) -> Result<()> {
    writer.write_all(dumps(value)?.as_bytes())?;
    Ok(())
}
