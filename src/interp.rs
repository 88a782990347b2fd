//! Type interpreter: `TypeLike` (literal or textual) + name environment →
//! canonical `Ty` tree.
//!
//! Records are interpreted once per call and memoized by name in a registry.
//! A record that refers back to itself (directly or through other records)
//! while it is still being interpreted gets a `Ty::Unresolved(name)`
//! placeholder; the finished `Schema` carries the registry the decoder uses to
//! look those names up. No `Arc` cycles are ever built.
pub mod env;
pub mod parse;

use std::collections::HashSet;
use std::sync::Arc;

use indexmap::IndexMap;
use log::{debug, trace};

use crate::error::{TypeError, TypeResolutionError};
use crate::ty::{FieldTy, RecordTy, Ty};

pub use env::{Definition, FieldDef, NameEnv, RecordDef, Substitution, TypeLike};

/// An interpreted type expression: the root descriptor plus every record it
/// reaches, keyed by record name. Immutable; safe to share across threads.
#[derive(Debug, Clone)]
pub struct Schema {
    pub root: Ty,
    pub records: IndexMap<String, Arc<RecordTy>>,
}

pub struct Interpreter<'a> {
    env: &'a NameEnv,
    substitution: &'a Substitution,
    registry: IndexMap<String, Arc<RecordTy>>,
    in_progress: HashSet<String>,
    alias_stack: Vec<String>,
}

/// Interpret `expr` against `env`, applying `substitution` at record
/// references made by name.
pub fn interpret(expr: &TypeLike, env: &NameEnv, substitution: &Substitution) -> Result<Schema, TypeError> {
    let mut interp = Interpreter::new(env, substitution);
    let root = interp.eval(expr)?;
    let schema = interp.finish(root)?;
    debug!("interpreted type `{}` ({} record types)", schema.root, schema.records.len());
    Ok(schema)
}

// ————————————————————————————————————————————————————————————————————————————
// IMPLEMENTATION
// ————————————————————————————————————————————————————————————————————————————

impl Schema {
    /// Registry lookup for `Ty::Unresolved` back-references.
    pub fn record(&self, name: &str) -> Option<&Arc<RecordTy>> {
        self.records.get(name)
    }

    pub fn type_to_str(&self) -> String {
        self.root.to_string()
    }
}

impl<'a> Interpreter<'a> {
    pub fn new(env: &'a NameEnv, substitution: &'a Substitution) -> Self {
        Self {
            env,
            substitution,
            registry: IndexMap::new(),
            in_progress: HashSet::new(),
            alias_stack: Vec::new(),
        }
    }

    pub fn eval(&mut self, expr: &TypeLike) -> Result<Ty, TypeError> {
        Ok(match expr {
            TypeLike::Text(src) => {
                let parsed = parse::parse(src)?;
                self.eval(&parsed)?
            }
            TypeLike::Named(name) => self.eval_name(name)?,
            TypeLike::Any => Ty::Any,
            TypeLike::Primitive(p) => Ty::Primitive(*p),
            TypeLike::List(item) => Ty::List(Box::new(self.eval_or_any(item.as_deref())?)),
            TypeLike::Set(item) => Ty::Set(Box::new(self.eval_or_any(item.as_deref())?)),
            TypeLike::Tuple(None) => Ty::VarTuple(Box::new(Ty::Any)),
            TypeLike::Tuple(Some(elems)) => Ty::Tuple(
                elems.iter().map(|e| self.eval(e)).collect::<Result<Vec<_>, _>>()?,
            ),
            TypeLike::VarTuple(item) => Ty::VarTuple(Box::new(self.eval(item)?)),
            TypeLike::Dict(None) => Ty::mapping(Ty::Any, Ty::Any),
            TypeLike::Dict(Some(kv)) => {
                let (key, value) = &**kv;
                Ty::mapping(self.eval(key)?, self.eval(value)?)
            }
            TypeLike::Union(alts) => self.eval_union(alts)?,
            TypeLike::Record(def) => self.eval_record(def)?,
        })
    }

    fn eval_or_any(&mut self, item: Option<&TypeLike>) -> Result<Ty, TypeError> {
        match item {
            Some(item) => self.eval(item),
            None => Ok(Ty::Any),
        }
    }

    // Union[A, Union[B, A]] → A | B ; Union[A] → A
    fn eval_union(&mut self, alts: &[TypeLike]) -> Result<Ty, TypeError> {
        let mut out: Vec<Ty> = Vec::with_capacity(alts.len());
        for alt in alts {
            let members = match self.eval(alt)? {
                Ty::Union(inner) => inner,
                other => vec![other],
            };
            for ty in members {
                if !out.contains(&ty) {
                    out.push(ty);
                }
            }
        }
        match out.len() {
            0 => Err(TypeError::EmptyUnion),
            1 => Ok(out.remove(0)),
            _ => Ok(Ty::Union(out)),
        }
    }

    fn names_record(&self, name: &str) -> bool {
        self.registry.contains_key(name) || self.in_progress.contains(name) || self.env.is_record(name)
    }

    fn eval_name(&mut self, name: &str) -> Result<Ty, TypeError> {
        let (env, substitution) = (self.env, self.substitution);
        let target = match substitution.get(name) {
            Some(replacement) if self.names_record(name) => {
                if !self.names_record(replacement) {
                    return Err(TypeResolutionError::UnknownReplacement {
                        name: name.to_string(),
                        replacement: replacement.clone(),
                    }
                    .into());
                }
                trace!("substituting record type `{name}` with `{replacement}`");
                replacement.as_str()
            }
            _ => name,
        };

        if let Some(rec) = self.registry.get(target) {
            trace!("record type `{target}` found in registry");
            return Ok(Ty::Record(Arc::clone(rec)));
        }
        if self.in_progress.contains(target) {
            return Ok(Ty::Unresolved(target.to_string()));
        }

        match env.get(target) {
            Some(Definition::Record(def)) => {
                let def = Arc::clone(def);
                self.eval_record(&def)
            }
            Some(Definition::Alias(ty)) => {
                if self.alias_stack.iter().any(|a| a == target) {
                    return Err(TypeResolutionError::RecursiveAlias { name: target.to_string() }.into());
                }
                let ty = ty.clone();
                self.alias_stack.push(target.to_string());
                let out = self.eval(&ty);
                self.alias_stack.pop();
                out
            }
            None => Err(TypeResolutionError::UnknownName { name: target.to_string() }.into()),
        }
    }

    fn eval_record(&mut self, def: &Arc<RecordDef>) -> Result<Ty, TypeError> {
        if let Some(rec) = self.registry.get(&def.name) {
            return Ok(Ty::Record(Arc::clone(rec)));
        }
        if self.in_progress.contains(&def.name) {
            return Ok(Ty::Unresolved(def.name.clone()));
        }

        debug!("interpreting record type `{}` ({} fields)", def.name, def.fields.len());
        self.in_progress.insert(def.name.clone());

        let mut seen = HashSet::new();
        let mut fields = Vec::with_capacity(def.fields.len());
        for field in &def.fields {
            if !seen.insert(field.name.as_str()) {
                return Err(TypeError::DuplicateField {
                    record: def.name.clone(),
                    field: field.name.clone(),
                });
            }
            fields.push(FieldTy {
                name: field.name.clone(),
                ty: self.eval(&field.ty)?,
                default: field.default.clone(),
                converter: field.converter.clone(),
            });
        }

        self.in_progress.remove(&def.name);
        let rec = Arc::new(RecordTy { name: def.name.clone(), fields });
        self.registry.insert(def.name.clone(), Arc::clone(&rec));
        Ok(Ty::Record(rec))
    }

    /// Seal the registry; every back-reference must have an entry.
    pub fn finish(self, root: Ty) -> Result<Schema, TypeError> {
        let schema = Schema { root, records: self.registry };
        let mut pending = vec![&schema.root];
        pending.extend(schema.records.values().flat_map(|r| r.fields.iter().map(|f| &f.ty)));
        while let Some(ty) = pending.pop() {
            match ty {
                Ty::Unresolved(name) if !schema.records.contains_key(name) => {
                    return Err(TypeResolutionError::UnknownName { name: name.clone() }.into());
                }
                Ty::List(t) | Ty::Set(t) | Ty::VarTuple(t) => pending.push(t),
                Ty::Tuple(ts) | Ty::Union(ts) => pending.extend(ts.iter()),
                Ty::Mapping { key, value } => {
                    pending.push(key);
                    pending.push(value);
                }
                // record fields are already queued from the registry
                _ => {}
            }
        }
        Ok(schema)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ty::Prim;

    fn render(expr: impl Into<TypeLike>) -> String {
        interpret(&expr.into(), &NameEnv::new(), &Substitution::new()).unwrap().type_to_str()
    }

    #[test]
    fn canonical_rendering_of_builtins() {
        assert_eq!(render(TypeLike::Primitive(Prim::Int)), "int");
        assert_eq!(render("int"), "int");
        assert_eq!(render(TypeLike::list(Prim::Int)), "list[int]");
        assert_eq!(render(TypeLike::list("int")), "list[int]");
        assert_eq!(render(TypeLike::list(TypeLike::list(Prim::Int))), "list[list[int]]");
        assert_eq!(render(TypeLike::List(None)), "list[Any]");
        assert_eq!(render(TypeLike::Dict(None)), "dict[Any, Any]");
        assert_eq!(render(TypeLike::Set(None)), "set[Any]");
        assert_eq!(render(TypeLike::Tuple(None)), "tuple[Any, ...]");
        assert_eq!(render("Any"), "Any");
        assert_eq!(render("list[int]"), "list[int]");
    }

    #[test]
    fn unions_flatten_and_collapse() {
        assert_eq!(render("Union[int, Union[str, int]]"), "int | str");
        assert_eq!(render("Union[int]"), "int");
        assert_eq!(render("Optional[list[int]]"), "list[int] | None");
        assert_eq!(
            interpret(&TypeLike::Union(vec![]), &NameEnv::new(), &Substitution::new()).unwrap_err(),
            TypeError::EmptyUnion
        );
    }

    #[test]
    fn rendering_round_trips() {
        let env = NameEnv::new().with_record(RecordDef::new("Point").field("x", "int").field("y", "int"));
        let none = Substitution::new();
        for src in [
            "int",
            "list[dict[str, tuple[int, ...]]]",
            "set[float] | None",
            "tuple[int, str, Any]",
            "Dict[str, Optional[Point]]",
            "tuple[()]",
            "list[tuple[()] | int]",
        ] {
            let first = interpret(&src.into(), &env, &none).unwrap();
            let again = interpret(&first.type_to_str().into(), &env, &none).unwrap();
            assert_eq!(first.root, again.root, "{src}");
        }
    }

    #[test]
    fn empty_literal_tuple_renders_parseably() {
        let none = Substitution::new();
        let first = interpret(&TypeLike::tuple(Vec::<TypeLike>::new()), &NameEnv::new(), &none).unwrap();
        assert_eq!(first.type_to_str(), "tuple[()]");
        let again = interpret(&first.type_to_str().into(), &NameEnv::new(), &none).unwrap();
        assert_eq!(first.root, again.root);
    }

    #[test]
    fn unknown_names_fail_resolution() {
        let err = interpret(&"list[Nope]".into(), &NameEnv::new(), &Substitution::new()).unwrap_err();
        assert_eq!(
            err,
            TypeError::Resolution(TypeResolutionError::UnknownName { name: "Nope".into() })
        );
    }

    #[test]
    fn recursive_alias_is_an_error() {
        let env = NameEnv::new().with_alias("Tree", "list[Tree]");
        let err = interpret(&"Tree".into(), &env, &Substitution::new()).unwrap_err();
        assert!(matches!(err, TypeError::Resolution(TypeResolutionError::RecursiveAlias { .. })));
    }

    #[test]
    fn self_reference_uses_placeholder_and_registry() {
        let person = RecordDef::new("Person").field("name", "str").field("friends", "list[Person]").into_arc();
        let env = NameEnv::new().with_record(Arc::clone(&person));
        let schema = interpret(&TypeLike::from(&person), &env, &Substitution::new()).unwrap();

        let Ty::Record(rec) = &schema.root else { panic!("expected record") };
        assert_eq!(rec.field("friends").map(|f| &f.ty), Some(&Ty::list(Ty::Unresolved("Person".into()))));
        assert!(Arc::ptr_eq(rec, schema.record("Person").unwrap()));
    }

    #[test]
    fn mutual_references_share_registry_instances() {
        let env = NameEnv::new()
            .with_record(RecordDef::new("A").field("b", "Optional[B]"))
            .with_record(RecordDef::new("B").field("a", "list[A]"));
        let schema = interpret(&"tuple[A, B]".into(), &env, &Substitution::new()).unwrap();

        let Ty::Tuple(elems) = &schema.root else { panic!("expected tuple") };
        let (Ty::Record(a), Ty::Record(b)) = (&elems[0], &elems[1]) else { panic!("expected records") };
        assert!(Arc::ptr_eq(b, schema.record("B").unwrap()));
        assert_eq!(a.field("b").map(|f| f.ty.to_string()).as_deref(), Some("B | None"));
        assert_eq!(b.field("a").map(|f| &f.ty), Some(&Ty::list(Ty::Unresolved("A".into()))));
    }

    #[test]
    fn duplicate_fields_are_rejected() {
        let def = RecordDef::new("P").field("x", "int").field("x", "str");
        let err = interpret(&def.into(), &NameEnv::new(), &Substitution::new()).unwrap_err();
        assert_eq!(err, TypeError::DuplicateField { record: "P".into(), field: "x".into() });
    }
}
