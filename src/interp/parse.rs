//! Textual type expressions → `TypeLike`.
//!
//! Grammar (whitespace, including newlines, allowed between tokens):
//!
//! ```text
//! expr := term ('|' term)*
//! term := NAME ('[' arg (',' arg)* ','? ']')?
//! arg  := expr | '...' | '(' ')'
//! ```
//!
//! `tuple[()]` is the empty fixed tuple.
//!
//! `NAME` is an identifier, optionally dotted (`models.Person`), or a quoted
//! string naming a type (`list['Person']`). Built-in names are mapped here;
//! every other name becomes `TypeLike::Named` for the interpreter to resolve.

use crate::error::TypeSyntaxError;
use crate::interp::env::TypeLike;
use crate::ty::Prim;

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Name(String),
    LBracket,
    RBracket,
    Comma,
    Pipe,
    Ellipsis,
    Unit,
}

enum Arg {
    Ty(TypeLike),
    Ellipsis(usize),
    Unit(usize),
}

pub fn parse(input: &str) -> Result<TypeLike, TypeSyntaxError> {
    let tokens = tokenize(input)?;
    let mut parser = Parser { input, tokens, pos: 0 };
    let ty = parser.expr()?;
    if let Some((tok, at)) = parser.tokens.get(parser.pos) {
        return Err(parser.error(*at, format!("unexpected {}", describe(tok))));
    }
    Ok(ty)
}

// ------------------------------ Lexer ------------------------------------ //

fn tokenize(input: &str) -> Result<Vec<(Token, usize)>, TypeSyntaxError> {
    let err = |at: usize, message: String| TypeSyntaxError {
        input: input.to_string(),
        offset: at,
        message,
    };

    let mut out = Vec::new();
    let mut chars = input.char_indices().peekable();
    while let Some((at, c)) = chars.next() {
        match c {
            c if c.is_whitespace() => {}
            '[' => out.push((Token::LBracket, at)),
            ']' => out.push((Token::RBracket, at)),
            ',' => out.push((Token::Comma, at)),
            '|' => out.push((Token::Pipe, at)),
            '(' => {
                while chars.next_if(|&(_, d)| d.is_whitespace()).is_some() {}
                if chars.next_if(|&(_, d)| d == ')').is_none() {
                    return Err(err(at, "expected `()`".into()));
                }
                out.push((Token::Unit, at));
            }
            '.' => {
                let dots = input[at..].chars().take_while(|&d| d == '.').count();
                if dots != 3 {
                    return Err(err(at, "expected `...`".into()));
                }
                chars.next();
                chars.next();
                out.push((Token::Ellipsis, at));
            }
            '\'' | '"' => {
                let mut name = String::new();
                let mut closed = false;
                for (_, d) in chars.by_ref() {
                    if d == c {
                        closed = true;
                        break;
                    }
                    name.push(d);
                }
                if !closed {
                    return Err(err(at, "unterminated quoted name".into()));
                }
                let name = name.trim().to_string();
                if !is_name(&name) {
                    return Err(err(at, format!("invalid type name {name:?}")));
                }
                out.push((Token::Name(name), at));
            }
            c if c.is_alphabetic() || c == '_' => {
                let mut name = String::from(c);
                while let Some(&(idx, d)) = chars.peek() {
                    // a dot continues a dotted name only when followed by an identifier char
                    let continues = d.is_alphanumeric()
                        || d == '_'
                        || (d == '.'
                            && input[idx + 1..]
                                .chars()
                                .next()
                                .is_some_and(|n| n.is_alphabetic() || n == '_'));
                    if !continues {
                        break;
                    }
                    name.push(d);
                    chars.next();
                }
                out.push((Token::Name(name), at));
            }
            other => return Err(err(at, format!("unexpected character {other:?}"))),
        }
    }
    Ok(out)
}

fn is_name(s: &str) -> bool {
    !s.is_empty()
        && s.split('.').all(|part| {
            let mut cs = part.chars();
            cs.next().is_some_and(|c| c.is_alphabetic() || c == '_')
                && cs.all(|c| c.is_alphanumeric() || c == '_')
        })
}

fn describe(tok: &Token) -> String {
    match tok {
        Token::Name(n) => format!("name `{n}`"),
        Token::LBracket => "`[`".into(),
        Token::RBracket => "`]`".into(),
        Token::Comma => "`,`".into(),
        Token::Pipe => "`|`".into(),
        Token::Ellipsis => "`...`".into(),
        Token::Unit => "`()`".into(),
    }
}

// ------------------------------ Parser ----------------------------------- //

struct Parser<'a> {
    input: &'a str,
    tokens: Vec<(Token, usize)>,
    pos: usize,
}

impl Parser<'_> {
    fn error(&self, offset: usize, message: impl Into<String>) -> TypeSyntaxError {
        TypeSyntaxError {
            input: self.input.to_string(),
            offset,
            message: message.into(),
        }
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos).map(|(t, _)| t)
    }

    /// Offset of the current token, or end of input.
    fn here(&self) -> usize {
        self.tokens.get(self.pos).map_or(self.input.len(), |(_, at)| *at)
    }

    fn eat(&mut self, tok: &Token) -> bool {
        if self.peek() == Some(tok) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expr(&mut self) -> Result<TypeLike, TypeSyntaxError> {
        let first = self.term()?;
        if self.peek() != Some(&Token::Pipe) {
            return Ok(first);
        }
        let mut alts = vec![first];
        while self.eat(&Token::Pipe) {
            alts.push(self.term()?);
        }
        Ok(TypeLike::Union(alts))
    }

    fn term(&mut self) -> Result<TypeLike, TypeSyntaxError> {
        let at = self.here();
        let name = match self.tokens.get(self.pos) {
            Some((Token::Name(n), _)) => n.clone(),
            Some((tok, _)) => {
                return Err(self.error(at, format!("expected type name, found {}", describe(tok))));
            }
            None => return Err(self.error(at, "expected type name, found end of input")),
        };
        self.pos += 1;

        let args = if self.eat(&Token::LBracket) {
            Some(self.args()?)
        } else {
            None
        };
        self.build(&name, at, args)
    }

    fn args(&mut self) -> Result<Vec<Arg>, TypeSyntaxError> {
        let mut args = Vec::new();
        loop {
            if self.peek() == Some(&Token::Ellipsis) {
                args.push(Arg::Ellipsis(self.here()));
                self.pos += 1;
            } else if self.peek() == Some(&Token::Unit) {
                args.push(Arg::Unit(self.here()));
                self.pos += 1;
            } else {
                args.push(Arg::Ty(self.expr()?));
            }
            if self.eat(&Token::Comma) {
                // trailing comma
                if self.eat(&Token::RBracket) {
                    return Ok(args);
                }
                continue;
            }
            if self.eat(&Token::RBracket) {
                return Ok(args);
            }
            let at = self.here();
            return Err(match self.peek() {
                Some(tok) => self.error(at, format!("expected `,` or `]`, found {}", describe(tok))),
                None => self.error(at, "expected `]`, found end of input"),
            });
        }
    }

    fn build(&self, name: &str, at: usize, args: Option<Vec<Arg>>) -> Result<TypeLike, TypeSyntaxError> {
        let bare = name.strip_prefix("typing.").unwrap_or(name);
        let primitive = match bare {
            "Any" => Some(TypeLike::Any),
            "bool" => Some(TypeLike::Primitive(Prim::Bool)),
            "int" => Some(TypeLike::Primitive(Prim::Int)),
            "float" => Some(TypeLike::Primitive(Prim::Float)),
            "str" => Some(TypeLike::Primitive(Prim::Str)),
            "None" | "NoneType" => Some(TypeLike::Primitive(Prim::Null)),
            _ => None,
        };

        match bare {
            "list" | "List" | "set" | "Set" | "frozenset" | "FrozenSet" => {
                let item = match args {
                    None => None,
                    Some(args) => Some(Box::new(self.exactly_one(name, at, args)?)),
                };
                Ok(if bare.eq_ignore_ascii_case("list") {
                    TypeLike::List(item)
                } else {
                    TypeLike::Set(item)
                })
            }
            "dict" | "Dict" => match args {
                None => Ok(TypeLike::Dict(None)),
                Some(args) => {
                    let mut tys = self.types_only(args)?;
                    if tys.len() != 2 {
                        return Err(self.error(at, format!("`{name}` takes 2 type arguments, {} given", tys.len())));
                    }
                    let value = tys.pop().unwrap_or(TypeLike::Any);
                    let key = tys.pop().unwrap_or(TypeLike::Any);
                    Ok(TypeLike::Dict(Some(Box::new((key, value)))))
                }
            },
            "tuple" | "Tuple" => match args {
                None => Ok(TypeLike::Tuple(None)),
                Some(mut args) => {
                    if let [Arg::Unit(_)] = args.as_slice() {
                        return Ok(TypeLike::Tuple(Some(Vec::new())));
                    }
                    if args.len() == 2 && matches!(args[1], Arg::Ellipsis(_)) {
                        args.pop();
                        let item = self.exactly_one(name, at, args)?;
                        return Ok(TypeLike::VarTuple(Box::new(item)));
                    }
                    Ok(TypeLike::Tuple(Some(self.types_only(args)?)))
                }
            },
            "Union" => match args {
                None => Err(self.error(at, "`Union` requires type arguments")),
                Some(args) => Ok(TypeLike::Union(self.types_only(args)?)),
            },
            "Optional" => match args {
                None => Err(self.error(at, "`Optional` requires a type argument")),
                Some(args) => Ok(TypeLike::optional(self.exactly_one(name, at, args)?)),
            },
            _ => match (primitive, args) {
                (Some(ty), None) => Ok(ty),
                (None, None) => Ok(TypeLike::Named(name.to_string())),
                (_, Some(_)) => Err(self.error(at, format!("`{name}` takes no type arguments"))),
            },
        }
    }

    fn types_only(&self, args: Vec<Arg>) -> Result<Vec<TypeLike>, TypeSyntaxError> {
        args.into_iter()
            .map(|arg| match arg {
                Arg::Ty(ty) => Ok(ty),
                Arg::Ellipsis(at) => Err(self.error(at, "`...` is only allowed as `tuple[T, ...]`")),
                Arg::Unit(at) => Err(self.error(at, "`()` is only allowed as `tuple[()]`")),
            })
            .collect()
    }

    fn exactly_one(&self, name: &str, at: usize, args: Vec<Arg>) -> Result<TypeLike, TypeSyntaxError> {
        let mut tys = self.types_only(args)?;
        match tys.len() {
            1 => Ok(tys.remove(0)),
            n => Err(self.error(at, format!("`{name}` takes 1 type argument, {n} given"))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn is_named(ty: &TypeLike, expected: &str) -> bool {
        matches!(ty, TypeLike::Named(n) if n == expected)
    }

    #[test]
    fn parses_nested_generics_across_newlines() {
        let ty = parse("list[list[\nint\n]]").unwrap();
        let TypeLike::List(Some(outer)) = ty else { panic!("expected list") };
        let TypeLike::List(Some(inner)) = *outer else { panic!("expected inner list") };
        assert!(matches!(*inner, TypeLike::Primitive(Prim::Int)));
    }

    #[test]
    fn parses_unions_and_variadic_tuples() {
        let TypeLike::Union(alts) = parse("int | list").unwrap() else { panic!("expected union") };
        assert_eq!(alts.len(), 2);
        assert!(matches!(alts[1], TypeLike::List(None)));

        assert!(matches!(parse("tuple[int, ...]").unwrap(), TypeLike::VarTuple(_)));
        assert!(matches!(parse("Tuple").unwrap(), TypeLike::Tuple(None)));
    }

    #[test]
    fn empty_tuple_notation() {
        assert!(matches!(parse("tuple[()]").unwrap(), TypeLike::Tuple(Some(v)) if v.is_empty()));
        assert!(matches!(parse("Tuple[( )]").unwrap(), TypeLike::Tuple(Some(v)) if v.is_empty()));
        for bad in ["tuple[(), int]", "list[()]", "tuple[(]", "()"] {
            assert!(parse(bad).is_err(), "{bad:?} should not parse");
        }
    }

    #[test]
    fn user_names_stay_named() {
        let TypeLike::List(Some(item)) = parse("List['Person']").unwrap() else { panic!() };
        assert!(is_named(&item, "Person"));
        assert!(is_named(&parse("models.Point").unwrap(), "models.Point"));
    }

    #[test]
    fn rejects_malformed_expressions() {
        for bad in ["", "list[", "list[]", "dict[int]", "int[str]", "tuple[..., int]", "list[int]]", "a..b", "int |"] {
            assert!(parse(bad).is_err(), "{bad:?} should not parse");
        }
    }

    #[test]
    fn error_reports_offset() {
        let err = parse("list[int,, str]").unwrap_err();
        assert_eq!(err.offset, 9);
    }
}
