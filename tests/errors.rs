use type_yaml::{loads, DocumentError, Error, LoadOptions, Prim, TypeError, TypeLike};

fn load_err(ty: impl Into<TypeLike>, yaml: &str) -> Error {
    loads(ty, yaml, &LoadOptions::default()).expect_err("load should fail")
}

#[test]
fn scalar_mismatch_message() {
    let err = load_err(Prim::Int, "aaa");
    assert_eq!(err.to_string(), "expected int, 'aaa' found\n  in \"<unicode string>\", line 1, column 1");
}

#[test]
fn union_message_lists_each_alternative() {
    let err = load_err("int | list", "aaa");
    let expected = [
        "failed to parse yaml. expected one of (int, list[Any])",
        "errors for each type:",
        "type: int",
        "    expected int, 'aaa' found",
        "      in \"<unicode string>\", line 1, column 1",
        "type: list[Any]",
        "    expected list[Any], scalar found",
        "      in \"<unicode string>\", line 1, column 1",
        "  in \"<unicode string>\", line 1, column 1",
    ]
    .join("\n");
    assert_eq!(err.to_string(), expected);
}

#[test]
fn nested_failures_point_at_the_inner_node() {
    let err = load_err("dict[str, list[int]]", "a: [1, 2]\nb: [3, x]\n");
    let Error::Decode(err) = err else { panic!("expected decode error, got {err:?}") };
    assert_eq!((err.mark.line, err.mark.column), (2, 8));
    assert!(err.to_string().starts_with("expected int, 'x' found"));
}

#[test]
fn source_label_appears_in_positions() {
    let opts = LoadOptions::new().source("config.yaml");
    let err = loads("int", "[1]", &opts).unwrap_err();
    assert_eq!(err.to_string(), "expected int, sequence found\n  in \"config.yaml\", line 1, column 1");
}

#[test]
fn fixed_tuple_length_mismatch() {
    let err = load_err("tuple[int, int]", "[1]");
    assert!(err.to_string().starts_with("expected tuple[int, int], sequence of length 1 found"));
}

#[test]
fn null_scalars_are_reported_as_none() {
    for yaml in ["a:\n", "a: ~\n", "a: null\n"] {
        let err = load_err("dict[str, int]", yaml);
        assert!(err.to_string().starts_with("expected int, None found"), "{yaml:?}: {err}");
    }
}

#[test]
fn malformed_and_unknown_types_are_type_errors() {
    assert!(matches!(load_err("list[int", "[]"), Error::Type(TypeError::Syntax(_))));
    assert!(matches!(load_err("dict[int]", "{}"), Error::Type(TypeError::Syntax(_))));
    assert!(matches!(load_err("list[Point]", "[]"), Error::Type(TypeError::Resolution(_))));
}

#[test]
fn document_errors() {
    assert!(matches!(load_err("int", "[1, 2"), Error::Document(DocumentError::Parse { .. })));
    assert!(matches!(
        load_err("int", "--- 1\n--- 2\n"),
        Error::Document(DocumentError::MultipleDocuments { count: 2, .. })
    ));
}
