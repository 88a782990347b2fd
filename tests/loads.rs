use type_yaml::{loads, LoadOptions, TypeLike, Value};

fn load(ty: impl Into<TypeLike>, yaml: &str) -> Value {
    loads(ty, yaml, &LoadOptions::default()).unwrap_or_else(|e| panic!("{e}"))
}

#[test]
fn scalar_lists() {
    assert_eq!(load("list[int]", "[1, 2, 3]"), Value::list([1, 2, 3]));
    assert_eq!(load("list[str]", "[1, 2, 3]"), Value::list(["1", "2", "3"]));
    assert_eq!(load("list[float]", "[1, 2, 3]"), Value::list([1.0, 2.0, 3.0]));
    assert_eq!(load("list[bool]", "[yes, no, 1]"), Value::list([true, false, true]));
}

#[test]
fn nested_and_block_sequences() {
    let nested = Value::list([Value::list([1, 2, 3]), Value::list(Vec::<i64>::new()), Value::list([5])]);
    assert_eq!(load("list[list[int]]", "[[1, 2, 3], [], [5]]"), nested);
    assert_eq!(load("list[list[\nint\n]]", "[[1, 2, 3], [], [5]]"), nested);
    assert_eq!(load("list[int]", "- 1\n- 2\n- 3\n"), Value::list([1, 2, 3]));
}

#[test]
fn mappings() {
    assert_eq!(load("dict[int, int]", "{1: 2, 3: 4}"), Value::map([(1, 2), (3, 4)]));
    assert_eq!(load("dict[str, int]", "foo: 1\nbar: 2\n"), Value::map([("foo", 1), ("bar", 2)]));
    assert_eq!(load("dict", "{1: a}"), Value::map([(Value::Int(1), Value::str("a"))]));
}

#[test]
fn sets_and_tuples() {
    assert_eq!(load("set[int]", "[1, 2, 3]"), Value::set([1, 2, 3]));
    assert_eq!(load("set", "[1, 2, 3]"), Value::set([1, 2, 3]));
    assert_eq!(load("tuple[int, int, int]", "[1, 2, 3]"), Value::tuple([1, 2, 3]));
    assert_eq!(load("tuple[int, ...]", "[1, 2, 3, 4]"), Value::tuple([1, 2, 3, 4]));
    assert_eq!(load("tuple", "[1, 2, 3]"), Value::tuple([1, 2, 3]));
}

#[test]
fn any_and_bare_list() {
    assert_eq!(load("Any", "[1, 2, 3]"), Value::list([1, 2, 3]));
    assert_eq!(
        load("Any", "[1, no, 1.0]"),
        Value::list([Value::Int(1), Value::Bool(false), Value::float(1.0)])
    );
    assert_eq!(
        load("Any", "{1: a, b: 2}"),
        Value::map([(Value::Int(1), Value::str("a")), (Value::str("b"), Value::Int(2))])
    );
    assert_eq!(load("list", "[1, 2, 3]"), Value::list([1, 2, 3]));
}

#[test]
fn unions_pick_the_first_alternative_that_fits() {
    assert_eq!(load("Union[int, list[int]]", "[1, 2, 3]"), Value::list([1, 2, 3]));
    assert_eq!(load("Optional[int]", "~"), Value::Null);
    assert_eq!(load("Optional[int]", "7"), Value::Int(7));
}

#[test]
fn literal_type_expressions_with_textual_parts() {
    let ty = TypeLike::dict("str", TypeLike::list("int"));
    assert_eq!(load(ty, "a: [1]\nb: []\n"), Value::map([
        ("a", Value::list([1])),
        ("b", Value::list(Vec::<i64>::new())),
    ]));
}

#[test]
fn multi_document_streams_decode_per_document() {
    let opts = LoadOptions::new().multi_document(true);
    let v = loads("dict[str, int]", "---\na: 1\n---\nb: 2\n", &opts).unwrap();
    assert_eq!(v, Value::list([Value::map([("a", 1)]), Value::map([("b", 2)])]));

    let v = loads("set[int]", "--- 1\n--- 2\n--- 1\n", &opts).unwrap();
    assert_eq!(v, Value::set([1, 2]));
}

#[test]
fn readers_are_accepted() {
    let v = type_yaml::load("list[int]", "[4, 5]".as_bytes(), &LoadOptions::default()).unwrap();
    assert_eq!(v, Value::list([4, 5]));
}
