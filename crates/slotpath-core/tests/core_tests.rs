use std::sync::Arc;

use serde_json::json;
use slotpath_core::{
    FloatWidth, IntWidth, Key, List, Map, Record, RecordType, Type, Value, assign, bools, floats,
    get_bool, get_float, get_int, get_str, get_uint, ints, select, strs, uints,
};

fn int(w: IntWidth) -> Type {
    Type::Int(w)
}

fn uint(w: IntWidth) -> Type {
    Type::Uint(w)
}

fn f64t() -> Type {
    Type::Float(FloatWidth::F64)
}

fn ptr_str() -> Type {
    Type::ptr(Type::Str)
}

/// A record of one field per scalar kind, all unexported.
fn vals() -> Value {
    let ty = RecordType::new("vals")
        .private_field("b", Type::Bool)
        .private_field("i", int(IntWidth::W64))
        .private_field("u", uint(IntWidth::W64))
        .private_field("f", f64t())
        .private_field("s", Type::Str)
        .shared();
    Record::zero(&ty)
        .with("b", true)
        .with("i", -2i64)
        .with("u", 4u64)
        .with("f", 8.0)
        .with("s", "32")
        .into()
}

/// Pointers to each scalar of `vals`; `filled` points them at its values.
fn ptrs(filled: bool) -> Value {
    let ty = RecordType::new("ptrs")
        .private_field("bp", Type::ptr(Type::Bool))
        .private_field("ip", Type::ptr(int(IntWidth::W64)))
        .private_field("up", Type::ptr(uint(IntWidth::W64)))
        .private_field("fp", Type::ptr(f64t()))
        .private_field("sp", ptr_str())
        .shared();
    let rec = Record::zero(&ty);
    if !filled {
        return rec.into();
    }
    rec.with("bp", Value::pointer(true.into()))
        .with("ip", Value::pointer((-2i64).into()))
        .with("up", Value::pointer(4u64.into()))
        .with("fp", Value::pointer(8.0.into()))
        .with("sp", Value::pointer("32".into()))
        .into()
}

fn node_type() -> Arc<RecordType> {
    RecordType::cyclic(|this| {
        RecordType::new("node")
            .field("Name", ptr_str())
            .field("Child", Type::ptr(this.clone()))
            .private_field("child", Type::ptr(this))
            .field("X", Type::Any)
            .private_field("a", Type::array(Type::Any, 2))
            .private_field("s", Type::seq(Type::Any))
    })
}

fn node() -> Record {
    Record::zero(&node_type())
}

fn any_list(items: Vec<Value>) -> List {
    List::with_items(Type::Any, items.into_iter().map(Value::any).collect())
}

fn single(fields: &[(&str, Type, bool)]) -> Arc<RecordType> {
    fields
        .iter()
        .fold(RecordType::new("fixture"), |rt, (name, ty, exported)| {
            if *exported {
                rt.field(*name, ty.clone())
            } else {
                rt.private_field(*name, ty.clone())
            }
        })
        .shared()
}

/// A pointer to a record with one field of type `ty`.
fn holder(name: &str, ty: Type, exported: bool) -> Value {
    Value::pointer(Record::zero(&single(&[(name, ty, exported)])).into())
}

/// As `holder`, with the field set to `value`.
fn holding(name: &str, ty: Type, exported: bool, value: Value) -> Value {
    Value::pointer(
        Record::zero(&single(&[(name, ty, exported)]))
            .with(name, value)
            .into(),
    )
}

fn assert_no_scalar(root: &Value, expr: &str) {
    assert_eq!(get_bool(root, expr), None, "bool at {expr}");
    assert_eq!(get_int(root, expr), None, "int at {expr}");
    assert_eq!(get_uint(root, expr), None, "uint at {expr}");
    assert_eq!(get_float(root, expr), None, "float at {expr}");
    assert_eq!(get_str(root, expr), None, "str at {expr}");
}

#[test]
fn reads_through_fields_pointers_and_keys() {
    assert_eq!(get_bool(&vals(), "/b"), Some(true));
    assert_eq!(get_int(&Value::pointer(ptrs(true)), "/ip"), Some(-2));

    let nested = node().with("X", Value::any(node().with("X", Value::any(vals())).into()));
    assert_eq!(get_uint(&nested.into(), "/X/X/u"), Some(4));

    let via_ptr = node().with("X", Value::any(Value::pointer(ptrs(true))));
    assert_eq!(get_float(&via_ptr.into(), "/X/../X/fp"), Some(8.0));

    let double = Value::pointer(Value::pointer("32".into()));
    assert_eq!(get_str(&double, "/"), Some("32".to_string()));

    assert_eq!(get_uint(&"hello".into(), "/.[0]"), Some(u64::from(b'h')));

    let with_seq = node().with("s", Value::Seq(any_list(vec![(-2i64).into()])));
    assert_eq!(get_int(&Value::pointer(with_seq.into()), "/s/.[0]"), Some(-2));

    let with_arr = node().with("a", Value::Array(any_list(vec![8.0.into(), "32".into()])));
    assert_eq!(get_str(&with_arr.into(), "/a[1]"), Some("32".to_string()));
}

#[test]
fn reads_typed_map_keys() {
    let bools = Map::empty(Type::Bool, Type::Str).with(true, "y");
    assert_eq!(get_str(&bools.into(), "/.[true]").as_deref(), Some("y"));

    let texts = Map::empty(Type::Str, f64t()).with("I / O", 99.8);
    assert_eq!(get_float(&texts.into(), r#"/.["I \x2f O"]"#), Some(99.8));

    let inner_ty = Type::map(uint(IntWidth::W64), Type::Str);
    let inner = Map::empty(uint(IntWidth::W64), Type::Str).with(2u64, "1.2");
    let outer = Map::empty(int(IntWidth::W64), inner_ty.clone()).with(1i64, inner);
    assert_eq!(get_str(&outer.into(), "/.[1]/.[2]").as_deref(), Some("1.2"));

    let inner = Map::empty(uint(IntWidth::W64), Type::Str).with(4u64, "3.4");
    let outer = Map::empty(int(IntWidth::W64), inner_ty).with(3i64, inner);
    assert_eq!(get_str(&outer.into(), "/.[*]/.[*]").as_deref(), Some("3.4"));
}

#[test]
fn unreachable_paths_have_no_result() {
    let nil_node = Value::null(Type::Record(node_type()));
    assert_no_scalar(&nil_node, "/Name");

    let empty: Value = node().into();
    for expr in ["/Child", "/Child/Name", "malformed", "/mis", "/s[4]", "/a[5]"] {
        assert_no_scalar(&empty, expr);
    }

    let pair = Value::Array(List::with_items(Type::Bool, vec![false.into(), false.into()]));
    assert_no_scalar(&pair, "/.[broken]");

    assert_no_scalar(&Map::empty(Type::Bool, Type::Bool).into(), "/.[yes]");
    assert_no_scalar(&node().with("X", Value::any(vals())).into(), "/X");
    assert_no_scalar(&vals(), "/.[3]");
    assert_no_scalar(&Map::empty(f64t(), Type::Bool).into(), "/.[6.66]");
}

#[test]
fn wildcards_fan_out_by_kind() {
    let v = vals();
    assert_eq!(bools(&v, "/*"), vec![true]);
    assert_eq!(ints(&v, "/*"), vec![-2]);
    assert_eq!(uints(&v, "/*"), vec![4]);
    assert_eq!(floats(&v, "/*"), vec![8.0]);
    assert_eq!(strs(&v, "/*"), vec!["32".to_string()]);

    let nulls = ptrs(false);
    assert!(select(&nulls, "/*").is_empty());
    assert!(ints(&nulls, "/*").is_empty());

    let data = Value::pointer(
        node()
            .with("a", Value::Array(any_list(vec![99i64.into(), 100i64.into()])))
            .with("s", Value::Seq(any_list(vec!["a".into(), "b".into(), 3i64.into()])))
            .into(),
    );
    assert_eq!(ints(&data, "/a[*]"), vec![99, 100]);
    assert_eq!(strs(&data, "/*[*]"), vec!["a".to_string(), "b".to_string()]);

    let items = vec![true.into(), (-2i64).into(), 4u64.into(), 8.0.into(), "32".into(), vals()];
    let mix = Value::Seq(any_list(items.clone()));
    let got: Vec<Value> = select(&mix, "/.[*]").into_iter().map(|v| v.into_owned()).collect();
    assert_eq!(got, items);
    assert_eq!(select(&mix, "/").len(), 1);
    assert_eq!(*select(&mix, "/")[0], mix);
    assert!(select(&mix, "/MisMatch").is_empty());
}

#[test]
fn map_wildcards_enumerate_in_key_order() {
    let m = Map::empty(Type::Str, int(IntWidth::W64))
        .with("b", 2i64)
        .with("c", 3i64)
        .with("a", 1i64);
    let root: Value = m.into();
    assert_eq!(ints(&root, "/.[*]"), vec![1, 2, 3]);
    assert_eq!(ints(&root, "/.[*]"), ints(&root, "/.[*]"));
}

fn check(mut root: Value, path: &str, value: impl Into<Value>, updates: usize, result: &[&str]) {
    let n = assign(&mut root, path, value);
    assert_eq!(n, updates, "updates for {path:?}");
    assert_eq!(strs(&root, path), result, "content at {path:?}");
}

#[test]
fn assigns_through_roots_fields_and_pointers() {
    check(Value::pointer("hello".into()), "/", "hell", 1, &["hell"]);
    check(Value::pointer("hello".into()), "/.", "hell", 1, &["hell"]);
    check(Value::pointer("hello".into()), "/", Value::pointer("poin".into()), 1, &["poin"]);

    check(holder("S", Type::Str, true), "/S", "hell", 1, &["hell"]);
    check(
        holding("P", ptr_str(), true, Value::pointer("".into())),
        "/P",
        "poin",
        1,
        &["poin"],
    );
    check(
        holding("PP", Type::ptr(ptr_str()), true, Value::pointer(Value::null(Type::Str))),
        "/PP",
        "doub",
        1,
        &["doub"],
    );
    check(
        holding(
            "PPP",
            Type::ptr(Type::ptr(ptr_str())),
            true,
            Value::pointer(Value::null(ptr_str())),
        ),
        "/PPP",
        "trip",
        1,
        &["trip"],
    );

    check(holder("I", Type::Any, true), "/I", "in", 1, &["in"]);
    check(holding("U", Type::Any, true, Value::any(true.into())), "/U", "up", 1, &["up"]);

    let s = single(&[("S", Type::Str, true)]);
    check(holder("X", Type::ptr(s.into()), true), "/X/S", "hell", 1, &["hell"]);
    let p = single(&[("P", ptr_str(), true)]);
    check(holder("X", Type::ptr(Type::ptr(p.into())), true), "/X/P", "poin", 1, &["poin"]);
    let pp = single(&[("PP", Type::ptr(ptr_str()), true)]);
    check(holder("X", Type::ptr(Type::ptr(pp.into())), true), "/X/PP", "doub", 1, &["doub"]);

    check(
        Value::pointer(node().into()),
        "/Child/Child/Child/Name",
        "Grand Grand",
        1,
        &["Grand Grand"],
    );
}

#[test]
fn assigns_into_sequences_and_arrays() {
    check(
        Value::pointer(Type::array(ptr_str(), 3).zero()),
        "/.[1]",
        "up",
        1,
        &["up"],
    );
    let three = List::with_items(Type::Str, vec!["1".into(), "2".into(), "3".into()]);
    check(Value::pointer(Value::Seq(three)), "/.[2]", "up", 1, &["up"]);

    let mut grown = Value::pointer(Type::seq(ptr_str()).zero());
    assert_eq!(assign(&mut grown, "/.[3]", "in"), 1);
    assert_eq!(strs(&grown, "/.[3]"), ["in"]);
    assert_eq!(select(&grown, "/.[*]").len(), 1, "padding stays null");
}

#[test]
fn sequence_growth_stays_bounded() {
    for path in ["/.[18446744073709551615]", "/.[1000000000000]"] {
        let mut seq = Value::pointer(Type::seq(Type::Str).zero());
        assert_eq!(assign(&mut seq, path, "x"), 0, "{path}");
        assert!(select(&seq, "/.[*]").is_empty(), "{path}");
    }

    let mut seq = Value::pointer(Type::seq(Type::Str).zero());
    assert_eq!(assign(&mut seq, "/.[1_000]", "x"), 1);
    assert_eq!(select(&seq, "/.[*]").len(), 1001);
    assert_eq!(strs(&seq, "/.[1000]"), ["x"]);
}

#[test]
fn assigns_into_maps_by_typed_key() {
    let bytes = Map::empty(uint(IntWidth::W8), ptr_str());
    check(Value::pointer(bytes.into()), "/.['p']", "in", 1, &["in"]);

    let shorts = Map::empty(int(IntWidth::W16), ptr_str())
        .with(i64::from(b'q'), Value::pointer("orig".into()));
    check(Value::pointer(shorts.into()), "/.['q']", "up", 1, &["up"]);

    let unsigned = Map::empty(uint(IntWidth::W64), Type::Str);
    check(Value::pointer(unsigned.into()), "/.['r']", "in", 1, &["in"]);

    let longs = Map::empty(int(IntWidth::W64), Type::Str).with(i64::from(b's'), "orig");
    check(Value::pointer(longs.into()), "/.['s']", "up", 1, &["up"]);

    let mixed = Map::empty(uint(IntWidth::W8), ptr_str())
        .with(u64::from(b'x'), Value::pointer("orig".into()))
        .with(u64::from(b'y'), Value::null(Type::Str));
    check(Value::pointer(mixed.into()), "/.[*]", "up", 2, &["up", "up"]);
}

#[test]
fn assigns_through_nested_maps() {
    let inner = Type::map(int(IntWidth::W64), Type::Str);
    let outer = Map::empty(int(IntWidth::W32), inner);
    check(Value::pointer(outer.into()), "/.[11]/.[12]", "11.12", 1, &["11.12"]);

    let inner = Type::map(int(IntWidth::W16), Type::Str);
    let outer = Map::empty(int(IntWidth::W8), Type::ptr(Type::ptr(inner)));
    check(Value::pointer(outer.into()), "/.[13]/.[14]", "13.14", 1, &["13.14"]);

    let y = single(&[("Y", Type::ptr(Type::ptr(ptr_str())), true)]);
    let x = single(&[("X", y.into(), true)]);
    let records = Map::empty(uint(IntWidth::W8), x.into());
    check(Value::pointer(records.into()), "/.['w']/X/Y", "z", 1, &["z"]);
}

#[test]
fn nested_wildcard_writes_all_land() {
    let inner_ty = Type::map(uint(IntWidth::W64), Type::Str);
    let inner = Map::empty(uint(IntWidth::W64), Type::Str)
        .with(4u64, "x")
        .with(5u64, "y");
    let outer = Map::empty(int(IntWidth::W64), inner_ty).with(3i64, inner);
    check(Value::pointer(outer.into()), "/.[*]/.[*]", "z", 2, &["z", "z"]);
}

#[test]
fn assignment_failures_are_silent() {
    check(Value::pointer("hello".into()), "", "fail", 0, &[]);
    check(Value::Any(None), "/", "fail", 0, &[]);
    check(Value::pointer("hello".into()), "/", Value::Any(None), 0, &["hello"]);
    check(Value::pointer("hello".into()), "/", Value::null(Type::Str), 0, &["hello"]);
    check("hello".into(), "/", "fail", 0, &["hello"]);
    check(Value::pointer(node().into()), "/X/anyField", "fail", 0, &[]);
    check(holder("Sp", ptr_str(), true), "/Sp", 9.98, 0, &[""]);
    check(Value::pointer("immutable".into()), "/.[6]", i32::from(b'-'), 0, &[]);
    check(Value::pointer(Type::array(Type::Str, 2).zero()), "/.[8]", "fail", 0, &[]);
}

#[test]
fn malformed_map_keys_match_nothing() {
    let cases = [
        ("Sk", Type::Str, "/Sk[''']"),
        ("Ik", int(IntWidth::W64), "/Ik[''']"),
        ("Ik", int(IntWidth::W64), "/Ik[z]"),
        ("Uk", uint(IntWidth::W64), "/Uk[''']"),
        ("Uk", uint(IntWidth::W64), "/Uk[z]"),
        ("Fk", Type::Float(FloatWidth::F32), "/Fk[z]"),
        ("Fk", Type::Float(FloatWidth::F32), "/Fk[]"),
    ];
    for (name, key, path) in cases {
        check(holder(name, Type::map(key, Type::Str), true), path, "fail", 0, &[]);
    }
}

#[test]
fn unexported_fields_are_read_only() {
    check(Value::pointer(node().into()), "/child/Name", "fail", 0, &[]);
    check(holder("ns", ptr_str(), false), "/ns", "fail", 0, &[]);

    check(holder("na", Type::array(Type::Str, 2), false), "/na[0]", "fail", 0, &[""]);
    check(holder("na", Type::array(ptr_str(), 2), false), "/na[1]", "fail", 0, &[]);
    check(holder("na", Type::array(Type::Str, 2), false), "/na[*]", "fail", 0, &["", ""]);

    check(holder("ns", Type::seq(Type::Str), false), "/ns[0]", "fail", 0, &[]);
    let ns = List::with_items(ptr_str(), vec![Value::null(Type::Str), Value::pointer("b".into())]);
    check(holding("ns", Type::seq(ptr_str()), false, Value::Seq(ns)), "/ns[1]", "fail", 0, &["b"]);
    let ns = List::with_items(Type::Str, vec!["a".into()]);
    check(holding("ns", Type::seq(Type::Str), false, Value::Seq(ns)), "/ns[*]", "fail", 0, &["a"]);

    let nm = Type::map(int(IntWidth::W64), Type::Str);
    check(holder("nm", nm.clone(), false), "/nm[0]", "fail", 0, &[]);
    let ptr_map = Map::empty(int(IntWidth::W64), ptr_str()).with(1i64, Value::pointer("b".into()));
    check(
        holding("nm", Type::map(int(IntWidth::W64), ptr_str()), false, ptr_map.into()),
        "/nm[1]",
        "fail",
        0,
        &["b"],
    );
    let plain = Map::empty(int(IntWidth::W64), Type::Str).with(2i64, "c");
    check(holding("nm", nm, false, plain.into()), "/nm[*]", "fail", 0, &["c"]);
}

#[test]
fn numeric_values_convert_to_slot_widths() {
    let numbers = RecordType::new("numbers")
        .field("B", uint(IntWidth::W8))
        .field("I", uint(IntWidth::W32))
        .field("F", f64t())
        .shared();
    let mut root = Value::pointer(Record::zero(&numbers).into());
    assert_eq!(assign(&mut root, "/*", 42i64), 3);
    let got: Vec<Value> = select(&root, "/*").into_iter().map(|v| v.into_owned()).collect();
    assert_eq!(
        got,
        [
            Value::Uint(IntWidth::W8, 42),
            Value::Uint(IntWidth::W32, 42),
            Value::Float(FloatWidth::F64, 42.0),
        ]
    );
}

#[test]
fn path_allocation_builds_a_chain() {
    let mut root = Value::pointer(node().into());
    assert_eq!(assign(&mut root, "/Child/Child/Name", "Hello"), 1);
    assert_eq!(get_str(&root, "/Child/Child/Name").as_deref(), Some("Hello"));
    assert_eq!(select(&root, "/Child/Child").len(), 1);
    assert!(select(&root, "/Child/Child/Child").is_empty());
    assert!(select(&root, "/Child/Name").is_empty());
}

#[test]
fn palette_bytes_read_as_uints() {
    let rgba = RecordType::new("RGBA")
        .field("R", uint(IntWidth::W8))
        .field("G", uint(IntWidth::W8))
        .field("B", uint(IntWidth::W8))
        .field("A", uint(IntWidth::W8))
        .shared();
    let white = Record::zero(&rgba)
        .with("R", 255u8)
        .with("G", 255u8)
        .with("B", 255u8)
        .with("A", 255u8);
    let image = RecordType::new("Paletted")
        .field("Palette", Type::seq(Type::Record(Arc::clone(&rgba))))
        .shared();
    let palette = List::with_items(rgba.into(), vec![white.into()]);
    let root: Value = Record::zero(&image)
        .with("Palette", Value::Seq(palette))
        .into();
    assert_eq!(uints(&root, "/Palette[0]/*"), vec![255, 255, 255, 255]);
}

fn feed_type() -> Arc<RecordType> {
    let item = RecordType::new("Item")
        .field("Title", Type::Str)
        .field("Timestamp", int(IntWidth::W64))
        .shared();
    let channel = RecordType::new("Channel")
        .field("Items", Type::seq(Type::ptr(item.into())))
        .shared();
    RecordType::new("Feed")
        .field("About", Type::map(Type::Str, Type::ptr(channel.into())))
        .shared()
}

#[test]
fn feed_example_builds_and_fans_out() {
    let mut feed = Value::pointer(Record::zero(&feed_type()).into());
    assert_eq!(assign(&mut feed, r#"/About["demo"]/Items[1]/Title"#, "Second"), 1);
    assert_eq!(assign(&mut feed, "/About[*]/Items[*]/Timestamp", 1437146613i32), 2);

    let want = json!({"About": {"demo": {"Items": [
        {"Title": "", "Timestamp": 1437146613},
        {"Title": "Second", "Timestamp": 1437146613},
    ]}}});
    assert_eq!(slotpath_core::to_json(&feed, Default::default()), want);

    let again = feed.clone();
    assert_eq!(assign(&mut feed, "/About[*]/Items[*]/Timestamp", 1437146613i32), 2);
    assert_eq!(feed, again);
}

#[test]
fn missing_map_entries_are_not_created_when_reading() {
    let root = Value::pointer(Record::zero(&feed_type()).into());
    assert!(select(&root, r#"/About["demo"]"#).is_empty());
    assert!(select(&root, "/About[*]").is_empty());
    let Some(Value::Record(feed)) = root.pointee() else {
        panic!("feed record");
    };
    assert!(matches!(feed.get("About"), Some(Value::Map(m)) if m.is_nil()));
}

#[test]
fn json_documents_round_trip_through_assignment() {
    use slotpath_core::{JsonOpts, load_json_file, write_json_file};

    let dir = tempfile::tempdir().unwrap();
    let src = dir.path().join("doc.json");
    std::fs::write(&src, r#"{"name":"a","tags":["x","y"],"meta":{"n":1}}"#).unwrap();

    let doc = load_json_file(&src).expect("load");
    let mut root = Value::pointer(doc);
    assert_eq!(assign(&mut root, "/tags[*]", "z"), 2);
    assert_eq!(assign(&mut root, "/tags[3]", "w"), 1);
    assert_eq!(assign(&mut root, "/meta/n", 2.5), 1);
    assert_eq!(assign(&mut root, "/meta/missing", 1i64), 0);

    let out = dir.path().join("out.json");
    let doc = root.into_pointee().expect("document");
    write_json_file(&out, &doc, JsonOpts::default()).expect("write");

    let back = load_json_file(&out).expect("reload");
    assert_eq!(
        slotpath_core::to_json(&back, JsonOpts::default()),
        json!({"name": "a", "tags": ["z", "z", null, "w"], "meta": {"n": 2.5}})
    );
    assert_eq!(strs(&back, "/tags[*]"), ["z", "z", "w"]);
    assert_eq!(get_float(&back, "/meta/n"), Some(2.5));
}

#[test]
fn keys_parse_per_map_key_type() {
    let m = Map::empty(Type::Bool, Type::Str).with(Key::Bool(false), "no");
    assert_eq!(strs(&m.into(), "/.[F]"), ["no"]);
}
