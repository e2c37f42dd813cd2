//! End-to-end scenarios exercising the four public entry points
//! (spec.md §8.3) against hand-built AST trees (a textual parser is
//! out of scope for this crate, per spec.md §1).

use jsonpath_exec::ast::{BinaryOp, DatetimeCastOp, Method, Node, NodeKind, Path, Subscript};
use jsonpath_exec::datetime::DateTimeValue;
use jsonpath_exec::{query, Mode, Options, Value};

fn obj(pairs: Vec<(&str, Value)>) -> Value {
	Value::Object(pairs.into_iter().map(|(k, v)| (k.to_string(), v)).collect())
}

/// 1. `query("$.a[*] ? (@ > 2)", {"a":[1,2,3,4]})` → `[3,4]`.
///
/// `#[test_log::test]` so `trace!` output from the dispatch entry
/// points (spec.md §2's logging requirement) is visible with
/// `RUST_LOG=trace cargo test -- --nocapture` instead of needing a
/// subscriber wired up by hand in every test.
#[test_log::test]
fn filter_over_unwrapped_array() {
	let tree = Node::root().with_next(
		Node::key("a").with_next(
			Node::any_array().with_next(Node::filter(Node::binary(BinaryOp::Gt, Node::current(), Node::integer(2)))),
		),
	);
	let path = Path::new(Mode::Lax, tree);
	let value = obj(vec![("a", Value::Array(vec![Value::Int(1), Value::Int(2), Value::Int(3), Value::Int(4)]))]);

	let result = query(&path, &value, &Options::default()).unwrap();
	assert_eq!(result, vec![Value::Int(3), Value::Int(4)]);
}

/// 2. `exists("strict $.x", {"y":1})` → `Null`; with `with_silent` → `false`.
#[test]
fn strict_missing_key_exists_is_null_unless_silent() {
	let tree = Node::root().with_next(Node::key("x"));
	let path = Path::new(Mode::Strict, tree);
	let value = obj(vec![("y", Value::Int(1))]);

	assert_eq!(jsonpath_exec::exists(&path, &value, &Options::default()).unwrap(), None);
	assert_eq!(jsonpath_exec::exists(&path, &value, &Options::default().with_silent()).unwrap(), Some(false));
}

/// 3. `match("$ == 5", 5)` → true; `match("$ == 5", "5")` → false.
#[test]
fn match_equality_does_not_coerce_across_types() {
	let tree = Node::binary(BinaryOp::Eq, Node::root(), Node::integer(5));
	let path = Path::new(Mode::Lax, tree);

	assert_eq!(jsonpath_exec::match_(&path, &Value::Int(5), &Options::default()).unwrap(), Some(true));
	assert_eq!(jsonpath_exec::match_(&path, &Value::String("5".into()), &Options::default()).unwrap(), Some(false));
}

/// 4. `query("$.** ? (@.type() == "number")", {"a":1,"b":{"c":2,"d":"x"}})`
/// → `[1, 2]` in any order consistent with pre-order descent.
#[test]
fn recursive_descent_filtered_by_type() {
	let cond = Node::binary(
		BinaryOp::Eq,
		Node::current().with_next(Node::method(Method::Type)),
		Node::string("number"),
	);
	let tree = Node::root().with_next(Node::recursive_descent(0, u32::MAX).with_next(Node::filter(cond)));
	let path = Path::new(Mode::Lax, tree);
	let value = obj(vec![
		("a", Value::Int(1)),
		("b", obj(vec![("c", Value::Int(2)), ("d", Value::String("x".into()))])),
	]);

	let mut result = query(&path, &value, &Options::default()).unwrap();
	result.sort_by_key(|v| match v {
		Value::Int(i) => *i,
		_ => unreachable!(),
	});
	assert_eq!(result, vec![Value::Int(1), Value::Int(2)]);
}

/// 5. `query("$[*].datetime()", [...], with_tz)` → a Date and a TimestampTz.
#[test]
fn datetime_auto_detects_variant_per_element() {
	let tree = Node::root().with_next(Node::any_array().with_next(Node::datetime_cast(DatetimeCastOp::Datetime, None)));
	let path = Path::new(Mode::Lax, tree);
	let value = Value::Array(vec![Value::String("2020-01-02".into()), Value::String("2020-01-03T04:05:06Z".into())]);

	let result = query(&path, &value, &Options::default().with_tz()).unwrap();
	assert_eq!(result.len(), 2);
	assert!(matches!(result[0], Value::DateTime(DateTimeValue::Date(_))));
	assert!(matches!(result[1], Value::DateTime(DateTimeValue::TimestampTz(_))));
}

/// 6. `query("$ ? (@.a == 1 && @.b == 2)", {"a":1,"b":2})` → `[{"a":1,"b":2}]`;
/// changing `b` to `3` → `[]`.
#[test]
fn filter_conjunction_over_root_object() {
	let cond = Node::binary(
		BinaryOp::And,
		Node::binary(BinaryOp::Eq, Node::current().with_next(Node::key("a")), Node::integer(1)),
		Node::binary(BinaryOp::Eq, Node::current().with_next(Node::key("b")), Node::integer(2)),
	);
	let tree = Node::root().with_next(Node::filter(cond));
	let path = Path::new(Mode::Lax, tree);

	let matching = obj(vec![("a", Value::Int(1)), ("b", Value::Int(2))]);
	assert_eq!(query(&path, &matching, &Options::default()).unwrap(), vec![matching.clone()]);

	let non_matching = obj(vec![("a", Value::Int(1)), ("b", Value::Int(3))]);
	assert_eq!(query(&path, &non_matching, &Options::default()).unwrap(), Vec::<Value>::new());
}

/// 7. `query("$[last]", [10,20,30])` → `[30]`; `query("$[5]", [10], strict)` → Failed.
#[test]
fn last_subscript_and_strict_out_of_bounds() {
	let last_tree = Node::root().with_next(Node::array_index(vec![Subscript {
		from: Node::new(NodeKind::Last),
		to: None,
	}]));
	let last_path = Path::new(Mode::Lax, last_tree);
	let array = Value::Array(vec![Value::Int(10), Value::Int(20), Value::Int(30)]);
	assert_eq!(query(&last_path, &array, &Options::default()).unwrap(), vec![Value::Int(30)]);

	let oob_tree = Node::root().with_next(Node::array_index(vec![Subscript {
		from: Node::integer(5),
		to: None,
	}]));
	let oob_path = Path::new(Mode::Strict, oob_tree);
	let short_array = Value::Array(vec![Value::Int(10)]);
	assert!(query(&oob_path, &short_array, &Options::default()).is_err());
}
