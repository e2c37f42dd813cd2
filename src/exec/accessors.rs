//! Key/wildcard/array/recursive-descent/subscript accessors (spec.md §4.2).

use crate::ast::{Node, Subscript};
use crate::error::Error;
use crate::value::Value;

use super::{failed, Executor, ExecOutcome, Status};

/// `.k` (spec.md §4.2).
pub(super) fn execute_key(exec: &mut Executor, node: &Node, name: &str, value: &Value, found: Option<&mut Vec<Value>>) -> ExecOutcome {
	match value {
		Value::Object(map) => match map.get(name) {
			Some(v) => {
				let v = v.clone();
				exec.recurse_next(node, v, found)
			}
			None => exec.classify(Error::NoSuchKey(name.to_string())),
		},
		Value::Array(items) if exec.mode.is_lax() => fan_out(exec, node, items.clone(), found, |exec, node, item, found| {
			execute_key(exec, node, name, &item, found)
		}),
		_ => exec.classify(Error::NotAnObject),
	}
}

/// `.*` (spec.md §4.2).
pub(super) fn execute_any_key(exec: &mut Executor, node: &Node, value: &Value, found: Option<&mut Vec<Value>>) -> ExecOutcome {
	match value {
		Value::Object(map) => {
			let values: Vec<Value> = map.values().cloned().collect();
			fan_out(exec, node, values, found, |exec, node, item, found| exec.recurse_next(node, item, found))
		}
		Value::Array(items) if exec.mode.is_lax() => {
			let inner: Vec<Value> = items.clone();
			fan_out(exec, node, inner, found, |exec, node, item, found| execute_any_key(exec, node, &item, found))
		}
		_ => exec.classify(Error::NotAnObject),
	}
}

/// `[*]` (spec.md §4.2).
pub(super) fn execute_any_array(exec: &mut Executor, node: &Node, value: &Value, found: Option<&mut Vec<Value>>) -> ExecOutcome {
	match value {
		Value::Array(items) => {
			let items = items.clone();
			fan_out(exec, node, items, found, |exec, node, item, found| exec.recurse_next(node, item, found))
		}
		other if exec.mode.is_lax() => {
			let item = other.clone();
			exec.recurse_next(node, item, found)
		}
		_ => exec.classify(Error::NotAnArray),
	}
}

/// Runs `visit` over every element, aggregating status the way
/// Postgres's `executeAnyItem` does: a later `NotFound` must not erase
/// an earlier successful contribution to `found` (spec.md §9 open
/// question), and any `Failed` short-circuits immediately.
fn fan_out(
	exec: &mut Executor,
	node: &Node,
	items: Vec<Value>,
	found: Option<&mut Vec<Value>>,
	visit: impl Fn(&mut Executor, &Node, Value, Option<&mut Vec<Value>>) -> ExecOutcome,
) -> ExecOutcome {
	let mut overall = Status::NotFound;
	let mut found = found;
	for item in items {
		let reborrow = found.as_mut().map(|v| &mut **v);
		let (status, err) = visit(exec, node, item, reborrow);
		match status {
			Status::Failed => return (status, err),
			Status::Ok => overall = Status::Ok,
			Status::NotFound => {}
		}
	}
	(overall, None)
}

/// `.**` recursive descent (spec.md §4.2, §9). `first`/`last` are
/// inclusive 1-based level bounds from the target; level 0 (self) is
/// emitted exactly when `first == 0`; the sentinel
/// `(DESCENT_LEAVES_ONLY, DESCENT_LEAVES_ONLY)` restricts emission to
/// non-container terminals.
pub(super) fn execute_any_item(
	exec: &mut Executor,
	node: &Node,
	first: u32,
	last: u32,
	value: &Value,
	found: Option<&mut Vec<Value>>,
	level: u32,
) -> ExecOutcome {
	use crate::ast::DESCENT_LEAVES_ONLY;

	if exec.is_cancelled() {
		return super::NOT_FOUND;
	}

	let leaves_only = first == DESCENT_LEAVES_ONLY && last == DESCENT_LEAVES_ONLY;
	let is_container = matches!(value, Value::Object(_) | Value::Array(_));

	let mut overall = Status::NotFound;
	let mut found = found;

	let emit_here = if leaves_only {
		!is_container
	} else {
		level >= first && level <= last
	};

	if emit_here {
		let reborrow = found.as_mut().map(|v| &mut **v);
		let (status, err) = exec.recurse_next(node, value.clone(), reborrow);
		if status == Status::Failed {
			return (status, err);
		}
		if status == Status::Ok {
			overall = Status::Ok;
		}
	}

	if !leaves_only && level >= last {
		return (overall, None);
	}

	let children: Vec<Value> = match value {
		Value::Object(map) => map.values().cloned().collect(),
		Value::Array(items) => items.clone(),
		_ => Vec::new(),
	};

	for child in children {
		let reborrow = found.as_mut().map(|v| &mut **v);
		let (status, err) = execute_any_item(exec, node, first, last, &child, reborrow, level + 1);
		if status == Status::Failed {
			return (status, err);
		}
		if status == Status::Ok {
			overall = Status::Ok;
		}
	}

	(overall, None)
}

/// `[from..to]` subscripts (spec.md §4.2): each subscript's `from`/`to`
/// must reduce to exactly one numeric item; `last` resolves via
/// `innermost_array_size`.
pub(super) fn execute_array_index(exec: &mut Executor, node: &Node, subscripts: &[Subscript], value: &Value, found: Option<&mut Vec<Value>>) -> ExecOutcome {
	let items: Vec<Value> = match value {
		Value::Array(items) => items.clone(),
		other if exec.mode.is_lax() => vec![other.clone()],
		_ => return exec.classify(Error::NotAnArray),
	};
	let len = items.len() as i64;

	exec.with_innermost_array_size(len, move |exec| {
		let mut overall = Status::NotFound;
		let mut found = found;

		for sub in subscripts {
			let from = match resolve_subscript_bound(exec, &sub.from, value) {
				Ok(v) => v,
				Err(e) => return failed(e),
			};
			let to = match &sub.to {
				Some(to_node) => match resolve_subscript_bound(exec, to_node, value) {
					Ok(v) => v,
					Err(e) => return failed(e),
				},
				None => from,
			};

			let (lo, hi) = if exec.mode.is_lax() {
				(from.max(0).min(len - 1), to.max(0).min(len - 1))
			} else {
				if from < 0 || from > to || to >= len {
					return failed(Error::SubscriptOutOfBounds);
				}
				(from, to)
			};

			if lo > hi {
				continue;
			}
			for idx in lo..=hi {
				if idx < 0 || idx >= len {
					continue;
				}
				let item = items[idx as usize].clone();
				if item.is_null() {
					continue;
				}
				let reborrow = found.as_mut().map(|v| &mut **v);
				let (s, e) = exec.recurse_next(node, item, reborrow);
				if s == Status::Failed {
					return (s, e);
				}
				if s == Status::Ok {
					overall = Status::Ok;
				}
			}
		}
		(overall, None)
	})
}

/// Evaluates a subscript bound expression, requiring exactly one
/// numeric result (spec.md §4.2); `LAST` resolves against
/// `innermost_array_size`, floats truncate, out-of-int32-range fails.
fn resolve_subscript_bound(exec: &mut Executor, node: &Node, value: &Value) -> Result<i64, Error> {
	let mut items = Vec::new();
	let (status, err) = exec.execute_item(node, value, Some(&mut items));
	if status == Status::Failed {
		return Err(err.unwrap_or(Error::SubscriptNotNumeric));
	}
	if items.len() != 1 {
		return Err(Error::SubscriptNotNumeric);
	}
	let n = match &items[0] {
		Value::Int(i) => *i,
		Value::Float(f) => {
			if !f.is_finite() {
				return Err(Error::SubscriptNotNumeric);
			}
			f.round() as i64
		}
		Value::Deferred(s) => match s.parse::<i64>() {
			Ok(i) => i,
			Err(_) => s.parse::<f64>().map_err(|_| Error::SubscriptNotNumeric)?.round() as i64,
		},
		_ => return Err(Error::SubscriptNotNumeric),
	};
	if n < i32::MIN as i64 || n > i32::MAX as i64 {
		return Err(Error::SubscriptNotNumeric);
	}
	Ok(n)
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::ast::Mode;
	use std::collections::HashMap;
	use std::sync::atomic::AtomicBool;
	use std::sync::Arc;

	fn exec(mode: Mode, root: Value) -> Executor {
		Executor::new(mode, root, HashMap::new(), true, false, Arc::new(AtomicBool::new(false)))
	}

	#[test]
	fn lax_key_on_array_fans_out() {
		let root = Value::Array(vec![
			Value::Object(BTreeMapOf(vec![("a", Value::Int(1))])),
			Value::Object(BTreeMapOf(vec![("a", Value::Int(2))])),
		]);
		let mut e = exec(Mode::Lax, root.clone());
		let node = Node::key("a");
		let mut found = Vec::new();
		let (status, _) = e.execute_item(&node, &root, Some(&mut found));
		assert_eq!(status, Status::Ok);
		assert_eq!(found, vec![Value::Int(1), Value::Int(2)]);
	}

	#[test]
	fn strict_missing_key_fails() {
		let root = Value::Object(BTreeMapOf(vec![("y", Value::Int(1))]));
		let mut e = exec(Mode::Strict, root.clone());
		let node = Node::key("x");
		let (status, err) = e.execute_item(&node, &root, None);
		assert_eq!(status, Status::Failed);
		assert!(err.is_some());
	}

	#[test]
	fn last_resolves_inside_nested_arithmetic() {
		use crate::ast::{BinaryOp, NodeKind};

		let root = Value::Array(vec![Value::Int(10), Value::Int(20), Value::Int(30)]);
		let mut e = exec(Mode::Lax, root.clone());
		let node = Node::array_index(vec![Subscript {
			from: Node::binary(BinaryOp::Sub, Node::new(NodeKind::Last), Node::integer(1)),
			to: None,
		}]);
		let mut found = Vec::new();
		let (status, _) = e.execute_item(&node, &root, Some(&mut found));
		assert_eq!(status, Status::Ok);
		assert_eq!(found, vec![Value::Int(20)]);
	}

	#[allow(non_snake_case)]
	fn BTreeMapOf(pairs: Vec<(&str, Value)>) -> std::collections::BTreeMap<String, Value> {
		pairs.into_iter().map(|(k, v)| (k.to_string(), v)).collect()
	}
}
