//! The tri-valued boolean sub-language (spec.md §4.3) and `compareItems`
//! (spec.md §4.3.2).

use std::cmp::Ordering;

use crate::ast::{BinaryOp, Node, NodeKind, UnaryOp};
use crate::error::Error;
use crate::value::Value;

use super::{Executor, Status};

/// The predicate domain (spec.md §4.3): `{true, false, unknown}`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Tri {
	True,
	False,
	Unknown,
}

impl Tri {
	pub fn not(self) -> Tri {
		match self {
			Tri::True => Tri::False,
			Tri::False => Tri::True,
			Tri::Unknown => Tri::Unknown,
		}
	}

	pub fn to_value(self) -> Value {
		match self {
			Tri::True => Value::Bool(true),
			Tri::False => Value::Bool(false),
			Tri::Unknown => Value::Null,
		}
	}

	fn from_bool(b: bool) -> Tri {
		if b {
			Tri::True
		} else {
			Tri::False
		}
	}
}

/// Evaluates a node fully into a candidate list, folding a non-fatal
/// `Failed` outcome into a predicate-level `unknown` (spec.md §7:
/// "predicate evaluation converts Failed into unknown") while letting a
/// truly fatal error bubble out unconditionally (spec.md §7: "Fatal
/// errors ... always surfaced").
enum ListOutcome {
	Items(Vec<Value>),
	Unknown,
	Fatal(Error),
}

fn evaluate_list_tagged(exec: &mut Executor, node: &Node, value: &Value) -> ListOutcome {
	let mut items = Vec::new();
	let (status, err) = exec.execute_item(node, value, Some(&mut items));
	match status {
		Status::Ok | Status::NotFound => ListOutcome::Items(items),
		Status::Failed => match err {
			Some(e) if e.is_fatal() => ListOutcome::Fatal(e),
			_ => ListOutcome::Unknown,
		},
	}
}

pub(crate) fn auto_unwrap_one_level(items: Vec<Value>) -> Vec<Value> {
	let mut out = Vec::with_capacity(items.len());
	for item in items {
		match item {
			Value::Array(arr) => out.extend(arr),
			other => out.push(other),
		}
	}
	out
}

/// Entry point for the boolean sub-language (spec.md §4.3).
/// `can_have_next` enforces the AST shape invariant described there.
pub(crate) fn execute_bool_item(exec: &mut Executor, node: &Node, value: &Value, can_have_next: bool) -> Result<Tri, Error> {
	if !can_have_next && node.next.is_some() {
		return Err(Error::UnexpectedNext);
	}

	match &node.kind {
		NodeKind::Binary(BinaryOp::And, l, r) => {
			let lt = eval_operand_to_tri(exec, l, value)?;
			if lt == Tri::False {
				return Ok(Tri::False);
			}
			let rt = eval_operand_to_tri(exec, r, value)?;
			if rt == Tri::False {
				return Ok(Tri::False);
			}
			if lt == Tri::Unknown || rt == Tri::Unknown {
				return Ok(Tri::Unknown);
			}
			Ok(Tri::True)
		}
		NodeKind::Binary(BinaryOp::Or, l, r) => {
			let lt = eval_operand_to_tri(exec, l, value)?;
			if lt == Tri::True {
				return Ok(Tri::True);
			}
			let rt = eval_operand_to_tri(exec, r, value)?;
			if rt == Tri::True {
				return Ok(Tri::True);
			}
			if lt == Tri::Unknown || rt == Tri::Unknown {
				return Ok(Tri::Unknown);
			}
			Ok(Tri::False)
		}
		NodeKind::Binary(op @ (BinaryOp::Eq | BinaryOp::Ne | BinaryOp::Lt | BinaryOp::Le | BinaryOp::Gt | BinaryOp::Ge), l, r) => {
			execute_predicate(exec, l, r, value, true, |a, b, exec| compare_items(*op, a, b, exec))
		}
		NodeKind::Binary(BinaryOp::StartsWith, l, r) => {
			execute_predicate(exec, l, r, value, false, |a, b, _| {
				match (a, b) {
					(Value::String(s), Value::String(prefix)) => Ok(Tri::from_bool(s.starts_with(prefix.as_str()))),
					_ => Err(Error::InvalidItemType),
				}
			})
		}
		NodeKind::LikeRegex(operand, re) => {
			let items = match evaluate_list_tagged(exec, operand, value) {
				ListOutcome::Items(items) => auto_unwrap_one_level(items),
				ListOutcome::Unknown => return Ok(Tri::Unknown),
				ListOutcome::Fatal(e) => return Err(e),
			};
			let mut saw_unknown = false;
			let mut saw_true = false;
			for item in &items {
				match item {
					Value::String(s) => {
						if re.is_match(s) {
							saw_true = true;
							if exec.mode.is_lax() {
								break;
							}
						}
					}
					_ => saw_unknown = true,
				}
			}
			Ok(resolve(exec, saw_true, saw_unknown))
		}
		NodeKind::Unary(UnaryOp::Not, operand) => {
			let t = execute_bool_item(exec, operand, value, false)?;
			Ok(t.not())
		}
		NodeKind::Unary(UnaryOp::IsUnknown, operand) => {
			let t = eval_operand_to_tri(exec, operand, value)?;
			Ok(Tri::from_bool(t == Tri::Unknown))
		}
		NodeKind::Unary(UnaryOp::Exists, operand) => execute_exists(exec, operand, value),
		_ => Err(Error::Fatal(format!("node kind {:?} is not a boolean expression", node.kind))),
	}
}

/// Evaluates a boolean sub-expression for use as an AND/OR/NOT/IS_UNKNOWN
/// operand, folding non-fatal failures into `unknown` per spec.md §7.
fn eval_operand_to_tri(exec: &mut Executor, node: &Node, value: &Value) -> Result<Tri, Error> {
	execute_bool_item(exec, node, value, true)
}

/// `EXISTS(e)` (spec.md §4.3): strict mode materializes a full list
/// under a silenced scope; lax mode short-circuits on the first item.
fn execute_exists(exec: &mut Executor, operand: &Node, value: &Value) -> Result<Tri, Error> {
	if exec.mode.is_lax() {
		let mut found: Option<Value> = None;
		let (status, err) = exec.with_silenced(|exec| {
			let mut items = Vec::new();
			let out = exec.execute_item(operand, value, Some(&mut items));
			if let Some(first) = items.into_iter().next() {
				found = Some(first);
			}
			out
		});
		return match status {
			Status::Failed => match err {
				Some(e) if e.is_fatal() => Err(e),
				_ => Ok(Tri::Unknown),
			},
			_ => Ok(Tri::from_bool(found.is_some())),
		};
	}

	let (status, err, items) = exec.with_silenced(|exec| {
		let mut items = Vec::new();
		let out = exec.execute_item(operand, value, Some(&mut items));
		(out.0, out.1, items)
	});
	match status {
		Status::Failed => match err {
			Some(e) if e.is_fatal() => Err(e),
			_ => Ok(Tri::Unknown),
		},
		_ => Ok(Tri::from_bool(!items.is_empty())),
	}
}

fn resolve(exec: &Executor, saw_true: bool, saw_unknown: bool) -> Tri {
	if exec.mode.is_lax() {
		if saw_true {
			Tri::True
		} else if saw_unknown {
			Tri::Unknown
		} else {
			Tri::False
		}
	} else if saw_true && !saw_unknown {
		Tri::True
	} else if saw_unknown {
		Tri::Unknown
	} else {
		Tri::False
	}
}

/// `executePredicate` (spec.md §4.3.1): forms the cross product of left
/// and right candidate items and folds per-pair callback outcomes using
/// lax short-circuit / strict exhaustive semantics.
fn execute_predicate(
	exec: &mut Executor,
	left: &Node,
	right: &Node,
	value: &Value,
	unwrap_right: bool,
	callback: impl Fn(&Value, &Value, &Executor) -> Result<Tri, Error>,
) -> Result<Tri, Error> {
	let left_items = match evaluate_list_tagged(exec, left, value) {
		ListOutcome::Items(items) => auto_unwrap_one_level(items),
		ListOutcome::Unknown => return Ok(Tri::Unknown),
		ListOutcome::Fatal(e) => return Err(e),
	};
	let right_items = match evaluate_list_tagged(exec, right, value) {
		ListOutcome::Items(items) => {
			if unwrap_right {
				auto_unwrap_one_level(items)
			} else {
				items
			}
		}
		ListOutcome::Unknown => return Ok(Tri::Unknown),
		ListOutcome::Fatal(e) => return Err(e),
	};

	let mut saw_true = false;
	let mut saw_unknown = false;
	'outer: for l in &left_items {
		for r in &right_items {
			match callback(l, r, exec) {
				Ok(Tri::True) => {
					saw_true = true;
					if exec.mode.is_lax() {
						break 'outer;
					}
				}
				Ok(Tri::False) => {}
				Ok(Tri::Unknown) => saw_unknown = true,
				Err(e) if e.is_fatal() => return Err(e),
				Err(_) => saw_unknown = true,
			}
		}
	}
	Ok(resolve(exec, saw_true, saw_unknown))
}

/// `compareItems` (spec.md §4.3.2).
pub(crate) fn compare_items(op: BinaryOp, a: &Value, b: &Value, exec: &Executor) -> Result<Tri, Error> {
	match (a, b) {
		(Value::Null, Value::Null) => Ok(apply_eq(op, true)),
		(Value::Null, _) | (_, Value::Null) => Ok(apply_eq(op, false)),
		(Value::Bool(x), Value::Bool(y)) => Ok(apply_ord(op, (*x as u8).cmp(&(*y as u8)))),
		(Value::Array(_), _) | (_, Value::Array(_)) | (Value::Object(_), _) | (_, Value::Object(_)) => Ok(Tri::Unknown),
		(Value::String(x), Value::String(y)) => Ok(apply_ord(op, x.as_bytes().cmp(y.as_bytes()))),
		(Value::DateTime(x), Value::DateTime(y)) => match crate::datetime::compare(x, y, exec.use_tz) {
			Some(ord) => Ok(apply_ord(op, ord)),
			None => Ok(Tri::Unknown),
		},
		_ => match (a.as_numeric_ladder(), b.as_numeric_ladder()) {
			(Some(x), Some(y)) => match x.partial_cmp(&y) {
				Some(ord) => Ok(apply_ord(op, ord)),
				None => Ok(Tri::Unknown),
			},
			// Mismatched scalar categories (e.g. number vs string) are
			// simply unequal for Eq/Ne; ordering between them is
			// undefined, not an error (spec.md §8.3 example 3).
			_ => match op {
				BinaryOp::Eq | BinaryOp::Ne => Ok(apply_eq(op, false)),
				_ => Ok(Tri::Unknown),
			},
		},
	}
}

fn apply_eq(op: BinaryOp, equal: bool) -> Tri {
	match op {
		BinaryOp::Eq => Tri::from_bool(equal),
		BinaryOp::Ne => Tri::from_bool(!equal),
		_ => Tri::False,
	}
}

fn apply_ord(op: BinaryOp, ord: Ordering) -> Tri {
	Tri::from_bool(match op {
		BinaryOp::Eq => ord == Ordering::Equal,
		BinaryOp::Ne => ord != Ordering::Equal,
		BinaryOp::Lt => ord == Ordering::Less,
		BinaryOp::Le => ord != Ordering::Greater,
		BinaryOp::Gt => ord == Ordering::Greater,
		BinaryOp::Ge => ord != Ordering::Less,
		_ => false,
	})
}

/// `? (cond)` (spec.md §4.4): if the current value is an array and lax
/// unwrap applies, unwrap and re-apply the filter elementwise; a filter
/// that doesn't match is not an error, just `NotFound` for that branch.
pub(crate) fn execute_filter(
	exec: &mut Executor,
	node: &Node,
	cond: &Node,
	value: &Value,
	found: Option<&mut Vec<Value>>,
) -> super::ExecOutcome {
	if exec.mode.is_lax() {
		if let Value::Array(items) = value {
			let mut overall = super::Status::NotFound;
			let mut found = found;
			for item in items {
				let reborrow = found.as_mut().map(|v| &mut **v);
				let (status, err) = execute_filter(exec, node, cond, item, reborrow);
				if status == super::Status::Failed {
					return (status, err);
				}
				if status == super::Status::Ok {
					overall = super::Status::Ok;
				}
			}
			return (overall, None);
		}
	}

	let tri = exec.with_current(value.clone(), |exec| execute_bool_item(exec, cond, value, false));
	match tri {
		Ok(Tri::True) => exec.recurse_next(node, value.clone(), found),
		Ok(Tri::False) | Ok(Tri::Unknown) => super::NOT_FOUND,
		Err(e) => exec.classify(e),
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::ast::{BinaryOp, Mode};
	use std::collections::HashMap;
	use std::sync::atomic::AtomicBool;
	use std::sync::Arc;

	fn exec(mode: Mode) -> Executor {
		Executor::new(mode, Value::Null, HashMap::new(), true, false, Arc::new(AtomicBool::new(false)))
	}

	#[test]
	fn not_not_is_identity() {
		for t in [Tri::True, Tri::False, Tri::Unknown] {
			assert_eq!(t.not().not(), t);
		}
	}

	#[test]
	fn is_unknown_never_unknown() {
		assert_ne!(Tri::from_bool(Tri::Unknown == Tri::Unknown), Tri::Unknown);
	}

	#[test]
	fn null_vs_non_null_not_equal_is_true() {
		let e = exec(Mode::Lax);
		assert_eq!(compare_items(BinaryOp::Ne, &Value::Null, &Value::Int(1), &e).unwrap(), Tri::True);
		assert_eq!(compare_items(BinaryOp::Eq, &Value::Null, &Value::Int(1), &e).unwrap(), Tri::False);
	}

	#[test]
	fn containers_are_incomparable() {
		let e = exec(Mode::Lax);
		let arr = Value::Array(vec![]);
		assert_eq!(compare_items(BinaryOp::Eq, &arr, &Value::Int(1), &e).unwrap(), Tri::Unknown);
	}

	#[test]
	fn mismatched_scalar_types_are_unequal_not_unknown() {
		let e = exec(Mode::Lax);
		assert_eq!(compare_items(BinaryOp::Eq, &Value::Int(5), &Value::String("5".into()), &e).unwrap(), Tri::False);
		assert_eq!(compare_items(BinaryOp::Ne, &Value::Int(5), &Value::String("5".into()), &e).unwrap(), Tri::True);
		assert_eq!(compare_items(BinaryOp::Lt, &Value::Int(5), &Value::String("5".into()), &e).unwrap(), Tri::Unknown);
	}

	#[test]
	fn string_ordering_is_byte_wise() {
		let e = exec(Mode::Lax);
		let a = Value::String("a".into());
		let b = Value::String("b".into());
		assert_eq!(compare_items(BinaryOp::Lt, &a, &b, &e).unwrap(), Tri::True);
	}
}
