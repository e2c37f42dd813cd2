//! Unary and binary numeric operators (spec.md §4.5).

use crate::ast::{BinaryOp, Node, UnaryOp};
use crate::error::Error;
use crate::value::{Num, Value};

use super::{Executor, ExecOutcome, Status};

/// Unary `+`/`-` (spec.md §4.5): lax unwraps a singleton array operand,
/// otherwise requires exactly one numeric item.
pub(super) fn execute_unary(exec: &mut Executor, node: &Node, op: UnaryOp, operand: &Node, value: &Value, found: Option<&mut Vec<Value>>) -> ExecOutcome {
	let n = match eval_single_numeric(exec, operand, value, "unary") {
		Ok(n) => n,
		Err(e) => return exec.classify(e),
	};
	let result = match op {
		UnaryOp::Plus => n,
		UnaryOp::Minus => match n {
			Num::Int(i) => Num::Int(-i),
			Num::Float(f) => Num::Float(-f),
		},
		UnaryOp::Not | UnaryOp::IsUnknown | UnaryOp::Exists | UnaryOp::Filter => {
			return exec.classify(Error::Fatal("boolean unary reached arithmetic dispatch".into()));
		}
	};
	exec.recurse_next(node, num_to_value(result), found)
}

/// Binary `+ - * / %` (spec.md §4.5): each side independently unwraps
/// (lax) or requires a single numeric item (strict); cross-products of
/// multi-item sides are not formed — both sides must reduce to exactly
/// one item.
pub(super) fn execute_binary(exec: &mut Executor, node: &Node, op: BinaryOp, l: &Node, r: &Node, value: &Value, found: Option<&mut Vec<Value>>) -> ExecOutcome {
	let left = match eval_single_numeric(exec, l, value, "left") {
		Ok(n) => n,
		Err(e) => return exec.classify(e),
	};
	let right = match eval_single_numeric(exec, r, value, "right") {
		Ok(n) => n,
		Err(e) => return exec.classify(e),
	};

	let result = match op {
		BinaryOp::Add => promote(left, right, |a, b| a + b, |a, b| a.checked_add(b)),
		BinaryOp::Sub => promote(left, right, |a, b| a - b, |a, b| a.checked_sub(b)),
		BinaryOp::Mul => promote(left, right, |a, b| a * b, |a, b| a.checked_mul(b)),
		BinaryOp::Div => {
			if right.to_f64() == 0.0 {
				return exec.classify(Error::DivisionByZero);
			}
			match (left, right) {
				(Num::Int(a), Num::Int(b)) if a % b == 0 => Num::Int(a / b),
				_ => Num::Float(left.to_f64() / right.to_f64()),
			}
		}
		BinaryOp::Rem => {
			if right.to_f64() == 0.0 {
				return exec.classify(Error::DivisionByZero);
			}
			match (left, right) {
				(Num::Int(a), Num::Int(b)) => Num::Int(a % b),
				_ => Num::Float(left.to_f64() % right.to_f64()),
			}
		}
		_ => return exec.classify(Error::Fatal("non-arithmetic op reached arithmetic dispatch".into())),
	};

	exec.recurse_next(node, num_to_value(result), found)
}

fn promote(a: Num, b: Num, ff: impl Fn(f64, f64) -> f64, fi: impl Fn(i64, i64) -> Option<i64>) -> Num {
	match (a, b) {
		(Num::Int(x), Num::Int(y)) => match fi(x, y) {
			Some(v) => Num::Int(v),
			None => Num::Float(ff(x as f64, y as f64)),
		},
		_ => Num::Float(ff(a.to_f64(), b.to_f64())),
	}
}

fn num_to_value(n: Num) -> Value {
	match n {
		Num::Int(i) => Value::Int(i),
		Num::Float(f) => Value::Float(f),
	}
}

fn eval_single_numeric(exec: &mut Executor, node: &Node, value: &Value, side: &'static str) -> Result<Num, Error> {
	let mut items = Vec::new();
	let (status, err) = exec.execute_item(node, value, Some(&mut items));
	if status == Status::Failed {
		return Err(err.unwrap_or(Error::OperandNotSingleNumeric {
			side,
			op: "arithmetic",
		}));
	}

	let items = if exec.mode.is_lax() {
		super::predicate::auto_unwrap_one_level(items)
	} else {
		items
	};

	if items.len() != 1 {
		return Err(Error::OperandNotSingleNumeric {
			side,
			op: "arithmetic",
		});
	}

	items[0].as_numeric_ladder().ok_or_else(|| Error::NotNumeric(items[0].type_name().to_string()))
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::ast::Mode;
	use std::collections::HashMap;
	use std::sync::atomic::AtomicBool;
	use std::sync::Arc;

	fn exec() -> Executor {
		Executor::new(Mode::Lax, Value::Null, HashMap::new(), true, false, Arc::new(AtomicBool::new(false)))
	}

	#[test]
	fn int_addition_stays_int() {
		let mut e = exec();
		let node = Node::binary(BinaryOp::Add, Node::integer(2), Node::integer(3));
		let mut found = Vec::new();
		let (status, _) = e.execute_item(&node, &Value::Null, Some(&mut found));
		assert_eq!(status, Status::Ok);
		assert_eq!(found, vec![Value::Int(5)]);
	}

	#[test]
	fn division_by_zero_fails() {
		let mut e = exec();
		let node = Node::binary(BinaryOp::Div, Node::integer(1), Node::integer(0));
		let (status, err) = e.execute_item(&node, &Value::Null, None);
		assert_eq!(status, Status::Failed);
		assert!(matches!(err, Some(Error::DivisionByZero)));
	}

	#[test]
	fn exact_division_stays_int() {
		let mut e = exec();
		let node = Node::binary(BinaryOp::Div, Node::integer(6), Node::integer(3));
		let mut found = Vec::new();
		e.execute_item(&node, &Value::Null, Some(&mut found));
		assert_eq!(found, vec![Value::Int(2)]);
	}

	#[test]
	fn singleton_array_operand_unwraps_in_lax_mode() {
		let mut e = exec();
		let node = Node::binary(BinaryOp::Add, Node::root(), Node::integer(1));
		let value = Value::Array(vec![Value::Int(5)]);
		let mut found = Vec::new();
		let (status, _) = e.execute_item(&node, &value, Some(&mut found));
		assert_eq!(status, Status::Ok);
		assert_eq!(found, vec![Value::Int(6)]);
	}
}
