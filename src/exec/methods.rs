//! Type-conversion methods (spec.md §4.6).

use crate::ast::{Method, Node};
use crate::error::Error;
use crate::value::{Num, Value};

use super::{Executor, ExecOutcome, Status};

/// All methods accept a single item; for `[]` current values, lax mode
/// unwraps and re-applies elementwise, strict mode errors — except
/// `.type()` and `.size()`, which are defined directly on arrays
/// (spec.md §4.6).
pub(super) fn execute_method(exec: &mut Executor, node: &Node, m: Method, value: &Value, found: Option<&mut Vec<Value>>) -> ExecOutcome {
	match m {
		Method::Type => {
			let v = Value::String(value.type_name().to_string());
			exec.recurse_next(node, v, found)
		}
		Method::Size => execute_size(exec, node, value, found),
		Method::KeyValue => super::keyvalue::execute_keyvalue(exec, node, value, found),
		_ => {
			if let Value::Array(items) = value {
				if exec.mode.is_lax() {
					return fan_out_scalar_method(exec, node, m, items.clone(), found);
				}
				return exec.classify(Error::InvalidItemType);
			}
			match apply_scalar_method(m, value) {
				Ok(v) => exec.recurse_next(node, v, found),
				Err(e) => exec.classify(e),
			}
		}
	}
}

fn fan_out_scalar_method(exec: &mut Executor, node: &Node, m: Method, items: Vec<Value>, found: Option<&mut Vec<Value>>) -> ExecOutcome {
	let mut overall = Status::NotFound;
	let mut found = found;
	for item in items {
		let reborrow = found.as_mut().map(|v| &mut **v);
		let (status, err) = execute_method(exec, node, m, &item, reborrow);
		match status {
			Status::Failed => return (status, err),
			Status::Ok => overall = Status::Ok,
			Status::NotFound => {}
		}
	}
	(overall, None)
}

fn execute_size(exec: &mut Executor, node: &Node, value: &Value, found: Option<&mut Vec<Value>>) -> ExecOutcome {
	let size = match value {
		Value::Array(items) => items.len() as i64,
		_ if exec.mode.is_lax() => 1,
		_ => return exec.classify(Error::InvalidItemType),
	};
	exec.recurse_next(node, Value::Int(size), found)
}

fn apply_scalar_method(m: Method, value: &Value) -> Result<Value, Error> {
	match m {
		Method::Double => to_f64(value).and_then(|f| {
			if f.is_finite() {
				Ok(Value::Float(f))
			} else {
				Err(Error::NotFinite("double"))
			}
		}),
		Method::Integer => to_f64(value).map(|f| round_half_away_from_zero(f)).and_then(|n| {
			if n < i32::MIN as f64 || n > i32::MAX as f64 {
				Err(Error::InvalidArgument {
					method: "integer",
					value: format!("{n}"),
					ty: "number",
				})
			} else {
				Ok(Value::Int(n as i64))
			}
		}),
		Method::Bigint => to_f64(value).map(round_half_away_from_zero).and_then(|n| {
			if n < i64::MIN as f64 || n > i64::MAX as f64 {
				Err(Error::InvalidArgument {
					method: "bigint",
					value: format!("{n}"),
					ty: "number",
				})
			} else {
				Ok(Value::Int(n as i64))
			}
		}),
		Method::String => value.to_canonical_string().map(Value::String),
		Method::Boolean => to_boolean(value).map(Value::Bool),
		Method::Abs => numeric_unary(value, |n| match n {
			Num::Int(i) => Num::Int(i.abs()),
			Num::Float(f) => Num::Float(f.abs()),
		}),
		Method::Floor => numeric_unary(value, |n| match n {
			Num::Int(i) => Num::Int(i),
			Num::Float(f) => Num::Float(f.floor()),
		}),
		Method::Ceiling => numeric_unary(value, |n| match n {
			Num::Int(i) => Num::Int(i),
			Num::Float(f) => Num::Float(f.ceil()),
		}),
		Method::Numeric => match value.as_numeric_ladder() {
			Some(Num::Int(i)) => Ok(Value::Int(i)),
			Some(Num::Float(f)) => Ok(Value::Float(f)),
			None => Err(Error::NotNumeric(value.type_name().to_string())),
		},
		Method::Decimal | Method::KeyValue => {
			Err(Error::Fatal(format!("{m:?} must dispatch through its dedicated node, not Method")))
		}
	}
}

fn numeric_unary(value: &Value, f: impl Fn(Num) -> Num) -> Result<Value, Error> {
	match value.as_numeric_ladder() {
		Some(n) => Ok(num_to_value(f(n))),
		None => Err(Error::NotNumeric(value.type_name().to_string())),
	}
}

fn num_to_value(n: Num) -> Value {
	match n {
		Num::Int(i) => Value::Int(i),
		Num::Float(f) => Value::Float(f),
	}
}

fn to_f64(value: &Value) -> Result<f64, Error> {
	match value.as_numeric_ladder() {
		Some(n) => Ok(n.to_f64()),
		None => match value {
			Value::String(s) => s.parse::<f64>().map_err(|_| Error::NotNumeric(s.clone())),
			_ => Err(Error::NotNumeric(value.type_name().to_string())),
		},
	}
}

fn round_half_away_from_zero(f: f64) -> f64 {
	if f >= 0.0 {
		(f + 0.5).floor()
	} else {
		(f - 0.5).ceil()
	}
}

/// `.boolean()` vocabulary (spec.md §4.6): `t|true|f|false|y|yes|n|no|on|off|1|0`, case-insensitive.
fn to_boolean(value: &Value) -> Result<bool, Error> {
	match value {
		Value::Bool(b) => Ok(*b),
		Value::Int(i) => Ok(*i != 0),
		Value::Float(f) => {
			if f.fract() != 0.0 {
				Err(Error::InvalidBooleanCoercion("boolean"))
			} else {
				Ok(*f != 0.0)
			}
		}
		Value::Deferred(_) => match value.as_numeric_ladder() {
			Some(Num::Int(i)) => Ok(i != 0),
			Some(Num::Float(f)) if f.fract() == 0.0 => Ok(f != 0.0),
			_ => Err(Error::InvalidBooleanCoercion("boolean")),
		},
		Value::String(s) => match s.to_ascii_lowercase().as_str() {
			"t" | "true" | "y" | "yes" | "on" | "1" => Ok(true),
			"f" | "false" | "n" | "no" | "off" | "0" => Ok(false),
			_ => Err(Error::InvalidArgument {
				method: "boolean",
				value: s.clone(),
				ty: "string",
			}),
		},
		_ => Err(Error::InvalidBooleanCoercion("boolean")),
	}
}

/// `.decimal(precision[, scale])` (spec.md §4.6): validates
/// `1<=precision<=1000`, `-1000<=scale<=1000`, rounds to scale, and
/// rejects results whose integer-part digit count exceeds
/// `precision - scale`.
pub(super) fn execute_decimal(exec: &mut Executor, node: &Node, precision_node: &Node, scale_node: Option<&Node>, value: &Value, found: Option<&mut Vec<Value>>) -> ExecOutcome {
	let precision = match eval_single_int(exec, precision_node, value) {
		Ok(v) => v,
		Err(e) => return exec.classify(e),
	};
	let scale = match scale_node {
		Some(n) => match eval_single_int(exec, n, value) {
			Ok(v) => v,
			Err(e) => return exec.classify(e),
		},
		None => 0,
	};

	if !(1..=1000).contains(&precision) {
		return exec.classify(Error::DecimalPrecisionOutOfRange);
	}
	if !(-1000..=1000).contains(&scale) {
		return exec.classify(Error::DecimalScaleOutOfRange);
	}

	let f = match to_f64(value) {
		Ok(f) => f,
		Err(e) => return exec.classify(e),
	};

	let ratio = 10f64.powi(scale as i32);
	let rounded = (f * ratio).round() / ratio;

	let integer_digits = if rounded == 0.0 {
		1
	} else {
		(rounded.abs().log10().floor() as i64 + 1).max(1)
	};
	if integer_digits > precision - scale {
		return exec.classify(Error::DecimalOverflow);
	}

	let scale_for_format = scale.max(0) as usize;
	let formatted = format!("{rounded:.scale_for_format$}");
	exec.recurse_next(node, Value::Deferred(formatted), found)
}

fn eval_single_int(exec: &mut Executor, node: &Node, value: &Value) -> Result<i64, Error> {
	let mut items = Vec::new();
	let (status, err) = exec.execute_item(node, value, Some(&mut items));
	if status == Status::Failed {
		return Err(err.unwrap_or(Error::SubscriptNotNumeric));
	}
	if items.len() != 1 {
		return Err(Error::SubscriptNotNumeric);
	}
	match items[0].as_numeric_ladder() {
		Some(Num::Int(i)) => Ok(i),
		Some(Num::Float(f)) => Ok(f.round() as i64),
		None => Err(Error::SubscriptNotNumeric),
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn abs_is_non_negative() {
		assert_eq!(apply_scalar_method(Method::Abs, &Value::Int(-5)).unwrap(), Value::Int(5));
		assert_eq!(apply_scalar_method(Method::Abs, &Value::Int(5)).unwrap(), Value::Int(5));
	}

	#[test]
	fn boolean_vocabulary_is_case_insensitive() {
		assert_eq!(to_boolean(&Value::String("YES".into())).unwrap(), true);
		assert_eq!(to_boolean(&Value::String("n".into())).unwrap(), false);
		assert!(to_boolean(&Value::String("maybe".into())).is_err());
	}

	#[test]
	fn integer_rounds_half_away_from_zero() {
		assert_eq!(apply_scalar_method(Method::Integer, &Value::Float(2.5)).unwrap(), Value::Int(3));
		assert_eq!(apply_scalar_method(Method::Integer, &Value::Float(-2.5)).unwrap(), Value::Int(-3));
	}
}
