//! The JSON value model (spec.md §3.1).

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::datetime::DateTimeValue;
use crate::error::Error;

/// A JSON value, plus the two extensions the executor needs: a
/// deferred-number form that preserves the original digit string from
/// decode, and a first-class datetime variant produced by the
/// `.datetime()`/`.date()`/... methods (spec.md §4.7).
#[derive(Clone, Debug, Serialize, Deserialize)]
#[non_exhaustive]
pub enum Value {
	Null,
	Bool(bool),
	Int(i64),
	Float(f64),
	/// A number whose original digit string was preserved verbatim at
	/// decode time; coerces lazily to `Int` or `Float` as operators
	/// demand (spec.md §3.1, §9).
	Deferred(String),
	String(String),
	Array(Vec<Value>),
	Object(BTreeMap<String, Value>),
	DateTime(DateTimeValue),
}

impl Default for Value {
	fn default() -> Self {
		Value::Null
	}
}

impl PartialEq for Value {
	fn eq(&self, other: &Self) -> bool {
		match (self, other) {
			(Value::Null, Value::Null) => true,
			(Value::Bool(a), Value::Bool(b)) => a == b,
			(Value::String(a), Value::String(b)) => a == b,
			(Value::Array(a), Value::Array(b)) => a == b,
			(Value::Object(a), Value::Object(b)) => a == b,
			(Value::DateTime(a), Value::DateTime(b)) => a == b,
			_ => match (self.as_numeric_ladder(), other.as_numeric_ladder()) {
				(Some(a), Some(b)) => a == b,
				_ => false,
			},
		}
	}
}

/// The three numeric representations promote into this ladder for
/// uniform arithmetic and comparison (spec.md §4.5).
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Num {
	Int(i64),
	Float(f64),
}

impl Num {
	pub fn to_f64(self) -> f64 {
		match self {
			Num::Int(i) => i as f64,
			Num::Float(f) => f,
		}
	}
}

impl PartialOrd for Num {
	fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
		match (self, other) {
			(Num::Int(a), Num::Int(b)) => a.partial_cmp(b),
			_ => self.to_f64().partial_cmp(&other.to_f64()),
		}
	}
}

impl Value {
	/// Vocabulary returned by `.type()` (spec.md §4.6).
	pub fn type_name(&self) -> &'static str {
		match self {
			Value::Null => "null",
			Value::Bool(_) => "boolean",
			Value::Int(_) | Value::Float(_) | Value::Deferred(_) => "number",
			Value::String(_) => "string",
			Value::Array(_) => "array",
			Value::Object(_) => "object",
			Value::DateTime(v) => v.type_name(),
		}
	}

	pub fn is_array(&self) -> bool {
		matches!(self, Value::Array(_))
	}

	pub fn is_object(&self) -> bool {
		matches!(self, Value::Object(_))
	}

	pub fn is_null(&self) -> bool {
		matches!(self, Value::Null)
	}

	/// Attempts to read this value as a number on the Int/Float ladder,
	/// coercing a `Deferred` digit string as Int first, then Float,
	/// matching the promotion rule of spec.md §4.5.
	pub fn as_numeric_ladder(&self) -> Option<Num> {
		match self {
			Value::Int(i) => Some(Num::Int(*i)),
			Value::Float(f) => Some(Num::Float(*f)),
			Value::Deferred(s) => {
				if let Ok(i) = s.parse::<i64>() {
					Some(Num::Int(i))
				} else {
					s.parse::<f64>().ok().map(Num::Float)
				}
			}
			_ => None,
		}
	}

	/// Canonical string form used by `.string()` (spec.md §4.6):
	/// JSON scalars formatted shortest-round-trip, booleans as
	/// `"true"`/`"false"`, datetimes in ISO-8601.
	pub fn to_canonical_string(&self) -> Result<String, Error> {
		match self {
			Value::Null => Ok("null".to_string()),
			Value::Bool(b) => Ok(b.to_string()),
			Value::Int(i) => Ok(i.to_string()),
			Value::Float(f) => Ok(format!("{f}")),
			Value::Deferred(s) => Ok(s.clone()),
			Value::String(s) => Ok(s.clone()),
			Value::DateTime(v) => Ok(v.to_iso8601()),
			Value::Array(_) | Value::Object(_) => {
				Err(Error::InvalidItemType)
			}
		}
	}
}

impl fmt::Display for Value {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self.to_canonical_string() {
			Ok(s) => write!(f, "{s}"),
			Err(_) => write!(f, "<{}>", self.type_name()),
		}
	}
}

/// Decodes a `serde_json::Value` into our `Value`, preserving the
/// original digit string of any JSON number via the
/// `arbitrary_precision` feature so arithmetic/comparison can decide
/// Int-vs-Float promotion later (spec.md §3.1).
pub fn from_json(v: &serde_json::Value) -> Value {
	match v {
		serde_json::Value::Null => Value::Null,
		serde_json::Value::Bool(b) => Value::Bool(*b),
		serde_json::Value::Number(n) => Value::Deferred(n.to_string()),
		serde_json::Value::String(s) => Value::String(s.clone()),
		serde_json::Value::Array(a) => Value::Array(a.iter().map(from_json).collect()),
		serde_json::Value::Object(o) => {
			Value::Object(o.iter().map(|(k, v)| (k.clone(), from_json(v))).collect())
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn deferred_number_coerces_to_int_first() {
		let v = Value::Deferred("42".to_string());
		assert_eq!(v.as_numeric_ladder(), Some(Num::Int(42)));
	}

	#[test]
	fn deferred_number_falls_back_to_float() {
		let v = Value::Deferred("4.5".to_string());
		assert_eq!(v.as_numeric_ladder(), Some(Num::Float(4.5)));
	}

	#[test]
	fn type_name_vocabulary() {
		assert_eq!(Value::Null.type_name(), "null");
		assert_eq!(Value::Array(vec![]).type_name(), "array");
		assert_eq!(Value::Object(Default::default()).type_name(), "object");
	}

	#[test]
	fn from_json_preserves_digit_string() {
		let j: serde_json::Value = serde_json::from_str("1.50").unwrap();
		match from_json(&j) {
			Value::Deferred(s) => assert_eq!(s, "1.50"),
			other => panic!("expected Deferred, got {other:?}"),
		}
	}
}
