//! `.datetime()/.date()/.time()/.time_tz()/.timestamp()/.timestamp_tz()` (spec.md §4.7).

use crate::ast::{DatetimeCastOp, Node};
use crate::datetime::{self, CastTarget};
use crate::error::Error;
use crate::value::Value;

use super::{Executor, ExecOutcome, Status};

pub(super) fn execute_cast(exec: &mut Executor, node: &Node, op: DatetimeCastOp, precision: Option<u32>, value: &Value, found: Option<&mut Vec<Value>>) -> ExecOutcome {
	if let Value::Array(items) = value {
		if exec.mode.is_lax() {
			return fan_out(exec, node, op, precision, items.clone(), found);
		}
		return exec.classify(Error::InvalidItemType);
	}

	let parsed = match value {
		Value::String(s) => match datetime::parse_auto(s, precision) {
			Ok(v) => v,
			Err(e) => return exec.classify(e),
		},
		Value::DateTime(v) => v.clone(),
		_ => return exec.classify(Error::InvalidItemType),
	};

	let result = match op {
		DatetimeCastOp::Datetime => Ok(parsed),
		DatetimeCastOp::Date => datetime::cast(parsed, CastTarget::Date, exec.use_tz),
		DatetimeCastOp::Time => datetime::cast(parsed, CastTarget::Time, exec.use_tz),
		DatetimeCastOp::TimeTz => datetime::cast(parsed, CastTarget::TimeTz, exec.use_tz),
		DatetimeCastOp::Timestamp => datetime::cast(parsed, CastTarget::Timestamp, exec.use_tz),
		DatetimeCastOp::TimestampTz => datetime::cast(parsed, CastTarget::TimestampTz, exec.use_tz),
	};

	match result {
		Ok(dt) => exec.recurse_next(node, Value::DateTime(dt), found),
		Err(e) => exec.classify(e),
	}
}

fn fan_out(exec: &mut Executor, node: &Node, op: DatetimeCastOp, precision: Option<u32>, items: Vec<Value>, found: Option<&mut Vec<Value>>) -> ExecOutcome {
	let mut overall = Status::NotFound;
	let mut found = found;
	for item in items {
		let reborrow = found.as_mut().map(|v| &mut **v);
		let (status, err) = execute_cast(exec, node, op, precision, &item, reborrow);
		match status {
			Status::Failed => return (status, err),
			Status::Ok => overall = Status::Ok,
			Status::NotFound => {}
		}
	}
	(overall, None)
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::ast::Mode;
	use std::collections::HashMap;
	use std::sync::atomic::AtomicBool;
	use std::sync::Arc;

	fn exec() -> Executor {
		Executor::new(Mode::Lax, Value::Null, HashMap::new(), true, true, Arc::new(AtomicBool::new(false)))
	}

	#[test]
	fn datetime_parses_plain_date_string() {
		let mut e = exec();
		let node = Node::datetime_cast(DatetimeCastOp::Datetime, None);
		let value = Value::String("2020-01-02".to_string());
		let mut found = Vec::new();
		let (status, _) = e.execute_item(&node, &value, Some(&mut found));
		assert_eq!(status, Status::Ok);
		assert!(matches!(found[0], Value::DateTime(_)));
	}

	#[test]
	fn date_cast_from_timestamp_string() {
		let mut e = exec();
		let node = Node::datetime_cast(DatetimeCastOp::Date, None);
		let value = Value::String("2020-01-02T03:04:05".to_string());
		let mut found = Vec::new();
		e.execute_item(&node, &value, Some(&mut found));
		assert!(matches!(found[0], Value::DateTime(crate::datetime::DateTimeValue::Date(_))));
	}
}
