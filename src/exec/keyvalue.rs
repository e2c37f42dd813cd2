//! `.keyvalue()` (spec.md §4.8): decomposes an object into
//! `{key, value, id}` triples so object identity survives flattening
//! through arrays.

use std::collections::BTreeMap;

use crate::ast::Node;
use crate::error::Error;
use crate::value::Value;

use super::{BaseObject, Executor, ExecOutcome, Status, ID_MULTIPLIER};

pub(super) fn execute_keyvalue(exec: &mut Executor, node: &Node, value: &Value, found: Option<&mut Vec<Value>>) -> ExecOutcome {
	match value {
		Value::Object(map) => {
			if map.is_empty() {
				return super::NOT_FOUND;
			}

			exec.last_generated_object_id += 1;
			let id = exec.base_object.id * ID_MULTIPLIER + exec.last_generated_object_id;
			let new_base = BaseObject {
				id,
			};

			let mut overall = Status::NotFound;
			let mut found = found;
			for (key, val) in map {
				let mut triple = BTreeMap::new();
				triple.insert("key".to_string(), Value::String(key.clone()));
				triple.insert("value".to_string(), val.clone());
				triple.insert("id".to_string(), Value::Int(id as i64));

				let reborrow = found.as_mut().map(|v| &mut **v);
				let (status, err) = exec.with_base_object(new_base, |exec| exec.recurse_next(node, Value::Object(triple), reborrow));
				if status == Status::Failed {
					return (status, err);
				}
				if status == Status::Ok {
					overall = Status::Ok;
				}
			}
			(overall, None)
		}
		Value::Array(items) if exec.mode.is_lax() => {
			let items = items.clone();
			let mut overall = Status::NotFound;
			let mut found = found;
			for item in items {
				let reborrow = found.as_mut().map(|v| &mut **v);
				let (status, err) = execute_keyvalue(exec, node, &item, reborrow);
				if status == Status::Failed {
					return (status, err);
				}
				if status == Status::Ok {
					overall = Status::Ok;
				}
			}
			(overall, None)
		}
		_ => exec.classify(Error::NotAnObject),
	}
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
	fn keyvalue_emits_one_triple_per_key() {
		let mut e = exec();
		let mut obj = BTreeMap::new();
		obj.insert("a".to_string(), Value::Int(1));
		obj.insert("b".to_string(), Value::Int(2));
		let node = Node::method(crate::ast::Method::KeyValue);
		let mut found = Vec::new();
		let (status, _) = e.execute_item(&node, &Value::Object(obj), Some(&mut found));
		assert_eq!(status, Status::Ok);
		assert_eq!(found.len(), 2);
		for triple in &found {
			assert!(matches!(triple, Value::Object(_)));
		}
	}

	#[test]
	fn keyvalue_triples_share_one_id() {
		let mut e = exec();
		let mut obj = BTreeMap::new();
		obj.insert("a".to_string(), Value::Int(1));
		obj.insert("b".to_string(), Value::Int(2));
		let node = Node::method(crate::ast::Method::KeyValue);
		let mut found = Vec::new();
		e.execute_item(&node, &Value::Object(obj), Some(&mut found));
		let ids: Vec<&Value> = found
			.iter()
			.map(|t| match t {
				Value::Object(m) => m.get("id").unwrap(),
				_ => unreachable!(),
			})
			.collect();
		assert_eq!(ids[0], ids[1]);
	}
}
