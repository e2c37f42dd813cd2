//! The executor: per-call state plus the top-level `execute_item` dispatch
//! (spec.md §3.4, §4.1).

mod accessors;
mod arithmetic;
mod datetime_cast;
mod keyvalue;
mod methods;
pub(crate) mod predicate;

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::ast::{Mode, Node, NodeKind};
use crate::error::Error;
use crate::value::Value;

/// Outcome of visiting one AST node, mirroring Postgres jsonpath's
/// `JsonPathExecResult` (spec.md §4.1).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
	Ok,
	NotFound,
	Failed,
}

pub(crate) type ExecOutcome = (Status, Option<Error>);

pub(crate) const OK: ExecOutcome = (Status::Ok, None);
pub(crate) const NOT_FOUND: ExecOutcome = (Status::NotFound, None);

pub(crate) fn failed(err: Error) -> ExecOutcome {
	(Status::Failed, Some(err))
}

/// Identity anchor for `.keyvalue()` (spec.md §4.8, §9). `$` is id 0,
/// `$var` is id `VARS_OBJECT_ID * ID_MULTIPLIER`; ids for objects
/// emitted by `.keyvalue()` come from a monotonic counter multiplied
/// the same way.
pub(crate) const ID_MULTIPLIER: u64 = 10_000_000_000;
pub(crate) const VARS_OBJECT_ID: u64 = 1;

#[derive(Clone, Copy, Debug)]
pub(crate) struct BaseObject {
	pub id: u64,
}

/// Per-call execution state (spec.md §3.4). Constructed once per
/// top-level call, mutated during traversal, discarded at the end.
pub struct Executor {
	pub(crate) mode: Mode,
	pub(crate) vars: HashMap<String, Value>,
	pub(crate) root: Value,
	pub(crate) current: Value,
	pub(crate) base_object: BaseObject,
	pub(crate) last_generated_object_id: u64,
	pub(crate) innermost_array_size: i64,
	pub(crate) ignore_structural_errors: bool,
	pub(crate) verbose: bool,
	pub(crate) use_tz: bool,
	pub(crate) cancelled: Arc<AtomicBool>,
}

impl Executor {
	pub(crate) fn new(
		mode: Mode,
		root: Value,
		vars: HashMap<String, Value>,
		verbose: bool,
		use_tz: bool,
		cancelled: Arc<AtomicBool>,
	) -> Self {
		Executor {
			mode,
			vars,
			current: root.clone(),
			root,
			base_object: BaseObject {
				id: 0,
			},
			last_generated_object_id: VARS_OBJECT_ID,
			innermost_array_size: -1,
			ignore_structural_errors: mode.is_lax(),
			verbose,
			use_tz,
			cancelled,
		}
	}

	fn is_cancelled(&self) -> bool {
		self.cancelled.load(Ordering::Relaxed)
	}

	/// Runs `f` with `self.current` temporarily replaced, guaranteeing
	/// restoration on every return path out of `f` (spec.md §3.4, §5).
	pub(crate) fn with_current<T>(&mut self, new_current: Value, f: impl FnOnce(&mut Self) -> T) -> T {
		let saved = std::mem::replace(&mut self.current, new_current);
		let result = f(self);
		self.current = saved;
		result
	}

	pub(crate) fn with_base_object<T>(&mut self, new_base: BaseObject, f: impl FnOnce(&mut Self) -> T) -> T {
		let saved = self.base_object;
		self.base_object = new_base;
		let result = f(self);
		self.base_object = saved;
		result
	}

	pub(crate) fn with_innermost_array_size<T>(&mut self, size: i64, f: impl FnOnce(&mut Self) -> T) -> T {
		let saved = self.innermost_array_size;
		self.innermost_array_size = size;
		let result = f(self);
		self.innermost_array_size = saved;
		result
	}

	/// Scoped toggle used by `EXISTS`/filter evaluation to mask
	/// verbose-only (suppressible) errors inside their inner traversal
	/// (spec.md §7's "silent toggle is scoped").
	pub(crate) fn with_silenced<T>(&mut self, f: impl FnOnce(&mut Self) -> T) -> T {
		let saved = self.verbose;
		self.verbose = false;
		let result = f(self);
		self.verbose = saved;
		result
	}

	pub(crate) fn with_ignore_structural_errors<T>(&mut self, ignore: bool, f: impl FnOnce(&mut Self) -> T) -> T {
		let saved = self.ignore_structural_errors;
		self.ignore_structural_errors = ignore;
		let result = f(self);
		self.ignore_structural_errors = saved;
		result
	}

	/// Converts a raw error according to the current suppression mode:
	/// structural errors downgrade to `NotFound` whenever
	/// `ignore_structural_errors` is set; suppressible errors downgrade
	/// to a silent `Failed` (no error) unless `verbose`; fatal errors and
	/// `Error::Null` always propagate as-is (spec.md §7).
	fn classify(&self, err: Error) -> ExecOutcome {
		if err.is_structural() {
			if self.ignore_structural_errors {
				return NOT_FOUND;
			}
			return if self.verbose {
				failed(err)
			} else {
				(Status::Failed, None)
			};
		}
		if err.is_suppressible() {
			return if self.verbose {
				failed(err)
			} else {
				(Status::Failed, None)
			};
		}
		failed(err)
	}

	/// Emits `value` to the node's continuation, or into `found` /
	/// reports existence if this was the terminal node (the
	/// "recurseNext" pattern Postgres's jsonpath executor uses
	/// throughout `executeItem`).
	pub(crate) fn recurse_next(
		&mut self,
		node: &Node,
		value: Value,
		found: Option<&mut Vec<Value>>,
	) -> ExecOutcome {
		match &node.next {
			Some(next) => self.execute_item(next, &value, found),
			None => {
				if let Some(found) = found {
					found.push(value);
				}
				OK
			}
		}
	}

	/// Top-level dispatch (spec.md §4.1). `found = None` means the
	/// caller only wants existence; in strict mode this triggers the
	/// "strict preflight" that materializes a local list so latent
	/// structural errors surface before existence is reported.
	pub fn execute_item(&mut self, node: &Node, value: &Value, found: Option<&mut Vec<Value>>) -> ExecOutcome {
		if self.is_cancelled() {
			return NOT_FOUND;
		}

		if found.is_none() && self.mode == Mode::Strict {
			let mut local = Vec::new();
			let (status, err) = self.execute_item_inner(node, value, Some(&mut local));
			return match status {
				Status::Failed => (Status::Failed, err),
				_ => {
					if local.is_empty() {
						NOT_FOUND
					} else {
						OK
					}
				}
			};
		}

		self.execute_item_inner(node, value, found)
	}

	fn execute_item_inner(&mut self, node: &Node, value: &Value, found: Option<&mut Vec<Value>>) -> ExecOutcome {
		trace!("execute_item: {:?}", node.kind);
		match &node.kind {
			NodeKind::Null => self.recurse_next(node, Value::Null, found),
			NodeKind::True => self.recurse_next(node, Value::Bool(true), found),
			NodeKind::False => self.recurse_next(node, Value::Bool(false), found),
			NodeKind::StringLit(s) => self.recurse_next(node, Value::String(s.clone()), found),
			NodeKind::IntegerLit(i) => self.recurse_next(node, Value::Int(*i), found),
			NodeKind::NumericLit(f) => self.recurse_next(node, Value::Float(*f), found),
			NodeKind::Last => {
				if self.innermost_array_size < 0 {
					return failed(Error::LastOutsideSubscript);
				}
				let last = self.innermost_array_size - 1;
				self.recurse_next(node, Value::Int(last), found)
			}

			NodeKind::Root => {
				let root = self.root.clone();
				self.with_base_object(BaseObject {
					id: 0,
				}, |exec| exec.recurse_next(node, root, found))
			}

			NodeKind::Current => {
				let current = self.current.clone();
				self.recurse_next(node, current, found)
			}

			NodeKind::Variable(name) => {
				let val = match self.vars.get(name) {
					Some(v) => v.clone(),
					None => return failed(Error::NoSuchVariable(name.clone())),
				};
				self.with_base_object(BaseObject {
					id: VARS_OBJECT_ID * ID_MULTIPLIER,
				}, |exec| exec.recurse_next(node, val, found))
			}

			NodeKind::Key(name) => accessors::execute_key(self, node, name, value, found),
			NodeKind::AnyKey => accessors::execute_any_key(self, node, value, found),
			NodeKind::AnyArray => accessors::execute_any_array(self, node, value, found),
			NodeKind::Any {
				first,
				last,
			} => accessors::execute_any_item(self, node, *first, *last, value, found, 0),
			NodeKind::ArrayIndex(subscripts) => accessors::execute_array_index(self, node, subscripts, value, found),

			NodeKind::Binary(op, l, r) => match op {
				crate::ast::BinaryOp::And
				| crate::ast::BinaryOp::Or
				| crate::ast::BinaryOp::Eq
				| crate::ast::BinaryOp::Ne
				| crate::ast::BinaryOp::Lt
				| crate::ast::BinaryOp::Le
				| crate::ast::BinaryOp::Gt
				| crate::ast::BinaryOp::Ge
				| crate::ast::BinaryOp::StartsWith => {
					let _ = (l, r);
					let outcome = predicate::execute_bool_item(self, node, value, true);
					bool_outcome_to_value(self, node, outcome, found)
				}
				crate::ast::BinaryOp::Add
				| crate::ast::BinaryOp::Sub
				| crate::ast::BinaryOp::Mul
				| crate::ast::BinaryOp::Div
				| crate::ast::BinaryOp::Rem => arithmetic::execute_binary(self, node, *op, l, r, value, found),
				crate::ast::BinaryOp::Subscript => failed(Error::Fatal("subscript binary reached top-level dispatch".into())),
				crate::ast::BinaryOp::Decimal => failed(Error::Fatal("decimal binary reached top-level dispatch".into())),
			},

			NodeKind::Unary(op, operand) => match op {
				crate::ast::UnaryOp::Plus | crate::ast::UnaryOp::Minus => {
					arithmetic::execute_unary(self, node, *op, operand, value, found)
				}
				crate::ast::UnaryOp::Not | crate::ast::UnaryOp::IsUnknown | crate::ast::UnaryOp::Exists => {
					let b = predicate::execute_bool_item(self, node, value, false);
					bool_outcome_to_value(self, node, b, found)
				}
				crate::ast::UnaryOp::Filter => predicate::execute_filter(self, node, operand, value, found),
			},

			NodeKind::LikeRegex(_, _) => {
				let b = predicate::execute_bool_item(self, node, value, false);
				bool_outcome_to_value(self, node, b, found)
			}

			NodeKind::Method(m) => methods::execute_method(self, node, *m, value, found),
			NodeKind::Decimal {
				precision,
				scale,
			} => methods::execute_decimal(self, node, precision, scale.as_deref(), value, found),

			NodeKind::DatetimeCast {
				op,
				precision,
			} => datetime_cast::execute_cast(self, node, *op, *precision, value, found),
			NodeKind::DatetimeTemplate(_) => failed(Error::DatetimeTemplateUnsupported),
		}
	}
}

fn bool_outcome_to_value(
	exec: &mut Executor,
	node: &Node,
	outcome: Result<predicate::Tri, Error>,
	found: Option<&mut Vec<Value>>,
) -> ExecOutcome {
	match outcome {
		Ok(tri) => {
			let v = tri.to_value();
			exec.recurse_next(node, v, found)
		}
		Err(e) => exec.classify(e),
	}
}
