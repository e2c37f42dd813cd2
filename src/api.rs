//! The four public entry points (spec.md §6).

use std::collections::HashMap;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use crate::ast::Path;
use crate::error::Error;
use crate::exec::{Executor, Status};
use crate::value::Value;

/// Evaluation options, mirroring `surrealdb-core::dbs::Options`'s
/// consuming-builder style (spec.md §6).
#[derive(Default, Clone)]
pub struct Options {
	vars: HashMap<String, Value>,
	use_tz: bool,
	silent: bool,
	cancelled: Option<Arc<AtomicBool>>,
}

impl Options {
	pub fn with_vars(mut self, vars: HashMap<String, Value>) -> Self {
		self.vars = vars;
		self
	}

	/// Enables comparisons/casts across timezone-bearing and
	/// timezone-naive datetime variants (spec.md §4.7).
	pub fn with_tz(mut self) -> Self {
		self.use_tz = true;
		self
	}

	/// Suppresses the suppressible error class (spec.md §7): failures
	/// still short-circuit the traversal, but carry no message.
	pub fn with_silent(mut self) -> Self {
		self.silent = true;
		self
	}

	/// Cooperative cancellation flag checked at every dispatch (spec.md §5).
	pub fn with_cancellation(mut self, flag: Arc<AtomicBool>) -> Self {
		self.cancelled = Some(flag);
		self
	}

	fn executor(&self, path: &Path, value: &Value) -> Executor {
		Executor::new(
			path.mode,
			value.clone(),
			self.vars.clone(),
			!self.silent,
			self.use_tz,
			self.cancelled.clone().unwrap_or_else(|| Arc::new(AtomicBool::new(false))),
		)
	}
}

/// `query` (spec.md §6): the ordered sequence of selected values.
/// Structural/suppressible failures collapse to an empty sequence
/// under `with_silent`; under verbose mode they surface as `Err`.
pub fn query(path: &Path, value: &Value, options: &Options) -> Result<Vec<Value>, Error> {
	let mut exec = options.executor(path, value);
	let mut items = Vec::new();
	let (status, err) = exec.execute_item(&path.root, value, Some(&mut items));
	match status {
		Status::Failed => match err {
			Some(e) => Err(e),
			None => Ok(Vec::new()),
		},
		_ => Ok(items),
	}
}

/// `first` (spec.md §6): `Ok(None)` means the sequence was empty,
/// distinct from `Ok(Some(Value::Null))` (a selected JSON null).
pub fn first(path: &Path, value: &Value, options: &Options) -> Result<Option<Value>, Error> {
	let items = query(path, value, options)?;
	Ok(items.into_iter().next())
}

/// `exists` (spec.md §6): tri-valued. A verbose strict-mode structural
/// failure surfaces as `Ok(None)` (the `ErrNull` sentinel) rather than
/// an `Err` — `exists` never raises for non-fatal failures; under
/// `with_silent` the same failure instead reads as plain `false`
/// (spec.md §8.3 example 2).
pub fn exists(path: &Path, value: &Value, options: &Options) -> Result<Option<bool>, Error> {
	let mut exec = options.executor(path, value);
	let (status, err) = exec.execute_item(&path.root, value, None);
	match status {
		Status::Ok => Ok(Some(true)),
		Status::NotFound => Ok(Some(false)),
		Status::Failed => match err {
			Some(e) if e.is_fatal() => Err(e),
			Some(_) => Ok(None),
			None => Ok(Some(false)),
		},
	}
}

/// `match_` (spec.md §6): runs `path` as an ordinary query and requires
/// the result sequence to reduce to exactly one boolean. A single `Null`
/// result yields `Ok(None)` (the `ErrNull` sentinel); anything else
/// (empty, more than one item, or a single non-boolean item) is a
/// verbose-mode error and a silent-mode `ErrNull` (spec.md §8.3
/// example 3 — `match("$ == 5", ...)` relies on `==` itself being
/// ordinary query grammar that resolves to a lone `Bool`).
pub fn match_(path: &Path, value: &Value, options: &Options) -> Result<Option<bool>, Error> {
	let mut exec = options.executor(path, value);
	let mut items = Vec::new();
	let (status, err) = exec.execute_item(&path.root, value, Some(&mut items));
	if let Status::Failed = status {
		if let Some(e) = &err {
			if e.is_fatal() {
				return Err(err.unwrap());
			}
		}
		return Ok(None);
	}

	match items.as_slice() {
		[Value::Bool(b)] => Ok(Some(*b)),
		[Value::Null] => Ok(None),
		_ if exec.verbose => Err(Error::SingleBooleanResultExpected),
		_ => Ok(None),
	}
}
