//! AST node types consumed (not produced) by the executor (spec.md §3.3).
//!
//! Parsing a textual path expression into this tree is out of scope
//! (spec.md §1); a parser crate is expected to build these nodes
//! directly. The constructors below exist so tests — and any future
//! parser — can build trees without reaching into private fields.

use std::sync::Arc;

use regex::Regex;

use crate::value::Value;

/// `strict` requires structural conformity; `lax` tolerates it via
/// auto-unwrap/auto-wrap (spec.md glossary).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Mode {
	Strict,
	Lax,
}

impl Mode {
	pub fn is_lax(self) -> bool {
		matches!(self, Mode::Lax)
	}
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BinaryOp {
	And,
	Or,
	Eq,
	Ne,
	Lt,
	Le,
	Gt,
	Ge,
	StartsWith,
	Add,
	Sub,
	Mul,
	Div,
	Rem,
	/// `[from..to]`, always binary even when `to` is absent (`to` is then `None`).
	Subscript,
	Decimal,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UnaryOp {
	Not,
	IsUnknown,
	Exists,
	/// `? (...)` filter.
	Filter,
	Plus,
	Minus,
}

/// The datetime-cast family is split out of [`UnaryOp`] because each
/// carries an optional fractional-second precision argument rather
/// than a plain sub-node (spec.md §4.7).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DatetimeCastOp {
	/// `.datetime()` — parse, no forced target variant.
	Datetime,
	Date,
	Time,
	TimeTz,
	Timestamp,
	TimestampTz,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Method {
	Type,
	Size,
	Double,
	Integer,
	Bigint,
	String,
	Boolean,
	Abs,
	Floor,
	Ceiling,
	Numeric,
	/// `.decimal(precision[, scale])`; arguments carried on the `Node::Decimal` kind.
	Decimal,
	KeyValue,
}

/// Recursive-descent level bounds (spec.md §3.3, §9): `(0, n)` descends
/// from self; `(k, m)` with `k > 0` is a bounded range; the sentinel
/// `(MAX, MAX)` means "leaves only".
pub const DESCENT_LEAVES_ONLY: u32 = u32::MAX;

#[derive(Clone, Debug)]
pub enum NodeKind {
	Null,
	True,
	False,
	/// `$`
	Root,
	/// `@`
	Current,
	/// `.*`
	AnyKey,
	/// `[*]`
	AnyArray,
	/// `last`, valid only inside an array subscript.
	Last,
	StringLit(String),
	IntegerLit(i64),
	NumericLit(f64),
	/// `$name`
	Variable(String),
	/// `.name`
	Key(String),
	Binary(BinaryOp, Box<Node>, Box<Node>),
	Unary(UnaryOp, Box<Node>),
	LikeRegex(Box<Node>, Arc<Regex>),
	Method(Method),
	/// `.decimal(precision, scale?)`
	Decimal {
		precision: Box<Node>,
		scale: Option<Box<Node>>,
	},
	/// `.datetime()/.date()/.time()/.time_tz()/.timestamp()/.timestamp_tz()`,
	/// applied to the value this node continues from.
	DatetimeCast {
		op: DatetimeCastOp,
		precision: Option<u32>,
	},
	/// `.datetime(template)` — deliberately unimplemented (spec.md §1, §9).
	DatetimeTemplate(String),
	/// `.**` with inclusive, 1-based level bounds from the target.
	Any {
		first: u32,
		last: u32,
	},
	/// `[s1, s2, ...]`, each a `(from, to?)` pair.
	ArrayIndex(Vec<Subscript>),
}

#[derive(Clone, Debug)]
pub struct Subscript {
	pub from: Node,
	pub to: Option<Node>,
}

/// A node plus its left-to-right accessor continuation (spec.md §3.3).
#[derive(Clone, Debug)]
pub struct Node {
	pub kind: NodeKind,
	pub next: Option<Box<Node>>,
}

/// A compiled path expression: the accessor tree plus the `strict`/`lax`
/// flag it was parsed with (spec.md §3.4 — "path: AST plus strict/lax
/// flag"). The four public entry points in `api` take this, not a bare
/// `Node`, since mode is a property of the whole expression.
#[derive(Clone, Debug)]
pub struct Path {
	pub mode: Mode,
	pub root: Node,
}

impl Path {
	pub fn new(mode: Mode, root: Node) -> Self {
		Path {
			mode,
			root,
		}
	}
}

impl Node {
	pub fn new(kind: NodeKind) -> Self {
		Node {
			kind,
			next: None,
		}
	}

	pub fn with_next(mut self, next: Node) -> Self {
		self.next = Some(Box::new(next));
		self
	}

	pub fn root() -> Self {
		Node::new(NodeKind::Root)
	}

	pub fn current() -> Self {
		Node::new(NodeKind::Current)
	}

	pub fn null() -> Self {
		Node::new(NodeKind::Null)
	}

	pub fn key(name: impl Into<String>) -> Self {
		Node::new(NodeKind::Key(name.into()))
	}

	pub fn variable(name: impl Into<String>) -> Self {
		Node::new(NodeKind::Variable(name.into()))
	}

	pub fn integer(v: i64) -> Self {
		Node::new(NodeKind::IntegerLit(v))
	}

	pub fn numeric(v: f64) -> Self {
		Node::new(NodeKind::NumericLit(v))
	}

	pub fn string(v: impl Into<String>) -> Self {
		Node::new(NodeKind::StringLit(v.into()))
	}

	pub fn any_array() -> Self {
		Node::new(NodeKind::AnyArray)
	}

	pub fn any_key() -> Self {
		Node::new(NodeKind::AnyKey)
	}

	pub fn binary(op: BinaryOp, left: Node, right: Node) -> Self {
		Node::new(NodeKind::Binary(op, Box::new(left), Box::new(right)))
	}

	pub fn unary(op: UnaryOp, operand: Node) -> Self {
		Node::new(NodeKind::Unary(op, Box::new(operand)))
	}

	pub fn filter(cond: Node) -> Self {
		Node::unary(UnaryOp::Filter, cond)
	}

	pub fn method(m: Method) -> Self {
		Node::new(NodeKind::Method(m))
	}

	pub fn array_index(subscripts: Vec<Subscript>) -> Self {
		Node::new(NodeKind::ArrayIndex(subscripts))
	}

	pub fn recursive_descent(first: u32, last: u32) -> Self {
		Node::new(NodeKind::Any {
			first,
			last,
		})
	}

	pub fn datetime_cast(op: DatetimeCastOp, precision: Option<u32>) -> Self {
		Node::new(NodeKind::DatetimeCast {
			op,
			precision,
		})
	}

	/// A [`Node`] wrapping a literal [`Value`], used as the `Where`/`Value`
	/// style embedding of a precomputed value inside a larger tree (e.g.
	/// in tests that want a constant array element without re-deriving a
	/// literal kind for every JSON type).
	pub fn literal(v: Value) -> Self {
		match v {
			Value::Null => Node::null(),
			Value::Bool(true) => Node::new(NodeKind::True),
			Value::Bool(false) => Node::new(NodeKind::False),
			Value::Int(i) => Node::integer(i),
			Value::Float(f) => Node::numeric(f),
			Value::String(s) => Node::string(s),
			_ => Node::null(),
		}
	}
}
