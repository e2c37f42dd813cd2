//! A tree-walking execution engine for SQL/JSON path expressions,
//! tracking PostgreSQL's `jsonpath` semantics (spec.md §1-2).
//!
//! Parsing a textual path expression into an [`ast::Node`]/[`ast::Path`]
//! tree is out of scope; this crate consumes an already-built tree and
//! evaluates it against a [`value::Value`] document via the four entry
//! points in [`api`].

#[macro_use]
extern crate tracing;

pub mod api;
pub mod ast;
pub mod datetime;
pub mod error;
mod exec;
pub mod value;

pub use api::{exists, first, match_, query, Options};
pub use ast::{Mode, Node, Path};
pub use error::Error;
pub use value::Value;
