//! JSON-schema validation for dago graph documents.
//!
//! [`Graph::validate`](dago_graph::Graph::validate) checks referential
//! integrity of an in-memory graph. This crate checks the *wire shape* of
//! documents before they are parsed: required fields, known node types and
//! the configuration fragments of executor and router nodes. The three
//! Draft-7 schemas are embedded at compile time.

mod error;
mod validator;

pub use error::{SchemaError, SchemaKind};
pub use validator::Validator;
