//! Schema-directed constrained JSON token generation.
//!
//! This crate is the hard core of a constrained-decoding library: given a
//! [`schema::Schema`] and a pluggable [`backend::TokenBackend`], it walks
//! the schema node by node, computes which vocabulary tokens may legally
//! extend the partial JSON document at each step, and drives the backend's
//! `sample`/`decode` primitives to produce a structurally valid document
//! within a bounded token budget.
//!
//! Everything outside this triangle -- the session façade, transport
//! adapters to specific model backends, tool-call dispatch, prompt
//! building, and a `Generable`-style reflection layer that turns user types
//! into schemas -- is deliberately out of scope for this crate.

pub mod backend;
pub mod error;
pub mod generator;
pub mod mask;
pub mod schema;

#[cfg(any(test, feature = "test-util"))]
pub mod testing;

pub use backend::{TokenBackend, TokenId};
pub use error::{GeneratorError, Result};
pub use generator::Generator;
pub use mask::VocabMasks;
pub use schema::loader::{from_json_schema, LoaderError};
pub use schema::{Node, Schema};
