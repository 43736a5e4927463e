//! Shared domain types for the dispatchd workspace.
//!
//! - [`types`] — id and timestamp aliases used across crates.
//! - [`error`] — the domain-level [`CoreError`](error::CoreError) type.
//! - [`predicate`] — the declarative path/filter language used to match
//!   inbound event payloads.

pub mod error;
pub mod predicate;
pub mod types;

pub use error::CoreError;
pub use predicate::{Predicate, PredicateError};
