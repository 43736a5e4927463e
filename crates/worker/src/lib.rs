//! Background task worker for dispatchd.
//!
//! - [`runner`] — the polling loop that claims queued tasks and routes
//!   their events through the registered handlers.
//! - [`uppercase`] — the download → uppercase → upload round-trip
//!   handler.

pub mod runner;
pub mod uppercase;

pub use runner::TaskRunner;
pub use uppercase::{UppercaseHandler, UPPERCASE_PREDICATE};

#[cfg(test)]
pub(crate) mod test_support;
