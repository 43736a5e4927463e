//! Event model and predicate routing for dispatchd.
//!
//! - [`IngestEvent`] — the immutable domain view of a received
//!   notification envelope.
//! - [`EventRouter`] — ordered (predicate, handler) pairs; every matching
//!   handler fires, in registration order.

pub mod event;
pub mod router;

pub use event::{EnvelopeError, FileRef, IngestEvent, KeyValue};
pub use router::{EventHandler, EventRouter, HandlerError, RouteOutcome};
