//! HTTP service for dispatchd.
//!
//! Exposes the `/receive` endpoint the notification service pushes event
//! envelopes to, a task status lookup, and a health check.

pub mod config;
pub mod error;
pub mod routes;
pub mod state;
