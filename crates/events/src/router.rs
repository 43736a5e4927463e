//! Predicate-to-handler routing.
//!
//! [`EventRouter`] keeps an ordered list of (predicate, handler) bindings.
//! For each inbound event it evaluates every predicate against the raw
//! envelope payload and invokes **all** matching handlers, in registration
//! order. The first handler error aborts the pass and propagates to the
//! caller — the task runner records it; no retry happens here.

use async_trait::async_trait;
use dispatchd_core::predicate::{Predicate, PredicateError};
use dispatchd_core::types::DbId;

use crate::event::IngestEvent;

/// Error type returned by event handlers.
///
/// Handlers are heterogeneous, so errors are boxed at this seam and the
/// text ends up on the task row.
pub type HandlerError = Box<dyn std::error::Error + Send + Sync>;

/// Code invoked when an event matches a registered predicate.
#[async_trait]
pub trait EventHandler: Send + Sync {
    /// Stable handler name, used in logs and error messages.
    fn name(&self) -> &str;

    /// Process a matched event.
    ///
    /// Returns the upstream upload job id when the handler produced a new
    /// upload, `None` otherwise.
    async fn handle(&self, event: &IngestEvent) -> Result<Option<DbId>, HandlerError>;
}

/// One registered (predicate, handler) pair.
struct Binding {
    predicate: Predicate,
    handler: Box<dyn EventHandler>,
}

/// Result of routing one event.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct RouteOutcome {
    /// Number of handlers that matched and ran to completion.
    pub handlers_run: usize,
    /// Upload job id from the last handler that produced one.
    pub job_id: Option<DbId>,
}

/// Ordered predicate router.
#[derive(Default)]
pub struct EventRouter {
    bindings: Vec<Binding>,
}

impl EventRouter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler under a predicate expression.
    ///
    /// The predicate is compiled here, so a malformed expression is
    /// rejected at registration time, never during matching.
    pub fn register(
        &mut self,
        predicate_src: &str,
        handler: Box<dyn EventHandler>,
    ) -> Result<(), PredicateError> {
        let predicate = Predicate::compile(predicate_src)?;
        tracing::info!(
            handler = handler.name(),
            predicate = predicate_src,
            "Registered event handler"
        );
        self.bindings.push(Binding { predicate, handler });
        Ok(())
    }

    /// Number of registered bindings.
    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    /// Route one event through every matching handler, in registration
    /// order. The first handler error aborts the pass and propagates.
    pub async fn route(&self, event: &IngestEvent) -> Result<RouteOutcome, HandlerError> {
        let mut outcome = RouteOutcome::default();

        for binding in &self.bindings {
            if !binding.predicate.matches(&event.payload) {
                continue;
            }

            tracing::debug!(
                handler = binding.handler.name(),
                event_id = event.event_id.as_deref().unwrap_or("<none>"),
                "Predicate matched, invoking handler"
            );

            match binding.handler.handle(event).await {
                Ok(job_id) => {
                    outcome.handlers_run += 1;
                    if job_id.is_some() {
                        outcome.job_id = job_id;
                    }
                }
                Err(e) => {
                    tracing::error!(
                        handler = binding.handler.name(),
                        error = %e,
                        "Handler failed"
                    );
                    return Err(format!("handler {}: {e}", binding.handler.name()).into());
                }
            }
        }

        Ok(outcome)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    /// Test handler that counts invocations and returns a fixed job id.
    struct Recorder {
        name: &'static str,
        calls: Arc<AtomicUsize>,
        job_id: Option<DbId>,
        fail: bool,
    }

    impl Recorder {
        fn boxed(
            name: &'static str,
            calls: Arc<AtomicUsize>,
            job_id: Option<DbId>,
        ) -> Box<dyn EventHandler> {
            Box::new(Self {
                name,
                calls,
                job_id,
                fail: false,
            })
        }
    }

    #[async_trait]
    impl EventHandler for Recorder {
        fn name(&self) -> &str {
            self.name
        }

        async fn handle(&self, _event: &IngestEvent) -> Result<Option<DbId>, HandlerError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err("simulated handler failure".into());
            }
            Ok(self.job_id)
        }
    }

    const PRED: &str = "$.data[?(@.destinationTable == \"TransactionKeyValue\" \
         && @.key == \"uppercase_text\" && @.value == \"false\")]";

    fn event_with_flag(value: &str) -> IngestEvent {
        IngestEvent::from_envelope(json!({
            "eventID": "e-1",
            "data": [
                {"destinationTable": "TransactionKeyValue", "key": "uppercase_text", "value": value}
            ]
        }))
        .unwrap()
    }

    #[tokio::test]
    async fn matching_event_fires_handler_exactly_once() {
        let calls = Arc::new(AtomicUsize::new(0));
        let mut router = EventRouter::new();
        router
            .register(PRED, Recorder::boxed("rec", Arc::clone(&calls), Some(7)))
            .unwrap();

        let outcome = router.route(&event_with_flag("false")).await.unwrap();
        assert_eq!(outcome.handlers_run, 1);
        assert_eq!(outcome.job_id, Some(7));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn suppression_flag_does_not_fire_handler() {
        let calls = Arc::new(AtomicUsize::new(0));
        let mut router = EventRouter::new();
        router
            .register(PRED, Recorder::boxed("rec", Arc::clone(&calls), None))
            .unwrap();

        let outcome = router.route(&event_with_flag("true")).await.unwrap();
        assert_eq!(outcome.handlers_run, 0);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn all_matching_handlers_fire_in_registration_order() {
        let first = Arc::new(AtomicUsize::new(0));
        let second = Arc::new(AtomicUsize::new(0));

        let mut router = EventRouter::new();
        router
            .register(PRED, Recorder::boxed("first", Arc::clone(&first), Some(1)))
            .unwrap();
        // Matches anything with a data array.
        router
            .register("$.data", Recorder::boxed("second", Arc::clone(&second), Some(2)))
            .unwrap();

        let outcome = router.route(&event_with_flag("false")).await.unwrap();
        assert_eq!(outcome.handlers_run, 2);
        // Last handler to produce a job id wins.
        assert_eq!(outcome.job_id, Some(2));
        assert_eq!(first.load(Ordering::SeqCst), 1);
        assert_eq!(second.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn handler_error_aborts_pass_and_propagates() {
        let first = Arc::new(AtomicUsize::new(0));
        let second = Arc::new(AtomicUsize::new(0));

        let mut router = EventRouter::new();
        router
            .register(
                "$.data",
                Box::new(Recorder {
                    name: "failing",
                    calls: Arc::clone(&first),
                    job_id: None,
                    fail: true,
                }),
            )
            .unwrap();
        router
            .register("$.data", Recorder::boxed("after", Arc::clone(&second), None))
            .unwrap();

        let err = router.route(&event_with_flag("false")).await.unwrap_err();
        assert!(err.to_string().contains("failing"));
        assert_eq!(first.load(Ordering::SeqCst), 1);
        // The later binding never ran.
        assert_eq!(second.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn malformed_predicate_rejected_at_registration() {
        let calls = Arc::new(AtomicUsize::new(0));
        let mut router = EventRouter::new();
        let result = router.register("data[*]", Recorder::boxed("rec", calls, None));
        assert_matches!(result, Err(PredicateError::MissingRoot));
        assert!(router.is_empty());
    }
}
