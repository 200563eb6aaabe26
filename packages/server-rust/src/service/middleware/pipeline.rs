//! Pipeline composition: combines all middleware layers into a single service stack.

use std::sync::Arc;

use fintrack_core::InterceptionSink;
use tower::ServiceBuilder;

use super::audit::AuditLayer;
use super::timeout::TimeoutLayer;
use super::timing::TimingLayer;
use crate::service::config::ServerConfig;
use crate::service::operation::{Operation, OperationError, OperationFuture, OperationResponse};
use crate::service::router::OperationRouter;

/// Build the operation pipeline by wrapping the `OperationRouter` with middleware layers.
///
/// Layer order (outermost to innermost):
/// 1. `TimeoutLayer` -- enforce per-operation timeouts
/// 2. `TimingLayer` -- entry and completion events with elapsed time
/// 3. `AuditLayer` -- one audit record per auditable operation
///
/// A timed-out operation is reported by the timing layer as cancelled. The
/// config is accepted so per-deployment layers can be added here without
/// touching callers.
#[must_use]
pub fn build_operation_pipeline(
    router: OperationRouter,
    _config: &ServerConfig,
    sink: Arc<dyn InterceptionSink>,
) -> impl tower::Service<
    Operation,
    Response = OperationResponse,
    Error = OperationError,
    Future = OperationFuture,
> + Send
       + 'static {
    ServiceBuilder::new()
        .layer(TimeoutLayer)
        .layer(TimingLayer::new(Arc::clone(&sink)))
        .layer(AuditLayer::new(sink))
        .service(router)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use std::task::{Context, Poll};
    use std::time::Duration;

    use fintrack_core::{
        CallerIdentity, IdentityContext, InterceptionEvent, Outcome, RecordingSink,
    };
    use tower::{Service, ServiceExt};
    use uuid::Uuid;

    use super::*;
    use crate::service::operation::{service_names, OperationContext};

    /// Stub service that records which events existed when it ran.
    struct StubService {
        sink: Arc<RecordingSink>,
        delay_ms: u64,
    }

    impl Service<Operation> for StubService {
        type Response = OperationResponse;
        type Error = OperationError;
        type Future = OperationFuture;

        fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
            Poll::Ready(Ok(()))
        }

        fn call(&mut self, op: Operation) -> Self::Future {
            let sink = Arc::clone(&self.sink);
            let delay = self.delay_ms;
            Box::pin(async move {
                tokio::time::sleep(Duration::from_millis(delay)).await;
                // Entered and Audited must already be recorded, Completed not yet.
                assert_eq!(sink.events().len(), 2);
                match op {
                    Operation::DeleteGoal { id, .. } => Ok(OperationResponse::Deleted { id }),
                    _ => Ok(OperationResponse::Empty),
                }
            })
        }
    }

    fn pipeline(
        sink: &Arc<RecordingSink>,
        delay_ms: u64,
    ) -> impl Service<
        Operation,
        Response = OperationResponse,
        Error = OperationError,
        Future = OperationFuture,
    > {
        let mut router = OperationRouter::new();
        router.register(
            service_names::GOALS,
            StubService {
                sink: Arc::clone(sink),
                delay_ms,
            },
        );
        build_operation_pipeline(router, &ServerConfig::default(), sink.clone())
    }

    fn delete_goal(id: Uuid, timeout_ms: u64) -> Operation {
        Operation::DeleteGoal {
            ctx: OperationContext::new(42, service_names::GOALS, timeout_ms),
            id,
        }
    }

    #[tokio::test]
    async fn pipeline_orders_entry_audit_call_completion() {
        let sink = Arc::new(RecordingSink::new());
        let id = Uuid::new_v4();

        let resp = IdentityContext::scope(
            Some(CallerIdentity::new("alice@example.com")),
            pipeline(&sink, 1).oneshot(delete_goal(id, 5000)),
        )
        .await
        .unwrap();
        assert!(matches!(resp, OperationResponse::Deleted { id: got } if got == id));

        let events = sink.events();
        assert_eq!(events.len(), 3);
        assert!(matches!(
            &events[0],
            InterceptionEvent::Entered { signature, .. } if signature == "goals::delete"
        ));
        assert!(matches!(
            &events[1],
            InterceptionEvent::Audited(record)
                if record.actor == "alice@example.com" && record.action == "delete_goal"
        ));
        assert!(matches!(
            &events[2],
            InterceptionEvent::Completed(trace) if trace.outcome == Outcome::Ok
        ));
    }

    #[tokio::test]
    async fn timed_out_operation_is_traced_as_cancelled() {
        let sink = Arc::new(RecordingSink::new());

        let err = pipeline(&sink, 200)
            .oneshot(delete_goal(Uuid::new_v4(), 20))
            .await
            .unwrap_err();
        assert!(matches!(err, OperationError::Timeout { timeout_ms: 20 }));

        assert_eq!(sink.audit_records().len(), 1);
        let traces = sink.traces();
        assert_eq!(traces.len(), 1);
        assert_eq!(traces[0].outcome, Outcome::Cancelled);
    }

    #[tokio::test]
    async fn unknown_service_is_still_traced() {
        let sink = Arc::new(RecordingSink::new());
        let op = Operation::ListGoals {
            ctx: OperationContext::new(1, "nonexistent", 5000),
        };

        let err = pipeline(&sink, 0).oneshot(op).await.unwrap_err();
        assert!(matches!(err, OperationError::UnknownService { .. }));
        assert!(sink.audit_records().is_empty());
        assert_eq!(sink.traces()[0].outcome, Outcome::Error);
    }
}
