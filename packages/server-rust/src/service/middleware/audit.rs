//! Audit middleware.
//!
//! For requests marked auditable, emits one audit record naming the current
//! caller (or `Anonymous`), the action label and the argument snapshot before
//! the inner service runs. Results and errors pass through untouched.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use fintrack_core::{audited, Audited, Intercepted, InterceptionSink};
use tower::{Layer, Service};

// ---------------------------------------------------------------------------
// AuditLayer
// ---------------------------------------------------------------------------

/// Tower layer that wraps services with audit interception.
#[derive(Clone)]
pub struct AuditLayer {
    sink: Arc<dyn InterceptionSink>,
}

impl AuditLayer {
    #[must_use]
    pub fn new(sink: Arc<dyn InterceptionSink>) -> Self {
        Self { sink }
    }
}

impl<S> Layer<S> for AuditLayer {
    type Service = AuditService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        AuditService {
            inner,
            sink: Arc::clone(&self.sink),
        }
    }
}

// ---------------------------------------------------------------------------
// AuditService
// ---------------------------------------------------------------------------

/// Service wrapper that records who called which auditable action.
#[derive(Clone)]
pub struct AuditService<S> {
    inner: S,
    sink: Arc<dyn InterceptionSink>,
}

impl<S, R> Service<R> for AuditService<S>
where
    R: Intercepted,
    S: Service<R> + Send,
    S::Future: Send + 'static,
    S::Response: Send + 'static,
    S::Error: Send + 'static,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = Pin<Box<dyn Future<Output = Result<S::Response, S::Error>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, req: R) -> Self::Future {
        let Some(Audited { action }) = req.interception().audit else {
            return Box::pin(self.inner.call(req));
        };

        let arguments = req.arguments();
        let sink = Arc::clone(&self.sink);
        let fut = self.inner.call(req);
        // The identity is read when this future is first polled, on the task
        // that owns the caller's identity scope.
        Box::pin(async move { audited(&*sink, action, arguments, fut).await })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
