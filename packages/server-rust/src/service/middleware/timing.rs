//! Timing middleware.
//!
//! Logs entry, measures wall-clock duration and logs completion for every
//! request whose markers opt into timing. Completion is reported whether the
//! inner call succeeds, fails, is cancelled, or panics.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use fintrack_core::{timed, Intercepted, InterceptionSink};
use tower::{Layer, Service};

// ---------------------------------------------------------------------------
// TimingLayer
// ---------------------------------------------------------------------------

/// Tower layer that wraps services with timing interception.
#[derive(Clone)]
pub struct TimingLayer {
    sink: Arc<dyn InterceptionSink>,
}

impl TimingLayer {
    #[must_use]
    pub fn new(sink: Arc<dyn InterceptionSink>) -> Self {
        Self { sink }
    }
}

impl<S> Layer<S> for TimingLayer {
    type Service = TimingService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        TimingService {
            inner,
            sink: Arc::clone(&self.sink),
        }
    }
}

// ---------------------------------------------------------------------------
// TimingService
// ---------------------------------------------------------------------------

/// Service wrapper that brackets each call with entry and completion events.
#[derive(Clone)]
pub struct TimingService<S> {
    inner: S,
    sink: Arc<dyn InterceptionSink>,
}

impl<S, R> Service<R> for TimingService<S>
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
        if !req.interception().timed {
            return Box::pin(self.inner.call(req));
        }

        let signature = req.signature();
        let sink = Arc::clone(&self.sink);
        let fut = self.inner.call(req);
        Box::pin(async move { timed(&*sink, signature, fut).await })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use fintrack_core::{InterceptionEvent, Interception, Outcome, RecordingSink, Value};
    use tower::ServiceExt;

    use super::*;

    /// Minimal request type so the layer is exercised without the full
    /// operation model.
    struct Probe {
        timed: bool,
        fail: bool,
    }

    impl Intercepted for Probe {
        fn interception(&self) -> Interception {
            if self.timed {
                Interception::timed()
            } else {
                Interception::NONE
            }
        }

        fn signature(&self) -> String {
            "probe::run".to_string()
        }

        fn arguments(&self) -> Vec<Value> {
            Vec::new()
        }
    }

    /// Fails or succeeds depending on the probe, after a short delay.
    struct ProbeService;

    impl Service<Probe> for ProbeService {
        type Response = &'static str;
        type Error = &'static str;
        type Future = Pin<Box<dyn Future<Output = Result<&'static str, &'static str>> + Send>>;

        fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
            Poll::Ready(Ok(()))
        }

        fn call(&mut self, req: Probe) -> Self::Future {
            Box::pin(async move {
                tokio::time::sleep(Duration::from_millis(2)).await;
                if req.fail {
                    Err("boom")
                } else {
                    Ok("done")
                }
            })
        }
    }

    fn layered(sink: &Arc<RecordingSink>) -> TimingService<ProbeService> {
        TimingLayer::new(sink.clone()).layer(ProbeService)
    }

    #[tokio::test]
    async fn timed_request_emits_entry_and_completion() {
        let sink = Arc::new(RecordingSink::new());
        let resp = layered(&sink)
            .oneshot(Probe {
                timed: true,
                fail: false,
            })
            .await
            .unwrap();
        assert_eq!(resp, "done");

        let events = sink.events();
        assert_eq!(events.len(), 2);
        assert!(matches!(events[0], InterceptionEvent::Entered { .. }));
        let traces = sink.traces();
        assert_eq!(traces[0].signature, "probe::run");
        assert_eq!(traces[0].outcome, Outcome::Ok);
    }

    #[tokio::test]
    async fn failure_is_measured_and_propagated() {
        let sink = Arc::new(RecordingSink::new());
        let err = layered(&sink)
            .oneshot(Probe {
                timed: true,
                fail: true,
            })
            .await
            .unwrap_err();
        assert_eq!(err, "boom");

        let traces = sink.traces();
        assert_eq!(traces.len(), 1);
        assert_eq!(traces[0].outcome, Outcome::Error);
        assert!(traces[0].elapsed >= Duration::from_millis(2));
    }

    #[tokio::test]
    async fn unmarked_request_passes_through_silently() {
        let sink = Arc::new(RecordingSink::new());
        let resp = layered(&sink)
            .oneshot(Probe {
                timed: false,
                fail: false,
            })
            .await
            .unwrap();
        assert_eq!(resp, "done");
        assert!(sink.events().is_empty());
    }
}
