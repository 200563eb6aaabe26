//! Entry point from the outer surfaces into the operation pipeline.

use tokio::sync::Mutex;
use tower::util::BoxService;
use tower::{Service, ServiceExt};
use tracing::Instrument;

use fintrack_core::{IdentityContext, Request};

use super::classify::OperationService;
use super::operation::{Operation, OperationError, OperationResponse};

type BoxedPipeline = BoxService<Operation, OperationResponse, OperationError>;

/// Classifies requests and drives them through the middleware pipeline.
///
/// Shared by all HTTP handlers. The pipeline lock is held only while an
/// operation is handed to the pipeline, never while it runs.
pub struct OperationDispatcher {
    classifier: OperationService,
    pipeline: Mutex<BoxedPipeline>,
}

impl OperationDispatcher {
    pub fn new<S>(classifier: OperationService, pipeline: S) -> Self
    where
        S: Service<Operation, Response = OperationResponse, Error = OperationError>
            + Send
            + 'static,
        S::Future: Send + 'static,
    {
        Self {
            classifier,
            pipeline: Mutex::new(BoxService::new(pipeline)),
        }
    }

    /// Run one request on behalf of the caller in the current identity scope.
    ///
    /// Outside any scope the operation gets a fresh scope seeded with the
    /// current identity, so nothing it sets can outlive the call.
    pub async fn dispatch(
        &self,
        request: Request,
        request_id: Option<String>,
    ) -> Result<OperationResponse, OperationError> {
        let op = self.classifier.classify(request, request_id);
        let span = tracing::debug_span!(
            "operation",
            call_id = op.ctx().call_id,
            service = op.ctx().service_name,
            method = op.method(),
            request_id = op.ctx().request_id.as_deref().unwrap_or("-"),
        );

        let fut = {
            let mut pipeline = self.pipeline.lock().await;
            ServiceExt::ready(&mut *pipeline).await?.call(op)
        };

        if IdentityContext::is_scoped() {
            fut.instrument(span).await
        } else {
            IdentityContext::scope(IdentityContext::current(), fut)
                .instrument(span)
                .await
        }
    }
}
