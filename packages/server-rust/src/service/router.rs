//! Operation routing: dispatches `Operation` to domain services by `service_name`.

use std::collections::HashMap;
use std::task::{Context, Poll};

use tower::Service;

use super::operation::{Operation, OperationError, OperationFuture, OperationResponse};

/// A boxed Tower service that handles operations for a single domain.
type BoxedService = Box<
    dyn Service<Operation, Response = OperationResponse, Error = OperationError, Future = OperationFuture>
        + Send,
>;

// ---------------------------------------------------------------------------
// OperationRouter
// ---------------------------------------------------------------------------

/// Routes `Operation` values to the correct domain service by `service_name`.
///
/// Each registered domain service is a `tower::Service<Operation>` keyed by
/// its service name (e.g., `"transactions"`, `"goals"`). Operations with an
/// unregistered `service_name` return `OperationError::UnknownService`.
pub struct OperationRouter {
    services: HashMap<&'static str, BoxedService>,
}

impl OperationRouter {
    /// Create a new empty router.
    #[must_use]
    pub fn new() -> Self {
        Self {
            services: HashMap::new(),
        }
    }

    /// Register a domain service for the given name.
    pub fn register<S>(&mut self, name: &'static str, service: S)
    where
        S: Service<Operation, Response = OperationResponse, Error = OperationError> + Send + 'static,
        S::Future: Send + 'static,
    {
        self.services.insert(name, Box::new(ServiceWrapper(service)));
    }

    /// Names of all registered services.
    pub fn service_names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.services.keys().copied()
    }
}

impl Default for OperationRouter {
    fn default() -> Self {
        Self::new()
    }
}

impl Service<Operation> for OperationRouter {
    type Response = OperationResponse;
    type Error = OperationError;
    type Future = OperationFuture;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        // All registered services must be ready. If any is not ready, return pending.
        for svc in self.services.values_mut() {
            match svc.poll_ready(cx) {
                Poll::Ready(Ok(())) => {}
                Poll::Ready(Err(e)) => return Poll::Ready(Err(e)),
                Poll::Pending => return Poll::Pending,
            }
        }
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, op: Operation) -> Self::Future {
        let service_name = op.ctx().service_name;
        match self.services.get_mut(service_name) {
            Some(svc) => svc.call(op),
            None => Box::pin(async move {
                Err(OperationError::UnknownService {
                    name: service_name.to_string(),
                })
            }),
        }
    }
}

// ---------------------------------------------------------------------------
// ServiceWrapper (type-erased adapter)
// ---------------------------------------------------------------------------

/// Wrapper to type-erase a concrete `Service<Operation>` into a `BoxedService`.
struct ServiceWrapper<S>(S);

impl<S> Service<Operation> for ServiceWrapper<S>
where
    S: Service<Operation, Response = OperationResponse, Error = OperationError> + Send,
    S::Future: Send + 'static,
{
    type Response = OperationResponse;
    type Error = OperationError;
    type Future = OperationFuture;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.0.poll_ready(cx)
    }

    fn call(&mut self, op: Operation) -> Self::Future {
        Box::pin(self.0.call(op))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use tower::ServiceExt;
    use uuid::Uuid;

    use super::*;
    use crate::service::operation::{service_names, OperationContext};

    /// Echoes the id of a delete operation back, tagged by service.
    #[derive(Clone)]
    struct EchoService;

    impl Service<Operation> for EchoService {
        type Response = OperationResponse;
        type Error = OperationError;
        type Future = OperationFuture;

        fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
            Poll::Ready(Ok(()))
        }

        fn call(&mut self, op: Operation) -> Self::Future {
            Box::pin(async move {
                match op {
                    Operation::DeleteGoal { id, .. } | Operation::DeleteBudget { id, .. } => {
                        Ok(OperationResponse::Deleted { id })
                    }
                    _ => Err(OperationError::WrongService),
                }
            })
        }
    }

    fn ctx(service_name: &'static str) -> OperationContext {
        OperationContext::new(1, service_name, 5000)
    }

    #[tokio::test]
    async fn routes_to_registered_service() {
        let mut router = OperationRouter::new();
        router.register(service_names::GOALS, EchoService);

        let id = Uuid::new_v4();
        let op = Operation::DeleteGoal {
            ctx: ctx(service_names::GOALS),
            id,
        };

        let resp = router.oneshot(op).await.unwrap();
        assert!(matches!(resp, OperationResponse::Deleted { id: got } if got == id));
    }

    #[tokio::test]
    async fn unknown_service_returns_error() {
        let mut router = OperationRouter::new();
        router.register(service_names::GOALS, EchoService);

        let op = Operation::DeleteGoal {
            ctx: ctx("nonexistent"),
            id: Uuid::new_v4(),
        };

        let err = router.oneshot(op).await.unwrap_err();
        assert!(matches!(
            err,
            OperationError::UnknownService { name } if name == "nonexistent"
        ));
    }

    #[tokio::test]
    async fn routes_to_correct_service_among_multiple() {
        let mut router = OperationRouter::new();
        router.register(service_names::GOALS, EchoService);
        router.register(service_names::BUDGETS, EchoService);

        let mut names: Vec<_> = router.service_names().collect();
        names.sort_unstable();
        assert_eq!(names, vec![service_names::BUDGETS, service_names::GOALS]);

        let id = Uuid::new_v4();
        let op = Operation::DeleteBudget {
            ctx: ctx(service_names::BUDGETS),
            id,
        };
        let resp = ServiceExt::ready(&mut router).await.unwrap().call(op).await.unwrap();
        assert!(matches!(resp, OperationResponse::Deleted { id: got } if got == id));
    }
}
