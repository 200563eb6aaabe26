//! Domain services.
//!
//! Each service is a `tower::Service<Operation>` implemented on `Arc<Self>`
//! and registered with the `OperationRouter` under its service name. Every
//! service except user registration and login acts on behalf of the caller
//! found in `IdentityContext`.

use fintrack_core::{CallerIdentity, IdentityContext};

use crate::service::operation::OperationError;

// ---------------------------------------------------------------------------
// Macro for the tower plumbing shared by every domain service
// ---------------------------------------------------------------------------

/// Implement `tower::Service<Operation>` for `Arc<$name>` by delegating to
/// `$name::handle`.
macro_rules! domain_service {
    ($name:ident) => {
        impl tower::Service<crate::service::operation::Operation> for std::sync::Arc<$name> {
            type Response = crate::service::operation::OperationResponse;
            type Error = crate::service::operation::OperationError;
            type Future = crate::service::operation::OperationFuture;

            fn poll_ready(
                &mut self,
                _cx: &mut std::task::Context<'_>,
            ) -> std::task::Poll<Result<(), Self::Error>> {
                std::task::Poll::Ready(Ok(()))
            }

            fn call(&mut self, op: crate::service::operation::Operation) -> Self::Future {
                let svc = std::sync::Arc::clone(self);
                Box::pin(async move { svc.handle(op).await })
            }
        }
    };
}

pub mod budgets;
pub mod goals;
pub mod transactions;
pub mod users;

pub use budgets::BudgetService;
pub use goals::GoalService;
pub use transactions::TransactionService;
pub use users::UserService;

/// The caller of the current operation, or `Unauthenticated`.
pub(crate) fn require_identity() -> Result<CallerIdentity, OperationError> {
    IdentityContext::current().ok_or(OperationError::Unauthenticated)
}

/// Largest single amount accepted by any operation, in cents.
pub const MAX_AMOUNT_CENTS: i64 = 100_000_000_000_000;

/// Accepts amounts in `1..=MAX_AMOUNT_CENTS`.
pub(crate) fn require_positive(value: i64, field: &str) -> Result<(), OperationError> {
    if value <= 0 {
        Err(OperationError::Validation(format!(
            "{field} must be greater than zero"
        )))
    } else if value > MAX_AMOUNT_CENTS {
        Err(OperationError::Validation(format!(
            "{field} must not exceed {MAX_AMOUNT_CENTS}"
        )))
    } else {
        Ok(())
    }
}

/// Trims `value` and rejects it if nothing is left.
pub(crate) fn require_text(value: &str, field: &str) -> Result<String, OperationError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        Err(OperationError::Validation(format!("{field} must not be empty")))
    } else {
        Ok(trimmed.to_string())
    }
}
