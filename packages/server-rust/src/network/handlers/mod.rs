//! HTTP handler definitions for the Fintrack server.
//!
//! This module defines `AppState` (the shared state carried through axum
//! extractors) and re-exports all handler functions for building the router.

pub mod budgets;
pub mod error;
pub mod goals;
pub mod health;
pub mod sessions;
pub mod transactions;
pub mod users;

pub use budgets::{create_budget, delete_budget, list_budgets, update_budget};
pub use error::ApiError;
pub use goals::{contribute_to_goal, create_goal, delete_goal, list_goals};
pub use health::{health_handler, liveness_handler, readiness_handler};
pub use sessions::{login, logout};
pub use transactions::{
    create_transaction, delete_transaction, list_transactions, update_transaction,
};
pub use users::{current_user, register_user};

use std::sync::Arc;
use std::time::Instant;

use axum::http::HeaderMap;
use fintrack_core::Request;

use super::{NetworkConfig, ShutdownController};
use crate::service::{OperationDispatcher, OperationError, OperationResponse, TokenIssuer};

/// Shared application state passed to all axum handlers via `State` extraction.
///
/// Holds `Arc` references to shared resources so cloning is cheap.
#[derive(Clone)]
pub struct AppState {
    /// Classification plus operation pipeline.
    pub dispatcher: Arc<OperationDispatcher>,
    /// Session token verification for the identity middleware.
    pub tokens: Arc<TokenIssuer>,
    /// Graceful shutdown controller with health state and in-flight tracking.
    pub shutdown: Arc<ShutdownController>,
    /// Network configuration (bind address, TLS, CORS, timeouts).
    pub config: Arc<NetworkConfig>,
    /// Server process start time, used for uptime calculation.
    pub start_time: Instant,
}

impl AppState {
    /// Dispatch `request`, tagging it with the request's `X-Request-Id`.
    pub async fn dispatch(
        &self,
        request: Request,
        headers: &HeaderMap,
    ) -> Result<OperationResponse, OperationError> {
        let request_id = headers
            .get("x-request-id")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        self.dispatcher.dispatch(request, request_id).await
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use fintrack_core::RecordingSink;

    use super::*;
    use crate::app::App;
    use crate::service::ServerConfig;

    pub(crate) fn test_state_with_sink() -> (AppState, Arc<RecordingSink>) {
        let sink = Arc::new(RecordingSink::new());
        let config = ServerConfig {
            jwt_secret: "test-secret".to_string(),
            password_memory_kib: 1024,
            password_iterations: 1,
            ..ServerConfig::default()
        };
        let app = App::in_memory(config, sink.clone()).unwrap();
        let state = AppState {
            dispatcher: app.dispatcher,
            tokens: app.tokens,
            shutdown: Arc::new(ShutdownController::new()),
            config: Arc::new(NetworkConfig::default()),
            start_time: Instant::now(),
        };
        (state, sink)
    }

    pub(crate) fn test_state() -> AppState {
        test_state_with_sink().0
    }
}
