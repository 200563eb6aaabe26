//! Operation routing and execution framework.
//!
//! This module implements the service-oriented operation pipeline:
//!
//! 1. **Classification** (`classify`): `Request` -> `Operation`
//! 2. **Middleware** (`middleware`): Tower layers (timeout, timing, audit)
//! 3. **Routing** (`router`): Dispatch to domain services by `service_name`
//! 4. **Domain services** (`domain`): users, transactions, budgets, goals
//! 5. **Dispatch** (`dispatcher`): Classification plus pipeline, shared by handlers

pub mod classify;
pub mod config;
pub mod dispatcher;
pub mod domain;
pub mod middleware;
pub mod operation;
pub mod password;
pub mod router;
pub mod tokens;

// Re-export key types for convenient access.
pub use classify::OperationService;
pub use config::ServerConfig;
pub use dispatcher::OperationDispatcher;
pub use operation::{
    service_names, Operation, OperationContext, OperationError, OperationResponse,
};
pub use router::OperationRouter;
pub use tokens::{Claims, TokenError, TokenIssuer};
