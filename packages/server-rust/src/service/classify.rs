//! Request classification: converts `Request` payloads into typed `Operation` variants.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use fintrack_core::Request;

use super::config::ServerConfig;
use super::operation::{service_names, Operation, OperationContext};

// ---------------------------------------------------------------------------
// OperationService
// ---------------------------------------------------------------------------

/// Classifies incoming `Request` values into typed `Operation` variants.
///
/// Each call gets a unique call ID and the configured default timeout.
pub struct OperationService {
    config: Arc<ServerConfig>,
    call_id_counter: AtomicU64,
}

impl OperationService {
    /// Create a new `OperationService`.
    #[must_use]
    pub fn new(config: Arc<ServerConfig>) -> Self {
        Self {
            config,
            call_id_counter: AtomicU64::new(1),
        }
    }

    /// Generate a unique call ID for each operation.
    fn next_call_id(&self) -> u64 {
        self.call_id_counter.fetch_add(1, Ordering::Relaxed)
    }

    fn make_ctx(&self, service_name: &'static str, request_id: Option<String>) -> OperationContext {
        let mut ctx = OperationContext::new(
            self.next_call_id(),
            service_name,
            self.config.default_operation_timeout_ms,
        );
        ctx.request_id = request_id;
        ctx
    }

    /// Classify a `Request` into an `Operation` routed to its owning service.
    pub fn classify(&self, request: Request, request_id: Option<String>) -> Operation {
        match request {
            // ----- users -----
            Request::RegisterUser(payload) => Operation::RegisterUser {
                ctx: self.make_ctx(service_names::USERS, request_id),
                payload,
            },
            Request::Login(payload) => Operation::Login {
                ctx: self.make_ctx(service_names::USERS, request_id),
                payload,
            },
            Request::Logout { token_id } => Operation::Logout {
                ctx: self.make_ctx(service_names::USERS, request_id),
                token_id,
            },
            Request::CurrentUser => Operation::CurrentUser {
                ctx: self.make_ctx(service_names::USERS, request_id),
            },

            // ----- transactions -----
            Request::CreateTransaction(payload) => Operation::CreateTransaction {
                ctx: self.make_ctx(service_names::TRANSACTIONS, request_id),
                payload,
            },
            Request::UpdateTransaction { id, patch } => Operation::UpdateTransaction {
                ctx: self.make_ctx(service_names::TRANSACTIONS, request_id),
                id,
                patch,
            },
            Request::ListTransactions(filter) => Operation::ListTransactions {
                ctx: self.make_ctx(service_names::TRANSACTIONS, request_id),
                filter,
            },
            Request::DeleteTransaction { id } => Operation::DeleteTransaction {
                ctx: self.make_ctx(service_names::TRANSACTIONS, request_id),
                id,
            },

            // ----- budgets -----
            Request::CreateBudget(payload) => Operation::CreateBudget {
                ctx: self.make_ctx(service_names::BUDGETS, request_id),
                payload,
            },
            Request::UpdateBudget { id, update } => Operation::UpdateBudget {
                ctx: self.make_ctx(service_names::BUDGETS, request_id),
                id,
                update,
            },
            Request::ListBudgets(query) => Operation::ListBudgets {
                ctx: self.make_ctx(service_names::BUDGETS, request_id),
                query,
            },
            Request::DeleteBudget { id } => Operation::DeleteBudget {
                ctx: self.make_ctx(service_names::BUDGETS, request_id),
                id,
            },

            // ----- goals -----
            Request::CreateGoal(payload) => Operation::CreateGoal {
                ctx: self.make_ctx(service_names::GOALS, request_id),
                payload,
            },
            Request::ContributeToGoal { id, contribution } => Operation::ContributeToGoal {
                ctx: self.make_ctx(service_names::GOALS, request_id),
                id,
                contribution,
            },
            Request::ListGoals => Operation::ListGoals {
                ctx: self.make_ctx(service_names::GOALS, request_id),
            },
            Request::DeleteGoal { id } => Operation::DeleteGoal {
                ctx: self.make_ctx(service_names::GOALS, request_id),
                id,
            },
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
