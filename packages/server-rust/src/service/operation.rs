//! Operation types dispatched through the pipeline.

use std::collections::BTreeMap;
use std::future::Future;
use std::pin::Pin;

use fintrack_core::messages::{
    BudgetQuery, BudgetUpdate, Contribution, Credentials, NewBudget, NewGoal, NewTransaction,
    RegisterUser, TransactionFilter, TransactionPatch,
};
use fintrack_core::{
    Budget, BudgetStatus, Goal, Intercepted, Interception, Session, Transaction, UserProfile,
    Value,
};
use uuid::Uuid;

/// Service names used for routing.
pub mod service_names {
    pub const USERS: &str = "users";
    pub const TRANSACTIONS: &str = "transactions";
    pub const BUDGETS: &str = "budgets";
    pub const GOALS: &str = "goals";
}

/// Boxed future returned by every service in the pipeline.
pub type OperationFuture =
    Pin<Box<dyn Future<Output = Result<OperationResponse, OperationError>> + Send>>;

/// Context carried with every operation through the pipeline.
#[derive(Debug, Clone)]
pub struct OperationContext {
    pub call_id: u64,
    pub service_name: &'static str,
    /// `X-Request-Id` of the HTTP request that produced this operation.
    pub request_id: Option<String>,
    pub call_timeout_ms: u64,
}

impl OperationContext {
    #[must_use]
    pub fn new(call_id: u64, service_name: &'static str, call_timeout_ms: u64) -> Self {
        Self {
            call_id,
            service_name,
            request_id: None,
            call_timeout_ms,
        }
    }
}

/// Typed operation variants dispatched through the pipeline.
#[derive(Debug)]
pub enum Operation {
    // users
    RegisterUser { ctx: OperationContext, payload: RegisterUser },
    Login { ctx: OperationContext, payload: Credentials },
    Logout { ctx: OperationContext, token_id: String },
    CurrentUser { ctx: OperationContext },

    // transactions
    CreateTransaction { ctx: OperationContext, payload: NewTransaction },
    UpdateTransaction { ctx: OperationContext, id: Uuid, patch: TransactionPatch },
    ListTransactions { ctx: OperationContext, filter: TransactionFilter },
    DeleteTransaction { ctx: OperationContext, id: Uuid },

    // budgets
    CreateBudget { ctx: OperationContext, payload: NewBudget },
    UpdateBudget { ctx: OperationContext, id: Uuid, update: BudgetUpdate },
    ListBudgets { ctx: OperationContext, query: BudgetQuery },
    DeleteBudget { ctx: OperationContext, id: Uuid },

    // goals
    CreateGoal { ctx: OperationContext, payload: NewGoal },
    ContributeToGoal { ctx: OperationContext, id: Uuid, contribution: Contribution },
    ListGoals { ctx: OperationContext },
    DeleteGoal { ctx: OperationContext, id: Uuid },
}

impl Operation {
    #[must_use]
    pub fn ctx(&self) -> &OperationContext {
        match self {
            Operation::RegisterUser { ctx, .. }
            | Operation::Login { ctx, .. }
            | Operation::Logout { ctx, .. }
            | Operation::CurrentUser { ctx }
            | Operation::CreateTransaction { ctx, .. }
            | Operation::UpdateTransaction { ctx, .. }
            | Operation::ListTransactions { ctx, .. }
            | Operation::DeleteTransaction { ctx, .. }
            | Operation::CreateBudget { ctx, .. }
            | Operation::UpdateBudget { ctx, .. }
            | Operation::ListBudgets { ctx, .. }
            | Operation::DeleteBudget { ctx, .. }
            | Operation::CreateGoal { ctx, .. }
            | Operation::ContributeToGoal { ctx, .. }
            | Operation::ListGoals { ctx }
            | Operation::DeleteGoal { ctx, .. } => ctx,
        }
    }

    /// Method name within the owning service.
    #[must_use]
    pub fn method(&self) -> &'static str {
        match self {
            Operation::RegisterUser { .. } => "register",
            Operation::Login { .. } => "login",
            Operation::Logout { .. } => "logout",
            Operation::CurrentUser { .. } => "current",
            Operation::CreateTransaction { .. }
            | Operation::CreateBudget { .. }
            | Operation::CreateGoal { .. } => "create",
            Operation::UpdateTransaction { .. } | Operation::UpdateBudget { .. } => "update",
            Operation::ListTransactions { .. }
            | Operation::ListBudgets { .. }
            | Operation::ListGoals { .. } => "list",
            Operation::DeleteTransaction { .. }
            | Operation::DeleteBudget { .. }
            | Operation::DeleteGoal { .. } => "delete",
            Operation::ContributeToGoal { .. } => "contribute",
        }
    }
}

impl Intercepted for Operation {
    fn interception(&self) -> Interception {
        let timed = Interception::timed();
        match self {
            Operation::RegisterUser { .. } => timed.audited("register_user"),
            Operation::Login { .. } => timed.audited("login"),
            Operation::Logout { .. } => timed.audited("logout"),
            Operation::CreateTransaction { .. } => timed.audited("create_transaction"),
            Operation::UpdateTransaction { .. } => timed.audited("update_transaction"),
            Operation::DeleteTransaction { .. } => timed.audited("delete_transaction"),
            Operation::CreateBudget { .. } => timed.audited("create_budget"),
            Operation::UpdateBudget { .. } => timed.audited("update_budget"),
            Operation::DeleteBudget { .. } => timed.audited("delete_budget"),
            Operation::CreateGoal { .. } => timed.audited("create_goal"),
            Operation::ContributeToGoal { .. } => timed.audited("contribute_goal"),
            Operation::DeleteGoal { .. } => timed.audited("delete_goal"),
            Operation::CurrentUser { .. }
            | Operation::ListTransactions { .. }
            | Operation::ListBudgets { .. }
            | Operation::ListGoals { .. } => timed,
        }
    }

    fn signature(&self) -> String {
        format!("{}::{}", self.ctx().service_name, self.method())
    }

    fn arguments(&self) -> Vec<Value> {
        match self {
            Operation::RegisterUser { payload, .. } => vec![
                payload.email.clone().into(),
                payload.display_name.clone().into(),
            ],
            Operation::Login { payload, .. } => vec![payload.email.clone().into()],
            Operation::Logout { token_id, .. } => vec![token_id.clone().into()],
            Operation::CreateTransaction { payload, .. } => vec![
                payload.amount_cents.into(),
                payload.category.clone().into(),
                payload.kind.as_str().into(),
                payload.description.clone().into(),
                payload.occurred_on.into(),
            ],
            Operation::UpdateTransaction { id, patch, .. } => {
                vec![(*id).into(), patch_snapshot(patch)]
            }
            Operation::ListTransactions { filter, .. } => vec![
                filter.category.clone().into(),
                filter.from.into(),
                filter.to.into(),
            ],
            Operation::CreateBudget { payload, .. } => vec![
                payload.category.clone().into(),
                payload.limit_cents.into(),
                payload.period.as_str().into(),
            ],
            Operation::UpdateBudget { id, update, .. } => {
                vec![(*id).into(), update.limit_cents.into()]
            }
            Operation::ListBudgets { query, .. } => vec![query.as_of.into()],
            Operation::CreateGoal { payload, .. } => vec![
                payload.name.clone().into(),
                payload.target_cents.into(),
                payload.deadline.into(),
            ],
            Operation::ContributeToGoal {
                id, contribution, ..
            } => vec![(*id).into(), contribution.amount_cents.into()],
            Operation::DeleteTransaction { id, .. }
            | Operation::DeleteBudget { id, .. }
            | Operation::DeleteGoal { id, .. } => vec![(*id).into()],
            Operation::CurrentUser { .. } | Operation::ListGoals { .. } => Vec::new(),
        }
    }
}

/// The fields a patch actually changes, keyed by field name.
fn patch_snapshot(patch: &TransactionPatch) -> Value {
    let mut changes = BTreeMap::new();
    if let Some(amount_cents) = patch.amount_cents {
        changes.insert("amount_cents".to_string(), amount_cents.into());
    }
    if let Some(kind) = patch.kind {
        changes.insert("kind".to_string(), kind.as_str().into());
    }
    if let Some(category) = &patch.category {
        changes.insert("category".to_string(), category.clone().into());
    }
    if let Some(description) = &patch.description {
        changes.insert("description".to_string(), description.clone().into());
    }
    if let Some(occurred_on) = patch.occurred_on {
        changes.insert("occurred_on".to_string(), occurred_on.into());
    }
    Value::Map(changes)
}

/// Successful response from an operation handler.
#[derive(Debug)]
pub enum OperationResponse {
    User(UserProfile),
    Session(Session),
    Transaction(Transaction),
    Transactions(Vec<Transaction>),
    Budget(Budget),
    Budgets(Vec<BudgetStatus>),
    Goal(Goal),
    Goals(Vec<Goal>),
    Deleted { id: Uuid },
    Empty,
}

/// Errors returned by operation handlers.
#[derive(Debug, thiserror::Error)]
pub enum OperationError {
    #[error("unknown service: {name}")]
    UnknownService { name: String },
    #[error("operation timed out after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },
    #[error("authentication required")]
    Unauthenticated,
    #[error("invalid email or password")]
    InvalidCredentials,
    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: String },
    #[error("invalid request: {0}")]
    Validation(String),
    #[error("conflict: {0}")]
    Conflict(String),
    #[error("wrong service for operation")]
    WrongService,
    #[error("internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl OperationError {
    pub(crate) fn not_found(entity: &'static str, id: Uuid) -> Self {
        OperationError::NotFound {
            entity,
            id: id.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use fintrack_core::TransactionKind;

    use super::*;

    fn ctx(service_name: &'static str) -> OperationContext {
        OperationContext::new(7, service_name, 5000)
    }

    fn create_transaction() -> Operation {
        Operation::CreateTransaction {
            ctx: ctx(service_names::TRANSACTIONS),
            payload: NewTransaction {
                amount_cents: 10_000,
                kind: TransactionKind::Expense,
                category: "food".to_string(),
                description: "groceries".to_string(),
                occurred_on: NaiveDate::from_ymd_opt(2024, 3, 14).unwrap(),
            },
        }
    }

    #[test]
    fn signature_combines_service_and_method() {
        assert_eq!(create_transaction().signature(), "transactions::create");
        let op = Operation::ListGoals {
            ctx: ctx(service_names::GOALS),
        };
        assert_eq!(op.signature(), "goals::list");
    }

    #[test]
    fn writes_are_audited_and_reads_are_only_timed() {
        let write = create_transaction().interception();
        assert!(write.timed);
        assert_eq!(write.audit.map(|a| a.action), Some("create_transaction"));

        let read = Operation::ListTransactions {
            ctx: ctx(service_names::TRANSACTIONS),
            filter: TransactionFilter::default(),
        }
        .interception();
        assert!(read.timed);
        assert!(read.audit.is_none());
    }

    #[test]
    fn arguments_snapshot_payload_fields() {
        let args = create_transaction().arguments();
        assert_eq!(args[0], Value::Int(10_000));
        assert_eq!(args[1], Value::from("food"));
        assert_eq!(args[2], Value::from("expense"));
        assert_eq!(args[4], Value::from("2024-03-14"));
    }

    #[test]
    fn update_arguments_list_only_changed_fields() {
        let id = Uuid::new_v4();
        let op = Operation::UpdateTransaction {
            ctx: ctx(service_names::TRANSACTIONS),
            id,
            patch: TransactionPatch {
                amount_cents: Some(2_500),
                category: Some("dining".to_string()),
                ..TransactionPatch::default()
            },
        };
        let args = op.arguments();
        assert_eq!(args[0], Value::from(id));
        let Value::Map(changes) = &args[1] else {
            panic!("expected a map of changes, got {:?}", args[1]);
        };
        assert_eq!(changes.len(), 2);
        assert_eq!(changes["amount_cents"], Value::Int(2_500));
        assert_eq!(changes["category"], Value::from("dining"));
        assert_eq!(
            args[1].to_string(),
            r#"{"amount_cents":2500,"category":"dining"}"#
        );
    }

    #[test]
    fn login_arguments_leave_out_password() {
        let op = Operation::Login {
            ctx: ctx(service_names::USERS),
            payload: Credentials {
                email: "alice@example.com".to_string(),
                password: "correct horse battery".to_string(),
            },
        };
        let args = op.arguments();
        assert_eq!(args, vec![Value::from("alice@example.com")]);
    }
}
