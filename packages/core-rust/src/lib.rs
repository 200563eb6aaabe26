//! Fintrack Core: caller identity context, interception records and functions,
//! and finance domain types.

pub mod audit;
pub mod context;
pub mod finance;
pub mod intercept;
pub mod messages;
pub mod types;

pub use audit::{
    AuditRecord, FanoutSink, InterceptionEvent, InterceptionSink, InvocationTrace, Outcome,
    RecordingSink, TracingSink, ANONYMOUS_ACTOR,
};
pub use context::{IdentityContext, IdentityGuard};
pub use finance::{
    Budget, BudgetPeriod, BudgetStatus, Goal, Session, Transaction, TransactionKind, UserProfile,
};
pub use intercept::{audited, timed, Audited, Intercepted, Interception};
pub use messages::Request;
pub use types::{CallerIdentity, Value};
