//! Wiring of storage, domain services and the operation pipeline.

use std::sync::Arc;

use fintrack_core::{Budget, Goal, InterceptionSink, Transaction};
use rand::distr::Alphanumeric;
use rand::Rng;

use crate::service::domain::{BudgetService, GoalService, TransactionService, UserService};
use crate::service::middleware::build_operation_pipeline;
use crate::service::password::PasswordHashing;
use crate::service::{
    service_names, OperationDispatcher, OperationRouter, OperationService, ServerConfig,
    TokenIssuer,
};
use crate::storage::{MemoryRepository, MemoryUserDirectory, TokenRevocations};
use crate::traits::{Repository, UserDirectory};

/// Fully assembled application core, shared by the HTTP layer.
pub struct App {
    pub config: Arc<ServerConfig>,
    pub dispatcher: Arc<OperationDispatcher>,
    pub tokens: Arc<TokenIssuer>,
}

impl App {
    /// Build the application on in-memory storage.
    ///
    /// An empty `jwt_secret` is replaced by a random per-process secret, so
    /// tokens do not survive a restart.
    pub fn in_memory(
        mut config: ServerConfig,
        sink: Arc<dyn InterceptionSink>,
    ) -> anyhow::Result<Self> {
        if config.jwt_secret.is_empty() {
            tracing::warn!("no JWT secret configured; generating an ephemeral one");
            config.jwt_secret = ephemeral_secret();
        }

        let transactions: Arc<dyn Repository<Transaction>> =
            Arc::new(MemoryRepository::<Transaction>::new());
        let budgets: Arc<dyn Repository<Budget>> =
            Arc::new(MemoryRepository::<Budget>::new());
        let goals: Arc<dyn Repository<Goal>> =
            Arc::new(MemoryRepository::<Goal>::new());
        let directory: Arc<dyn UserDirectory> = Arc::new(MemoryUserDirectory::new());

        Self::assemble(config, sink, directory, transactions, budgets, goals)
    }

    /// Build the application on the given storage backends.
    pub fn assemble(
        config: ServerConfig,
        sink: Arc<dyn InterceptionSink>,
        directory: Arc<dyn UserDirectory>,
        transactions: Arc<dyn Repository<Transaction>>,
        budgets: Arc<dyn Repository<Budget>>,
        goals: Arc<dyn Repository<Goal>>,
    ) -> anyhow::Result<Self> {
        let config = Arc::new(config);
        let tokens = Arc::new(TokenIssuer::new(
            &config.jwt_secret,
            config.token_ttl_secs,
            Arc::new(TokenRevocations::new()),
        ));
        let hashing = PasswordHashing::from_config(&config)?;

        let mut router = OperationRouter::new();
        router.register(
            service_names::USERS,
            Arc::new(UserService::new(
                directory,
                Arc::clone(&tokens),
                hashing,
                config.min_password_len,
            )),
        );
        router.register(
            service_names::TRANSACTIONS,
            Arc::new(TransactionService::new(Arc::clone(&transactions))),
        );
        router.register(
            service_names::BUDGETS,
            Arc::new(BudgetService::new(budgets, transactions)),
        );
        router.register(service_names::GOALS, Arc::new(GoalService::new(goals)));

        let pipeline = build_operation_pipeline(router, &config, sink);
        let dispatcher = Arc::new(OperationDispatcher::new(
            OperationService::new(Arc::clone(&config)),
            pipeline,
        ));

        Ok(Self {
            config,
            dispatcher,
            tokens,
        })
    }
}

/// 64 alphanumeric characters (about 380 bits) from the thread-local CSPRNG.
fn ephemeral_secret() -> String {
    rand::rng()
        .sample_iter(&Alphanumeric)
        .take(64)
        .map(char::from)
        .collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use fintrack_core::messages::{Credentials, NewTransaction, RegisterUser};
    use fintrack_core::{
        CallerIdentity, IdentityContext, InterceptionEvent, Outcome, RecordingSink, Request,
        TransactionKind,
    };

    use super::*;
    use crate::service::{OperationError, OperationResponse};

    fn test_app(sink: &Arc<RecordingSink>) -> App {
        let config = ServerConfig {
            jwt_secret: "test-secret".to_string(),
            password_memory_kib: 1024,
            password_iterations: 1,
            ..ServerConfig::default()
        };
        App::in_memory(config, sink.clone()).unwrap()
    }

    fn groceries() -> Request {
        Request::CreateTransaction(NewTransaction {
            amount_cents: 10_000,
            kind: TransactionKind::Expense,
            category: "food".to_string(),
            description: "groceries".to_string(),
            occurred_on: NaiveDate::from_ymd_opt(2024, 3, 14).unwrap(),
        })
    }

    #[test]
    fn ephemeral_secrets_are_long_and_distinct() {
        let first = ephemeral_secret();
        let second = ephemeral_secret();
        assert_eq!(first.len(), 64);
        assert!(first.chars().all(|c| c.is_ascii_alphanumeric()));
        assert_ne!(first, second);
    }

    #[tokio::test]
    async fn empty_secret_still_issues_verifiable_tokens() {
        let config = ServerConfig {
            password_memory_kib: 1024,
            password_iterations: 1,
            ..ServerConfig::default()
        };
        let app = App::in_memory(config, Arc::new(RecordingSink::new())).unwrap();
        let session = app.tokens.issue("alice@example.com").unwrap();
        assert_eq!(app.tokens.verify(&session.token).unwrap().sub, "alice@example.com");
    }

    #[tokio::test]
    async fn anonymous_write_is_audited_then_rejected() {
        let sink = Arc::new(RecordingSink::new());
        let app = test_app(&sink);

        let err = IdentityContext::scope(None, app.dispatcher.dispatch(groceries(), None))
            .await
            .unwrap_err();
        assert!(matches!(err, OperationError::Unauthenticated));

        let records = sink.audit_records();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].actor, "Anonymous");
        assert_eq!(records[0].action, "create_transaction");
        assert_eq!(sink.traces()[0].outcome, Outcome::Error);
    }

    #[tokio::test]
    async fn authenticated_write_records_caller_and_timing() {
        let sink = Arc::new(RecordingSink::new());
        let app = test_app(&sink);

        let resp = IdentityContext::scope(
            Some(CallerIdentity::new("alice@example.com")),
            app.dispatcher.dispatch(groceries(), Some("req-1".to_string())),
        )
        .await
        .unwrap();
        assert!(matches!(resp, OperationResponse::Transaction(tx) if tx.owner == "alice@example.com"));

        let events = sink.events();
        assert_eq!(events.len(), 3);
        assert!(matches!(
            &events[1],
            InterceptionEvent::Audited(r) if r.actor == "alice@example.com"
        ));
        let trace = &sink.traces()[0];
        assert_eq!(trace.signature, "transactions::create");
        assert_eq!(trace.outcome, Outcome::Ok);
    }

    #[tokio::test]
    async fn login_identity_does_not_leak_past_the_dispatch() {
        let sink = Arc::new(RecordingSink::new());
        let app = test_app(&sink);

        app.dispatcher
            .dispatch(
                Request::RegisterUser(RegisterUser {
                    email: "alice@example.com".to_string(),
                    password: "correct horse".to_string(),
                    display_name: Some("Alice".to_string()),
                }),
                None,
            )
            .await
            .unwrap();
        let resp = app
            .dispatcher
            .dispatch(
                Request::Login(Credentials {
                    email: "alice@example.com".to_string(),
                    password: "correct horse".to_string(),
                }),
                None,
            )
            .await
            .unwrap();
        assert!(matches!(resp, OperationResponse::Session(_)));

        // Dispatched outside any scope: login acted on a private scope.
        assert!(IdentityContext::current().is_none());
        let err = app
            .dispatcher
            .dispatch(Request::CurrentUser, None)
            .await
            .unwrap_err();
        assert!(matches!(err, OperationError::Unauthenticated));

        let actions: Vec<_> = sink.audit_records().into_iter().map(|r| r.action).collect();
        assert_eq!(actions, vec!["register_user", "login"]);
    }
}
