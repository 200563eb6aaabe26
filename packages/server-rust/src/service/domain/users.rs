//! User accounts and sessions.

use std::sync::{Arc, OnceLock};

use chrono::Utc;
use fintrack_core::messages::{Credentials, RegisterUser};
use fintrack_core::{CallerIdentity, IdentityContext};
use regex::Regex;

use super::require_identity;
use crate::service::operation::{Operation, OperationError, OperationResponse};
use crate::service::password::PasswordHashing;
use crate::service::tokens::TokenIssuer;
use crate::traits::{UserAccount, UserDirectory};

fn email_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("email pattern is a valid regex")
    })
}

/// Registration, login, logout and profile lookup.
pub struct UserService {
    directory: Arc<dyn UserDirectory>,
    tokens: Arc<TokenIssuer>,
    hashing: PasswordHashing,
    min_password_len: usize,
}

impl UserService {
    #[must_use]
    pub fn new(
        directory: Arc<dyn UserDirectory>,
        tokens: Arc<TokenIssuer>,
        hashing: PasswordHashing,
        min_password_len: usize,
    ) -> Self {
        Self {
            directory,
            tokens,
            hashing,
            min_password_len,
        }
    }

    async fn handle(&self, op: Operation) -> Result<OperationResponse, OperationError> {
        match op {
            Operation::RegisterUser { payload, .. } => self.register(payload).await,
            Operation::Login { payload, .. } => self.login(payload).await,
            Operation::Logout { token_id, .. } => self.logout(&token_id),
            Operation::CurrentUser { .. } => self.current().await,
            _ => Err(OperationError::WrongService),
        }
    }

    async fn register(&self, payload: RegisterUser) -> Result<OperationResponse, OperationError> {
        let email = payload.email.trim().to_lowercase();
        if !email_pattern().is_match(&email) {
            return Err(OperationError::Validation(format!(
                "{email:?} is not a valid email address"
            )));
        }
        if payload.password.chars().count() < self.min_password_len {
            return Err(OperationError::Validation(format!(
                "password must be at least {} characters",
                self.min_password_len
            )));
        }
        let display_name = match payload.display_name.as_deref().map(str::trim) {
            Some(name) if !name.is_empty() => name.to_string(),
            _ => email.split('@').next().unwrap_or_default().to_string(),
        };

        let hashing = self.hashing.clone();
        let password = payload.password;
        let password_hash = tokio::task::spawn_blocking(move || hashing.hash(&password))
            .await
            .map_err(anyhow::Error::from)??;

        let account = UserAccount {
            email: email.clone(),
            display_name,
            password_hash,
            created_at: Utc::now(),
        };
        let profile = account.profile();
        if !self.directory.insert_user(account).await? {
            return Err(OperationError::Conflict(format!(
                "{email} is already registered"
            )));
        }

        tracing::info!(email = %email, "user registered");
        Ok(OperationResponse::User(profile))
    }

    /// On success the caller becomes the logged-in user for the rest of the
    /// current identity scope.
    async fn login(&self, payload: Credentials) -> Result<OperationResponse, OperationError> {
        let email = payload.email.trim().to_lowercase();
        let Some(account) = self.directory.find_user(&email).await? else {
            return Err(OperationError::InvalidCredentials);
        };

        let hashing = self.hashing.clone();
        let hash = account.password_hash.clone();
        let password = payload.password;
        let matches = tokio::task::spawn_blocking(move || hashing.verify(&hash, &password))
            .await
            .map_err(anyhow::Error::from)?;
        if !matches {
            tracing::debug!(email = %email, "login rejected");
            return Err(OperationError::InvalidCredentials);
        }

        let session = self
            .tokens
            .issue(&account.email)
            .map_err(|e| OperationError::Internal(e.into()))?;
        IdentityContext::set_current(Some(CallerIdentity::new(account.email)));
        Ok(OperationResponse::Session(session))
    }

    fn logout(&self, token_id: &str) -> Result<OperationResponse, OperationError> {
        let caller = require_identity()?;
        self.tokens.revoke(token_id);
        IdentityContext::clear();
        tracing::info!(email = %caller, "user logged out");
        Ok(OperationResponse::Empty)
    }

    async fn current(&self) -> Result<OperationResponse, OperationError> {
        let caller = require_identity()?;
        let account = self
            .directory
            .find_user(caller.handle())
            .await?
            .ok_or_else(|| OperationError::NotFound {
                entity: "user",
                id: caller.handle().to_string(),
            })?;
        Ok(OperationResponse::User(account.profile()))
    }
}

domain_service!(UserService);
