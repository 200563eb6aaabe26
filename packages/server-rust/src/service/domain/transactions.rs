//! Income and expense records.

use std::sync::Arc;

use chrono::Utc;
use fintrack_core::messages::{NewTransaction, TransactionFilter, TransactionPatch};
use fintrack_core::Transaction;
use uuid::Uuid;

use super::{require_identity, require_positive, require_text};
use crate::service::operation::{Operation, OperationError, OperationResponse};
use crate::traits::{OwnedRecord, Repository};

/// CRUD over the caller's transactions.
pub struct TransactionService {
    repo: Arc<dyn Repository<Transaction>>,
}

impl TransactionService {
    #[must_use]
    pub fn new(repo: Arc<dyn Repository<Transaction>>) -> Self {
        Self { repo }
    }

    async fn handle(&self, op: Operation) -> Result<OperationResponse, OperationError> {
        let owner = require_identity()?.handle().to_string();
        match op {
            Operation::CreateTransaction { payload, .. } => self.create(owner, payload).await,
            Operation::UpdateTransaction { id, patch, .. } => self.update(&owner, id, patch).await,
            Operation::ListTransactions { filter, .. } => self.list(&owner, &filter).await,
            Operation::DeleteTransaction { id, .. } => {
                match self.repo.remove(&owner, id).await? {
                    Some(_) => Ok(OperationResponse::Deleted { id }),
                    None => Err(OperationError::not_found(Transaction::ENTITY, id)),
                }
            }
            _ => Err(OperationError::WrongService),
        }
    }

    async fn create(
        &self,
        owner: String,
        payload: NewTransaction,
    ) -> Result<OperationResponse, OperationError> {
        require_positive(payload.amount_cents, "amount_cents")?;
        let transaction = Transaction {
            id: Uuid::new_v4(),
            owner,
            amount_cents: payload.amount_cents,
            kind: payload.kind,
            category: require_text(&payload.category, "category")?,
            description: payload.description.trim().to_string(),
            occurred_on: payload.occurred_on,
            created_at: Utc::now(),
        };
        self.repo.insert(transaction.clone()).await?;
        tracing::debug!(id = %transaction.id, "transaction created");
        Ok(OperationResponse::Transaction(transaction))
    }

    async fn update(
        &self,
        owner: &str,
        id: Uuid,
        patch: TransactionPatch,
    ) -> Result<OperationResponse, OperationError> {
        let mut transaction = self
            .repo
            .get(owner, id)
            .await?
            .ok_or_else(|| OperationError::not_found(Transaction::ENTITY, id))?;

        if let Some(amount_cents) = patch.amount_cents {
            require_positive(amount_cents, "amount_cents")?;
            transaction.amount_cents = amount_cents;
        }
        if let Some(kind) = patch.kind {
            transaction.kind = kind;
        }
        if let Some(category) = patch.category {
            transaction.category = require_text(&category, "category")?;
        }
        if let Some(description) = patch.description {
            transaction.description = description.trim().to_string();
        }
        if let Some(occurred_on) = patch.occurred_on {
            transaction.occurred_on = occurred_on;
        }

        if !self.repo.put(transaction.clone()).await? {
            return Err(OperationError::not_found(Transaction::ENTITY, id));
        }
        Ok(OperationResponse::Transaction(transaction))
    }

    async fn list(
        &self,
        owner: &str,
        filter: &TransactionFilter,
    ) -> Result<OperationResponse, OperationError> {
        if let (Some(from), Some(to)) = (filter.from, filter.to) {
            if from > to {
                return Err(OperationError::Validation(
                    "from must not be after to".to_string(),
                ));
            }
        }

        let mut transactions: Vec<Transaction> = self
            .repo
            .list(owner)
            .await?
            .into_iter()
            .filter(|tx| matches_filter(tx, filter))
            .collect();
        transactions.sort_by(|a, b| {
            b.occurred_on
                .cmp(&a.occurred_on)
                .then_with(|| b.created_at.cmp(&a.created_at))
        });
        Ok(OperationResponse::Transactions(transactions))
    }
}

/// Category matches case-insensitively; `from` and `to` are inclusive.
fn matches_filter(tx: &Transaction, filter: &TransactionFilter) -> bool {
    filter
        .category
        .as_deref()
        .map_or(true, |c| tx.category.eq_ignore_ascii_case(c.trim()))
        && filter.from.map_or(true, |from| tx.occurred_on >= from)
        && filter.to.map_or(true, |to| tx.occurred_on <= to)
}

domain_service!(TransactionService);
