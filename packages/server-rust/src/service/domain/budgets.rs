//! Spending limits per category and period.

use std::sync::Arc;

use chrono::Utc;
use fintrack_core::messages::{BudgetQuery, BudgetUpdate, NewBudget};
use fintrack_core::{Budget, BudgetStatus, Transaction};
use uuid::Uuid;

use super::{require_identity, require_positive, require_text};
use crate::service::operation::{Operation, OperationError, OperationResponse};
use crate::traits::{OwnedRecord, Repository};

/// Budgets, reported together with what was spent in the current window.
pub struct BudgetService {
    budgets: Arc<dyn Repository<Budget>>,
    transactions: Arc<dyn Repository<Transaction>>,
}

impl BudgetService {
    #[must_use]
    pub fn new(
        budgets: Arc<dyn Repository<Budget>>,
        transactions: Arc<dyn Repository<Transaction>>,
    ) -> Self {
        Self {
            budgets,
            transactions,
        }
    }

    async fn handle(&self, op: Operation) -> Result<OperationResponse, OperationError> {
        let owner = require_identity()?.handle().to_string();
        match op {
            Operation::CreateBudget { payload, .. } => self.create(owner, payload).await,
            Operation::UpdateBudget { id, update, .. } => self.update(&owner, id, update).await,
            Operation::ListBudgets { query, .. } => self.list(&owner, query).await,
            Operation::DeleteBudget { id, .. } => match self.budgets.remove(&owner, id).await? {
                Some(_) => Ok(OperationResponse::Deleted { id }),
                None => Err(OperationError::not_found(Budget::ENTITY, id)),
            },
            _ => Err(OperationError::WrongService),
        }
    }

    /// One budget per category and period.
    async fn create(
        &self,
        owner: String,
        payload: NewBudget,
    ) -> Result<OperationResponse, OperationError> {
        require_positive(payload.limit_cents, "limit_cents")?;
        let category = require_text(&payload.category, "category")?;

        let existing = self.budgets.list(&owner).await?;
        if existing
            .iter()
            .any(|b| b.period == payload.period && b.category.eq_ignore_ascii_case(&category))
        {
            return Err(OperationError::Conflict(format!(
                "a {} budget for {category} already exists",
                payload.period.as_str()
            )));
        }

        let budget = Budget {
            id: Uuid::new_v4(),
            owner,
            category,
            limit_cents: payload.limit_cents,
            period: payload.period,
            created_at: Utc::now(),
        };
        self.budgets.insert(budget.clone()).await?;
        Ok(OperationResponse::Budget(budget))
    }

    async fn update(
        &self,
        owner: &str,
        id: Uuid,
        update: BudgetUpdate,
    ) -> Result<OperationResponse, OperationError> {
        require_positive(update.limit_cents, "limit_cents")?;
        let mut budget = self
            .budgets
            .get(owner, id)
            .await?
            .ok_or_else(|| OperationError::not_found(Budget::ENTITY, id))?;
        budget.limit_cents = update.limit_cents;
        if !self.budgets.put(budget.clone()).await? {
            return Err(OperationError::not_found(Budget::ENTITY, id));
        }
        Ok(OperationResponse::Budget(budget))
    }

    async fn list(
        &self,
        owner: &str,
        query: BudgetQuery,
    ) -> Result<OperationResponse, OperationError> {
        let as_of = query.as_of.unwrap_or_else(|| Utc::now().date_naive());
        let transactions = self.transactions.list(owner).await?;
        let mut budgets = self.budgets.list(owner).await?;
        budgets.sort_by(|a, b| a.category.cmp(&b.category).then(a.period.cmp(&b.period)));

        let statuses = budgets
            .into_iter()
            .map(|budget| BudgetStatus::compute(budget, &transactions, as_of))
            .collect();
        Ok(OperationResponse::Budgets(statuses))
    }
}

domain_service!(BudgetService);
