//! Finance records: transactions, budgets, savings goals, user profiles.
//!
//! Amounts are integer minor units (cents) throughout.

use chrono::{DateTime, Datelike, Months, NaiveDate, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Direction of a transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionKind {
    Income,
    Expense,
}

impl TransactionKind {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            TransactionKind::Income => "income",
            TransactionKind::Expense => "expense",
        }
    }
}

/// A recorded money movement owned by one user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: Uuid,
    pub owner: String,
    pub amount_cents: i64,
    pub kind: TransactionKind,
    pub category: String,
    pub description: String,
    pub occurred_on: NaiveDate,
    pub created_at: DateTime<Utc>,
}

/// Length of the window a budget limit applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BudgetPeriod {
    Weekly,
    Monthly,
    Yearly,
}

impl BudgetPeriod {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            BudgetPeriod::Weekly => "weekly",
            BudgetPeriod::Monthly => "monthly",
            BudgetPeriod::Yearly => "yearly",
        }
    }

    /// Half-open `[start, end)` window of this period containing `as_of`.
    ///
    /// Weeks start on Monday; months and years on their first day.
    #[must_use]
    pub fn window(self, as_of: NaiveDate) -> (NaiveDate, NaiveDate) {
        let back = |days: u32| {
            as_of
                .checked_sub_signed(TimeDelta::days(i64::from(days)))
                .unwrap_or(NaiveDate::MIN)
        };
        match self {
            BudgetPeriod::Weekly => {
                let start = back(as_of.weekday().num_days_from_monday());
                let end = start
                    .checked_add_signed(TimeDelta::days(7))
                    .unwrap_or(NaiveDate::MAX);
                (start, end)
            }
            BudgetPeriod::Monthly => {
                let start = back(as_of.day0());
                let end = start
                    .checked_add_months(Months::new(1))
                    .unwrap_or(NaiveDate::MAX);
                (start, end)
            }
            BudgetPeriod::Yearly => {
                let start = back(as_of.ordinal0());
                let end = start
                    .checked_add_months(Months::new(12))
                    .unwrap_or(NaiveDate::MAX);
                (start, end)
            }
        }
    }
}

/// Spending limit for one category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Budget {
    pub id: Uuid,
    pub owner: String,
    pub category: String,
    pub limit_cents: i64,
    pub period: BudgetPeriod,
    pub created_at: DateTime<Utc>,
}

/// A budget together with what was spent against it in one window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BudgetStatus {
    #[serde(flatten)]
    pub budget: Budget,
    pub window_start: NaiveDate,
    pub window_end: NaiveDate,
    pub spent_cents: i64,
    pub remaining_cents: i64,
}

impl BudgetStatus {
    /// Sums the expenses in `transactions` that fall into the budget's
    /// category and the window containing `as_of`. Totals saturate at the
    /// `i64` bounds.
    #[must_use]
    pub fn compute(budget: Budget, transactions: &[Transaction], as_of: NaiveDate) -> Self {
        let (window_start, window_end) = budget.period.window(as_of);
        let spent_cents = transactions
            .iter()
            .filter(|tx| tx.kind == TransactionKind::Expense)
            .filter(|tx| tx.category.eq_ignore_ascii_case(&budget.category))
            .filter(|tx| tx.occurred_on >= window_start && tx.occurred_on < window_end)
            .fold(0_i64, |total, tx| total.saturating_add(tx.amount_cents));
        Self {
            remaining_cents: budget.limit_cents.saturating_sub(spent_cents),
            budget,
            window_start,
            window_end,
            spent_cents,
        }
    }

    #[must_use]
    pub fn is_exceeded(&self) -> bool {
        self.remaining_cents < 0
    }
}

/// Savings goal with accumulated contributions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Goal {
    pub id: Uuid,
    pub owner: String,
    pub name: String,
    pub target_cents: i64,
    pub saved_cents: i64,
    pub deadline: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl Goal {
    /// Adds a contribution, stamping `completed_at` the first time the target
    /// is reached. Returns `false` and leaves the goal untouched if the saved
    /// total would overflow.
    #[must_use]
    pub fn contribute(&mut self, amount_cents: i64, now: DateTime<Utc>) -> bool {
        let Some(saved_cents) = self.saved_cents.checked_add(amount_cents) else {
            return false;
        };
        self.saved_cents = saved_cents;
        if self.completed_at.is_none() && self.saved_cents >= self.target_cents {
            self.completed_at = Some(now);
        }
        true
    }

    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.completed_at.is_some()
    }
}

/// Public view of a registered user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub email: String,
    pub display_name: String,
    pub created_at: DateTime<Utc>,
}

/// Bearer token handed out on login.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub token: String,
    pub token_type: String,
    pub expires_at: DateTime<Utc>,
}
