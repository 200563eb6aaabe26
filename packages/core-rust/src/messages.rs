//! Request payloads accepted by the finance services.

use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::finance::{BudgetPeriod, TransactionKind};

/// New account details.
#[derive(Clone, Serialize, Deserialize)]
pub struct RegisterUser {
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub display_name: Option<String>,
}

impl fmt::Debug for RegisterUser {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegisterUser")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .field("display_name", &self.display_name)
            .finish()
    }
}

/// Login credentials.
#[derive(Clone, Serialize, Deserialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewTransaction {
    pub amount_cents: i64,
    pub kind: TransactionKind,
    pub category: String,
    #[serde(default)]
    pub description: String,
    pub occurred_on: NaiveDate,
}

/// Partial update; absent fields keep their stored value.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TransactionPatch {
    #[serde(default)]
    pub amount_cents: Option<i64>,
    #[serde(default)]
    pub kind: Option<TransactionKind>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub occurred_on: Option<NaiveDate>,
}

/// Listing filter. Date bounds are inclusive.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TransactionFilter {
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub from: Option<NaiveDate>,
    #[serde(default)]
    pub to: Option<NaiveDate>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewBudget {
    pub category: String,
    pub limit_cents: i64,
    pub period: BudgetPeriod,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BudgetUpdate {
    pub limit_cents: i64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BudgetQuery {
    #[serde(default)]
    pub as_of: Option<NaiveDate>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewGoal {
    pub name: String,
    pub target_cents: i64,
    #[serde(default)]
    pub deadline: Option<NaiveDate>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Contribution {
    pub amount_cents: i64,
}

/// Every request the finance services understand.
#[derive(Debug, Clone)]
pub enum Request {
    RegisterUser(RegisterUser),
    Login(Credentials),
    /// Revokes the session token with the given id (`jti`).
    Logout { token_id: String },
    CurrentUser,
    CreateTransaction(NewTransaction),
    UpdateTransaction { id: Uuid, patch: TransactionPatch },
    ListTransactions(TransactionFilter),
    DeleteTransaction { id: Uuid },
    CreateBudget(NewBudget),
    UpdateBudget { id: Uuid, update: BudgetUpdate },
    ListBudgets(BudgetQuery),
    DeleteBudget { id: Uuid },
    CreateGoal(NewGoal),
    ContributeToGoal { id: Uuid, contribution: Contribution },
    ListGoals,
    DeleteGoal { id: Uuid },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn passwords_never_reach_debug_output() {
        let register = RegisterUser {
            email: "alice@example.com".to_string(),
            password: "hunter22hunter".to_string(),
            display_name: None,
        };
        let login = Credentials {
            email: "alice@example.com".to_string(),
            password: "hunter22hunter".to_string(),
        };
        assert!(!format!("{register:?}").contains("hunter22"));
        assert!(!format!("{login:?}").contains("hunter22"));
    }

    #[test]
    fn transaction_payload_parses_snake_case_kind() {
        let json = r#"{"amount_cents":10000,"kind":"expense","category":"food","occurred_on":"2024-03-14"}"#;
        let tx: NewTransaction = serde_json::from_str(json).unwrap();
        assert_eq!(tx.kind, TransactionKind::Expense);
        assert!(tx.description.is_empty());
    }

    #[test]
    fn patch_fields_default_to_absent() {
        let patch: TransactionPatch = serde_json::from_str(r#"{"category":"travel"}"#).unwrap();
        assert_eq!(patch.category.as_deref(), Some("travel"));
        assert!(patch.amount_cents.is_none());
        assert!(patch.occurred_on.is_none());
    }
}
