//! Savings goals.

use std::sync::Arc;

use chrono::Utc;
use fintrack_core::messages::{Contribution, NewGoal};
use fintrack_core::Goal;
use uuid::Uuid;

use super::{require_identity, require_positive, require_text};
use crate::service::operation::{Operation, OperationError, OperationResponse};
use crate::traits::{OwnedRecord, Repository};

pub struct GoalService {
    repo: Arc<dyn Repository<Goal>>,
}

impl GoalService {
    #[must_use]
    pub fn new(repo: Arc<dyn Repository<Goal>>) -> Self {
        Self { repo }
    }

    async fn handle(&self, op: Operation) -> Result<OperationResponse, OperationError> {
        let owner = require_identity()?.handle().to_string();
        match op {
            Operation::CreateGoal { payload, .. } => self.create(owner, payload).await,
            Operation::ContributeToGoal {
                id, contribution, ..
            } => self.contribute(&owner, id, contribution).await,
            Operation::ListGoals { .. } => {
                let mut goals = self.repo.list(&owner).await?;
                goals.sort_by_key(|g| g.created_at);
                Ok(OperationResponse::Goals(goals))
            }
            Operation::DeleteGoal { id, .. } => match self.repo.remove(&owner, id).await? {
                Some(_) => Ok(OperationResponse::Deleted { id }),
                None => Err(OperationError::not_found(Goal::ENTITY, id)),
            },
            _ => Err(OperationError::WrongService),
        }
    }

    async fn create(&self, owner: String, payload: NewGoal) -> Result<OperationResponse, OperationError> {
        require_positive(payload.target_cents, "target_cents")?;
        let now = Utc::now();
        if payload.deadline.is_some_and(|d| d < now.date_naive()) {
            return Err(OperationError::Validation(
                "deadline must not be in the past".to_string(),
            ));
        }
        let goal = Goal {
            id: Uuid::new_v4(),
            owner,
            name: require_text(&payload.name, "name")?,
            target_cents: payload.target_cents,
            saved_cents: 0,
            deadline: payload.deadline,
            created_at: now,
            completed_at: None,
        };
        self.repo.insert(goal.clone()).await?;
        Ok(OperationResponse::Goal(goal))
    }

    async fn contribute(
        &self,
        owner: &str,
        id: Uuid,
        contribution: Contribution,
    ) -> Result<OperationResponse, OperationError> {
        require_positive(contribution.amount_cents, "amount_cents")?;
        let mut goal = self
            .repo
            .get(owner, id)
            .await?
            .ok_or_else(|| OperationError::not_found(Goal::ENTITY, id))?;

        let was_complete = goal.is_complete();
        if !goal.contribute(contribution.amount_cents, Utc::now()) {
            return Err(OperationError::Validation(
                "contribution would overflow the saved amount".to_string(),
            ));
        }
        if !self.repo.put(goal.clone()).await? {
            return Err(OperationError::not_found(Goal::ENTITY, id));
        }
        if !was_complete && goal.is_complete() {
            tracing::info!(goal = %goal.id, "savings goal reached");
        }
        Ok(OperationResponse::Goal(goal))
    }
}

domain_service!(GoalService);

#[cfg(test)]
mod tests {
    use chrono::TimeDelta;
    use fintrack_core::{CallerIdentity, IdentityContext};
    use tower::ServiceExt;

    use super::*;
    use crate::service::operation::{service_names, OperationContext};
    use crate::storage::MemoryRepository;

    fn service() -> Arc<GoalService> {
        service_with(Arc::new(MemoryRepository::<Goal>::new()))
    }

    fn service_with(repo: Arc<MemoryRepository<Goal>>) -> Arc<GoalService> {
        Arc::new(GoalService::new(repo))
    }

    fn ctx() -> OperationContext {
        OperationContext::new(1, service_names::GOALS, 5000)
    }

    async fn as_alice(
        svc: &Arc<GoalService>,
        op: Operation,
    ) -> Result<OperationResponse, OperationError> {
        IdentityContext::scope(
            Some(CallerIdentity::new("alice@example.com")),
            Arc::clone(svc).oneshot(op),
        )
        .await
    }

    fn new_goal(target_cents: i64) -> Operation {
        Operation::CreateGoal {
            ctx: ctx(),
            payload: NewGoal {
                name: "vacation".to_string(),
                target_cents,
                deadline: None,
            },
        }
    }

    fn contribute(id: Uuid, amount_cents: i64) -> Operation {
        Operation::ContributeToGoal {
            ctx: ctx(),
            id,
            contribution: Contribution { amount_cents },
        }
    }

    async fn goal_of(svc: &Arc<GoalService>, op: Operation) -> Goal {
        match as_alice(svc, op).await.unwrap() {
            OperationResponse::Goal(goal) => goal,
            other => panic!("expected goal, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn contributions_accumulate_until_complete() {
        let svc = service();
        let goal = goal_of(&svc, new_goal(1_000)).await;
        assert_eq!(goal.saved_cents, 0);

        let goal = goal_of(&svc, contribute(goal.id, 600)).await;
        assert!(!goal.is_complete());
        let goal = goal_of(&svc, contribute(goal.id, 400)).await;
        assert!(goal.is_complete());
        assert_eq!(goal.saved_cents, 1_000);

        let resp = as_alice(&svc, Operation::ListGoals { ctx: ctx() }).await.unwrap();
        assert!(matches!(resp, OperationResponse::Goals(goals) if goals.len() == 1));
    }

    #[tokio::test]
    async fn create_and_contribute_validate_amounts() {
        let svc = service();
        let err = as_alice(&svc, new_goal(0)).await.unwrap_err();
        assert!(matches!(err, OperationError::Validation(_)));

        let goal = goal_of(&svc, new_goal(1_000)).await;
        let err = as_alice(&svc, contribute(goal.id, -1)).await.unwrap_err();
        assert!(matches!(err, OperationError::Validation(_)));
    }

    #[tokio::test]
    async fn oversized_amounts_are_rejected() {
        let svc = service();
        let err = as_alice(&svc, new_goal(i64::MAX)).await.unwrap_err();
        assert!(matches!(err, OperationError::Validation(_)));

        let goal = goal_of(&svc, new_goal(1_000)).await;
        let err = as_alice(&svc, contribute(goal.id, i64::MAX)).await.unwrap_err();
        assert!(matches!(err, OperationError::Validation(_)));
    }

    #[tokio::test]
    async fn contribution_overflow_is_a_validation_error() {
        let repo = Arc::new(MemoryRepository::<Goal>::new());
        let svc = service_with(Arc::clone(&repo));
        let goal = Goal {
            id: Uuid::new_v4(),
            owner: "alice@example.com".to_string(),
            name: "everything".to_string(),
            target_cents: 1_000,
            saved_cents: i64::MAX - 10,
            deadline: None,
            created_at: Utc::now(),
            completed_at: Some(Utc::now()),
        };
        repo.insert(goal.clone()).await.unwrap();

        let err = as_alice(&svc, contribute(goal.id, 100)).await.unwrap_err();
        assert!(matches!(err, OperationError::Validation(_)));

        let stored = repo.get("alice@example.com", goal.id).await.unwrap().unwrap();
        assert_eq!(stored.saved_cents, i64::MAX - 10);
    }

    #[tokio::test]
    async fn past_deadline_is_rejected() {
        let svc = service();
        let yesterday = Utc::now().date_naive() - TimeDelta::days(1);
        let err = as_alice(
            &svc,
            Operation::CreateGoal {
                ctx: ctx(),
                payload: NewGoal {
                    name: "late".to_string(),
                    target_cents: 100,
                    deadline: Some(yesterday),
                },
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, OperationError::Validation(_)));
    }

    #[tokio::test]
    async fn contributing_to_missing_goal_is_not_found() {
        let svc = service();
        let err = as_alice(&svc, contribute(Uuid::new_v4(), 100)).await.unwrap_err();
        assert!(matches!(err, OperationError::NotFound { entity: "goal", .. }));

        let goal = goal_of(&svc, new_goal(1_000)).await;
        let resp = as_alice(&svc, Operation::DeleteGoal { ctx: ctx(), id: goal.id })
            .await
            .unwrap();
        assert!(matches!(resp, OperationResponse::Deleted { id } if id == goal.id));
    }
}
