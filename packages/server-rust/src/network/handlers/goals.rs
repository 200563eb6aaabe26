//! Savings goal handlers.

use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::Json;
use fintrack_core::messages::{Contribution, NewGoal};
use fintrack_core::{Goal, Request};
use uuid::Uuid;

use super::{ApiError, AppState};
use crate::service::OperationResponse;

/// `GET /api/goals`
pub async fn list_goals(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<Vec<Goal>>, ApiError> {
    match state.dispatch(Request::ListGoals, &headers).await? {
        OperationResponse::Goals(list) => Ok(Json(list)),
        other => Err(ApiError::unexpected(&other)),
    }
}

/// `POST /api/goals`
pub async fn create_goal(
    State(state): State<AppState>,
    headers: HeaderMap,
    payload: Result<Json<NewGoal>, JsonRejection>,
) -> Result<(StatusCode, Json<Goal>), ApiError> {
    let Json(payload) = payload?;
    match state.dispatch(Request::CreateGoal(payload), &headers).await? {
        OperationResponse::Goal(goal) => Ok((StatusCode::CREATED, Json(goal))),
        other => Err(ApiError::unexpected(&other)),
    }
}

/// `POST /api/goals/{id}/contributions`
pub async fn contribute_to_goal(
    State(state): State<AppState>,
    id: Result<Path<Uuid>, PathRejection>,
    headers: HeaderMap,
    contribution: Result<Json<Contribution>, JsonRejection>,
) -> Result<Json<Goal>, ApiError> {
    let Path(id) = id?;
    let Json(contribution) = contribution?;
    match state
        .dispatch(Request::ContributeToGoal { id, contribution }, &headers)
        .await?
    {
        OperationResponse::Goal(goal) => Ok(Json(goal)),
        other => Err(ApiError::unexpected(&other)),
    }
}

/// `DELETE /api/goals/{id}`
pub async fn delete_goal(
    State(state): State<AppState>,
    id: Result<Path<Uuid>, PathRejection>,
    headers: HeaderMap,
) -> Result<StatusCode, ApiError> {
    let Path(id) = id?;
    match state.dispatch(Request::DeleteGoal { id }, &headers).await? {
        OperationResponse::Deleted { .. } => Ok(StatusCode::NO_CONTENT),
        other => Err(ApiError::unexpected(&other)),
    }
}
