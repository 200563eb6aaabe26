//! Budget handlers.

use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::Json;
use fintrack_core::messages::{BudgetQuery, BudgetUpdate, NewBudget};
use fintrack_core::{Budget, BudgetStatus, Request};
use uuid::Uuid;

use super::{ApiError, AppState};
use crate::service::OperationResponse;

/// `GET /api/budgets?as_of=YYYY-MM-DD`
pub async fn list_budgets(
    State(state): State<AppState>,
    headers: HeaderMap,
    query: Result<Query<BudgetQuery>, QueryRejection>,
) -> Result<Json<Vec<BudgetStatus>>, ApiError> {
    let Query(query) = query?;
    match state.dispatch(Request::ListBudgets(query), &headers).await? {
        OperationResponse::Budgets(list) => Ok(Json(list)),
        other => Err(ApiError::unexpected(&other)),
    }
}

/// `POST /api/budgets`
pub async fn create_budget(
    State(state): State<AppState>,
    headers: HeaderMap,
    payload: Result<Json<NewBudget>, JsonRejection>,
) -> Result<(StatusCode, Json<Budget>), ApiError> {
    let Json(payload) = payload?;
    match state.dispatch(Request::CreateBudget(payload), &headers).await? {
        OperationResponse::Budget(budget) => Ok((StatusCode::CREATED, Json(budget))),
        other => Err(ApiError::unexpected(&other)),
    }
}

/// `PUT /api/budgets/{id}`
pub async fn update_budget(
    State(state): State<AppState>,
    id: Result<Path<Uuid>, PathRejection>,
    headers: HeaderMap,
    update: Result<Json<BudgetUpdate>, JsonRejection>,
) -> Result<Json<Budget>, ApiError> {
    let Path(id) = id?;
    let Json(update) = update?;
    match state
        .dispatch(Request::UpdateBudget { id, update }, &headers)
        .await?
    {
        OperationResponse::Budget(budget) => Ok(Json(budget)),
        other => Err(ApiError::unexpected(&other)),
    }
}

/// `DELETE /api/budgets/{id}`
pub async fn delete_budget(
    State(state): State<AppState>,
    id: Result<Path<Uuid>, PathRejection>,
    headers: HeaderMap,
) -> Result<StatusCode, ApiError> {
    let Path(id) = id?;
    match state.dispatch(Request::DeleteBudget { id }, &headers).await? {
        OperationResponse::Deleted { .. } => Ok(StatusCode::NO_CONTENT),
        other => Err(ApiError::unexpected(&other)),
    }
}
