//! Transaction handlers.

use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::Json;
use fintrack_core::messages::{NewTransaction, TransactionFilter, TransactionPatch};
use fintrack_core::{Request, Transaction};
use uuid::Uuid;

use super::{ApiError, AppState};
use crate::service::OperationResponse;

/// `GET /api/transactions?category=&from=&to=`
pub async fn list_transactions(
    State(state): State<AppState>,
    headers: HeaderMap,
    filter: Result<Query<TransactionFilter>, QueryRejection>,
) -> Result<Json<Vec<Transaction>>, ApiError> {
    let Query(filter) = filter?;
    match state
        .dispatch(Request::ListTransactions(filter), &headers)
        .await?
    {
        OperationResponse::Transactions(list) => Ok(Json(list)),
        other => Err(ApiError::unexpected(&other)),
    }
}

/// `POST /api/transactions`
pub async fn create_transaction(
    State(state): State<AppState>,
    headers: HeaderMap,
    payload: Result<Json<NewTransaction>, JsonRejection>,
) -> Result<(StatusCode, Json<Transaction>), ApiError> {
    let Json(payload) = payload?;
    match state
        .dispatch(Request::CreateTransaction(payload), &headers)
        .await?
    {
        OperationResponse::Transaction(tx) => Ok((StatusCode::CREATED, Json(tx))),
        other => Err(ApiError::unexpected(&other)),
    }
}

/// `PUT /api/transactions/{id}`
pub async fn update_transaction(
    State(state): State<AppState>,
    id: Result<Path<Uuid>, PathRejection>,
    headers: HeaderMap,
    patch: Result<Json<TransactionPatch>, JsonRejection>,
) -> Result<Json<Transaction>, ApiError> {
    let Path(id) = id?;
    let Json(patch) = patch?;
    match state
        .dispatch(Request::UpdateTransaction { id, patch }, &headers)
        .await?
    {
        OperationResponse::Transaction(tx) => Ok(Json(tx)),
        other => Err(ApiError::unexpected(&other)),
    }
}

/// `DELETE /api/transactions/{id}`
pub async fn delete_transaction(
    State(state): State<AppState>,
    id: Result<Path<Uuid>, PathRejection>,
    headers: HeaderMap,
) -> Result<StatusCode, ApiError> {
    let Path(id) = id?;
    match state
        .dispatch(Request::DeleteTransaction { id }, &headers)
        .await?
    {
        OperationResponse::Deleted { .. } => Ok(StatusCode::NO_CONTENT),
        other => Err(ApiError::unexpected(&other)),
    }
}
