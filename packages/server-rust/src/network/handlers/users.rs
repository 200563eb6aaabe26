//! User registration and profile handlers.

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::Json;
use fintrack_core::messages::RegisterUser;
use fintrack_core::{Request, UserProfile};

use super::{ApiError, AppState};
use crate::service::OperationResponse;

/// `POST /api/users`
pub async fn register_user(
    State(state): State<AppState>,
    headers: HeaderMap,
    payload: Result<Json<RegisterUser>, JsonRejection>,
) -> Result<(StatusCode, Json<UserProfile>), ApiError> {
    let Json(payload) = payload?;
    match state
        .dispatch(Request::RegisterUser(payload), &headers)
        .await?
    {
        OperationResponse::User(profile) => Ok((StatusCode::CREATED, Json(profile))),
        other => Err(ApiError::unexpected(&other)),
    }
}

/// `GET /api/users/me`
pub async fn current_user(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<UserProfile>, ApiError> {
    match state.dispatch(Request::CurrentUser, &headers).await? {
        OperationResponse::User(profile) => Ok(Json(profile)),
        other => Err(ApiError::unexpected(&other)),
    }
}
