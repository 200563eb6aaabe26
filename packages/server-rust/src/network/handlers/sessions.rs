//! Login and logout handlers.

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::{Extension, Json};
use fintrack_core::messages::Credentials;
use fintrack_core::{Request, Session};

use super::{ApiError, AppState};
use crate::network::identity::ActiveSession;
use crate::service::{OperationError, OperationResponse};

/// `POST /api/sessions`
pub async fn login(
    State(state): State<AppState>,
    headers: HeaderMap,
    payload: Result<Json<Credentials>, JsonRejection>,
) -> Result<(StatusCode, Json<Session>), ApiError> {
    let Json(payload) = payload?;
    match state.dispatch(Request::Login(payload), &headers).await? {
        OperationResponse::Session(session) => Ok((StatusCode::CREATED, Json(session))),
        other => Err(ApiError::unexpected(&other)),
    }
}

/// `DELETE /api/sessions`: revokes the bearer token used for this request.
pub async fn logout(
    State(state): State<AppState>,
    Extension(ActiveSession(session)): Extension<ActiveSession>,
    headers: HeaderMap,
) -> Result<StatusCode, ApiError> {
    let claims = session.ok_or(OperationError::Unauthenticated)?;
    match state
        .dispatch(Request::Logout { token_id: claims.jti }, &headers)
        .await?
    {
        OperationResponse::Empty => Ok(StatusCode::NO_CONTENT),
        other => Err(ApiError::unexpected(&other)),
    }
}
