//! Mapping of service errors onto JSON HTTP responses.

use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;

use crate::service::{OperationError, OperationResponse, TokenError};

/// Errors surfaced by the HTTP API.
///
/// Rendered as `{"error": <message>, "code": <machine-readable code>}`.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error(transparent)]
    Operation(#[from] OperationError),

    #[error(transparent)]
    Token(#[from] TokenError),

    /// `Authorization` header present but not a bearer token.
    #[error("malformed authorization header")]
    MalformedAuthorization,

    #[error("server is shutting down")]
    ShuttingDown,

    #[error("invalid request: {0}")]
    BadRequest(String),
}

impl ApiError {
    /// A response variant the handler did not expect for its request.
    pub(crate) fn unexpected(response: &OperationResponse) -> Self {
        ApiError::Operation(OperationError::Internal(anyhow::anyhow!(
            "unexpected operation response: {response:?}"
        )))
    }

    #[must_use]
    pub fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            ApiError::Operation(err) => match err {
                OperationError::Unauthenticated => (StatusCode::UNAUTHORIZED, "unauthenticated"),
                OperationError::InvalidCredentials => {
                    (StatusCode::UNAUTHORIZED, "invalid_credentials")
                }
                OperationError::NotFound { .. } => (StatusCode::NOT_FOUND, "not_found"),
                OperationError::Validation(_) => (StatusCode::BAD_REQUEST, "validation"),
                OperationError::Conflict(_) => (StatusCode::CONFLICT, "conflict"),
                OperationError::Timeout { .. } => (StatusCode::GATEWAY_TIMEOUT, "timeout"),
                OperationError::UnknownService { .. }
                | OperationError::WrongService
                | OperationError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "internal"),
            },
            ApiError::Token(err) => match err {
                TokenError::Expired => (StatusCode::UNAUTHORIZED, "token_expired"),
                TokenError::Revoked => (StatusCode::UNAUTHORIZED, "token_revoked"),
                TokenError::Invalid(_) => (StatusCode::UNAUTHORIZED, "invalid_token"),
            },
            ApiError::MalformedAuthorization => (StatusCode::UNAUTHORIZED, "invalid_token"),
            ApiError::ShuttingDown => (StatusCode::SERVICE_UNAVAILABLE, "unavailable"),
            ApiError::BadRequest(_) => (StatusCode::BAD_REQUEST, "bad_request"),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();
        let message = if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!(error = %self, "request failed");
            "internal server error".to_string()
        } else {
            self.to_string()
        };

        (
            status,
            Json(serde_json::json!({ "error": message, "code": code })),
        )
            .into_response()
    }
}
