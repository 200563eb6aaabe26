//! Identity middleware: binds the caller behind a bearer token to the
//! request's identity scope.

use axum::extract::{Request, State};
use axum::http::header::AUTHORIZATION;
use axum::http::HeaderMap;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use fintrack_core::{CallerIdentity, IdentityContext};

use super::handlers::{ApiError, AppState};
use crate::service::Claims;

/// Verified claims of the request's bearer token, if one was presented.
///
/// Always inserted into request extensions by [`identity_middleware`].
#[derive(Debug, Clone)]
pub struct ActiveSession(pub Option<Claims>);

/// Extracts the token from `Authorization: Bearer <token>`.
///
/// Returns `Ok(None)` when the header is absent.
fn bearer_token(headers: &HeaderMap) -> Result<Option<&str>, ApiError> {
    let Some(value) = headers.get(AUTHORIZATION) else {
        return Ok(None);
    };
    let value = value
        .to_str()
        .map_err(|_| ApiError::MalformedAuthorization)?;
    match value.split_once(' ') {
        Some((scheme, token)) if scheme.eq_ignore_ascii_case("bearer") && !token.trim().is_empty() => {
            Ok(Some(token.trim()))
        }
        _ => Err(ApiError::MalformedAuthorization),
    }
}

/// Runs the rest of the request inside an identity scope.
///
/// - no `Authorization` header: anonymous scope
/// - valid bearer token: scope seeded with the token's subject
/// - anything else: 401 without reaching a handler
///
/// Each admitted request holds an in-flight guard for its whole duration.
/// Once the server is draining, new requests get 503.
pub async fn identity_middleware(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Response {
    if !state.shutdown.health_state().accepts_requests() {
        return ApiError::ShuttingDown.into_response();
    }
    let _in_flight = state.shutdown.in_flight_guard();

    let claims = match bearer_token(req.headers()) {
        Ok(None) => None,
        Ok(Some(token)) => match state.tokens.verify(token) {
            Ok(claims) => Some(claims),
            Err(err) => {
                tracing::debug!(error = %err, "bearer token rejected");
                return ApiError::from(err).into_response();
            }
        },
        Err(err) => return err.into_response(),
    };

    let identity = claims.as_ref().map(|c| CallerIdentity::new(c.sub.clone()));
    req.extensions_mut().insert(ActiveSession(claims));
    IdentityContext::scope(identity, next.run(req)).await
}

#[cfg(test)]
mod tests {
    use axum::http::HeaderValue;

    use super::*;

    fn headers(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn bearer_token_parsing() {
        assert!(matches!(bearer_token(&HeaderMap::new()), Ok(None)));
        assert!(matches!(bearer_token(&headers("Bearer abc.def")), Ok(Some("abc.def"))));
        assert!(matches!(bearer_token(&headers("bearer  abc ")), Ok(Some("abc"))));
        assert!(matches!(
            bearer_token(&headers("Basic dXNlcjpwYXNz")),
            Err(ApiError::MalformedAuthorization)
        ));
        assert!(matches!(
            bearer_token(&headers("Bearer ")),
            Err(ApiError::MalformedAuthorization)
        ));
    }
}
