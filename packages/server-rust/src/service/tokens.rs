//! Session token issuance and verification (HS256 JWT).

use std::sync::Arc;

use chrono::{DateTime, TimeDelta, Utc};
use fintrack_core::Session;
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::storage::TokenRevocations;

/// JWT claims embedded in issued tokens.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (user email).
    pub sub: String,
    /// Unique token ID for revocation tracking.
    pub jti: String,
    /// Issued at (seconds since epoch).
    pub iat: u64,
    /// Expiry (seconds since epoch).
    pub exp: u64,
}

#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    #[error("token has expired")]
    Expired,
    #[error("token has been revoked")]
    Revoked,
    #[error("invalid token: {0}")]
    Invalid(jsonwebtoken::errors::Error),
}

impl From<jsonwebtoken::errors::Error> for TokenError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        match err.kind() {
            ErrorKind::ExpiredSignature => TokenError::Expired,
            _ => TokenError::Invalid(err),
        }
    }
}

/// Issues, verifies and revokes bearer tokens.
pub struct TokenIssuer {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    ttl_secs: u64,
    revocations: Arc<TokenRevocations>,
}

impl TokenIssuer {
    #[must_use]
    pub fn new(secret: &str, ttl_secs: u64, revocations: Arc<TokenRevocations>) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_required_spec_claims(&["exp", "sub"]);
        validation.leeway = 0;
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
            ttl_secs,
            revocations,
        }
    }

    /// Issue a token for `subject`.
    pub fn issue(&self, subject: &str) -> Result<Session, TokenError> {
        let iat = jsonwebtoken::get_current_timestamp();
        let claims = Claims {
            sub: subject.to_string(),
            jti: uuid::Uuid::new_v4().to_string(),
            iat,
            exp: iat + self.ttl_secs,
        };
        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)?;
        Ok(Session {
            token,
            token_type: "Bearer".to_string(),
            expires_at: timestamp(claims.exp),
        })
    }

    /// Check signature, expiry, and that the `jti` has not been revoked.
    pub fn verify(&self, token: &str) -> Result<Claims, TokenError> {
        let claims = decode::<Claims>(token, &self.decoding_key, &self.validation)?.claims;
        if self.revocations.is_revoked(&claims.jti) {
            return Err(TokenError::Revoked);
        }
        Ok(claims)
    }

    /// Revoke a token id. The entry is kept for one token lifetime.
    pub fn revoke(&self, jti: &str) {
        let until = i64::try_from(self.ttl_secs)
            .ok()
            .and_then(TimeDelta::try_seconds)
            .and_then(|ttl| Utc::now().checked_add_signed(ttl))
            .unwrap_or(DateTime::<Utc>::MAX_UTC);
        self.revocations.revoke(jti, until);
        tracing::debug!(jti, "session token revoked");
    }
}

fn timestamp(secs: u64) -> DateTime<Utc> {
    i64::try_from(secs)
        .ok()
        .and_then(|secs| DateTime::from_timestamp(secs, 0))
        .unwrap_or(DateTime::<Utc>::MAX_UTC)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn issuer(ttl_secs: u64) -> TokenIssuer {
        TokenIssuer::new("test-secret", ttl_secs, Arc::new(TokenRevocations::new()))
    }

    #[test]
    fn issued_token_verifies() {
        let issuer = issuer(3600);
        let session = issuer.issue("alice@example.com").unwrap();
        assert_eq!(session.token_type, "Bearer");
        assert!(session.expires_at > Utc::now());

        let claims = issuer.verify(&session.token).unwrap();
        assert_eq!(claims.sub, "alice@example.com");
        assert_eq!(claims.exp, claims.iat + 3600);
    }

    #[test]
    fn revoked_token_is_rejected() {
        let issuer = issuer(3600);
        let session = issuer.issue("alice@example.com").unwrap();
        let claims = issuer.verify(&session.token).unwrap();

        issuer.revoke(&claims.jti);
        assert!(matches!(issuer.verify(&session.token), Err(TokenError::Revoked)));
    }

    #[test]
    fn expired_token_is_rejected() {
        let issuer = issuer(3600);
        let past = jsonwebtoken::get_current_timestamp() - 7200;
        let claims = Claims {
            sub: "alice@example.com".to_string(),
            jti: "old".to_string(),
            iat: past,
            exp: past + 60,
        };
        let token = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(b"test-secret"),
        )
        .unwrap();
        assert!(matches!(issuer.verify(&token), Err(TokenError::Expired)));
    }

    #[test]
    fn token_signed_with_other_secret_is_invalid() {
        let other = TokenIssuer::new("other-secret", 3600, Arc::new(TokenRevocations::new()));
        let session = other.issue("mallory@example.com").unwrap();
        assert!(matches!(
            issuer(3600).verify(&session.token),
            Err(TokenError::Invalid(_))
        ));
        assert!(matches!(issuer(3600).verify("not-a-jwt"), Err(TokenError::Invalid(_))));
    }
}
