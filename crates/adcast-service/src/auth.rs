//! Authentication extractors.
//!
//! - `AuthUser` - End-user authentication via HS256 session JWT
//! - `AdminAuth` - Admin authentication for privileged credit endpoints
//! - `OperatorKey` - The optional operator token presented for commit-mode exports

use std::sync::Arc;

use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};

use adcast_core::UserId;

use crate::crypto::constant_time_eq;
use crate::error::ApiError;
use crate::state::AppState;

/// Header carrying the operator token for commit-mode exports.
pub const OPERATOR_KEY_HEADER: &str = "x-export-admin-key";

/// An authenticated end user.
#[derive(Debug, Clone)]
pub struct AuthUser {
    /// The user ID.
    pub user_id: UserId,
}

#[async_trait]
impl FromRequestParts<Arc<AppState>> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let token = parts
            .headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "))
            .ok_or(ApiError::Unauthorized)?;

        // Allow test tokens in testing only.
        // This bypass is gated behind #[cfg(test)] or the "test-auth" feature
        // to ensure it is never active in production builds.
        #[cfg(any(test, feature = "test-auth"))]
        if let Some(user_id_str) = token.strip_prefix("test-token:") {
            let user_id = user_id_str
                .parse::<UserId>()
                .map_err(|_| ApiError::Unauthorized)?;
            return Ok(AuthUser { user_id });
        }

        let secret = state
            .config
            .jwt_secret
            .as_deref()
            .ok_or(ApiError::Unauthorized)?;
        let claims = decode_session_token(token, secret)?;

        let user_id = claims
            .sub
            .parse::<UserId>()
            .map_err(|_| ApiError::Unauthorized)?;

        Ok(AuthUser { user_id })
    }
}

/// Admin authentication via the `X-Admin-Key` header.
#[derive(Debug, Clone)]
pub struct AdminAuth {
    /// Admin identifier (for audit logging).
    pub admin_id: String,
}

#[async_trait]
impl FromRequestParts<Arc<AppState>> for AdminAuth {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let admin_key = parts
            .headers
            .get("x-admin-key")
            .and_then(|v| v.to_str().ok())
            .ok_or(ApiError::Unauthorized)?;

        let expected_key = state
            .config
            .admin_api_key
            .as_deref()
            .ok_or(ApiError::Unauthorized)?;

        if !constant_time_eq(admin_key, expected_key) {
            return Err(ApiError::Unauthorized);
        }

        let admin_id = parts
            .headers
            .get("x-admin-id")
            .and_then(|v| v.to_str().ok())
            .unwrap_or("admin")
            .to_string();

        tracing::info!(admin_id = %admin_id, "Admin authenticated");

        Ok(AdminAuth { admin_id })
    }
}

/// The operator token, if the request carried one. Never rejects.
#[derive(Debug, Clone, Default)]
pub struct OperatorKey(pub Option<String>);

#[async_trait]
impl<S: Send + Sync> FromRequestParts<S> for OperatorKey {
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(OperatorKey(
            parts
                .headers
                .get(OPERATOR_KEY_HEADER)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string),
        ))
    }
}

/// Session token claims.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JwtClaims {
    /// Subject (user ID).
    pub sub: String,
    /// Expiration time.
    pub exp: i64,
    /// Issued at.
    #[serde(default)]
    pub iat: Option<i64>,
}

/// Validate an HS256 session token and return its claims.
///
/// # Errors
///
/// Returns `ApiError::Unauthorized` for a bad signature, an expired token, or malformed
/// claims.
pub fn decode_session_token(token: &str, secret: &str) -> Result<JwtClaims, ApiError> {
    let validation = Validation::new(Algorithm::HS256);
    decode::<JwtClaims>(token, &DecodingKey::from_secret(secret.as_bytes()), &validation)
        .map(|data| data.claims)
        .map_err(|e| {
            tracing::debug!(error = %e, "JWT validation failed");
            ApiError::Unauthorized
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::{encode, EncodingKey, Header};

    fn token(secret: &str, sub: &str, exp: i64) -> String {
        let claims = JwtClaims {
            sub: sub.to_string(),
            exp,
            iat: None,
        };
        encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .unwrap()
    }

    #[test]
    fn valid_token_decodes() {
        let user_id = UserId::generate();
        let exp = chrono::Utc::now().timestamp() + 3600;
        let claims = decode_session_token(&token("s3cret", &user_id.to_string(), exp), "s3cret").unwrap();
        assert_eq!(claims.sub.parse::<UserId>().unwrap(), user_id);
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let exp = chrono::Utc::now().timestamp() + 3600;
        let result = decode_session_token(&token("s3cret", "someone", exp), "other");
        assert!(matches!(result, Err(ApiError::Unauthorized)));
    }

    #[test]
    fn expired_token_is_rejected() {
        let exp = chrono::Utc::now().timestamp() - 3600;
        let result = decode_session_token(&token("s3cret", "someone", exp), "s3cret");
        assert!(matches!(result, Err(ApiError::Unauthorized)));
    }
}
