// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! JWT authentication middleware.
//!
//! The identity provider issues an HS256 session token; a valid token is the
//! only way an [`Identity`] enters a request.

use crate::error::AppError;
use crate::models::Identity;
use crate::AppState;
use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::Response,
};
use axum_extra::extract::cookie::CookieJar;
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Session cookie set by the identity provider's sign-in flow.
pub const SESSION_COOKIE: &str = "webgym_token";

/// JWT claims structure.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// Subject (identity-provider uid)
    pub sub: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Expiration time (Unix timestamp)
    pub exp: usize,
    /// Issued at (Unix timestamp)
    pub iat: usize,
}

impl Claims {
    fn into_identity(self) -> Option<Identity> {
        let uid = self.sub.trim();
        if uid.is_empty() {
            return None;
        }

        let identity = Identity::new(uid, self.email.as_deref());
        Some(match self.name {
            Some(name) if !name.trim().is_empty() => identity.with_display_name(name),
            _ => identity,
        })
    }
}

/// Middleware that requires valid JWT authentication.
pub async fn require_auth(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    // Try cookie first, then header
    let token = if let Some(cookie) = jar.get(SESSION_COOKIE) {
        cookie.value().to_string()
    } else {
        let auth_header = request
            .headers()
            .get(header::AUTHORIZATION)
            .and_then(|h| h.to_str().ok());

        match auth_header.and_then(|h| h.strip_prefix("Bearer ")) {
            Some(token) => token.to_string(),
            None => return Err(AppError::Unauthorized),
        }
    };

    let identity = verify_jwt(&token, &state.config.jwt_signing_key)?;
    tracing::debug!(uid = %identity.uid, "Request authenticated");
    request.extensions_mut().insert(identity);

    Ok(next.run(request).await)
}

/// Verify a session token and extract the identity it carries.
pub fn verify_jwt(token: &str, signing_key: &[u8]) -> Result<Identity, AppError> {
    let key = DecodingKey::from_secret(signing_key);
    let validation = Validation::new(Algorithm::HS256);

    let token_data = decode::<Claims>(token, &key, &validation).map_err(|e| {
        tracing::debug!(error = %e, "Rejected session token");
        AppError::InvalidToken
    })?;

    token_data
        .claims
        .into_identity()
        .ok_or(AppError::InvalidToken)
}

/// Create a session token for an identity.
pub fn create_jwt(identity: &Identity, signing_key: &[u8]) -> anyhow::Result<String> {
    use jsonwebtoken::{encode, EncodingKey, Header};
    use std::time::{SystemTime, UNIX_EPOCH};

    let now = SystemTime::now().duration_since(UNIX_EPOCH)?.as_secs() as usize;

    let claims = Claims {
        sub: identity.uid.clone(),
        email: identity.email.clone(),
        name: identity.display_name.clone(),
        iat: now,
        exp: now + 7 * 24 * 60 * 60, // 7 days
    };

    Ok(encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(signing_key),
    )?)
}

#[cfg(test)]
mod tests {
    use super::*;

    const KEY: &[u8] = b"unit_test_signing_key_32_bytes!!";

    #[test]
    fn test_token_carries_identity() {
        let identity = Identity::new("u1", Some("Ana@Gym.com")).with_display_name("Ana");
        let token = create_jwt(&identity, KEY).unwrap();

        let verified = verify_jwt(&token, KEY).unwrap();
        assert_eq!(verified.uid, "u1");
        assert_eq!(verified.email.as_deref(), Some("Ana@Gym.com"));
        assert_eq!(verified.display_name.as_deref(), Some("Ana"));
    }

    #[test]
    fn test_wrong_key_rejected() {
        let token = create_jwt(&Identity::new("u1", None), KEY).unwrap();
        assert!(matches!(
            verify_jwt(&token, b"another_key_that_is_32_bytes!!!!"),
            Err(AppError::InvalidToken)
        ));
    }

    #[test]
    fn test_blank_subject_rejected() {
        let claims = Claims {
            sub: "  ".to_string(),
            email: None,
            name: None,
            exp: usize::MAX / 2,
            iat: 0,
        };
        assert!(claims.into_identity().is_none());
    }
}
