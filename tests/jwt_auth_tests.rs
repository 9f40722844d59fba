// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! JWT authentication tests.
//!
//! These tests verify that tokens in the identity provider's format are
//! accepted by the auth middleware, catching compatibility issues early.

use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};
use webgym::error::AppError;
use webgym::middleware::auth::{create_jwt, verify_jwt};
use webgym::models::Identity;

const SIGNING_KEY: &[u8] = b"test_signing_key_32_bytes_long!!";

/// Claims as the identity provider issues them. If the middleware's Claims
/// struct drifts from this shape, these tests fail.
#[derive(Debug, Serialize, Deserialize)]
struct ProviderClaims {
    sub: String,
    email: Option<String>,
    exp: usize,
    iat: usize,
}

fn now() -> usize {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_secs() as usize
}

fn provider_token(sub: &str, email: Option<&str>, exp: usize) -> String {
    let claims = ProviderClaims {
        sub: sub.to_string(),
        email: email.map(str::to_string),
        exp,
        iat: now(),
    };

    encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(SIGNING_KEY),
    )
    .expect("Failed to create JWT")
}

#[test]
fn test_provider_token_accepted() {
    let token = provider_token("uid-123", Some("Ana@X.com"), now() + 3600);

    let identity = verify_jwt(&token, SIGNING_KEY).expect("Provider token should verify");
    assert_eq!(identity.uid, "uid-123");
    assert_eq!(identity.normalized_email().as_deref(), Some("ana@x.com"));
    assert!(identity.display_name.is_none());
}

#[test]
fn test_token_without_email() {
    let token = provider_token("uid-123", None, now() + 3600);

    let identity = verify_jwt(&token, SIGNING_KEY).unwrap();
    assert!(identity.email.is_none());
    assert!(identity.normalized_email().is_none());
}

#[test]
fn test_expired_token_rejected() {
    let token = provider_token("uid-123", Some("a@x.com"), now() - 3600);

    assert!(matches!(
        verify_jwt(&token, SIGNING_KEY),
        Err(AppError::InvalidToken)
    ));
}

#[test]
fn test_created_token_decodes_as_provider_claims() {
    let identity = Identity::new("uid-9", Some("m@x.com"));
    let token = create_jwt(&identity, SIGNING_KEY).unwrap();

    let key = DecodingKey::from_secret(SIGNING_KEY);
    let validation = Validation::new(Algorithm::HS256);
    let token_data = decode::<ProviderClaims>(&token, &key, &validation)
        .expect("Failed to decode JWT - check Claims struct compatibility");

    assert_eq!(token_data.claims.sub, "uid-9");
    assert_eq!(token_data.claims.email.as_deref(), Some("m@x.com"));
    assert!(token_data.claims.exp > token_data.claims.iat);
    assert!(token_data.claims.exp > now() + 86400 * 6);
}
