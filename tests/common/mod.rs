// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use axum::body::Body;
use axum::http::{header, Request};
use std::sync::Arc;
use webgym::config::Config;
use webgym::db::{FirestoreDb, MemoryStore};
use webgym::middleware::auth::create_jwt;
use webgym::models::{Identity, Profile};
use webgym::routes::create_router;
use webgym::services::RoleResolver;
use webgym::AppState;

/// Email on the test master allow-list (see `Config::test_default`).
#[allow(dead_code)]
pub const MASTER_EMAIL: &str = "admin@x.com";

/// Check if emulator is available via environment variable.
#[allow(dead_code)]
pub fn emulator_available() -> bool {
    std::env::var("FIRESTORE_EMULATOR_HOST").is_ok()
}

/// Skip test with message if emulator not available.
#[macro_export]
macro_rules! require_emulator {
    () => {
        if !crate::common::emulator_available() {
            eprintln!("⚠️  Skipping: FIRESTORE_EMULATOR_HOST not set");
            return;
        }
    };
}

/// Create a test database connection.
#[allow(dead_code)]
pub async fn test_db() -> FirestoreDb {
    FirestoreDb::new("test-project")
        .await
        .expect("Failed to connect to Firestore emulator")
}

/// Role resolver over an in-memory store with the test master list.
#[allow(dead_code)]
pub fn test_resolver(store: Arc<MemoryStore>) -> RoleResolver {
    RoleResolver::new(Config::test_default().master_emails, store)
}

/// Create a test app over an in-memory store.
/// Returns the router, the shared state and the store for seeding.
#[allow(dead_code)]
pub fn create_test_app() -> (axum::Router, Arc<AppState>, Arc<MemoryStore>) {
    let store = Arc::new(MemoryStore::new());
    let state = Arc::new(AppState::new(Config::test_default(), store.clone()));
    (create_router(state.clone()), state, store)
}

#[allow(dead_code)]
pub fn identity(uid: &str, email: &str) -> Identity {
    Identity::new(uid, Some(email))
}

#[allow(dead_code)]
pub fn bearer(identity: &Identity) -> String {
    let key = Config::test_default().jwt_signing_key;
    format!("Bearer {}", create_jwt(identity, &key).expect("Failed to create JWT"))
}

/// Build a request authenticated as `identity`, with an optional JSON body.
#[allow(dead_code)]
pub fn authed_request(
    method: &str,
    uri: &str,
    identity: &Identity,
    body: Option<serde_json::Value>,
) -> Request<Body> {
    let builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::AUTHORIZATION, bearer(identity));

    match body {
        Some(json) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

/// Profile with a name and email, as registration would write it.
#[allow(dead_code)]
pub fn profile(uid: &str, name: &str, email: &str) -> Profile {
    let mut profile = Profile {
        uid: Some(uid.to_string()),
        name: name.to_string(),
        email: email.to_string(),
        ..Default::default()
    };
    profile.normalize();
    profile
}

#[allow(dead_code)]
pub async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}
