// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Registration and own-profile routes.

use crate::error::Result;
use crate::models::{Identity, Profile, ProfileUpdate};
use crate::AppState;
use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Extension, Json, Router,
};
use serde::Deserialize;
use std::sync::Arc;

/// Profile routes (require authentication via JWT).
pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/register", post(register))
        .route("/api/profile", get(get_profile).put(update_profile))
}

#[derive(Debug, Deserialize)]
struct RegisterRequest {
    name: String,
}

/// Complete sign-up for a new identity.
async fn register(
    State(state): State<Arc<AppState>>,
    Extension(identity): Extension<Identity>,
    Json(request): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<Profile>)> {
    let profile = state.access.register(&identity, &request.name).await?;
    Ok((StatusCode::CREATED, Json(profile)))
}

/// Own profile, or an empty scaffold for first-time users.
async fn get_profile(
    State(state): State<Arc<AppState>>,
    Extension(identity): Extension<Identity>,
) -> Result<Json<Profile>> {
    Ok(Json(state.access.profile_for(&identity).await?))
}

async fn update_profile(
    State(state): State<Arc<AppState>>,
    Extension(identity): Extension<Identity>,
    Json(update): Json<ProfileUpdate>,
) -> Result<Json<Profile>> {
    Ok(Json(state.access.update_own_profile(&identity, update).await?))
}
