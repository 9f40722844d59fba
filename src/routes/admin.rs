// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Trainer and master routes.
//!
//! The role layers in `routes/mod.rs` turn away callers early; the access
//! service checks privilege again on the actor's resolved session.

use crate::error::Result;
use crate::models::{CatalogExercise, Identity, Role};
use crate::services::{RosterPage, RosterQuery};
use crate::AppState;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, put},
    Extension, Json, Router,
};
use serde::Deserialize;
use std::sync::Arc;

/// Routes for trainers and masters.
pub fn trainer_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/roster", get(get_roster))
        .route("/api/students/{uid}/trainer", put(assign_trainer))
        .route("/api/catalog", get(list_catalog).post(add_catalog_exercise))
}

/// Routes for masters only.
pub fn master_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/users/{uid}/role", put(change_role))
        .route("/api/users/{uid}", axum::routing::delete(delete_user))
}

async fn get_roster(
    State(state): State<Arc<AppState>>,
    Extension(identity): Extension<Identity>,
    Query(query): Query<RosterQuery>,
) -> Result<Json<RosterPage>> {
    let actor = state.actor(identity).await;
    Ok(Json(state.access.roster(&actor, &query).await?))
}

#[derive(Debug, Deserialize)]
struct AssignTrainerRequest {
    /// `null` clears the assignment
    trainer_id: Option<String>,
}

async fn assign_trainer(
    State(state): State<Arc<AppState>>,
    Extension(identity): Extension<Identity>,
    Path(uid): Path<String>,
    Json(request): Json<AssignTrainerRequest>,
) -> Result<StatusCode> {
    let actor = state.actor(identity).await;
    state
        .access
        .assign_trainer(&actor, &uid, request.trainer_id.as_deref())
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn list_catalog(
    State(state): State<Arc<AppState>>,
    Extension(identity): Extension<Identity>,
) -> Result<Json<Vec<CatalogExercise>>> {
    let actor = state.actor(identity).await;
    Ok(Json(state.access.catalog(&actor).await?))
}

async fn add_catalog_exercise(
    State(state): State<Arc<AppState>>,
    Extension(identity): Extension<Identity>,
    Json(entry): Json<CatalogExercise>,
) -> Result<(StatusCode, Json<CatalogExercise>)> {
    let actor = state.actor(identity).await;
    let entry = state.access.add_catalog_exercise(&actor, entry).await?;
    Ok((StatusCode::CREATED, Json(entry)))
}

#[derive(Debug, Deserialize)]
struct ChangeRoleRequest {
    role: Role,
}

async fn change_role(
    State(state): State<Arc<AppState>>,
    Extension(identity): Extension<Identity>,
    Path(uid): Path<String>,
    Json(request): Json<ChangeRoleRequest>,
) -> Result<StatusCode> {
    let actor = state.actor(identity).await;
    state.access.change_role(&actor, &uid, request.role).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Delete a user's documents. The identity-provider account is untouched.
async fn delete_user(
    State(state): State<Arc<AppState>>,
    Extension(identity): Extension<Identity>,
    Path(uid): Path<String>,
) -> Result<StatusCode> {
    let actor = state.actor(identity).await;
    state.access.delete_user(&actor, &uid).await?;
    Ok(StatusCode::NO_CONTENT)
}
