// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Workout plan and daily progress routes for a student.

use crate::error::Result;
use crate::models::{DayProgress, Identity, PlanDetail};
use crate::AppState;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, put},
    Extension, Json, Router,
};
use serde::Deserialize;
use std::sync::Arc;

/// Plan routes (require authentication via JWT).
pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/students/{uid}/plans", get(list_plans))
        .route(
            "/api/students/{uid}/plans/{plan_id}",
            put(save_plan).delete(delete_plan),
        )
        .route(
            "/api/students/{uid}/plans/{plan_id}/progress",
            get(get_progress),
        )
        .route(
            "/api/students/{uid}/plans/{plan_id}/progress/{exercise_id}",
            put(set_exercise_done),
        )
}

async fn list_plans(
    State(state): State<Arc<AppState>>,
    Extension(identity): Extension<Identity>,
    Path(uid): Path<String>,
) -> Result<Json<Vec<PlanDetail>>> {
    let actor = state.actor(identity).await;
    Ok(Json(state.access.list_plans(&actor, &uid).await?))
}

async fn save_plan(
    State(state): State<Arc<AppState>>,
    Extension(identity): Extension<Identity>,
    Path((uid, plan_id)): Path<(String, String)>,
    Json(plan): Json<PlanDetail>,
) -> Result<Json<PlanDetail>> {
    let actor = state.actor(identity).await;
    Ok(Json(
        state.access.save_plan(&actor, &uid, &plan_id, plan).await?,
    ))
}

async fn delete_plan(
    State(state): State<Arc<AppState>>,
    Extension(identity): Extension<Identity>,
    Path((uid, plan_id)): Path<(String, String)>,
) -> Result<StatusCode> {
    let actor = state.actor(identity).await;
    state.access.delete_plan(&actor, &uid, &plan_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Debug, Deserialize)]
struct DayQuery {
    /// `YYYY-MM-DD`; today when absent
    day: Option<String>,
}

async fn get_progress(
    State(state): State<Arc<AppState>>,
    Extension(identity): Extension<Identity>,
    Path((uid, plan_id)): Path<(String, String)>,
    Query(query): Query<DayQuery>,
) -> Result<Json<DayProgress>> {
    let actor = state.actor(identity).await;
    Ok(Json(
        state
            .access
            .progress(&actor, &uid, &plan_id, query.day.as_deref())
            .await?,
    ))
}

#[derive(Debug, Deserialize)]
struct ExerciseDoneRequest {
    done: bool,
}

async fn set_exercise_done(
    State(state): State<Arc<AppState>>,
    Extension(identity): Extension<Identity>,
    Path((uid, plan_id, exercise_id)): Path<(String, String, String)>,
    Query(query): Query<DayQuery>,
    Json(request): Json<ExerciseDoneRequest>,
) -> Result<Json<DayProgress>> {
    let actor = state.actor(identity).await;
    Ok(Json(
        state
            .access
            .set_exercise_done(
                &actor,
                &uid,
                &plan_id,
                query.day.as_deref(),
                &exercise_id,
                request.done,
            )
            .await?,
    ))
}
