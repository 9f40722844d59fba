// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Session routes: the resolved session, its live stream, and route checks.

use crate::models::{Identity, LoadingState, Session};
use crate::services::guard::{self, Decision, Requirement, Route};
use crate::services::{load_session, SessionAggregator};
use crate::AppState;
use axum::{
    extract::{Query, State},
    response::sse::{Event, KeepAlive, Sse},
    routing::get,
    Extension, Json, Router,
};
use futures_util::stream::{self, Stream};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::broadcast::error::RecvError;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// Session routes (require authentication via JWT).
pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/session", get(get_session))
        .route("/api/session/stream", get(stream_session))
        .route("/api/access", get(check_access))
}

/// Session plus the values the UI derives from it.
#[derive(Debug, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct SessionResponse {
    pub session: Session,
    pub loading_state: LoadingState,
    pub display_name: String,
    pub avatar_url: Option<String>,
    pub navigation: Vec<Route>,
    /// Landing route after sign-in; absent until the session is ready.
    pub home: Option<Route>,
}

impl From<Session> for SessionResponse {
    fn from(session: Session) -> Self {
        let home = session
            .is_ready()
            .then(|| guard::post_login_route(&session));
        Self {
            loading_state: session.loading_state(),
            display_name: session.display_name(),
            avatar_url: session.avatar_url(),
            navigation: guard::navigation(&session),
            home,
            session,
        }
    }
}

/// Resolve the caller's session once.
async fn get_session(
    State(state): State<Arc<AppState>>,
    Extension(identity): Extension<Identity>,
) -> Json<SessionResponse> {
    let session = load_session(&state.roles, state.db.as_ref(), identity).await;
    Json(session.into())
}

/// Stream every session the caller's aggregator publishes, in order.
///
/// The aggregator lives as long as the stream; a client disconnect drops it,
/// which cancels its document subscriptions.
async fn stream_session(
    State(state): State<Arc<AppState>>,
    Extension(identity): Extension<Identity>,
) -> Sse<impl Stream<Item = std::result::Result<Event, axum::Error>>> {
    tracing::info!(uid = %identity.uid, "Session stream opened");

    let aggregator = SessionAggregator::new(state.roles.clone(), state.config.session_poll_interval);
    let sessions = aggregator.events();
    aggregator.on_identity_changed(Some(identity));

    let events = stream::unfold((aggregator, sessions), |(aggregator, mut sessions)| async move {
        loop {
            match sessions.recv().await {
                Ok(session) => {
                    let event = Event::default()
                        .event("session")
                        .json_data(SessionResponse::from(session));
                    return Some((event, (aggregator, sessions)));
                }
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "Session stream lagged; skipping ahead");
                }
                Err(RecvError::Closed) => return None,
            }
        }
    });

    Sse::new(events).keep_alive(KeepAlive::default())
}

#[derive(Debug, Deserialize)]
struct AccessQuery {
    path: String,
}

#[derive(Debug, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct AccessResponse {
    pub route: Route,
    pub requirement: Requirement,
    #[serde(flatten)]
    pub decision: Decision,
}

/// Guard decision for a browser path.
async fn check_access(
    State(state): State<Arc<AppState>>,
    Extension(identity): Extension<Identity>,
    Query(query): Query<AccessQuery>,
) -> Json<AccessResponse> {
    let route = Route::from_path(&query.path);
    let requirement = route.requirement();

    let decision = match guard::short_circuit(&state.roles, &identity, requirement) {
        Some(decision) => decision,
        None => guard::authorize(&state.actor(identity).await, requirement),
    };

    Json(AccessResponse {
        route,
        requirement,
        decision,
    })
}
