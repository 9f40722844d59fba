// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Role-gated route layers.
//!
//! Must be layered inside [`require_auth`](super::auth::require_auth), which
//! puts the [`Identity`] into the request extensions.

use crate::error::AppError;
use crate::models::{Identity, Session};
use crate::services::guard::{self, Decision, Requirement};
use crate::AppState;
use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use std::sync::Arc;

/// Allow trainers and masters.
pub async fn require_trainer(
    State(state): State<Arc<AppState>>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let identity = request.extensions().get::<Identity>().cloned();
    enforce(&state, identity, Requirement::TrainerOnly).await?;
    Ok(next.run(request).await)
}

/// Allow masters only.
pub async fn require_master(
    State(state): State<Arc<AppState>>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let identity = request.extensions().get::<Identity>().cloned();
    enforce(&state, identity, Requirement::MasterOnly).await?;
    Ok(next.run(request).await)
}

async fn enforce(
    state: &AppState,
    identity: Option<Identity>,
    requirement: Requirement,
) -> Result<(), AppError> {
    let identity = identity.ok_or(AppError::Unauthorized)?;

    let decision = match guard::short_circuit(&state.roles, &identity, requirement) {
        Some(decision) => decision,
        None => {
            let resolved = state.roles.resolve(&identity).await;
            let session = Session::ready(identity.clone(), resolved.role, None, resolved.is_master);
            guard::authorize(&session, requirement)
        }
    };

    match decision {
        Decision::Allow => Ok(()),
        Decision::RedirectTo(route) => {
            tracing::info!(uid = %identity.uid, ?requirement, "Access denied");
            Err(AppError::Forbidden {
                reason: format!("{:?} access required", requirement),
                redirect_to: Some(route.path()),
            })
        }
        Decision::Pending => Err(AppError::forbidden("Access check did not settle")),
    }
}
