// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! WebGym: session and access control for a personal-training app.
//!
//! Students and trainers sign in through an external identity provider. This
//! crate resolves each identity to a role (trainer, student, plus master
//! authority from a static allow-list), keeps a live session of identity,
//! role and profile, gates routes on it, and serves the profile, roster and
//! workout-plan API.

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;

use config::Config;
use db::DocumentStore;
use models::{Identity, Session};
use services::{AccessService, RoleResolver};
use std::sync::Arc;

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub db: Arc<dyn DocumentStore>,
    pub roles: RoleResolver,
    pub access: AccessService,
}

impl AppState {
    pub fn new(config: Config, db: Arc<dyn DocumentStore>) -> Self {
        let roles = RoleResolver::new(config.master_emails.clone(), db.clone());
        let access = AccessService::new(roles.clone());
        Self {
            config,
            db,
            roles,
            access,
        }
    }

    /// Session of the acting identity, for privilege checks. Skips the profile.
    pub async fn actor(&self, identity: Identity) -> Session {
        let resolved = self.roles.resolve(&identity).await;
        Session::ready(identity, resolved.role, None, resolved.is_master)
    }
}
