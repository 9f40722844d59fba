// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Route guard: access decisions for application routes.
//!
//! Decisions are pure functions of a [`Session`]. Until the session is
//! settled, every decision is `Pending`, so nothing protected is shown early
//! and nobody is redirected before their role is known.

use crate::models::{Identity, Session};
use crate::services::role::RoleResolver;
use serde::Serialize;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// Access requirement of a route.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
#[serde(rename_all = "snake_case")]
pub enum Requirement {
    /// No requirement beyond a settled session.
    None,
    AuthenticatedOnly,
    TrainerOnly,
    MasterOnly,
}

/// Application routes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
#[serde(rename_all = "snake_case")]
pub enum Route {
    PublicLanding,
    Home,
    StudentHome,
    Timer,
    Profile,
    Biometrics,
    Payments,
    TrainerStudentList,
    TrainerCatalog,
    TrainerWorkouts,
    TrainerRosterManagement,
}

impl Route {
    pub const ALL: [Route; 11] = [
        Route::PublicLanding,
        Route::Home,
        Route::StudentHome,
        Route::Timer,
        Route::Profile,
        Route::Biometrics,
        Route::Payments,
        Route::TrainerStudentList,
        Route::TrainerCatalog,
        Route::TrainerWorkouts,
        Route::TrainerRosterManagement,
    ];

    pub fn path(self) -> &'static str {
        match self {
            Route::PublicLanding => "/",
            Route::Home => "/home",
            Route::StudentHome => "/dashboard",
            Route::Timer => "/timer",
            Route::Profile => "/profile",
            Route::Biometrics => "/ficha-biometrica",
            Route::Payments => "/pagamentos",
            Route::TrainerStudentList => "/admin/alunos",
            Route::TrainerCatalog => "/admin/catalog",
            Route::TrainerWorkouts => "/admin/treinos/{uid}",
            Route::TrainerRosterManagement => "/admin/console",
        }
    }

    pub fn requirement(self) -> Requirement {
        match self {
            Route::PublicLanding => Requirement::None,
            Route::Home
            | Route::StudentHome
            | Route::Timer
            | Route::Profile
            | Route::Biometrics
            | Route::Payments => Requirement::AuthenticatedOnly,
            Route::TrainerStudentList | Route::TrainerCatalog | Route::TrainerWorkouts => {
                Requirement::TrainerOnly
            }
            Route::TrainerRosterManagement => Requirement::MasterOnly,
        }
    }

    /// Match a browser path. Unknown paths fall back to the landing route.
    pub fn from_path(path: &str) -> Route {
        let path = path.split(['?', '#']).next().unwrap_or_default();
        let path = match path.trim_end_matches('/') {
            "" => "/",
            trimmed => trimmed,
        };

        if let Some(rest) = path.strip_prefix("/admin/treinos/") {
            if !rest.is_empty() && !rest.contains('/') {
                return Route::TrainerWorkouts;
            }
        }

        Route::ALL
            .into_iter()
            .find(|route| route.path() == path)
            .unwrap_or(Route::PublicLanding)
    }
}

/// Outcome of a guard check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
#[serde(tag = "decision", content = "target", rename_all = "snake_case")]
pub enum Decision {
    /// Session still resolving: show "checking access", decide nothing.
    Pending,
    Allow,
    RedirectTo(Route),
}

/// Decide whether `session` may enter a route with `requirement`.
pub fn authorize(session: &Session, requirement: Requirement) -> Decision {
    if !session.is_ready() {
        return Decision::Pending;
    }

    let signed_in = session.identity.is_some();

    match requirement {
        Requirement::None => Decision::Allow,
        Requirement::AuthenticatedOnly if signed_in => Decision::Allow,
        Requirement::AuthenticatedOnly => Decision::RedirectTo(Route::PublicLanding),
        Requirement::TrainerOnly if session.has_trainer_access() => Decision::Allow,
        Requirement::TrainerOnly if signed_in => Decision::RedirectTo(Route::StudentHome),
        Requirement::TrainerOnly => Decision::RedirectTo(Route::PublicLanding),
        Requirement::MasterOnly if session.is_master => Decision::Allow,
        Requirement::MasterOnly => Decision::RedirectTo(Route::PublicLanding),
    }
}

pub fn authorize_route(session: &Session, route: Route) -> Decision {
    authorize(session, route.requirement())
}

/// Identity-only decision for requirements that master authority satisfies.
///
/// Returns `Some` when the allow-list alone decides, so no role record has to
/// be read. `None` means the caller must resolve the full role.
pub fn short_circuit(
    resolver: &RoleResolver,
    identity: &Identity,
    requirement: Requirement,
) -> Option<Decision> {
    let is_master = resolver.is_master(identity);
    match requirement {
        Requirement::None | Requirement::AuthenticatedOnly => Some(Decision::Allow),
        Requirement::MasterOnly if is_master => Some(Decision::Allow),
        Requirement::MasterOnly => Some(Decision::RedirectTo(Route::PublicLanding)),
        Requirement::TrainerOnly if is_master => Some(Decision::Allow),
        Requirement::TrainerOnly => None,
    }
}

/// Where to send a user right after sign-in.
pub fn post_login_route(session: &Session) -> Route {
    if session.has_trainer_access() {
        Route::TrainerStudentList
    } else {
        Route::StudentHome
    }
}

/// Menu entries visible to the session, in display order.
pub fn navigation(session: &Session) -> Vec<Route> {
    if session.identity.is_none() || !session.is_ready() {
        return Vec::new();
    }

    let mut items = vec![
        Route::Home,
        Route::Profile,
        Route::StudentHome,
        Route::Biometrics,
        Route::Payments,
    ];
    if session.has_trainer_access() {
        items.extend([Route::TrainerStudentList, Route::TrainerCatalog]);
    }
    if session.is_master {
        items.push(Route::TrainerRosterManagement);
    }
    items
}
