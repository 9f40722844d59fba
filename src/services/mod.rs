// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - business logic layer.

pub mod access;
pub mod guard;
pub mod role;
pub mod session;
pub mod subscription;

pub use access::{AccessService, RosterEntry, RosterPage, RosterQuery, RosterTab};
pub use guard::{authorize, navigation, post_login_route, Decision, Requirement, Route};
pub use role::{ResolvedRole, RoleResolver, RoleSource};
pub use session::{load_session, SessionAggregator};
pub use subscription::{watch_document, Subscription};
