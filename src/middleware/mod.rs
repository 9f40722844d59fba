// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Middleware modules (authentication, role gates, security headers).

pub mod auth;
pub mod guard;
pub mod security;

pub use auth::require_auth;
pub use guard::{require_master, require_trainer};
