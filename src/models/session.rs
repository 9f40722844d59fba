// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Aggregated session value consumed by route guards and menus.

use crate::models::{Identity, Profile, Role};
use serde::Serialize;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// Where the session aggregator is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
#[serde(rename_all = "snake_case")]
pub enum SessionPhase {
    SignedOut,
    ResolvingIdentity,
    ResolvingSessionData,
    Ready,
}

/// Coarse loading flag derived from the phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
#[serde(rename_all = "snake_case")]
pub enum LoadingState {
    Loading,
    Ready,
}

/// Immutable snapshot of identity + role + profile.
///
/// Built only by the session aggregator (or `load_session`); consumers read it.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct Session {
    pub identity: Option<Identity>,
    pub role: Option<Role>,
    pub profile: Option<Profile>,
    pub is_master: bool,
    pub phase: SessionPhase,
}

impl Session {
    /// Nothing known yet: waiting for the identity provider's first callback.
    pub fn initial() -> Self {
        Self {
            identity: None,
            role: None,
            profile: None,
            is_master: false,
            phase: SessionPhase::ResolvingIdentity,
        }
    }

    pub fn signed_out() -> Self {
        Self {
            phase: SessionPhase::SignedOut,
            ..Self::initial()
        }
    }

    /// A fully resolved session.
    pub fn ready(identity: Identity, role: Role, profile: Option<Profile>, is_master: bool) -> Self {
        Self {
            identity: Some(identity),
            role: Some(role),
            profile,
            is_master,
            phase: SessionPhase::Ready,
        }
    }

    /// Signed-out counts as settled: there is nothing left to resolve.
    pub fn loading_state(&self) -> LoadingState {
        match self.phase {
            SessionPhase::SignedOut | SessionPhase::Ready => LoadingState::Ready,
            SessionPhase::ResolvingIdentity | SessionPhase::ResolvingSessionData => {
                LoadingState::Loading
            }
        }
    }

    pub fn is_ready(&self) -> bool {
        self.loading_state() == LoadingState::Ready
    }

    pub fn uid(&self) -> Option<&str> {
        self.identity.as_ref().map(|identity| identity.uid.as_str())
    }

    pub fn is_trainer(&self) -> bool {
        self.role == Some(Role::Trainer)
    }

    /// Trainer role or master authority.
    pub fn has_trainer_access(&self) -> bool {
        self.is_trainer() || self.is_master
    }

    /// Name shown in menus and greetings.
    pub fn display_name(&self) -> String {
        let profile_name = self
            .profile
            .as_ref()
            .map(|p| p.name.trim())
            .filter(|name| !name.is_empty());
        let identity = self.identity.as_ref();

        profile_name
            .map(str::to_string)
            .or_else(|| identity.and_then(|i| i.display_name.clone()))
            .or_else(|| identity.and_then(|i| i.email.clone()))
            .unwrap_or_else(|| "Usuário".to_string())
    }

    /// Profile photo, else a generated avatar from the email.
    pub fn avatar_url(&self) -> Option<String> {
        if let Some(url) = self
            .profile
            .as_ref()
            .and_then(|p| p.photo_url.clone())
            .filter(|url| !url.is_empty())
        {
            return Some(url);
        }

        let email = self.identity.as_ref()?.email.as_deref()?;
        Some(format!(
            "https://ui-avatars.com/api/?name={}&background=4f46e5&color=fff",
            urlencoding::encode(email)
        ))
    }
}
