// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Session aggregation: identity + role + profile as one consistent value.
//!
//! The aggregator is the single writer of the session. Each identity
//! transition opens a new generation: the previous generation's subscriptions
//! are cancelled before the new ones are started, and any late delivery that
//! still carries the old generation number is discarded. The session only
//! becomes `Ready` once both the role and the profile of the current
//! generation have delivered at least once.

use crate::db::collections;
use crate::db::DocumentStore;
use crate::models::{Identity, Profile, Role, RoleDocument, Session, SessionPhase};
use crate::services::role::RoleResolver;
use crate::services::subscription::{watch_document, Subscription};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::sync::{broadcast, watch};

/// Resolve a session once, fetching role and profile concurrently.
///
/// Read failures fall back to `student` and no profile; this never fails.
pub async fn load_session(
    resolver: &RoleResolver,
    store: &dyn DocumentStore,
    identity: Identity,
) -> Session {
    let (resolved, profile) = tokio::join!(
        resolver.resolve(&identity),
        store.get_profile(&identity.uid)
    );

    let profile = settle_profile(&identity, profile);
    Session::ready(identity, resolved.role, profile, resolved.is_master)
}

fn settle_profile(
    identity: &Identity,
    lookup: Result<Option<Profile>, crate::error::AppError>,
) -> Option<Profile> {
    lookup.unwrap_or_else(|e| {
        tracing::warn!(uid = %identity.uid, error = %e, "Profile lookup failed; using empty profile");
        None
    })
}

/// Delivery from one of the current generation's subscriptions.
enum Delivery {
    Role(Role),
    Profile(Option<Profile>),
}

/// Mutable state of the current generation.
struct Generation {
    id: u64,
    identity: Option<Identity>,
    is_master: bool,
    /// `None` until the first role delivery
    role: Option<Role>,
    /// `None` until the first profile delivery
    profile: Option<Option<Profile>>,
    subscriptions: Vec<Subscription>,
}

impl Generation {
    fn session(&self, phase: SessionPhase) -> Session {
        Session {
            identity: self.identity.clone(),
            role: self.role,
            profile: self.profile.clone().flatten(),
            is_master: self.is_master,
            phase,
        }
    }

    fn settled(&self) -> bool {
        self.role.is_some() && self.profile.is_some()
    }
}

/// Published sessions buffered per `events()` receiver.
const EVENT_BUFFER: usize = 32;

struct Shared {
    generation: Mutex<Generation>,
    /// Latest session
    tx: watch::Sender<Session>,
    /// Every published session, in order
    events: broadcast::Sender<Session>,
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, Generation> {
        self.generation
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn publish(&self, session: Session) {
        tracing::debug!(uid = ?session.uid(), phase = ?session.phase, "Session published");
        // No receivers is fine.
        let _ = self.events.send(session.clone());
        self.tx.send_replace(session);
    }

    /// Apply a delivery if it belongs to the current generation.
    fn apply(&self, generation: u64, delivery: Delivery) {
        let mut state = self.lock();
        if state.id != generation {
            tracing::debug!(
                generation,
                current = state.id,
                "Discarding delivery from a stale generation"
            );
            return;
        }

        let was_ready = state.settled();
        let changed = match delivery {
            Delivery::Role(role) => state.role.replace(role) != Some(role),
            Delivery::Profile(profile) => {
                let profile = Some(profile);
                let changed = state.profile != profile;
                state.profile = profile;
                changed
            }
        };

        if was_ready && changed {
            // Live change after readiness: pass through resolving so guards re-evaluate.
            self.publish(state.session(SessionPhase::ResolvingSessionData));
        }

        let phase = if state.settled() {
            SessionPhase::Ready
        } else {
            SessionPhase::ResolvingSessionData
        };
        self.publish(state.session(phase));
    }
}

/// Long-lived session owner for one signed-in context (a browser tab, a stream).
pub struct SessionAggregator {
    resolver: RoleResolver,
    poll_interval: Option<Duration>,
    shared: Arc<Shared>,
}

impl SessionAggregator {
    pub fn new(resolver: RoleResolver, poll_interval: Option<Duration>) -> Self {
        let (tx, _) = watch::channel(Session::initial());
        let (events, _) = broadcast::channel(EVENT_BUFFER);
        let generation = Generation {
            id: 0,
            identity: None,
            is_master: false,
            role: None,
            profile: None,
            subscriptions: Vec::new(),
        };

        Self {
            resolver,
            poll_interval,
            shared: Arc::new(Shared {
                generation: Mutex::new(generation),
                tx,
                events,
            }),
        }
    }

    /// Current session snapshot.
    pub fn current(&self) -> Session {
        self.shared.tx.borrow().clone()
    }

    /// Receiver of the latest session.
    ///
    /// Sessions published in quick succession coalesce: a reader may see only
    /// the last of them. Use [`events`](Self::events) to observe each one.
    pub fn subscribe(&self) -> watch::Receiver<Session> {
        self.shared.tx.subscribe()
    }

    /// Every session published from now on, in order, including the
    /// `ResolvingSessionData` step between two `Ready` sessions.
    pub fn events(&self) -> broadcast::Receiver<Session> {
        self.shared.events.subscribe()
    }

    /// Number of live document subscriptions held for the current identity.
    pub fn active_subscriptions(&self) -> usize {
        self.shared.lock().subscriptions.len()
    }

    /// Identity-provider callback. `None` means signed out.
    ///
    /// Every call, including a repeat sign-in without a sign-out in between,
    /// tears down the previous generation before anything new is started.
    /// Must be called from within a tokio runtime.
    pub fn on_identity_changed(&self, identity: Option<Identity>) {
        let mut state = self.shared.lock();

        for subscription in state.subscriptions.drain(..) {
            subscription.cancel();
        }
        state.id += 1;
        state.identity = None;
        state.is_master = false;
        state.role = None;
        state.profile = None;

        let Some(identity) = identity else {
            tracing::info!(generation = state.id, "Signed out");
            self.shared.publish(Session::signed_out());
            return;
        };

        tracing::info!(uid = %identity.uid, generation = state.id, "Identity changed");

        state.is_master = self.resolver.is_master(&identity);
        state.identity = Some(identity.clone());
        self.shared
            .publish(state.session(SessionPhase::ResolvingIdentity));
        self.shared
            .publish(state.session(SessionPhase::ResolvingSessionData));

        let generation = state.id;
        state.subscriptions = vec![
            self.watch_role(&identity, generation),
            self.watch_profile(&identity, generation),
        ];
    }

    /// Cancel all subscriptions without publishing. Called on drop.
    pub fn shutdown(&self) {
        let mut state = self.shared.lock();
        let count = state.subscriptions.len();
        for subscription in state.subscriptions.drain(..) {
            subscription.cancel();
        }
        if count > 0 {
            tracing::debug!(count, "Session aggregator shut down");
        }
    }

    fn watch_role(&self, identity: &Identity, generation: u64) -> Subscription {
        let store = self.resolver.store().clone();
        let uid = identity.uid.clone();
        let resolver = self.resolver.clone();
        let owner = identity.clone();
        let shared = self.shared.clone();

        watch_document(
            collections::USER_ROLES,
            &identity.uid,
            self.poll_interval,
            move || {
                let store = store.clone();
                let uid = uid.clone();
                async move { store.get_role_record(&uid).await }
            },
            move |lookup: Result<Option<RoleDocument>, _>| {
                let resolved = resolver.settle(&owner, lookup);
                shared.apply(generation, Delivery::Role(resolved.role));
            },
        )
    }

    fn watch_profile(&self, identity: &Identity, generation: u64) -> Subscription {
        let store = self.resolver.store().clone();
        let uid = identity.uid.clone();
        let owner = identity.clone();
        let shared = self.shared.clone();

        watch_document(
            collections::PROFILES,
            &identity.uid,
            self.poll_interval,
            move || {
                let store = store.clone();
                let uid = uid.clone();
                async move { store.get_profile(&uid).await }
            },
            move |lookup| {
                let profile = settle_profile(&owner, lookup);
                shared.apply(generation, Delivery::Profile(profile));
            },
        )
    }
}

impl Drop for SessionAggregator {
    fn drop(&mut self) {
        self.shutdown();
    }
}
