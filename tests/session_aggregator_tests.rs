// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Session aggregator tests: readiness, live updates and identity switches.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, watch};
use webgym::db::MemoryStore;
use webgym::models::{Role, Session, SessionPhase};
use webgym::services::{authorize, Decision, Requirement, Route, SessionAggregator};

mod common;
use common::{identity, profile, test_resolver, MASTER_EMAIL};

const POLL: Duration = Duration::from_millis(10);

fn aggregator(store: &Arc<MemoryStore>) -> SessionAggregator {
    SessionAggregator::new(test_resolver(store.clone()), Some(POLL))
}

/// Wait until the published session satisfies `predicate`.
async fn wait_until(
    rx: &mut watch::Receiver<Session>,
    predicate: impl FnMut(&Session) -> bool,
) -> Session {
    tokio::time::timeout(Duration::from_secs(2), rx.wait_for(predicate))
        .await
        .expect("Timed out waiting for session")
        .expect("Session channel closed")
        .clone()
}

#[tokio::test]
async fn test_starts_resolving_identity() {
    let store = Arc::new(MemoryStore::new());
    let aggregator = aggregator(&store);

    let session = aggregator.current();
    assert_eq!(session.phase, SessionPhase::ResolvingIdentity);
    assert!(session.identity.is_none());
    assert_eq!(authorize(&session, Requirement::None), Decision::Pending);
}

#[tokio::test]
async fn test_ready_after_role_and_profile() {
    let store = Arc::new(MemoryStore::new());
    store.put_role("u1", "trainer");
    store.put_profile("u1", profile("u1", "Ana", "ana@x.com"));
    store.set_read_delay("u1", Duration::from_millis(100));

    let aggregator = aggregator(&store);
    let mut rx = aggregator.subscribe();
    aggregator.on_identity_changed(Some(identity("u1", "ana@x.com")));

    let resolving = aggregator.current();
    assert_eq!(resolving.phase, SessionPhase::ResolvingSessionData);
    assert_eq!(resolving.uid(), Some("u1"));
    assert_eq!(authorize(&resolving, Requirement::TrainerOnly), Decision::Pending);

    let ready = wait_until(&mut rx, Session::is_ready).await;
    assert_eq!(ready.role, Some(Role::Trainer));
    assert_eq!(ready.profile.as_ref().map(|p| p.name.as_str()), Some("Ana"));
    assert_eq!(authorize(&ready, Requirement::TrainerOnly), Decision::Allow);
    assert_eq!(aggregator.active_subscriptions(), 2);
}

#[tokio::test]
async fn test_master_flag_published_before_reads_finish() {
    let store = Arc::new(MemoryStore::new());
    store.set_read_delay("m1", Duration::from_millis(200));

    let aggregator = aggregator(&store);
    aggregator.on_identity_changed(Some(identity("m1", MASTER_EMAIL)));

    let session = aggregator.current();
    assert!(session.is_master);
    assert!(!session.is_ready());
}

#[tokio::test]
async fn test_backend_failure_settles_as_student() {
    let store = Arc::new(MemoryStore::new());
    store.put_role("u1", "trainer");
    store.set_fail_reads(true);

    let aggregator = aggregator(&store);
    let mut rx = aggregator.subscribe();
    aggregator.on_identity_changed(Some(identity("u1", "ana@x.com")));

    let ready = wait_until(&mut rx, Session::is_ready).await;
    assert_eq!(ready.role, Some(Role::Student));
    assert!(ready.profile.is_none());
    assert_eq!(
        authorize(&ready, Requirement::TrainerOnly),
        Decision::RedirectTo(Route::StudentHome)
    );
}

#[tokio::test]
async fn test_master_ready_despite_backend_failure() {
    let store = Arc::new(MemoryStore::new());
    store.set_fail_reads(true);

    let aggregator = aggregator(&store);
    let mut rx = aggregator.subscribe();
    aggregator.on_identity_changed(Some(identity("m1", MASTER_EMAIL)));

    let ready = wait_until(&mut rx, Session::is_ready).await;
    assert!(ready.is_master);
    assert_eq!(authorize(&ready, Requirement::MasterOnly), Decision::Allow);
}

#[tokio::test]
async fn test_live_role_change() {
    let store = Arc::new(MemoryStore::new());
    store.put_profile("u1", profile("u1", "Ana", "ana@x.com"));

    let aggregator = aggregator(&store);
    let mut rx = aggregator.subscribe();
    aggregator.on_identity_changed(Some(identity("u1", "ana@x.com")));

    let ready = wait_until(&mut rx, Session::is_ready).await;
    assert_eq!(ready.role, Some(Role::Student));

    store.put_role("u1", "trainer");
    let promoted = wait_until(&mut rx, |s| s.is_ready() && s.role == Some(Role::Trainer)).await;
    assert_eq!(authorize(&promoted, Requirement::TrainerOnly), Decision::Allow);

    store.remove_role("u1");
    let demoted = wait_until(&mut rx, |s| s.is_ready() && s.role == Some(Role::Student)).await;
    assert_eq!(
        authorize(&demoted, Requirement::TrainerOnly),
        Decision::RedirectTo(Route::StudentHome)
    );
}

/// Next published session from an ordered event receiver.
async fn next_event(events: &mut broadcast::Receiver<Session>) -> Session {
    tokio::time::timeout(Duration::from_secs(2), events.recv())
        .await
        .expect("Timed out waiting for session event")
        .expect("Session event channel closed")
}

#[tokio::test]
async fn test_events_keep_resolving_step_between_ready_sessions() {
    let store = Arc::new(MemoryStore::new());
    store.put_profile("u1", profile("u1", "Ana", "ana@x.com"));

    let aggregator = aggregator(&store);
    let mut events = aggregator.events();
    aggregator.on_identity_changed(Some(identity("u1", "ana@x.com")));

    let first = next_event(&mut events).await;
    assert_eq!(first.phase, SessionPhase::ResolvingIdentity);
    loop {
        if next_event(&mut events).await.is_ready() {
            break;
        }
    }

    store.put_role("u1", "trainer");
    let resolving = next_event(&mut events).await;
    assert_eq!(resolving.phase, SessionPhase::ResolvingSessionData);
    assert_eq!(resolving.role, Some(Role::Trainer));
    assert_eq!(authorize(&resolving, Requirement::TrainerOnly), Decision::Pending);

    let ready = next_event(&mut events).await;
    assert_eq!(ready.phase, SessionPhase::Ready);
    assert_eq!(ready.role, Some(Role::Trainer));
}

#[tokio::test]
async fn test_live_profile_change() {
    let store = Arc::new(MemoryStore::new());
    let aggregator = aggregator(&store);
    let mut rx = aggregator.subscribe();
    aggregator.on_identity_changed(Some(identity("u1", "ana@x.com")));

    let ready = wait_until(&mut rx, Session::is_ready).await;
    assert!(ready.profile.is_none());
    assert_eq!(ready.display_name(), "ana@x.com");

    store.put_profile("u1", profile("u1", "Ana Souza", "ana@x.com"));
    let updated = wait_until(&mut rx, |s| s.is_ready() && s.profile.is_some()).await;
    assert_eq!(updated.display_name(), "Ana Souza");
}

#[tokio::test]
async fn test_account_switch_leaves_nothing_of_previous_user() {
    let store = Arc::new(MemoryStore::new());
    store.put_role("a", "trainer");
    store.put_profile("a", profile("a", "Alice", "alice@x.com"));
    store.put_profile("b", profile("b", "Bob", "bob@x.com"));
    // A's reads are still in flight when B signs in
    store.set_read_delay("a", Duration::from_millis(150));

    let aggregator = aggregator(&store);
    let mut rx = aggregator.subscribe();
    aggregator.on_identity_changed(Some(identity("a", "alice@x.com")));
    aggregator.on_identity_changed(Some(identity("b", "bob@x.com")));
    assert_eq!(aggregator.active_subscriptions(), 2);

    let ready = wait_until(&mut rx, Session::is_ready).await;
    assert_eq!(ready.uid(), Some("b"));
    assert_eq!(ready.role, Some(Role::Student));
    assert_eq!(ready.profile.as_ref().map(|p| p.name.as_str()), Some("Bob"));

    // Well past A's read delay: nothing from A may surface
    tokio::time::sleep(Duration::from_millis(300)).await;
    let settled = aggregator.current();
    assert_eq!(settled, ready);
    assert_eq!(settled.uid(), Some("b"));
    assert_ne!(settled.role, Some(Role::Trainer));
}

#[tokio::test]
async fn test_sign_out_resets_session() {
    let store = Arc::new(MemoryStore::new());
    store.put_role("u1", "trainer");

    let aggregator = aggregator(&store);
    let mut rx = aggregator.subscribe();
    aggregator.on_identity_changed(Some(identity("u1", "ana@x.com")));
    wait_until(&mut rx, Session::is_ready).await;

    aggregator.on_identity_changed(None);

    let session = aggregator.current();
    assert_eq!(session, Session::signed_out());
    assert!(session.identity.is_none() && session.role.is_none() && session.profile.is_none());
    assert!(session.is_ready());
    assert_eq!(aggregator.active_subscriptions(), 0);
    assert_eq!(
        authorize(&session, Requirement::AuthenticatedOnly),
        Decision::RedirectTo(Route::PublicLanding)
    );

    // A later role change for the signed-out user is not observed
    store.put_role("u1", "student");
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(aggregator.current(), Session::signed_out());
}

#[tokio::test]
async fn test_drop_cancels_subscriptions() {
    let store = Arc::new(MemoryStore::new());
    let aggregator = aggregator(&store);
    aggregator.on_identity_changed(Some(identity("u1", "ana@x.com")));

    tokio::time::sleep(Duration::from_millis(50)).await;
    drop(aggregator);
    tokio::time::sleep(Duration::from_millis(20)).await;

    let reads = store.role_reads();
    tokio::time::sleep(Duration::from_millis(60)).await;
    assert_eq!(store.role_reads(), reads);
}
