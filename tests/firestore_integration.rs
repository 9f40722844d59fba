// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Firestore integration tests.
//!
//! These tests require the Firestore emulator to be running
//! (FIRESTORE_EMULATOR_HOST set); otherwise they are skipped.

use webgym::db::DocumentStore;
use webgym::models::{CatalogExercise, Exercise, Profile, Progress, Role, WorkoutPlan};

mod common;
use common::{profile, test_db};

/// Generate a unique uid for test isolation.
fn unique_uid(prefix: &str) -> String {
    use std::time::{SystemTime, UNIX_EPOCH};
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    format!("{}-{}", prefix, nanos)
}

// ═══════════════════════════════════════════════════════════════════════════
// ROLE TESTS
// ═══════════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn test_role_record_roundtrip() {
    require_emulator!();
    let db = test_db().await;
    let uid = unique_uid("role");

    assert!(db.get_role_record(&uid).await.unwrap().is_none());

    db.set_role(&uid, Role::Trainer).await.unwrap();
    let record = db.get_role_record(&uid).await.unwrap().unwrap();
    assert_eq!(record.role, "trainer");
    assert_eq!(record.uid.as_deref(), Some(uid.as_str()));

    let listed = db.list_role_records().await.unwrap();
    assert!(listed.iter().any(|doc| doc.uid.as_deref() == Some(uid.as_str())));
}

// ═══════════════════════════════════════════════════════════════════════════
// PROFILE TESTS
// ═══════════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn test_owner_merge_keeps_trainer_link() {
    require_emulator!();
    let db = test_db().await;
    let uid = unique_uid("profile");

    db.merge_profile(
        &uid,
        &profile(&uid, "Bia", "bia@x.com"),
        Profile::REGISTRATION_FIELDS,
    )
    .await
    .unwrap();
    db.set_trainer_id(&uid, Some("t1")).await.unwrap();

    let update = profile(&uid, "Beatriz", "bia@x.com");
    db.merge_profile(&uid, &update, Profile::OWNER_FIELDS)
        .await
        .unwrap();

    let stored = db.get_profile(&uid).await.unwrap().unwrap();
    assert_eq!(stored.name, "Beatriz");
    assert_eq!(stored.assigned_trainer(), Some("t1"));
    assert_eq!(stored.owner_uid(), Some(uid.as_str()));

    db.set_trainer_id(&uid, None).await.unwrap();
    let stored = db.get_profile(&uid).await.unwrap().unwrap();
    assert_eq!(stored.assigned_trainer(), None);
}

#[tokio::test]
async fn test_delete_user_documents() {
    require_emulator!();
    let db = test_db().await;
    let uid = unique_uid("delete");

    db.merge_profile(
        &uid,
        &profile(&uid, "Temp", "temp@x.com"),
        Profile::REGISTRATION_FIELDS,
    )
    .await
    .unwrap();
    db.set_role(&uid, Role::Student).await.unwrap();

    db.delete_user_documents(&uid).await.unwrap();
    assert!(db.get_profile(&uid).await.unwrap().is_none());
    assert!(db.get_role_record(&uid).await.unwrap().is_none());
}

// ═══════════════════════════════════════════════════════════════════════════
// WORKOUT PLAN TESTS
// ═══════════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn test_workout_plan_crud() {
    require_emulator!();
    let db = test_db().await;
    let uid = unique_uid("plans");

    let plan = WorkoutPlan {
        title: "Treino A".to_string(),
        order: 1,
        ..Default::default()
    };
    let exercise = |name: &str, order: u32| Exercise {
        name: name.to_string(),
        series: "3x12".to_string(),
        video_id: "abc".to_string(),
        muscle_group: "Peito".to_string(),
        order,
        ..Default::default()
    };

    db.set_workout_plan(&uid, "treino-a", &plan).await.unwrap();
    db.set_exercise(&uid, "treino-a", "e2", &exercise("Crucifixo", 2))
        .await
        .unwrap();
    db.set_exercise(&uid, "treino-a", "e1", &exercise("Supino", 1))
        .await
        .unwrap();

    let plans = db.list_workout_plans(&uid).await.unwrap();
    assert_eq!(plans.len(), 1);
    assert_eq!(plans[0].id.as_deref(), Some("treino-a"));
    assert_eq!(plans[0].title, "Treino A");

    let exercises = db.list_exercises(&uid, "treino-a").await.unwrap();
    assert_eq!(exercises.len(), 2);
    assert_eq!(exercises[0].name, "Supino");
    assert_eq!(exercises[0].id.as_deref(), Some("e1"));

    db.delete_workout_plan(&uid, "treino-a").await.unwrap();
    assert!(db.list_workout_plans(&uid).await.unwrap().is_empty());
    assert!(db.list_exercises(&uid, "treino-a").await.unwrap().is_empty());
}

#[tokio::test]
async fn test_progress_roundtrip() {
    require_emulator!();
    let db = test_db().await;
    let uid = unique_uid("progress");

    assert!(db
        .get_progress(&uid, "treino-a", "2026-03-01")
        .await
        .unwrap()
        .is_none());

    let progress = Progress {
        done: vec!["e1".to_string()],
    };
    db.set_progress(&uid, "treino-a", "2026-03-01", &progress)
        .await
        .unwrap();
    let stored = db
        .get_progress(&uid, "treino-a", "2026-03-01")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.done, vec!["e1".to_string()]);
}

#[tokio::test]
async fn test_catalog_add_and_list() {
    require_emulator!();
    let db = test_db().await;
    let id = unique_uid("catalog");

    let entry = CatalogExercise {
        name: "Puxada".to_string(),
        muscle_group: "Costas".to_string(),
        video_id: "xyz".to_string(),
        ..Default::default()
    };
    db.add_catalog_exercise(&id, &entry).await.unwrap();

    let listed = db.list_catalog().await.unwrap();
    let stored = listed
        .iter()
        .find(|e| e.id.as_deref() == Some(id.as_str()))
        .unwrap();
    assert_eq!(stored.name, "Puxada");
}
