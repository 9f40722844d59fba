// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! In-memory document store.
//!
//! Mirrors the Firestore merge-write semantics closely enough for tests and
//! local runs without the emulator. Reads can be made to fail or stall per uid
//! to exercise the fail-open and stale-subscription paths.

use crate::db::DocumentStore;
use crate::error::AppError;
use crate::models::{CatalogExercise, Exercise, Profile, Progress, Role, RoleDocument, WorkoutPlan};
use async_trait::async_trait;
use dashmap::DashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

#[derive(Default)]
pub struct MemoryStore {
    roles: DashMap<String, RoleDocument>,
    profiles: DashMap<String, Profile>,
    /// Keyed by (student uid, plan id)
    plans: DashMap<(String, String), WorkoutPlan>,
    /// Keyed by (student uid, plan id, exercise id)
    exercises: DashMap<(String, String, String), Exercise>,
    /// Keyed by (student uid, plan id, day)
    progress: DashMap<(String, String, String), Progress>,
    catalog: DashMap<String, CatalogExercise>,
    read_delays: DashMap<String, Duration>,
    fail_reads: AtomicBool,
    fail_writes: AtomicBool,
    role_reads: AtomicUsize,
    profile_reads: AtomicUsize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed or overwrite a raw role value, bypassing authorization.
    pub fn put_role(&self, uid: &str, role: &str) {
        self.roles.insert(
            uid.to_string(),
            RoleDocument {
                uid: None,
                role: role.to_string(),
            },
        );
    }

    /// Raw stored role value, if any.
    pub fn role_value(&self, uid: &str) -> Option<String> {
        self.roles.get(uid).map(|doc| doc.role.clone())
    }

    pub fn remove_role(&self, uid: &str) {
        self.roles.remove(uid);
    }

    /// Seed or overwrite a profile, bypassing authorization.
    pub fn put_profile(&self, uid: &str, profile: Profile) {
        self.profiles.insert(uid.to_string(), profile);
    }

    /// Make every read fail as if the backend were unreachable.
    pub fn set_fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Delay every role/profile read for `uid`.
    pub fn set_read_delay(&self, uid: &str, delay: Duration) {
        self.read_delays.insert(uid.to_string(), delay);
    }

    /// Number of role record reads served so far.
    pub fn role_reads(&self) -> usize {
        self.role_reads.load(Ordering::SeqCst)
    }

    pub fn profile_reads(&self) -> usize {
        self.profile_reads.load(Ordering::SeqCst)
    }

    async fn before_read(&self, uid: &str) -> Result<(), AppError> {
        let delay = self.read_delays.get(uid).map(|d| *d);
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(AppError::Database("backend unavailable".to_string()));
        }
        Ok(())
    }

    fn before_write(&self) -> Result<(), AppError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(AppError::Database("permission denied".to_string()));
        }
        Ok(())
    }
}

/// Copy the named wire fields of `update` onto `existing`.
fn merge_fields(existing: &Profile, update: &Profile, fields: &[&str]) -> Result<Profile, AppError> {
    let mut base = serde_json::to_value(existing).map_err(anyhow::Error::from)?;
    let patch = serde_json::to_value(update).map_err(anyhow::Error::from)?;

    if let (Some(base), Some(patch)) = (base.as_object_mut(), patch.as_object()) {
        for field in fields {
            match patch.get(*field) {
                Some(value) => base.insert(field.to_string(), value.clone()),
                None => base.remove(*field),
            };
        }
    }

    let mut merged: Profile = serde_json::from_value(base).map_err(anyhow::Error::from)?;
    merged.doc_id = existing.doc_id.clone();
    Ok(merged)
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn get_role_record(&self, uid: &str) -> Result<Option<RoleDocument>, AppError> {
        self.role_reads.fetch_add(1, Ordering::SeqCst);
        self.before_read(uid).await?;
        Ok(self.roles.get(uid).map(|doc| RoleDocument {
            uid: Some(uid.to_string()),
            role: doc.role.clone(),
        }))
    }

    async fn list_role_records(&self) -> Result<Vec<RoleDocument>, AppError> {
        self.before_read("").await?;
        Ok(self
            .roles
            .iter()
            .map(|entry| RoleDocument {
                uid: Some(entry.key().clone()),
                role: entry.value().role.clone(),
            })
            .collect())
    }

    async fn set_role(&self, uid: &str, role: Role) -> Result<(), AppError> {
        self.before_write()?;
        self.roles.insert(uid.to_string(), RoleDocument::new(role));
        Ok(())
    }

    async fn get_profile(&self, uid: &str) -> Result<Option<Profile>, AppError> {
        self.profile_reads.fetch_add(1, Ordering::SeqCst);
        self.before_read(uid).await?;
        Ok(self.profiles.get(uid).map(|profile| Profile {
            doc_id: Some(uid.to_string()),
            ..profile.clone()
        }))
    }

    async fn list_profiles(&self) -> Result<Vec<Profile>, AppError> {
        self.before_read("").await?;
        Ok(self
            .profiles
            .iter()
            .map(|entry| Profile {
                doc_id: Some(entry.key().clone()),
                ..entry.value().clone()
            })
            .collect())
    }

    async fn merge_profile(
        &self,
        uid: &str,
        profile: &Profile,
        fields: &[&str],
    ) -> Result<(), AppError> {
        self.before_write()?;
        let existing = self
            .profiles
            .get(uid)
            .map(|p| p.clone())
            .unwrap_or_default();
        let merged = merge_fields(&existing, profile, fields)?;
        self.profiles.insert(uid.to_string(), merged);
        Ok(())
    }

    async fn set_trainer_id(&self, uid: &str, trainer_id: Option<&str>) -> Result<(), AppError> {
        self.before_write()?;
        self.profiles.entry(uid.to_string()).or_default().trainer_id =
            trainer_id.map(str::to_string);
        Ok(())
    }

    async fn delete_user_documents(&self, uid: &str) -> Result<(), AppError> {
        self.before_write()?;
        self.profiles.remove(uid);
        self.roles.remove(uid);
        Ok(())
    }

    async fn list_workout_plans(&self, uid: &str) -> Result<Vec<WorkoutPlan>, AppError> {
        self.before_read(uid).await?;
        let mut plans: Vec<WorkoutPlan> = self
            .plans
            .iter()
            .filter(|entry| entry.key().0 == uid)
            .map(|entry| WorkoutPlan {
                id: Some(entry.key().1.clone()),
                ..entry.value().clone()
            })
            .collect();
        plans.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(plans)
    }

    async fn get_workout_plan(
        &self,
        uid: &str,
        plan_id: &str,
    ) -> Result<Option<WorkoutPlan>, AppError> {
        self.before_read(uid).await?;
        Ok(self
            .plans
            .get(&(uid.to_string(), plan_id.to_string()))
            .map(|plan| WorkoutPlan {
                id: Some(plan_id.to_string()),
                ..plan.clone()
            }))
    }

    async fn set_workout_plan(
        &self,
        uid: &str,
        plan_id: &str,
        plan: &WorkoutPlan,
    ) -> Result<(), AppError> {
        self.before_write()?;
        self.plans.insert(
            (uid.to_string(), plan_id.to_string()),
            WorkoutPlan {
                id: None,
                ..plan.clone()
            },
        );
        Ok(())
    }

    async fn delete_workout_plan(&self, uid: &str, plan_id: &str) -> Result<(), AppError> {
        self.before_write()?;
        self.exercises
            .retain(|(owner, plan, _), _| !(owner == uid && plan == plan_id));
        self.plans.remove(&(uid.to_string(), plan_id.to_string()));
        Ok(())
    }

    async fn list_exercises(&self, uid: &str, plan_id: &str) -> Result<Vec<Exercise>, AppError> {
        self.before_read(uid).await?;
        let mut exercises: Vec<Exercise> = self
            .exercises
            .iter()
            .filter(|entry| entry.key().0 == uid && entry.key().1 == plan_id)
            .map(|entry| Exercise {
                id: Some(entry.key().2.clone()),
                ..entry.value().clone()
            })
            .collect();
        exercises.sort_by(|a, b| a.order.cmp(&b.order).then_with(|| a.id.cmp(&b.id)));
        Ok(exercises)
    }

    async fn set_exercise(
        &self,
        uid: &str,
        plan_id: &str,
        exercise_id: &str,
        exercise: &Exercise,
    ) -> Result<(), AppError> {
        self.before_write()?;
        self.exercises.insert(
            (uid.to_string(), plan_id.to_string(), exercise_id.to_string()),
            Exercise {
                id: None,
                ..exercise.clone()
            },
        );
        Ok(())
    }

    async fn delete_exercise(
        &self,
        uid: &str,
        plan_id: &str,
        exercise_id: &str,
    ) -> Result<(), AppError> {
        self.before_write()?;
        self.exercises.remove(&(
            uid.to_string(),
            plan_id.to_string(),
            exercise_id.to_string(),
        ));
        Ok(())
    }

    async fn get_progress(
        &self,
        uid: &str,
        plan_id: &str,
        day: &str,
    ) -> Result<Option<Progress>, AppError> {
        self.before_read(uid).await?;
        Ok(self
            .progress
            .get(&(uid.to_string(), plan_id.to_string(), day.to_string()))
            .map(|p| p.clone()))
    }

    async fn set_progress(
        &self,
        uid: &str,
        plan_id: &str,
        day: &str,
        progress: &Progress,
    ) -> Result<(), AppError> {
        self.before_write()?;
        self.progress.insert(
            (uid.to_string(), plan_id.to_string(), day.to_string()),
            progress.clone(),
        );
        Ok(())
    }

    async fn list_catalog(&self) -> Result<Vec<CatalogExercise>, AppError> {
        self.before_read("").await?;
        let mut entries: Vec<CatalogExercise> = self
            .catalog
            .iter()
            .map(|entry| CatalogExercise {
                id: Some(entry.key().clone()),
                ..entry.value().clone()
            })
            .collect();
        entries.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(entries)
    }

    async fn add_catalog_exercise(
        &self,
        id: &str,
        entry: &CatalogExercise,
    ) -> Result<(), AppError> {
        self.before_write()?;
        self.catalog.insert(
            id.to_string(),
            CatalogExercise {
                id: None,
                ..entry.clone()
            },
        );
        Ok(())
    }
}
