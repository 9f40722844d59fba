// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Named write operations and their privilege checks.
//!
//! Each field has one owning writer: `role` belongs to masters, `trainerId`
//! to trainers and masters, the rest of a profile to its owner. Writes are
//! merge-writes of the owned fields only, so no locking is needed.

use crate::db::DocumentStore;
use crate::error::{AppError, Result};
use crate::models::{
    CatalogExercise, DayProgress, Identity, PlanDetail, Profile, ProfileUpdate, Progress, Role,
    Session,
};
use crate::services::role::RoleResolver;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use validator::Validate;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

pub const ROSTER_PAGE_SIZE: usize = 10;

/// Muscle group recorded when none is given.
const DEFAULT_MUSCLE_GROUP: &str = "Outros";

/// Which side of the roster to list.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RosterTab {
    #[default]
    Students,
    Trainers,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RosterQuery {
    #[serde(default)]
    pub tab: RosterTab,
    /// Case-insensitive substring of name or email
    pub search: Option<String>,
    /// 1-indexed
    #[serde(default = "default_page")]
    pub page: usize,
}

fn default_page() -> usize {
    1
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct RosterEntry {
    pub uid: String,
    pub name: String,
    pub email: String,
    pub nickname: Option<String>,
    pub trainer_id: Option<String>,
    pub role: Role,
}

#[derive(Debug, Clone, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct RosterPage {
    pub entries: Vec<RosterEntry>,
    pub page: usize,
    pub total_pages: usize,
    pub total: usize,
}

/// Privileged and owner writes, gated on the acting session.
#[derive(Clone)]
pub struct AccessService {
    resolver: RoleResolver,
    store: Arc<dyn DocumentStore>,
}

impl AccessService {
    pub fn new(resolver: RoleResolver) -> Self {
        let store = resolver.store().clone();
        Self { resolver, store }
    }

    // ─── Registration & Own Profile ──────────────────────────────

    /// Write the registration fields of a freshly signed-up identity's profile.
    ///
    /// Only the fields registration owns are merge-written, so registering
    /// again never drops a trainer link or owner-entered data. An existing
    /// `criadoEm` is kept. The role record is created only when absent, and
    /// failing to create it does not fail registration: absence already
    /// means student.
    pub async fn register(&self, identity: &Identity, name: &str) -> Result<Profile> {
        let name = name.trim();
        if name.is_empty() {
            return Err(AppError::BadRequest("Name is required".to_string()));
        }

        let existing = self.store.get_profile(&identity.uid).await?;
        let is_new = existing.is_none();
        let mut profile = existing.unwrap_or_default();
        profile.uid = Some(identity.uid.clone());
        profile.name = name.to_string();
        profile.email = identity.email.clone().unwrap_or_default();
        if profile.created_at.is_none() {
            profile.created_at = Some(chrono::Utc::now().to_rfc3339());
        }
        profile.normalize();

        self.store
            .merge_profile(&identity.uid, &profile, Profile::REGISTRATION_FIELDS)
            .await?;
        tracing::info!(uid = %identity.uid, is_new, "Profile registered");

        match self.store.get_role_record(&identity.uid).await {
            Ok(Some(_)) => {
                tracing::debug!(uid = %identity.uid, "Role record already exists; leaving it");
            }
            Ok(None) => {
                if let Err(e) = self.store.set_role(&identity.uid, Role::Student).await {
                    tracing::warn!(uid = %identity.uid, error = %e, "Ignoring role record creation failure");
                }
            }
            Err(e) => {
                tracing::warn!(uid = %identity.uid, error = %e, "Ignoring role record lookup failure");
            }
        }

        Ok(profile)
    }

    /// Own profile, or an empty scaffold when none exists yet.
    pub async fn profile_for(&self, identity: &Identity) -> Result<Profile> {
        Ok(self
            .store
            .get_profile(&identity.uid)
            .await?
            .unwrap_or_else(|| Profile::scaffold(identity)))
    }

    /// Owner update of their own profile. Never writes `trainerId`.
    pub async fn update_own_profile(
        &self,
        identity: &Identity,
        update: ProfileUpdate,
    ) -> Result<Profile> {
        update.validate()?;

        let mut profile = self.profile_for(identity).await?;
        update.apply_to(&mut profile);
        if let Some(email) = identity.email.as_deref() {
            profile.email = email.to_string();
            profile.normalize();
        }
        profile.updated_at = Some(chrono::Utc::now().to_rfc3339());

        self.store
            .merge_profile(&identity.uid, &profile, Profile::OWNER_FIELDS)
            .await?;
        tracing::info!(uid = %identity.uid, "Profile updated");

        Ok(profile)
    }

    // ─── Privileged Writes ───────────────────────────────────────

    /// Change a user's role. Masters only.
    pub async fn change_role(&self, actor: &Session, uid: &str, role: Role) -> Result<()> {
        let actor_uid = require_identity(actor)?.uid.as_str();
        if !actor.is_master {
            tracing::warn!(actor = actor_uid, target = uid, "Non-master attempted role change");
            return Err(AppError::forbidden("Only a master can change roles"));
        }

        self.store.set_role(uid, role).await?;
        tracing::info!(actor = actor_uid, target = uid, %role, "Role changed");
        Ok(())
    }

    /// Link a student to a trainer, or clear the link with `None`.
    ///
    /// The target must currently hold the trainer role.
    pub async fn assign_trainer(
        &self,
        actor: &Session,
        student_uid: &str,
        trainer_uid: Option<&str>,
    ) -> Result<()> {
        let actor_uid = require_identity(actor)?.uid.as_str();
        if !actor.has_trainer_access() {
            return Err(AppError::forbidden(
                "Only trainers and masters can assign trainers",
            ));
        }

        let trainer_uid = trainer_uid.map(str::trim).filter(|uid| !uid.is_empty());
        if let Some(trainer_uid) = trainer_uid {
            if self.resolver.stored_role(trainer_uid).await? != Role::Trainer {
                return Err(AppError::BadRequest(format!(
                    "User {} is not a trainer",
                    trainer_uid
                )));
            }
        }

        self.store.set_trainer_id(student_uid, trainer_uid).await?;
        tracing::info!(
            actor = actor_uid,
            student = student_uid,
            trainer = ?trainer_uid,
            "Trainer assignment updated"
        );
        Ok(())
    }

    /// Remove a user's documents. Masters only; the auth account stays.
    pub async fn delete_user(&self, actor: &Session, uid: &str) -> Result<()> {
        let actor_uid = require_identity(actor)?.uid.as_str();
        if !actor.is_master {
            return Err(AppError::forbidden("Only a master can delete profiles"));
        }

        self.store.delete_user_documents(uid).await?;
        tracing::info!(actor = actor_uid, target = uid, "User profile deleted");
        Ok(())
    }

    // ─── Roster ──────────────────────────────────────────────────

    /// Profiles joined with roles, filtered, sorted by name and paginated.
    pub async fn roster(&self, actor: &Session, query: &RosterQuery) -> Result<RosterPage> {
        if !actor.has_trainer_access() {
            return Err(AppError::forbidden("Roster is for trainers only"));
        }

        let (profiles, roles) =
            tokio::try_join!(self.store.list_profiles(), self.store.list_role_records())?;

        let roles: HashMap<String, Role> = roles
            .into_iter()
            .filter_map(|doc| {
                let uid = doc.uid?;
                Some((uid, Role::from_stored(&doc.role)))
            })
            .collect();

        let needle = query
            .search
            .as_deref()
            .map(|s| s.trim().to_lowercase())
            .filter(|s| !s.is_empty());

        let mut matching: Vec<(String, RosterEntry)> = profiles
            .into_iter()
            .filter_map(|profile| {
                let uid = profile.owner_uid()?.to_string();
                let role = roles.get(&uid).copied().unwrap_or(Role::Student);
                let entry = RosterEntry {
                    uid,
                    name: profile.name.clone(),
                    email: profile.email.clone(),
                    nickname: profile.nickname.clone(),
                    trainer_id: profile.assigned_trainer().map(str::to_string),
                    role,
                };
                Some((profile.sort_key(), entry))
            })
            .filter(|(_, entry)| match query.tab {
                RosterTab::Students => entry.role != Role::Trainer,
                RosterTab::Trainers => entry.role == Role::Trainer,
            })
            .filter(|(_, entry)| match &needle {
                Some(needle) => {
                    entry.name.to_lowercase().contains(needle)
                        || entry.email.to_lowercase().contains(needle)
                }
                None => true,
            })
            .collect();

        matching.sort_by(|a, b| a.0.cmp(&b.0).then_with(|| a.1.uid.cmp(&b.1.uid)));

        let total = matching.len();
        let total_pages = total.div_ceil(ROSTER_PAGE_SIZE).max(1);
        let page = query.page.clamp(1, total_pages);
        let entries = matching
            .into_iter()
            .skip((page - 1) * ROSTER_PAGE_SIZE)
            .take(ROSTER_PAGE_SIZE)
            .map(|(_, entry)| entry)
            .collect();

        Ok(RosterPage {
            entries,
            page,
            total_pages,
            total,
        })
    }

    // ─── Workout Plans ───────────────────────────────────────────

    /// The student, their assigned trainer, or a master.
    pub fn can_manage_plans(
        actor: &Session,
        student_uid: &str,
        student_profile: Option<&Profile>,
    ) -> bool {
        let Some(actor_uid) = actor.uid() else {
            return false;
        };

        actor.is_master
            || actor_uid == student_uid
            || (actor.is_trainer()
                && student_profile.and_then(Profile::assigned_trainer) == Some(actor_uid))
    }

    async fn require_plan_access(&self, actor: &Session, student_uid: &str) -> Result<()> {
        let allowed = if actor.is_master || actor.uid() == Some(student_uid) {
            true
        } else {
            let profile = self.store.get_profile(student_uid).await?;
            Self::can_manage_plans(actor, student_uid, profile.as_ref())
        };

        if allowed {
            Ok(())
        } else {
            tracing::warn!(actor = ?actor.uid(), student = student_uid, "Workout plan access denied");
            Err(AppError::forbidden(
                "Only the student, their trainer or a master can manage these plans",
            ))
        }
    }

    /// Plans with their exercises, in display order.
    pub async fn list_plans(&self, actor: &Session, student_uid: &str) -> Result<Vec<PlanDetail>> {
        self.require_plan_access(actor, student_uid).await?;

        let mut plans = self.store.list_workout_plans(student_uid).await?;
        plans.sort_by(|a, b| a.order.cmp(&b.order).then_with(|| a.id.cmp(&b.id)));

        let exercises = futures_util::future::try_join_all(plans.iter().map(|plan| {
            self.store
                .list_exercises(student_uid, plan.id.as_deref().unwrap_or_default())
        }))
        .await?;

        Ok(plans
            .into_iter()
            .zip(exercises)
            .map(|(plan, exercises)| PlanDetail { plan, exercises })
            .collect())
    }

    /// Create or replace a plan and its exercise list.
    ///
    /// Exercises without an ID get one; stored exercises missing from the
    /// new list are deleted.
    pub async fn save_plan(
        &self,
        actor: &Session,
        student_uid: &str,
        plan_id: &str,
        mut detail: PlanDetail,
    ) -> Result<PlanDetail> {
        check_document_id(plan_id, "plan")?;
        detail.plan.title = detail.plan.title.trim().to_string();
        for (index, exercise) in detail.exercises.iter_mut().enumerate() {
            exercise.name = exercise.name.trim().to_string();
            exercise.series = exercise.series.trim().to_string();
            exercise.video_id = exercise.video_id.trim().to_string();
            exercise.muscle_group = exercise.muscle_group.trim().to_string();
            if exercise.muscle_group.is_empty() {
                exercise.muscle_group = DEFAULT_MUSCLE_GROUP.to_string();
            }
            if exercise.order == 0 {
                exercise.order = index as u32 + 1;
            }
            let has_id = exercise.id.as_deref().is_some_and(|id| !id.trim().is_empty());
            if has_id {
                check_document_id(exercise.id.as_deref().unwrap_or_default(), "exercise")?;
            } else {
                exercise.id = Some(uuid::Uuid::new_v4().simple().to_string());
            }
        }
        detail.validate()?;
        self.require_plan_access(actor, student_uid).await?;

        let (existing, previous) = tokio::try_join!(
            self.store.get_workout_plan(student_uid, plan_id),
            self.store.list_exercises(student_uid, plan_id)
        )?;

        let plan = &mut detail.plan;
        plan.id = Some(plan_id.to_string());
        plan.updated_by = actor.uid().map(str::to_string);
        plan.created_at = existing
            .and_then(|p| p.created_at)
            .or_else(|| Some(chrono::Utc::now().to_rfc3339()));
        if plan.order == 0 {
            plan.order = 1;
        }
        detail.exercises.sort_by_key(|exercise| exercise.order);

        self.store
            .set_workout_plan(student_uid, plan_id, &detail.plan)
            .await?;
        for exercise in &detail.exercises {
            let exercise_id = exercise.id.as_deref().unwrap_or_default();
            self.store
                .set_exercise(student_uid, plan_id, exercise_id, exercise)
                .await?;
        }
        for stale in previous
            .iter()
            .filter_map(|exercise| exercise.id.as_deref())
            .filter(|id| !detail.exercises.iter().any(|e| e.id.as_deref() == Some(*id)))
        {
            self.store.delete_exercise(student_uid, plan_id, stale).await?;
        }

        tracing::info!(
            actor = ?actor.uid(),
            student = student_uid,
            plan_id,
            exercises = detail.exercises.len(),
            "Workout plan saved"
        );
        Ok(detail)
    }

    pub async fn delete_plan(&self, actor: &Session, student_uid: &str, plan_id: &str) -> Result<()> {
        self.require_plan_access(actor, student_uid).await?;
        self.store.delete_workout_plan(student_uid, plan_id).await?;
        tracing::info!(actor = ?actor.uid(), student = student_uid, plan_id, "Workout plan deleted");
        Ok(())
    }

    // ─── Daily Progress ──────────────────────────────────────────

    /// Exercises marked done on `day` (default today).
    pub async fn progress(
        &self,
        actor: &Session,
        student_uid: &str,
        plan_id: &str,
        day: Option<&str>,
    ) -> Result<DayProgress> {
        let day = progress_day(day)?;
        self.require_plan_access(actor, student_uid).await?;

        let done = self
            .store
            .get_progress(student_uid, plan_id, &day)
            .await?
            .unwrap_or_default()
            .done;
        Ok(DayProgress { day, done })
    }

    /// Mark one exercise done or not done on `day` (default today).
    ///
    /// Read-modify-write of the day's `done` list; the student is its only
    /// regular writer.
    pub async fn set_exercise_done(
        &self,
        actor: &Session,
        student_uid: &str,
        plan_id: &str,
        day: Option<&str>,
        exercise_id: &str,
        done: bool,
    ) -> Result<DayProgress> {
        let day = progress_day(day)?;
        check_document_id(exercise_id, "exercise")?;
        self.require_plan_access(actor, student_uid).await?;

        let mut progress: Progress = self
            .store
            .get_progress(student_uid, plan_id, &day)
            .await?
            .unwrap_or_default();
        progress.done.retain(|id| id != exercise_id);
        if done {
            progress.done.push(exercise_id.to_string());
        }

        self.store
            .set_progress(student_uid, plan_id, &day, &progress)
            .await?;
        tracing::debug!(student = student_uid, plan_id, %day, exercise_id, done, "Progress updated");

        Ok(DayProgress {
            day,
            done: progress.done,
        })
    }

    // ─── Exercise Catalog ────────────────────────────────────────

    /// Shared catalog, sorted by name. Trainers and masters only.
    pub async fn catalog(&self, actor: &Session) -> Result<Vec<CatalogExercise>> {
        if !actor.has_trainer_access() {
            return Err(AppError::forbidden("The exercise catalog is for trainers only"));
        }

        let mut entries = self.store.list_catalog().await?;
        entries.sort_by_key(|entry| entry.name.to_lowercase());
        Ok(entries)
    }

    pub async fn add_catalog_exercise(
        &self,
        actor: &Session,
        mut entry: CatalogExercise,
    ) -> Result<CatalogExercise> {
        if !actor.has_trainer_access() {
            return Err(AppError::forbidden("The exercise catalog is for trainers only"));
        }

        entry.name = entry.name.trim().to_string();
        entry.video_id = entry.video_id.trim().to_string();
        entry.muscle_group = entry.muscle_group.trim().to_string();
        if entry.muscle_group.is_empty() {
            entry.muscle_group = DEFAULT_MUSCLE_GROUP.to_string();
        }
        entry.validate()?;

        let id = uuid::Uuid::new_v4().simple().to_string();
        self.store.add_catalog_exercise(&id, &entry).await?;
        tracing::info!(actor = ?actor.uid(), id = %id, name = %entry.name, "Catalog exercise added");

        entry.id = Some(id);
        Ok(entry)
    }
}

/// Day key for progress documents: `YYYY-MM-DD`, today when absent.
fn progress_day(day: Option<&str>) -> Result<String> {
    match day.map(str::trim).filter(|day| !day.is_empty()) {
        None => Ok(chrono::Local::now().date_naive().format("%Y-%m-%d").to_string()),
        Some(day) => chrono::NaiveDate::parse_from_str(day, "%Y-%m-%d")
            .map(|date| date.format("%Y-%m-%d").to_string())
            .map_err(|_| AppError::BadRequest(format!("Invalid day '{}', expected YYYY-MM-DD", day))),
    }
}

fn check_document_id(id: &str, what: &str) -> Result<()> {
    if id.trim().is_empty() || id.contains('/') {
        return Err(AppError::BadRequest(format!("Invalid {} id", what)));
    }
    Ok(())
}

fn require_identity(actor: &Session) -> Result<&Identity> {
    actor.identity.as_ref().ok_or(AppError::Unauthorized)
}
