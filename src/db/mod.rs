// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Database layer (Firestore, plus an in-memory store for tests and local runs).

pub mod firestore;
pub mod memory;

pub use firestore::FirestoreDb;
pub use memory::MemoryStore;

use crate::error::AppError;
use crate::models::{CatalogExercise, Exercise, Profile, Progress, Role, RoleDocument, WorkoutPlan};
use async_trait::async_trait;

/// Collection names as constants.
pub mod collections {
    /// Role records, keyed by uid
    pub const USER_ROLES: &str = "userRoles";
    /// Profiles, keyed by uid
    pub const PROFILES: &str = "profiles";
    /// Legacy profiles; also the parent of per-student workout plans
    pub const USERS: &str = "users";
    /// Workout plans (subcollection of `users/{uid}`)
    pub const WORKOUT_PLANS: &str = "treinos";
    /// Exercises (subcollection of a plan)
    pub const EXERCISES: &str = "exercicios";
    /// Daily progress keyed by `YYYY-MM-DD` (subcollection of a plan)
    pub const PROGRESS: &str = "progresso";
    /// Shared exercise catalog
    pub const CATALOG: &str = "catalogoExercicios";
}

/// Document store operations the application depends on.
///
/// Writes are last-writer-wins. Merge-writes only touch the fields they name,
/// so writers that own different fields of one document do not clobber each other.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    // ─── Roles ───────────────────────────────────────────────────

    async fn get_role_record(&self, uid: &str) -> Result<Option<RoleDocument>, AppError>;

    async fn list_role_records(&self) -> Result<Vec<RoleDocument>, AppError>;

    /// Merge-write the `role` field of `userRoles/{uid}`.
    async fn set_role(&self, uid: &str, role: Role) -> Result<(), AppError>;

    // ─── Profiles ────────────────────────────────────────────────

    async fn get_profile(&self, uid: &str) -> Result<Option<Profile>, AppError>;

    async fn list_profiles(&self) -> Result<Vec<Profile>, AppError>;

    /// Merge-write only `fields` (wire names) of `profile`.
    async fn merge_profile(
        &self,
        uid: &str,
        profile: &Profile,
        fields: &[&str],
    ) -> Result<(), AppError>;

    /// Merge-write the `trainerId` field. `None` clears the link.
    async fn set_trainer_id(&self, uid: &str, trainer_id: Option<&str>) -> Result<(), AppError>;

    /// Remove the profile, legacy user and role documents for `uid`.
    async fn delete_user_documents(&self, uid: &str) -> Result<(), AppError>;

    // ─── Workout Plans ───────────────────────────────────────────

    async fn list_workout_plans(&self, uid: &str) -> Result<Vec<WorkoutPlan>, AppError>;

    async fn get_workout_plan(
        &self,
        uid: &str,
        plan_id: &str,
    ) -> Result<Option<WorkoutPlan>, AppError>;

    /// Write the plan document only; its exercises are separate documents.
    async fn set_workout_plan(
        &self,
        uid: &str,
        plan_id: &str,
        plan: &WorkoutPlan,
    ) -> Result<(), AppError>;

    /// Delete the plan's exercises, then the plan itself.
    async fn delete_workout_plan(&self, uid: &str, plan_id: &str) -> Result<(), AppError>;

    /// Exercises of a plan, sorted by `ordem`.
    async fn list_exercises(&self, uid: &str, plan_id: &str) -> Result<Vec<Exercise>, AppError>;

    async fn set_exercise(
        &self,
        uid: &str,
        plan_id: &str,
        exercise_id: &str,
        exercise: &Exercise,
    ) -> Result<(), AppError>;

    async fn delete_exercise(
        &self,
        uid: &str,
        plan_id: &str,
        exercise_id: &str,
    ) -> Result<(), AppError>;

    // ─── Progress ────────────────────────────────────────────────

    async fn get_progress(
        &self,
        uid: &str,
        plan_id: &str,
        day: &str,
    ) -> Result<Option<Progress>, AppError>;

    /// Merge-write the `done` field of one day's progress.
    async fn set_progress(
        &self,
        uid: &str,
        plan_id: &str,
        day: &str,
        progress: &Progress,
    ) -> Result<(), AppError>;

    // ─── Exercise Catalog ────────────────────────────────────────

    async fn list_catalog(&self) -> Result<Vec<CatalogExercise>, AppError>;

    async fn add_catalog_exercise(
        &self,
        id: &str,
        entry: &CatalogExercise,
    ) -> Result<(), AppError>;
}
