// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Firestore client wrapper with typed operations.
//!
//! Provides high-level operations for:
//! - Role records (`userRoles/{uid}`)
//! - Profiles (`profiles/{uid}`)
//! - Workout plans (`users/{uid}/treinos/{plan_id}`), with their
//!   `exercicios` and `progresso` subcollections
//! - The exercise catalog (`catalogoExercicios/{id}`)

use crate::db::{collections, DocumentStore};
use crate::error::AppError;
use crate::models::{CatalogExercise, Exercise, Profile, Progress, Role, RoleDocument, WorkoutPlan};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Merge-write payload for the student → trainer link.
#[derive(Serialize, Deserialize)]
struct TrainerLink {
    #[serde(rename = "trainerId")]
    trainer_id: Option<String>,
}

/// Firestore database client.
#[derive(Clone)]
pub struct FirestoreDb {
    client: Option<firestore::FirestoreDb>,
}

impl FirestoreDb {
    /// Create a new Firestore client.
    ///
    /// For local development with emulator, set FIRESTORE_EMULATOR_HOST.
    pub async fn new(project_id: &str) -> Result<Self, AppError> {
        // If the emulator environment variable is set, use unauthenticated connection
        // to avoid local credential warnings and leakage.
        if std::env::var("FIRESTORE_EMULATOR_HOST").is_ok() {
            return Self::create_emulator_client(project_id).await;
        }

        let client = firestore::FirestoreDb::new(project_id)
            .await
            .map_err(|e| AppError::Database(format!("Failed to connect to Firestore: {}", e)))?;

        tracing::info!(project = project_id, "Connected to Firestore");

        Ok(Self {
            client: Some(client),
        })
    }

    /// Create a Firestore client for the emulator with unauthenticated access.
    async fn create_emulator_client(project_id: &str) -> Result<Self, AppError> {
        tracing::info!("Using unauthenticated connection for Firestore Emulator");

        let token_source = gcloud_sdk::ExternalJwtFunctionSource::new(|| async {
            Ok(gcloud_sdk::Token {
                token_type: "Bearer".to_string(),
                token: gcloud_sdk::SecretValue::new(
                    "eyJhbGciOiJub25lIn0.eyJ1aWQiOiJ0ZXN0In0."
                        .to_string()
                        .into(),
                ),
                expiry: chrono::Utc::now() + chrono::Duration::hours(1),
            })
        });

        let options = firestore::FirestoreDbOptions::new(project_id.to_string());

        let client = firestore::FirestoreDb::with_options_token_source(
            options,
            gcloud_sdk::GCP_DEFAULT_SCOPES.clone(),
            gcloud_sdk::TokenSourceType::ExternalSource(Box::new(token_source)),
        )
        .await
        .map_err(|e| {
            AppError::Database(format!("Failed to connect to Firestore Emulator: {}", e))
        })?;

        tracing::info!(
            project = project_id,
            "Connected to Firestore (Emulator/Unauthenticated)"
        );

        Ok(Self {
            client: Some(client),
        })
    }

    /// Create a mock Firestore client for testing (offline mode).
    ///
    /// All database operations will return an error if called.
    pub fn new_mock() -> Self {
        Self { client: None }
    }

    /// Helper to get the client or return an error if offline.
    fn get_client(&self) -> Result<&firestore::FirestoreDb, AppError> {
        self.client
            .as_ref()
            .ok_or_else(|| AppError::Database("Database not connected (offline mode)".to_string()))
    }

    /// Parent path `users/{uid}` for per-student subcollections.
    fn student_path(&self, uid: &str) -> Result<firestore::ParentPathBuilder, AppError> {
        self.get_client()?
            .parent_path(collections::USERS, uid)
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Parent path `users/{uid}/treinos/{plan_id}` for per-plan subcollections.
    fn plan_path(&self, uid: &str, plan_id: &str) -> Result<firestore::ParentPathBuilder, AppError> {
        self.student_path(uid)?
            .at(collections::WORKOUT_PLANS, plan_id)
            .map_err(|e| AppError::Database(e.to_string()))
    }

    async fn delete_doc(&self, collection: &str, uid: &str) -> Result<(), AppError> {
        self.get_client()?
            .fluent()
            .delete()
            .from(collection)
            .document_id(uid)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }
}

#[async_trait]
impl DocumentStore for FirestoreDb {
    // ─── Role Operations ─────────────────────────────────────────

    async fn get_role_record(&self, uid: &str) -> Result<Option<RoleDocument>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .by_id_in(collections::USER_ROLES)
            .obj()
            .one(uid)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    async fn list_role_records(&self) -> Result<Vec<RoleDocument>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .from(collections::USER_ROLES)
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    async fn set_role(&self, uid: &str, role: Role) -> Result<(), AppError> {
        let _: () = self
            .get_client()?
            .fluent()
            .update()
            .fields(["role"])
            .in_col(collections::USER_ROLES)
            .document_id(uid)
            .object(&RoleDocument::new(role))
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    // ─── Profile Operations ──────────────────────────────────────

    async fn get_profile(&self, uid: &str) -> Result<Option<Profile>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .by_id_in(collections::PROFILES)
            .obj()
            .one(uid)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    async fn list_profiles(&self) -> Result<Vec<Profile>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .from(collections::PROFILES)
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    async fn merge_profile(
        &self,
        uid: &str,
        profile: &Profile,
        fields: &[&str],
    ) -> Result<(), AppError> {
        let _: () = self
            .get_client()?
            .fluent()
            .update()
            .fields(fields.iter().copied())
            .in_col(collections::PROFILES)
            .document_id(uid)
            .object(profile)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    async fn set_trainer_id(&self, uid: &str, trainer_id: Option<&str>) -> Result<(), AppError> {
        let _: () = self
            .get_client()?
            .fluent()
            .update()
            .fields(["trainerId"])
            .in_col(collections::PROFILES)
            .document_id(uid)
            .object(&TrainerLink {
                trainer_id: trainer_id.map(str::to_owned),
            })
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// Deletes each document independently; the auth account is untouched.
    async fn delete_user_documents(&self, uid: &str) -> Result<(), AppError> {
        let mut first_error = None;

        for collection in [
            collections::PROFILES,
            collections::USERS,
            collections::USER_ROLES,
        ] {
            if let Err(e) = self.delete_doc(collection, uid).await {
                tracing::warn!(uid, collection, error = %e, "Failed to delete user document");
                first_error.get_or_insert(e);
            }
        }

        match first_error {
            Some(e) => Err(e),
            None => {
                tracing::info!(uid, "User documents deleted");
                Ok(())
            }
        }
    }

    // ─── Workout Plan Operations ─────────────────────────────────

    async fn list_workout_plans(&self, uid: &str) -> Result<Vec<WorkoutPlan>, AppError> {
        let parent_path = self.student_path(uid)?;

        self.get_client()?
            .fluent()
            .select()
            .from(collections::WORKOUT_PLANS)
            .parent(&parent_path)
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    async fn get_workout_plan(
        &self,
        uid: &str,
        plan_id: &str,
    ) -> Result<Option<WorkoutPlan>, AppError> {
        let parent_path = self.student_path(uid)?;

        self.get_client()?
            .fluent()
            .select()
            .by_id_in(collections::WORKOUT_PLANS)
            .parent(&parent_path)
            .obj()
            .one(plan_id)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    async fn set_workout_plan(
        &self,
        uid: &str,
        plan_id: &str,
        plan: &WorkoutPlan,
    ) -> Result<(), AppError> {
        let parent_path = self.student_path(uid)?;

        // The ID lives in the document name, not the body.
        let plan = WorkoutPlan {
            id: None,
            ..plan.clone()
        };

        let _: () = self
            .get_client()?
            .fluent()
            .update()
            .in_col(collections::WORKOUT_PLANS)
            .document_id(plan_id)
            .parent(&parent_path)
            .object(&plan)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// Firestore does not cascade, so exercises go first.
    async fn delete_workout_plan(&self, uid: &str, plan_id: &str) -> Result<(), AppError> {
        for exercise in self.list_exercises(uid, plan_id).await? {
            if let Some(exercise_id) = exercise.id.as_deref() {
                self.delete_exercise(uid, plan_id, exercise_id).await?;
            }
        }

        let parent_path = self.student_path(uid)?;

        self.get_client()?
            .fluent()
            .delete()
            .from(collections::WORKOUT_PLANS)
            .document_id(plan_id)
            .parent(&parent_path)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    async fn list_exercises(&self, uid: &str, plan_id: &str) -> Result<Vec<Exercise>, AppError> {
        let parent_path = self.plan_path(uid, plan_id)?;

        let mut exercises: Vec<Exercise> = self
            .get_client()?
            .fluent()
            .select()
            .from(collections::EXERCISES)
            .parent(&parent_path)
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        exercises.sort_by_key(|exercise| exercise.order);
        Ok(exercises)
    }

    async fn set_exercise(
        &self,
        uid: &str,
        plan_id: &str,
        exercise_id: &str,
        exercise: &Exercise,
    ) -> Result<(), AppError> {
        let parent_path = self.plan_path(uid, plan_id)?;

        let exercise = Exercise {
            id: None,
            ..exercise.clone()
        };

        let _: () = self
            .get_client()?
            .fluent()
            .update()
            .in_col(collections::EXERCISES)
            .document_id(exercise_id)
            .parent(&parent_path)
            .object(&exercise)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    async fn delete_exercise(
        &self,
        uid: &str,
        plan_id: &str,
        exercise_id: &str,
    ) -> Result<(), AppError> {
        let parent_path = self.plan_path(uid, plan_id)?;

        self.get_client()?
            .fluent()
            .delete()
            .from(collections::EXERCISES)
            .document_id(exercise_id)
            .parent(&parent_path)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    // ─── Progress Operations ─────────────────────────────────────

    async fn get_progress(
        &self,
        uid: &str,
        plan_id: &str,
        day: &str,
    ) -> Result<Option<Progress>, AppError> {
        let parent_path = self.plan_path(uid, plan_id)?;

        self.get_client()?
            .fluent()
            .select()
            .by_id_in(collections::PROGRESS)
            .parent(&parent_path)
            .obj()
            .one(day)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    async fn set_progress(
        &self,
        uid: &str,
        plan_id: &str,
        day: &str,
        progress: &Progress,
    ) -> Result<(), AppError> {
        let parent_path = self.plan_path(uid, plan_id)?;

        let _: () = self
            .get_client()?
            .fluent()
            .update()
            .fields(["done"])
            .in_col(collections::PROGRESS)
            .document_id(day)
            .parent(&parent_path)
            .object(progress)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    // ─── Catalog Operations ──────────────────────────────────────

    async fn list_catalog(&self) -> Result<Vec<CatalogExercise>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .from(collections::CATALOG)
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    async fn add_catalog_exercise(
        &self,
        id: &str,
        entry: &CatalogExercise,
    ) -> Result<(), AppError> {
        let entry = CatalogExercise {
            id: None,
            ..entry.clone()
        };

        let _: () = self
            .get_client()?
            .fluent()
            .update()
            .in_col(collections::CATALOG)
            .document_id(id)
            .object(&entry)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }
}
