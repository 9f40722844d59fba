// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Workout plans, stored per student under `users/{uid}/treinos`.
//!
//! Exercises live in the `exercicios` subcollection of each plan, and daily
//! progress in its `progresso` subcollection, one document per day.

use serde::{Deserialize, Serialize};
use validator::Validate;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// Plan document: `users/{uid}/treinos/{id}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Validate)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
#[serde(default)]
pub struct WorkoutPlan {
    /// Plan ID (also used as document ID)
    #[serde(alias = "_firestore_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(rename = "titulo")]
    #[validate(length(min = 1, max = 120))]
    pub title: String,
    #[serde(rename = "descricao")]
    #[validate(length(max = 1000))]
    pub description: String,
    #[serde(rename = "ordem")]
    pub order: u32,
    #[serde(rename = "criadoEm", skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    /// uid of whoever last wrote the plan
    #[serde(rename = "atualizadoPor", skip_serializing_if = "Option::is_none")]
    pub updated_by: Option<String>,
}

/// Exercise document: `users/{uid}/treinos/{plan}/exercicios/{id}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Validate)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
#[serde(default)]
pub struct Exercise {
    /// Document ID; generated on save when absent
    #[serde(alias = "_firestore_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(rename = "nome")]
    #[validate(length(min = 1, max = 120))]
    pub name: String,
    /// Sets and reps as written by the trainer, e.g. "3x12"
    #[validate(length(min = 1, max = 32))]
    pub series: String,
    /// YouTube video ID
    #[serde(rename = "videoId")]
    #[validate(length(min = 1, max = 64))]
    pub video_id: String,
    /// Muscle group the exercise belongs to
    #[serde(rename = "grupo")]
    pub muscle_group: String,
    #[serde(rename = "ordem")]
    pub order: u32,
}

/// A plan together with its exercises, as the API reads and writes it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Validate)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct PlanDetail {
    #[serde(flatten)]
    #[validate(nested)]
    pub plan: WorkoutPlan,
    #[serde(rename = "exercicios", default)]
    #[validate(length(min = 1), nested)]
    pub exercises: Vec<Exercise>,
}

/// Progress document: `.../treinos/{plan}/progresso/{YYYY-MM-DD}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Progress {
    /// IDs of the exercises done that day
    pub done: Vec<String>,
}

/// One day's progress on a plan.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct DayProgress {
    pub day: String,
    pub done: Vec<String>,
}

/// Shared exercise catalog entry: `catalogoExercicios/{id}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Validate)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
#[serde(default)]
pub struct CatalogExercise {
    #[serde(alias = "_firestore_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(rename = "nome")]
    #[validate(length(min = 1, max = 120))]
    pub name: String,
    #[serde(rename = "grupo")]
    #[validate(length(max = 60))]
    pub muscle_group: String,
    #[serde(rename = "videoId")]
    #[validate(length(min = 1, max = 64))]
    pub video_id: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exercise_document_shape() {
        let json = r#"{"nome":"Supino","series":"3x12","videoId":"abc","grupo":"Peito","ordem":1}"#;
        let exercise: Exercise = serde_json::from_str(json).unwrap();
        assert_eq!(exercise.name, "Supino");
        assert_eq!(exercise.series, "3x12");
        assert_eq!(exercise.video_id, "abc");
        assert_eq!(exercise.muscle_group, "Peito");
        assert_eq!(exercise.order, 1);
        assert!(exercise.validate().is_ok());
    }

    #[test]
    fn test_plan_document_shape() {
        let plan: WorkoutPlan = serde_json::from_str(r#"{"titulo":"Treino A"}"#).unwrap();
        assert_eq!(plan.title, "Treino A");
        assert!(plan.description.is_empty());

        let json = serde_json::to_value(&plan).unwrap();
        assert_eq!(json["titulo"], "Treino A");
        assert!(json.get("exercicios").is_none());
    }

    #[test]
    fn test_plan_detail_requires_exercises() {
        let detail: PlanDetail = serde_json::from_str(
            r#"{"titulo":"Treino A","descricao":"","exercicios":[]}"#,
        )
        .unwrap();
        assert!(detail.validate().is_err());

        let detail: PlanDetail = serde_json::from_str(
            r#"{"titulo":"Treino A","exercicios":[{"nome":"Remada","series":"4x10","videoId":""}]}"#,
        )
        .unwrap();
        assert!(detail.validate().is_err());
    }

    #[test]
    fn test_catalog_document_shape() {
        let entry: CatalogExercise =
            serde_json::from_str(r#"{"nome":"Puxada","grupo":"Costas","videoId":"xyz"}"#).unwrap();
        assert_eq!(entry.muscle_group, "Costas");
        assert!(entry.validate().is_ok());
    }
}
