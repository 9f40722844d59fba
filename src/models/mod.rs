// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Data models for the application.

pub mod identity;
pub mod profile;
pub mod role;
pub mod session;
pub mod workout;

pub use identity::Identity;
pub use profile::{Profile, ProfileUpdate};
pub use role::{Role, RoleDocument, RoleRecord};
pub use session::{LoadingState, Session, SessionPhase};
pub use workout::{CatalogExercise, DayProgress, Exercise, PlanDetail, Progress, WorkoutPlan};
