// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Profile model for storage and API.
//!
//! Field names on the wire match the documents the web client already writes
//! to the `profiles` collection.

use crate::models::identity::{normalize_email, Identity};
use serde::{Deserialize, Serialize};
use validator::Validate;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// Profile document stored in Firestore, one per uid.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
#[serde(default)]
pub struct Profile {
    /// Document ID, filled by the store on reads.
    #[serde(rename = "_firestore_id", skip_serializing)]
    pub doc_id: Option<String>,
    /// Owner uid, as written at registration
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uid: Option<String>,
    #[serde(rename = "nome")]
    pub name: String,
    /// Lowercased name for case-insensitive search
    #[serde(rename = "nomeLower")]
    pub name_lower: String,
    #[serde(rename = "apelido", skip_serializing_if = "Option::is_none")]
    pub nickname: Option<String>,
    pub email: String,
    /// Lowercased email for case-insensitive search
    #[serde(rename = "emailLower")]
    pub email_lower: String,
    #[serde(rename = "telefone")]
    pub phone: String,
    #[serde(rename = "nascimento")]
    pub birth_date: String,
    /// Free-form address line, kept for profiles written before the split fields
    #[serde(rename = "endereco")]
    pub address: String,
    /// Brazilian postal code
    pub cep: String,
    /// State (UF)
    #[serde(rename = "estado")]
    pub state: String,
    #[serde(rename = "cidade")]
    pub city: String,
    #[serde(rename = "rua")]
    pub street: String,
    #[serde(rename = "numero")]
    pub number: String,
    #[serde(rename = "bairro")]
    pub district: String,
    #[serde(rename = "genero")]
    pub gender: String,
    /// Height baseline, as entered
    #[serde(rename = "altura")]
    pub height: String,
    /// Weight baseline, as entered
    #[serde(rename = "peso")]
    pub weight: String,
    #[serde(rename = "objetivo")]
    pub goal: String,
    #[serde(rename = "contatoEmergenciaNome")]
    pub emergency_contact_name: String,
    #[serde(rename = "contatoEmergenciaTelefone")]
    pub emergency_contact_phone: String,
    #[serde(rename = "photoUrl", skip_serializing_if = "Option::is_none")]
    pub photo_url: Option<String>,
    /// Assigned trainer's uid. Must reference a uid whose role is trainer.
    #[serde(rename = "trainerId", skip_serializing_if = "Option::is_none")]
    pub trainer_id: Option<String>,
    #[serde(rename = "criadoEm", skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(rename = "updatedAt", skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
}

impl Profile {
    /// Fields the owning user may write. `trainerId` is owned by trainers/masters.
    pub const OWNER_FIELDS: &'static [&'static str] = &[
        "nome",
        "nomeLower",
        "email",
        "emailLower",
        "telefone",
        "nascimento",
        "endereco",
        "cep",
        "estado",
        "cidade",
        "rua",
        "numero",
        "bairro",
        "genero",
        "altura",
        "peso",
        "objetivo",
        "contatoEmergenciaNome",
        "contatoEmergenciaTelefone",
        "photoUrl",
        "updatedAt",
    ];

    /// Fields written at registration. Everything else survives a repeat sign-up.
    pub const REGISTRATION_FIELDS: &'static [&'static str] =
        &["uid", "nome", "nomeLower", "email", "emailLower", "criadoEm"];

    /// Empty profile for an identity that has no document yet.
    pub fn scaffold(identity: &Identity) -> Self {
        let mut profile = Self {
            uid: Some(identity.uid.clone()),
            email: identity.email.clone().unwrap_or_default(),
            ..Default::default()
        };
        profile.normalize();
        profile
    }

    /// Recompute the lowercased search fields.
    pub fn normalize(&mut self) {
        self.name = self.name.trim().to_string();
        self.name_lower = self.name.to_lowercase();
        self.email = self.email.trim().to_string();
        self.email_lower = normalize_email(&self.email).unwrap_or_default();
    }

    /// Owning uid: the stored field, else the document ID.
    pub fn owner_uid(&self) -> Option<&str> {
        self.uid.as_deref().or(self.doc_id.as_deref())
    }

    /// Assigned trainer, treating an empty string as no assignment.
    pub fn assigned_trainer(&self) -> Option<&str> {
        self.trainer_id.as_deref().filter(|id| !id.trim().is_empty())
    }

    /// Lowercased name used for sorting, falling back to the raw name.
    pub fn sort_key(&self) -> String {
        if self.name_lower.is_empty() {
            self.name.to_lowercase()
        } else {
            self.name_lower.clone()
        }
    }
}

/// Owner-editable profile fields. Absent fields keep their stored value.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct ProfileUpdate {
    #[validate(length(min = 1, max = 120))]
    pub name: Option<String>,
    #[validate(length(max = 32))]
    pub phone: Option<String>,
    #[validate(length(max = 10))]
    pub birth_date: Option<String>,
    #[validate(length(max = 200))]
    pub address: Option<String>,
    #[validate(length(max = 9))]
    pub cep: Option<String>,
    #[validate(length(max = 2))]
    pub state: Option<String>,
    #[validate(length(max = 120))]
    pub city: Option<String>,
    #[validate(length(max = 200))]
    pub street: Option<String>,
    #[validate(length(max = 16))]
    pub number: Option<String>,
    #[validate(length(max = 120))]
    pub district: Option<String>,
    #[validate(length(max = 32))]
    pub gender: Option<String>,
    #[validate(length(max = 16))]
    pub height: Option<String>,
    #[validate(length(max = 16))]
    pub weight: Option<String>,
    #[validate(length(max = 500))]
    pub goal: Option<String>,
    #[validate(length(max = 120))]
    pub emergency_contact_name: Option<String>,
    #[validate(length(max = 32))]
    pub emergency_contact_phone: Option<String>,
    #[validate(url)]
    pub photo_url: Option<String>,
}

impl ProfileUpdate {
    /// Apply the update onto `profile`. Never touches `trainer_id`.
    pub fn apply_to(self, profile: &mut Profile) {
        fn set(slot: &mut String, value: Option<String>) {
            if let Some(value) = value {
                *slot = value.trim().to_string();
            }
        }

        set(&mut profile.name, self.name);
        set(&mut profile.phone, self.phone);
        set(&mut profile.birth_date, self.birth_date);
        set(&mut profile.address, self.address);
        set(&mut profile.cep, self.cep);
        set(&mut profile.state, self.state.map(|uf| uf.to_uppercase()));
        set(&mut profile.city, self.city);
        set(&mut profile.street, self.street);
        set(&mut profile.number, self.number);
        set(&mut profile.district, self.district);
        set(&mut profile.gender, self.gender);
        set(&mut profile.height, self.height);
        set(&mut profile.weight, self.weight);
        set(&mut profile.goal, self.goal);
        set(&mut profile.emergency_contact_name, self.emergency_contact_name);
        set(&mut profile.emergency_contact_phone, self.emergency_contact_phone);
        if let Some(url) = self.photo_url {
            profile.photo_url = Some(url);
        }
        profile.normalize();
    }
}
