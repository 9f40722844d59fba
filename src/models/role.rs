// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Role documents and the effective-role rule.
//!
//! A uid's role lives in the `userRoles` collection. The stored value is a
//! free string (older clients wrote mixed case), so it is read raw and
//! interpreted in exactly one place: [`RoleRecord::effective_role`].

use serde::{Deserialize, Serialize};
use std::fmt;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// Effective application role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Trainer,
    Student,
}

impl Role {
    /// Interpret a stored role string. Anything other than `trainer` is a student.
    pub fn from_stored(value: &str) -> Self {
        if value.trim().eq_ignore_ascii_case("trainer") {
            Role::Trainer
        } else {
            Role::Student
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Trainer => "trainer",
            Role::Student => "student",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Raw `userRoles/{uid}` document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleDocument {
    /// Document ID (the uid); filled from the store on reads.
    #[serde(rename = "_firestore_id", default, skip_serializing)]
    pub uid: Option<String>,
    #[serde(default)]
    pub role: String,
}

impl RoleDocument {
    pub fn new(role: Role) -> Self {
        Self {
            uid: None,
            role: role.as_str().to_string(),
        }
    }
}

/// Outcome of a role lookup: either a record was found or there is none.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoleRecord {
    Found(Role),
    Absent,
}

impl RoleRecord {
    pub fn from_document(doc: Option<&RoleDocument>) -> Self {
        match doc {
            Some(doc) => RoleRecord::Found(Role::from_stored(&doc.role)),
            None => RoleRecord::Absent,
        }
    }

    /// Absence of a record means student. No elevated role without a record.
    pub fn effective_role(self) -> Role {
        match self {
            RoleRecord::Found(role) => role,
            RoleRecord::Absent => Role::Student,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_stored() {
        assert_eq!(Role::from_stored("trainer"), Role::Trainer);
        assert_eq!(Role::from_stored(" Trainer "), Role::Trainer);
        assert_eq!(Role::from_stored("student"), Role::Student);
        assert_eq!(Role::from_stored("admin"), Role::Student);
        assert_eq!(Role::from_stored(""), Role::Student);
    }

    #[test]
    fn test_absent_record_is_student() {
        assert_eq!(RoleRecord::Absent.effective_role(), Role::Student);
        let doc = RoleDocument::new(Role::Trainer);
        assert_eq!(
            RoleRecord::from_document(Some(&doc)).effective_role(),
            Role::Trainer
        );
    }

    #[test]
    fn test_role_document_reads_without_role_field() {
        let doc: RoleDocument = serde_json::from_str("{}").unwrap();
        assert_eq!(RoleRecord::from_document(Some(&doc)), RoleRecord::Found(Role::Student));
    }
}
