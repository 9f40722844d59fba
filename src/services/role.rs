// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Role resolution: effective role and master authority for an identity.
//!
//! Master authority comes only from the configured allow-list and never from
//! a document, so it holds even when the document store is unreachable. The
//! document-backed role fails toward least privilege: a missing record or a
//! failed read both yield `student`.

use crate::config::MasterAllowList;
use crate::db::DocumentStore;
use crate::error::AppError;
use crate::models::{Identity, Role, RoleDocument, RoleRecord};
use serde::Serialize;
use std::sync::Arc;

/// How the effective role was arrived at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RoleSource {
    /// A role record was read.
    Record,
    /// No role record exists for the uid.
    Absent,
    /// The read failed; least privilege was assumed.
    FetchFailed,
}

/// Effective role for one identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ResolvedRole {
    pub role: Role,
    pub is_master: bool,
    pub source: RoleSource,
}

/// Resolves roles against the static master list and the `userRoles` collection.
#[derive(Clone)]
pub struct RoleResolver {
    masters: Arc<MasterAllowList>,
    store: Arc<dyn DocumentStore>,
}

impl RoleResolver {
    pub fn new(masters: MasterAllowList, store: Arc<dyn DocumentStore>) -> Self {
        Self {
            masters: Arc::new(masters),
            store,
        }
    }

    /// Allow-list membership of the identity's email. No I/O.
    pub fn is_master(&self, identity: &Identity) -> bool {
        identity
            .normalized_email()
            .is_some_and(|email| self.masters.contains(&email))
    }

    /// Read the role record and settle it. Never fails.
    pub async fn resolve(&self, identity: &Identity) -> ResolvedRole {
        let lookup = self.store.get_role_record(&identity.uid).await;
        self.settle(identity, lookup)
    }

    /// Turn a role lookup (as read by `resolve` or a live subscription) into an
    /// effective role.
    pub fn settle(
        &self,
        identity: &Identity,
        lookup: Result<Option<RoleDocument>, AppError>,
    ) -> ResolvedRole {
        let is_master = self.is_master(identity);

        let (role, source) = match lookup {
            Ok(doc) => {
                let record = RoleRecord::from_document(doc.as_ref());
                let source = match record {
                    RoleRecord::Found(_) => RoleSource::Record,
                    RoleRecord::Absent => RoleSource::Absent,
                };
                (record.effective_role(), source)
            }
            Err(e) => {
                tracing::warn!(
                    uid = %identity.uid,
                    error = %e,
                    "Role lookup failed; falling back to student"
                );
                (Role::Student, RoleSource::FetchFailed)
            }
        };

        tracing::debug!(uid = %identity.uid, %role, is_master, ?source, "Role resolved");

        ResolvedRole {
            role,
            is_master,
            source,
        }
    }

    /// Stored role of an arbitrary uid, for validating writes that reference it.
    ///
    /// Unlike `resolve`, a failed read is returned: a write must not proceed on
    /// an assumption about another user's role.
    pub async fn stored_role(&self, uid: &str) -> Result<Role, AppError> {
        let doc = self.store.get_role_record(uid).await?;
        Ok(RoleRecord::from_document(doc.as_ref()).effective_role())
    }

    pub(crate) fn store(&self) -> &Arc<dyn DocumentStore> {
        &self.store
    }
}
