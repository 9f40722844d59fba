// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Authenticated identity as delivered by the identity provider.

use serde::{Deserialize, Serialize};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// Opaque signed-in identity. Owned by the identity provider; never mutated here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct Identity {
    pub uid: String,
    pub email: Option<String>,
    pub display_name: Option<String>,
}

impl Identity {
    pub fn new(uid: impl Into<String>, email: Option<&str>) -> Self {
        Self {
            uid: uid.into(),
            email: email.map(str::to_string),
            display_name: None,
        }
    }

    pub fn with_display_name(mut self, name: impl Into<String>) -> Self {
        self.display_name = Some(name.into());
        self
    }

    /// Trimmed, lowercased email, or `None` when absent or blank.
    pub fn normalized_email(&self) -> Option<String> {
        normalize_email(self.email.as_deref()?)
    }
}

/// Normalize an email for case-insensitive comparison and search.
pub fn normalize_email(email: &str) -> Option<String> {
    let email = email.trim();
    if email.is_empty() {
        None
    } else {
        Some(email.to_lowercase())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalized_email() {
        let identity = Identity::new("u1", Some("  Admin@X.com "));
        assert_eq!(identity.normalized_email().as_deref(), Some("admin@x.com"));

        assert_eq!(Identity::new("u2", Some("   ")).normalized_email(), None);
        assert_eq!(Identity::new("u3", None).normalized_email(), None);
    }
}
