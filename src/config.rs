// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Application configuration loaded from environment variables.
//!
//! The master allow-list is deployment configuration, not data: it is read
//! once at startup and handed to the role resolver. No document can add to it.

use crate::models::identity::normalize_email;
use std::env;
use std::time::Duration;

const DEFAULT_SESSION_POLL_SECS: u64 = 5;

/// Application configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    /// Frontend URL allowed by CORS
    pub frontend_url: String,
    /// GCP project ID (Firestore)
    pub gcp_project_id: String,
    /// Server port
    pub port: u16,
    /// Key used to verify identity-provider session tokens (raw bytes)
    pub jwt_signing_key: Vec<u8>,
    /// Emails with master authority
    pub master_emails: MasterAllowList,
    /// How often live session subscriptions re-read their document.
    /// `None` means read once.
    pub session_poll_interval: Option<Duration>,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        let master_emails = MasterAllowList::parse(&env::var("MASTER_EMAILS").unwrap_or_default());
        if master_emails.is_empty() {
            tracing::warn!("MASTER_EMAILS is empty; no identity has master authority");
        }

        let poll_secs = match env::var("SESSION_POLL_INTERVAL_SECS") {
            Ok(raw) => raw.trim().parse::<u64>().map_err(|e| ConfigError::Invalid {
                var: "SESSION_POLL_INTERVAL_SECS",
                reason: e.to_string(),
            })?,
            Err(_) => DEFAULT_SESSION_POLL_SECS,
        };

        Ok(Self {
            frontend_url: env::var("FRONTEND_URL")
                .unwrap_or_else(|_| "http://localhost:5173".to_string()),
            gcp_project_id: env::var("GCP_PROJECT_ID").unwrap_or_else(|_| "local-dev".to_string()),
            port: env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .unwrap_or(8080),
            jwt_signing_key: env::var("JWT_SIGNING_KEY")
                .map_err(|_| ConfigError::Missing("JWT_SIGNING_KEY"))?
                .into_bytes(),
            master_emails,
            session_poll_interval: poll_interval(poll_secs),
        })
    }

    /// Default config for testing only.
    pub fn test_default() -> Self {
        Self {
            frontend_url: "http://localhost:5173".to_string(),
            gcp_project_id: "test-project".to_string(),
            port: 8080,
            jwt_signing_key: b"test_jwt_key_32_bytes_minimum!!".to_vec(),
            master_emails: MasterAllowList::parse("admin@x.com"),
            session_poll_interval: Some(Duration::from_millis(20)),
        }
    }
}

fn poll_interval(secs: u64) -> Option<Duration> {
    (secs > 0).then(|| Duration::from_secs(secs))
}

/// Static, case-insensitive list of master emails.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MasterAllowList {
    emails: Vec<String>,
}

impl MasterAllowList {
    /// Parse a comma-separated list. Blank entries are ignored.
    pub fn parse(raw: &str) -> Self {
        let mut emails: Vec<String> = raw.split(',').filter_map(normalize_email).collect();
        emails.sort();
        emails.dedup();
        Self { emails }
    }

    pub fn contains(&self, email: &str) -> bool {
        normalize_email(email).is_some_and(|email| self.emails.binary_search(&email).is_ok())
    }

    pub fn is_empty(&self) -> bool {
        self.emails.is_empty()
    }

    pub fn len(&self) -> usize {
        self.emails.len()
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid value for {var}: {reason}")]
    Invalid { var: &'static str, reason: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_from_env() {
        // Set required env vars for test
        env::set_var("JWT_SIGNING_KEY", "test_jwt_key_32_bytes_minimum!!");
        env::set_var("MASTER_EMAILS", "Admin@X.com, boss@y.com,,");
        env::set_var("SESSION_POLL_INTERVAL_SECS", "0");

        let config = Config::from_env().expect("Config should load");

        assert_eq!(config.port, 8080);
        assert_eq!(config.master_emails.len(), 2);
        assert!(config.master_emails.contains("admin@x.com"));
        assert_eq!(config.session_poll_interval, None);
    }

    #[test]
    fn test_master_list_is_case_insensitive() {
        let list = MasterAllowList::parse("admin@x.com");
        assert!(list.contains("ADMIN@x.COM"));
        assert!(list.contains("  admin@x.com "));
        assert!(!list.contains("trainer@x.com"));
        assert!(!list.contains(""));
    }

    #[test]
    fn test_empty_master_list() {
        let list = MasterAllowList::parse(" , ");
        assert!(list.is_empty());
        assert!(!list.contains("admin@x.com"));
    }
}
