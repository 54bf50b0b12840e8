//! Runtime configuration parsed from environment variables.
//!
//! DESIGN
//! ======
//! `Config::from_env` is a thin wrapper over `Config::from_lookup`, which
//! takes any key lookup. Tests drive `from_lookup` with a map instead of
//! mutating the process environment.

use crate::error::ErrorCode;

pub const DEFAULT_AUTH_BASE_URL: &str = "https://identitytoolkit.googleapis.com/v1";
pub const DEFAULT_FIRESTORE_BASE_URL: &str = "https://firestore.googleapis.com/v1";
pub const DEFAULT_FIRESTORE_DATABASE: &str = "(default)";
pub const DEFAULT_BORROWED_COLLECTION: &str = "Books Borrowed";
pub const DEFAULT_SUBMITTED_COLLECTION: &str = "Books Submitted";
pub const DEFAULT_REPORTS_COLLECTION: &str = "Users Report";
pub const DEFAULT_HOME_ROUTE: &str = "/home";
pub const DEFAULT_ENTRY_ROUTE: &str = "/";
pub const DEFAULT_HTTP_REQUEST_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_HTTP_CONNECT_TIMEOUT_SECS: u64 = 10;

// =============================================================================
// TYPES
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("missing required env var {0}")]
    Missing(&'static str),
}

impl ErrorCode for ConfigError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::Missing(_) => "E_CONFIG_MISSING",
        }
    }
}

/// Names of the three backend collections.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Collections {
    pub borrowed: String,
    pub submitted: String,
    pub reports: String,
}

impl Default for Collections {
    fn default() -> Self {
        Self {
            borrowed: DEFAULT_BORROWED_COLLECTION.into(),
            submitted: DEFAULT_SUBMITTED_COLLECTION.into(),
            reports: DEFAULT_REPORTS_COLLECTION.into(),
        }
    }
}

/// Navigation targets used by the session manager.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Routes {
    /// Where a successful sign-in lands.
    pub home: String,
    /// The login/entry screen.
    pub entry: String,
}

impl Default for Routes {
    fn default() -> Self {
        Self { home: DEFAULT_HOME_ROUTE.into(), entry: DEFAULT_ENTRY_ROUTE.into() }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HttpTimeouts {
    pub request_secs: u64,
    pub connect_secs: u64,
}

impl Default for HttpTimeouts {
    fn default() -> Self {
        Self { request_secs: DEFAULT_HTTP_REQUEST_TIMEOUT_SECS, connect_secs: DEFAULT_HTTP_CONNECT_TIMEOUT_SECS }
    }
}

/// Firebase project settings shared by the auth and Firestore adapters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FirebaseConfig {
    pub api_key: String,
    pub project_id: String,
    pub auth_base_url: String,
    pub firestore_base_url: String,
    pub database: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub firebase: FirebaseConfig,
    pub collections: Collections,
    pub routes: Routes,
    pub timeouts: HttpTimeouts,
}

impl Config {
    /// Build typed config from environment variables.
    ///
    /// Required:
    /// - `FIREBASE_API_KEY`
    /// - `FIREBASE_PROJECT_ID`
    ///
    /// Optional:
    /// - `FIREBASE_AUTH_BASE_URL`, `FIRESTORE_BASE_URL`, `FIRESTORE_DATABASE`
    /// - `BOOKS_BORROWED_COLLECTION`, `BOOKS_SUBMITTED_COLLECTION`, `USERS_REPORT_COLLECTION`
    /// - `HOME_ROUTE`, `ENTRY_ROUTE`
    /// - `HTTP_REQUEST_TIMEOUT_SECS` (default 30), `HTTP_CONNECT_TIMEOUT_SECS` (default 10)
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Missing`] if a required variable is unset or empty.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build typed config from an arbitrary key lookup.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Missing`] if a required key is absent or empty.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let or_default = |key: &str, default: &str| get(key).unwrap_or_else(|| default.to_string());

        let api_key = get("FIREBASE_API_KEY").ok_or(ConfigError::Missing("FIREBASE_API_KEY"))?;
        let project_id = get("FIREBASE_PROJECT_ID").ok_or(ConfigError::Missing("FIREBASE_PROJECT_ID"))?;

        let firebase = FirebaseConfig {
            api_key,
            project_id,
            auth_base_url: trim_base_url(&or_default("FIREBASE_AUTH_BASE_URL", DEFAULT_AUTH_BASE_URL)),
            firestore_base_url: trim_base_url(&or_default("FIRESTORE_BASE_URL", DEFAULT_FIRESTORE_BASE_URL)),
            database: or_default("FIRESTORE_DATABASE", DEFAULT_FIRESTORE_DATABASE),
        };

        let collections = Collections {
            borrowed: or_default("BOOKS_BORROWED_COLLECTION", DEFAULT_BORROWED_COLLECTION),
            submitted: or_default("BOOKS_SUBMITTED_COLLECTION", DEFAULT_SUBMITTED_COLLECTION),
            reports: or_default("USERS_REPORT_COLLECTION", DEFAULT_REPORTS_COLLECTION),
        };

        let routes = Routes {
            home: or_default("HOME_ROUTE", DEFAULT_HOME_ROUTE),
            entry: or_default("ENTRY_ROUTE", DEFAULT_ENTRY_ROUTE),
        };

        let timeouts = HttpTimeouts {
            request_secs: parse_u64(get("HTTP_REQUEST_TIMEOUT_SECS"), DEFAULT_HTTP_REQUEST_TIMEOUT_SECS),
            connect_secs: parse_u64(get("HTTP_CONNECT_TIMEOUT_SECS"), DEFAULT_HTTP_CONNECT_TIMEOUT_SECS),
        };

        Ok(Self { firebase, collections, routes, timeouts })
    }
}

fn parse_u64(raw: Option<String>, default: u64) -> u64 {
    raw.and_then(|v| v.trim().parse::<u64>().ok())
        .unwrap_or(default)
}

fn trim_base_url(raw: &str) -> String {
    raw.trim_end_matches('/').to_string()
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
