//! Identity provider seam: credentials in, principal or coded error out.
//!
//! DESIGN
//! ======
//! The session manager only sees [`IdentityProvider`]. The Firebase adapter
//! lives in [`firebase`]; tests substitute an in-process double. Provider
//! errors carry the SDK-style `auth/*` code so classification stays
//! independent of the transport.

pub mod firebase;

use serde::{Deserialize, Serialize};

use crate::error::ErrorCode;

pub const CODE_EMAIL_EXISTS: &str = "auth/email-already-in-use";
pub const CODE_WEAK_PASSWORD: &str = "auth/weak-password";
pub const CODE_NETWORK_FAILED: &str = "auth/network-request-failed";
pub const CODE_INTERNAL: &str = "auth/internal-error";

// =============================================================================
// TYPES
// =============================================================================

/// Email/password pair submitted by the sign-up and sign-in forms.
#[derive(Clone, PartialEq, Eq, Deserialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

impl Credentials {
    #[must_use]
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self { email: email.into(), password: password.into() }
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Authenticated principal issued by the provider. Treated as immutable.
///
/// Tokens never leave the process through `Debug` or serialization.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    /// Provider-assigned user id.
    pub uid: String,
    pub email: Option<String>,
    /// Short-lived bearer token for backend calls, when the provider issues one.
    #[serde(default, skip_serializing)]
    pub id_token: Option<String>,
    #[serde(default, skip_serializing)]
    pub refresh_token: Option<String>,
}

impl std::fmt::Debug for Identity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let redact = |token: &Option<String>| token.as_ref().map(|_| "<redacted>");
        f.debug_struct("Identity")
            .field("uid", &self.uid)
            .field("email", &self.email)
            .field("id_token", &redact(&self.id_token))
            .field("refresh_token", &redact(&self.refresh_token))
            .finish()
    }
}

/// Failure reported by the identity provider.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct ProviderError {
    /// SDK-style code such as `auth/weak-password`.
    pub code: String,
    /// Human-readable provider message.
    pub message: String,
}

impl ProviderError {
    #[must_use]
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self { code: code.into(), message: message.into() }
    }
}

impl ErrorCode for ProviderError {
    fn error_code(&self) -> &'static str {
        "E_IDENTITY_PROVIDER"
    }

    fn retryable(&self) -> bool {
        self.code == CODE_NETWORK_FAILED || self.code == "auth/too-many-requests"
    }
}

// =============================================================================
// PROVIDER TRAIT
// =============================================================================

/// Async contract of the external identity provider. Enables mocking in tests.
#[async_trait::async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Create an account and return its principal.
    ///
    /// # Errors
    ///
    /// Returns a [`ProviderError`] carrying the provider's code and message.
    async fn register(&self, credentials: &Credentials) -> Result<Identity, ProviderError>;

    /// Sign in to an existing account.
    ///
    /// # Errors
    ///
    /// Returns a [`ProviderError`] carrying the provider's code and message.
    async fn authenticate(&self, credentials: &Credentials) -> Result<Identity, ProviderError>;
}

/// Supplies the bearer token of whoever is signed in right now.
pub trait TokenSource: Send + Sync {
    fn id_token(&self) -> Option<String>;
}

#[cfg(test)]
#[path = "mod_test.rs"]
mod tests;
