//! Firebase Authentication client (Identity Toolkit REST API).
//!
//! Thin HTTP wrapper for `accounts:signUp` and `accounts:signInWithPassword`.
//! Server error keys (`EMAIL_EXISTS`, `WEAK_PASSWORD : ...`) are translated to
//! the `auth/*` codes and `Firebase: ... (auth/...).` messages the web SDK
//! produces, so downstream classification sees the same values either way.
//! Pure parsing in `parse_identity` / `parse_error` for testability.

use std::time::Duration;

use tracing::debug;

use super::{CODE_INTERNAL, CODE_NETWORK_FAILED, Credentials, Identity, IdentityProvider, ProviderError};
use crate::config::{FirebaseConfig, HttpTimeouts};

const SIGN_UP_ENDPOINT: &str = "accounts:signUp";
const SIGN_IN_ENDPOINT: &str = "accounts:signInWithPassword";

// =============================================================================
// CLIENT
// =============================================================================

pub struct FirebaseAuth {
    http: reqwest::Client,
    api_key: String,
    base_url: String,
}

impl FirebaseAuth {
    /// Build a client against the configured Identity Toolkit base URL.
    ///
    /// # Errors
    ///
    /// Returns a `auth/internal-error` [`ProviderError`] if the HTTP client cannot be built.
    pub fn new(config: &FirebaseConfig, timeouts: HttpTimeouts) -> Result<Self, ProviderError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeouts.request_secs))
            .connect_timeout(Duration::from_secs(timeouts.connect_secs))
            .build()
            .map_err(|e| ProviderError::new(CODE_INTERNAL, e.to_string()))?;
        Ok(Self { http, api_key: config.api_key.clone(), base_url: config.auth_base_url.clone() })
    }

    fn endpoint_url(&self, endpoint: &str) -> String {
        endpoint_url(&self.base_url, endpoint, &self.api_key)
    }

    async fn post_credentials(&self, endpoint: &str, credentials: &Credentials) -> Result<Identity, ProviderError> {
        let body = PasswordRequest { email: &credentials.email, password: &credentials.password, return_secure_token: true };

        let response = self
            .http
            .post(self.endpoint_url(endpoint))
            .json(&body)
            .send()
            .await
            .map_err(network_error)?;

        let status = response.status().as_u16();
        let text = response.text().await.map_err(network_error)?;
        debug!(endpoint, status, "identity toolkit response");

        if !(200..300).contains(&status) {
            return Err(parse_error(&text));
        }
        parse_identity(&text)
    }
}

#[async_trait::async_trait]
impl IdentityProvider for FirebaseAuth {
    async fn register(&self, credentials: &Credentials) -> Result<Identity, ProviderError> {
        self.post_credentials(SIGN_UP_ENDPOINT, credentials).await
    }

    async fn authenticate(&self, credentials: &Credentials) -> Result<Identity, ProviderError> {
        self.post_credentials(SIGN_IN_ENDPOINT, credentials).await
    }
}

fn endpoint_url(base_url: &str, endpoint: &str, api_key: &str) -> String {
    format!("{base_url}/{endpoint}?key={api_key}")
}

fn network_error(err: reqwest::Error) -> ProviderError {
    ProviderError::new(CODE_NETWORK_FAILED, sdk_message(CODE_NETWORK_FAILED, Some(&err.to_string())))
}

// =============================================================================
// WIRE TYPES
// =============================================================================

#[derive(serde::Serialize)]
#[serde(rename_all = "camelCase")]
struct PasswordRequest<'a> {
    email: &'a str,
    password: &'a str,
    return_secure_token: bool,
}

#[derive(serde::Deserialize)]
#[serde(rename_all = "camelCase")]
struct PasswordResponse {
    local_id: String,
    email: Option<String>,
    id_token: Option<String>,
    refresh_token: Option<String>,
}

#[derive(serde::Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(serde::Deserialize)]
struct ErrorBody {
    message: String,
}

// =============================================================================
// PARSING
// =============================================================================

fn parse_identity(json: &str) -> Result<Identity, ProviderError> {
    let resp: PasswordResponse = serde_json::from_str(json)
        .map_err(|e| ProviderError::new(CODE_INTERNAL, sdk_message(CODE_INTERNAL, Some(&e.to_string()))))?;
    Ok(Identity { uid: resp.local_id, email: resp.email, id_token: resp.id_token, refresh_token: resp.refresh_token })
}

/// Translate an Identity Toolkit error body into an SDK-style provider error.
fn parse_error(json: &str) -> ProviderError {
    let Ok(envelope) = serde_json::from_str::<ErrorEnvelope>(json) else {
        return ProviderError::new(CODE_INTERNAL, sdk_message(CODE_INTERNAL, None));
    };

    let raw = envelope.error.message;
    let (key, detail) = match raw.split_once(" : ") {
        Some((key, detail)) => (key.trim(), Some(detail.trim())),
        None => (raw.trim(), None),
    };
    let code = server_code(key);
    ProviderError::new(code, sdk_message(code, detail))
}

fn server_code(key: &str) -> &'static str {
    match key {
        "EMAIL_EXISTS" => super::CODE_EMAIL_EXISTS,
        "WEAK_PASSWORD" => super::CODE_WEAK_PASSWORD,
        "INVALID_EMAIL" => "auth/invalid-email",
        "MISSING_PASSWORD" => "auth/missing-password",
        "EMAIL_NOT_FOUND" => "auth/user-not-found",
        "INVALID_PASSWORD" => "auth/wrong-password",
        "INVALID_LOGIN_CREDENTIALS" => "auth/invalid-credential",
        "USER_DISABLED" => "auth/user-disabled",
        "TOO_MANY_ATTEMPTS_TRY_LATER" => "auth/too-many-requests",
        "OPERATION_NOT_ALLOWED" | "PASSWORD_LOGIN_DISABLED" => "auth/operation-not-allowed",
        "INVALID_API_KEY" => "auth/invalid-api-key",
        _ if key.starts_with("API key not valid") => "auth/invalid-api-key",
        _ => CODE_INTERNAL,
    }
}

fn sdk_message(code: &str, detail: Option<&str>) -> String {
    match detail {
        Some(detail) if !detail.is_empty() => format!("Firebase: {detail} ({code})."),
        _ => format!("Firebase: Error ({code})."),
    }
}

#[cfg(test)]
#[path = "firebase_test.rs"]
mod tests;
