//! Session manager: sign-up, sign-in, sign-out, and the last auth error.
//!
//! ARCHITECTURE
//! ============
//! State is `{ identity, last_error }` held in a `watch` channel so views can
//! read a snapshot or await changes. Every provider failure is classified
//! into [`AuthError`], written to `last_error`, and returned to the caller.
//!
//! TRADE-OFFS
//! ==========
//! The "account already exists" failure blocks on a modal acknowledgment
//! before redirecting to the entry route, so `register` resolves only after
//! the user dismisses it. Overlapping calls are not serialized here; the last
//! one to finish wins the state.

use std::sync::Arc;

use serde::Serialize;
use tokio::sync::watch;
use tracing::{info, warn};

use crate::config::Routes;
use crate::error::ErrorCode;
use crate::identity::{
    CODE_EMAIL_EXISTS, CODE_NETWORK_FAILED, CODE_WEAK_PASSWORD, Credentials, Identity, IdentityProvider, ProviderError,
    TokenSource,
};
use crate::notify::{Navigator, Notice, Notifier};

pub const ACCOUNT_EXISTS_MESSAGE: &str = "Proceed to Login.";
pub const WEAK_PASSWORD_MESSAGE: &str = "Weak password.";
pub const ACCOUNT_EXISTS_TITLE: &str = "Account Already Registered";

// =============================================================================
// TYPES
// =============================================================================

/// Classified authentication failure.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthError {
    /// The email is already registered; the user should log in instead.
    #[error("{}", ACCOUNT_EXISTS_MESSAGE)]
    AccountExists,

    #[error("{}", WEAK_PASSWORD_MESSAGE)]
    WeakPassword,

    /// Any other provider failure. Displays the provider's message unchanged.
    #[error("{message}")]
    Other { code: String, message: String },
}

impl AuthError {
    /// Map a provider error onto the closed taxonomy. Unknown codes become `Other`.
    #[must_use]
    pub fn classify(err: &ProviderError) -> Self {
        match err.code.as_str() {
            CODE_EMAIL_EXISTS => Self::AccountExists,
            CODE_WEAK_PASSWORD => Self::WeakPassword,
            _ => Self::Other { code: err.code.clone(), message: err.message.clone() },
        }
    }
}

impl ErrorCode for AuthError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::AccountExists => "E_ACCOUNT_EXISTS",
            Self::WeakPassword => "E_WEAK_PASSWORD",
            Self::Other { .. } => "E_AUTH",
        }
    }

    fn retryable(&self) -> bool {
        matches!(self, Self::Other { code, .. } if code == CODE_NETWORK_FAILED)
    }
}

/// Whether a user is signed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    Anonymous,
    Authenticated,
}

/// Observable session state.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SessionState {
    pub identity: Option<Identity>,
    /// User-facing message of the most recent failed attempt.
    pub last_error: Option<String>,
}

impl SessionState {
    #[must_use]
    pub fn phase(&self) -> SessionPhase {
        if self.identity.is_some() { SessionPhase::Authenticated } else { SessionPhase::Anonymous }
    }
}

// =============================================================================
// MANAGER
// =============================================================================

pub struct SessionManager {
    provider: Arc<dyn IdentityProvider>,
    notifier: Arc<dyn Notifier>,
    navigator: Arc<dyn Navigator>,
    routes: Routes,
    state: watch::Sender<SessionState>,
}

impl SessionManager {
    #[must_use]
    pub fn new(
        provider: Arc<dyn IdentityProvider>,
        notifier: Arc<dyn Notifier>,
        navigator: Arc<dyn Navigator>,
        routes: Routes,
    ) -> Self {
        Self { provider, notifier, navigator, routes, state: watch::Sender::new(SessionState::default()) }
    }

    #[must_use]
    pub fn snapshot(&self) -> SessionState {
        self.state.borrow().clone()
    }

    #[must_use]
    pub fn identity(&self) -> Option<Identity> {
        self.state.borrow().identity.clone()
    }

    #[must_use]
    pub fn last_error(&self) -> Option<String> {
        self.state.borrow().last_error.clone()
    }

    /// Receive every state change from now on.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.state.subscribe()
    }

    /// Create an account and sign it in.
    ///
    /// # Errors
    ///
    /// Returns the classified [`AuthError`]. For [`AuthError::AccountExists`]
    /// the user has already acknowledged the modal and been sent to the entry
    /// route when this returns.
    pub async fn register(&self, credentials: &Credentials) -> Result<Identity, AuthError> {
        match self.provider.register(credentials).await {
            Ok(identity) => {
                info!(uid = %identity.uid, "account registered");
                self.signed_in(&identity);
                Ok(identity)
            }
            Err(err) => Err(self.failed(&err).await),
        }
    }

    /// Sign in to an existing account and navigate home.
    ///
    /// # Errors
    ///
    /// Returns the classified [`AuthError`]; no navigation happens then.
    pub async fn authenticate(&self, credentials: &Credentials) -> Result<Identity, AuthError> {
        match self.provider.authenticate(credentials).await {
            Ok(identity) => {
                info!(uid = %identity.uid, "signed in");
                self.signed_in(&identity);
                self.navigator.navigate(&self.routes.home);
                Ok(identity)
            }
            Err(err) => Err(self.failed(&err).await),
        }
    }

    /// Drop the current identity and return to the anonymous state.
    pub fn sign_out(&self) {
        let previous = self.state.send_replace(SessionState::default());
        if let Some(identity) = previous.identity {
            info!(uid = %identity.uid, "signed out");
        }
    }

    fn signed_in(&self, identity: &Identity) {
        self.state.send_replace(SessionState { identity: Some(identity.clone()), last_error: None });
    }

    async fn failed(&self, err: &ProviderError) -> AuthError {
        let auth_err = AuthError::classify(err);
        warn!(provider_code = %err.code, code = auth_err.error_code(), error = %auth_err, "authentication failed");
        self.state
            .send_modify(|state| state.last_error = Some(auth_err.to_string()));

        if auth_err == AuthError::AccountExists {
            self.notifier
                .acknowledge(&Notice::error(ACCOUNT_EXISTS_TITLE, ACCOUNT_EXISTS_MESSAGE))
                .await;
            self.navigator.navigate(&self.routes.entry);
        }

        auth_err
    }
}

/// Backend calls follow the session: the token disappears on `sign_out`.
impl TokenSource for SessionManager {
    fn id_token(&self) -> Option<String> {
        self.state
            .borrow()
            .identity
            .as_ref()
            .and_then(|identity| identity.id_token.clone())
    }
}

#[cfg(test)]
#[path = "session_test.rs"]
mod tests;
