//! User-facing notification and navigation surfaces.
//!
//! SYSTEM CONTEXT
//! ==============
//! Services report outcomes as [`Notice`] values and redirects as route
//! strings. The presentation layer implements [`Notifier`] and
//! [`Navigator`]; the tracing-backed sinks here serve headless runs.

use serde::{Deserialize, Serialize};
use tracing::{error, info};

/// Severity of a notice, which picks its icon/colour in the UI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeLevel {
    Success,
    Error,
}

/// A toast or modal shown to the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notice {
    pub level: NoticeLevel,
    pub title: String,
    pub text: String,
}

impl Notice {
    #[must_use]
    pub fn success(title: impl Into<String>, text: impl Into<String>) -> Self {
        Self { level: NoticeLevel::Success, title: title.into(), text: text.into() }
    }

    #[must_use]
    pub fn error(title: impl Into<String>, text: impl Into<String>) -> Self {
        Self { level: NoticeLevel::Error, title: title.into(), text: text.into() }
    }
}

/// Presents notices to the user.
#[async_trait::async_trait]
pub trait Notifier: Send + Sync {
    /// Show a non-blocking notice.
    fn notify(&self, notice: &Notice);

    /// Show a modal notice and resolve once the user acknowledges it.
    async fn acknowledge(&self, notice: &Notice);
}

/// Redirects the user to a route.
pub trait Navigator: Send + Sync {
    fn navigate(&self, route: &str);
}

// =============================================================================
// TRACING SINKS
// =============================================================================

/// Emits notices as log events. Modals acknowledge immediately.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingNotifier;

#[async_trait::async_trait]
impl Notifier for TracingNotifier {
    fn notify(&self, notice: &Notice) {
        match notice.level {
            NoticeLevel::Success => info!(title = %notice.title, text = %notice.text, "notice"),
            NoticeLevel::Error => error!(title = %notice.title, text = %notice.text, "notice"),
        }
    }

    async fn acknowledge(&self, notice: &Notice) {
        self.notify(notice);
    }
}

/// Emits navigations as log events.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingNavigator;

impl Navigator for TracingNavigator {
    fn navigate(&self, route: &str) {
        info!(route, "navigate");
    }
}
