//! Shared application state.
//!
//! DESIGN
//! ======
//! `AppState` is the provider tree: it mounts the session manager and the
//! record store side by side and hands clones to whatever renders them.
//! The two services share collaborators (notifier) but never call each other.

use std::sync::Arc;

use crate::config::{Collections, Routes};
use crate::docstore::DocumentStore;
use crate::identity::IdentityProvider;
use crate::notify::{Navigator, Notifier};
use crate::services::records::RecordStore;
use crate::services::session::SessionManager;

/// Backend and UI collaborators injected into both services.
#[derive(Clone)]
pub struct Collaborators {
    pub identity: Arc<dyn IdentityProvider>,
    pub documents: Arc<dyn DocumentStore>,
    pub notifier: Arc<dyn Notifier>,
    pub navigator: Arc<dyn Navigator>,
}

/// Clone is cheap: both services are Arc-wrapped.
#[derive(Clone)]
pub struct AppState {
    pub session: Arc<SessionManager>,
    pub records: Arc<RecordStore>,
}

impl AppState {
    /// Build both services with an empty record cache.
    #[must_use]
    pub fn new(collaborators: Collaborators, collections: Collections, routes: Routes) -> Self {
        let session = SessionManager::new(
            collaborators.identity,
            Arc::clone(&collaborators.notifier),
            collaborators.navigator,
            routes,
        );
        let records = RecordStore::new(collaborators.documents, collaborators.notifier, collections);
        Self { session: Arc::new(session), records: Arc::new(records) }
    }

    /// Build both services and load the borrowed-book cache.
    pub async fn mount(collaborators: Collaborators, collections: Collections, routes: Routes) -> Self {
        let state = Self::new(collaborators, collections, routes);
        // A failed first load is already logged and shown to the user.
        let _ = state.records.refresh().await;
        state
    }
}

// =============================================================================
// TEST HELPERS
// =============================================================================

#[cfg(test)]
pub mod test_helpers {
    use std::collections::VecDeque;
    use std::sync::Mutex;

    use super::*;
    use crate::docstore::memory::MemoryStore;
    use crate::docstore::{Document, Fields, StoreError};
    use crate::identity::{Credentials, Identity, ProviderError};
    use crate::notify::Notice;

    /// Identity provider that replays scripted outcomes and records calls.
    #[derive(Default)]
    pub struct MockProvider {
        outcomes: Mutex<VecDeque<Result<Identity, ProviderError>>>,
        pub calls: Mutex<Vec<(String, String)>>,
    }

    impl MockProvider {
        pub fn new(outcomes: Vec<Result<Identity, ProviderError>>) -> Self {
            Self { outcomes: Mutex::new(outcomes.into()), calls: Mutex::new(Vec::new()) }
        }

        fn next(&self, op: &str, credentials: &Credentials) -> Result<Identity, ProviderError> {
            self.calls
                .lock()
                .unwrap()
                .push((op.to_string(), credentials.email.clone()));
            self.outcomes
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(ProviderError::new("auth/internal-error", "no scripted outcome")))
        }
    }

    #[async_trait::async_trait]
    impl IdentityProvider for MockProvider {
        async fn register(&self, credentials: &Credentials) -> Result<Identity, ProviderError> {
            self.next("register", credentials)
        }

        async fn authenticate(&self, credentials: &Credentials) -> Result<Identity, ProviderError> {
            self.next("authenticate", credentials)
        }
    }

    /// Notifier that keeps every notice, split by kind.
    #[derive(Default)]
    pub struct RecordingNotifier {
        pub toasts: Mutex<Vec<Notice>>,
        pub modals: Mutex<Vec<Notice>>,
    }

    impl RecordingNotifier {
        pub fn toasts(&self) -> Vec<Notice> {
            self.toasts.lock().unwrap().clone()
        }

        pub fn modals(&self) -> Vec<Notice> {
            self.modals.lock().unwrap().clone()
        }
    }

    #[async_trait::async_trait]
    impl Notifier for RecordingNotifier {
        fn notify(&self, notice: &Notice) {
            self.toasts.lock().unwrap().push(notice.clone());
        }

        async fn acknowledge(&self, notice: &Notice) {
            self.modals.lock().unwrap().push(notice.clone());
        }
    }

    #[derive(Default)]
    pub struct RecordingNavigator {
        pub routes: Mutex<Vec<String>>,
    }

    impl RecordingNavigator {
        pub fn routes(&self) -> Vec<String> {
            self.routes.lock().unwrap().clone()
        }
    }

    impl Navigator for RecordingNavigator {
        fn navigate(&self, route: &str) {
            self.routes.lock().unwrap().push(route.to_string());
        }
    }

    /// Which store operations `FailingStore` should reject.
    #[derive(Default, Clone, Copy)]
    pub struct Failures {
        pub list: bool,
        pub insert: bool,
        pub update: bool,
        pub delete: bool,
        pub moves: bool,
    }

    /// Wraps a `MemoryStore`, failing selected operations and counting writes.
    pub struct FailingStore {
        pub inner: MemoryStore,
        pub failures: Mutex<Failures>,
        pub writes: Mutex<Vec<&'static str>>,
    }

    impl FailingStore {
        pub fn new(failures: Failures) -> Self {
            Self { inner: MemoryStore::new(), failures: Mutex::new(failures), writes: Mutex::new(Vec::new()) }
        }

        pub fn set_failures(&self, failures: Failures) {
            *self.failures.lock().unwrap() = failures;
        }

        pub fn writes(&self) -> Vec<&'static str> {
            self.writes.lock().unwrap().clone()
        }

        fn check(&self, op: &'static str, fail: fn(&Failures) -> bool) -> Result<(), StoreError> {
            if op != "list" {
                self.writes.lock().unwrap().push(op);
            }
            if fail(&self.failures.lock().unwrap()) {
                return Err(StoreError::Response { status: 503, message: format!("{op} unavailable") });
            }
            Ok(())
        }
    }

    #[async_trait::async_trait]
    impl DocumentStore for FailingStore {
        async fn list_all(&self, collection: &str) -> Result<Vec<Document>, StoreError> {
            self.check("list", |f| f.list)?;
            self.inner.list_all(collection).await
        }

        async fn insert(&self, collection: &str, fields: &Fields) -> Result<String, StoreError> {
            self.check("insert", |f| f.insert)?;
            self.inner.insert(collection, fields).await
        }

        async fn update_fields(&self, collection: &str, id: &str, patch: &Fields) -> Result<(), StoreError> {
            self.check("update", |f| f.update)?;
            self.inner.update_fields(collection, id, patch).await
        }

        async fn delete_by_id(&self, collection: &str, id: &str) -> Result<(), StoreError> {
            self.check("delete", |f| f.delete)?;
            self.inner.delete_by_id(collection, id).await
        }

        async fn move_document(&self, from: &str, id: &str, to: &str, fields: &Fields) -> Result<String, StoreError> {
            self.check("move", |f| f.moves)?;
            self.inner.move_document(from, id, to, fields).await
        }
    }

    pub fn identity(uid: &str, email: &str) -> Identity {
        Identity { uid: uid.into(), email: Some(email.into()), id_token: Some(format!("token-{uid}")), refresh_token: None }
    }

    pub fn fields(pairs: &[(&str, serde_json::Value)]) -> Fields {
        pairs.iter().map(|(k, v)| ((*k).to_string(), v.clone())).collect()
    }
}

#[cfg(test)]
#[path = "state_test.rs"]
mod tests;
