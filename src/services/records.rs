//! Record store: cached borrowed-book list plus its mutations.
//!
//! DESIGN
//! ======
//! The cache mirrors the borrowed collection and is only ever replaced
//! wholesale by `refresh`, which runs on mount and after every successful
//! mutation. There is no optimistic local edit: what views see is always the
//! last full read.
//!
//! Every operation logs failures for operators and shows a notice to the
//! user. `submit` resolves the record from the cache, not the backend, and
//! hands the move to the store's atomic `move_document`.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

use crate::config::Collections;
use crate::docstore::{Document, DocumentStore, Fields, StoreError};
use crate::error::ErrorCode;
use crate::notify::{Notice, Notifier};

/// Key under which a submitted record keeps its old borrowed id.
pub const RECORD_ID_FIELD: &str = "id";

// =============================================================================
// TYPES
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum RecordError {
    #[error("record not found: {0}")]
    NotFound(String),
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl ErrorCode for RecordError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "E_RECORD_NOT_FOUND",
            Self::Store(e) => e.error_code(),
        }
    }

    fn retryable(&self) -> bool {
        matches!(self, Self::Store(e) if e.retryable())
    }
}

/// One borrowed book as cached from the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BookRecord {
    pub id: String,
    pub fields: Fields,
}

impl BookRecord {
    /// Payload written to the submitted collection: the fields plus the old id.
    #[must_use]
    pub fn submission_payload(&self) -> Fields {
        let mut payload = Fields::with_capacity(self.fields.len() + 1);
        payload.insert(RECORD_ID_FIELD.to_string(), serde_json::Value::String(self.id.clone()));
        payload.extend(self.fields.iter().map(|(k, v)| (k.clone(), v.clone())));
        payload
    }
}

impl From<Document> for BookRecord {
    fn from(doc: Document) -> Self {
        Self { id: doc.id, fields: doc.fields }
    }
}

// =============================================================================
// STORE
// =============================================================================

pub struct RecordStore {
    store: Arc<dyn DocumentStore>,
    notifier: Arc<dyn Notifier>,
    collections: Collections,
    records: watch::Sender<Vec<BookRecord>>,
}

impl RecordStore {
    /// Build a store with an empty cache. Call [`RecordStore::refresh`] or use
    /// [`RecordStore::mount`] to populate it.
    #[must_use]
    pub fn new(store: Arc<dyn DocumentStore>, notifier: Arc<dyn Notifier>, collections: Collections) -> Self {
        Self { store, notifier, collections, records: watch::Sender::new(Vec::new()) }
    }

    /// Build a store and load the borrowed collection once.
    ///
    /// A failed initial load has already been logged and shown to the user;
    /// the cache stays empty.
    pub async fn mount(store: Arc<dyn DocumentStore>, notifier: Arc<dyn Notifier>, collections: Collections) -> Self {
        let records = Self::new(store, notifier, collections);
        records.reload().await;
        records
    }

    #[must_use]
    pub fn snapshot(&self) -> Vec<BookRecord> {
        self.records.borrow().clone()
    }

    /// Look up a record in the local cache only.
    #[must_use]
    pub fn find(&self, id: &str) -> Option<BookRecord> {
        self.records.borrow().iter().find(|r| r.id == id).cloned()
    }

    /// Receive every cache replacement from now on.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<Vec<BookRecord>> {
        self.records.subscribe()
    }

    /// Replace the cache with a full read of the borrowed collection.
    ///
    /// # Errors
    ///
    /// Returns the store error after notifying the user; the cache is left as it was.
    pub async fn refresh(&self) -> Result<(), RecordError> {
        let collection = &self.collections.borrowed;
        match self.store.list_all(collection).await {
            Ok(docs) => {
                let records: Vec<BookRecord> = docs.into_iter().map(BookRecord::from).collect();
                debug!(%collection, count = records.len(), "records refreshed");
                self.records.send_replace(records);
                Ok(())
            }
            Err(e) => {
                error!(%collection, error = %e, "record refresh failed");
                self.notifier
                    .notify(&Notice::error("Error loading books", e.to_string()));
                Err(e.into())
            }
        }
    }

    /// Add a borrowed book. Returns the backend-assigned id.
    ///
    /// # Errors
    ///
    /// Returns the store error after logging it and notifying the user.
    pub async fn create(&self, payload: &Fields) -> Result<String, RecordError> {
        match self.store.insert(&self.collections.borrowed, payload).await {
            Ok(id) => {
                info!(%id, "book added");
                self.reload().await;
                Ok(id)
            }
            Err(e) => {
                error!(error = %e, "adding book failed");
                self.notifier
                    .notify(&Notice::error("Error adding book", e.to_string()));
                Err(e.into())
            }
        }
    }

    /// Merge `patch` into a borrowed book. Keys absent from `patch` are kept.
    ///
    /// # Errors
    ///
    /// Returns the store error after notifying the user; the cache is not refreshed.
    pub async fn update(&self, id: &str, patch: &Fields) -> Result<(), RecordError> {
        match self
            .store
            .update_fields(&self.collections.borrowed, id, patch)
            .await
        {
            Ok(()) => {
                info!(%id, fields = patch.len(), "book updated");
                self.notifier
                    .notify(&Notice::success("Book updated successfully!", ""));
                self.reload().await;
                Ok(())
            }
            Err(e) => {
                error!(%id, error = %e, "updating book failed");
                self.notifier
                    .notify(&Notice::error("Error updating book", e.to_string()));
                Err(e.into())
            }
        }
    }

    /// Move a cached borrowed book into the submitted collection. Returns the
    /// id of the submitted copy, which is unrelated to `id`.
    ///
    /// # Errors
    ///
    /// Returns [`RecordError::NotFound`] without touching the backend when `id`
    /// is not in the cache, or the store error if the move fails.
    pub async fn submit(&self, id: &str) -> Result<String, RecordError> {
        let Some(record) = self.find(id) else {
            warn!(%id, "submit requested for uncached book");
            self.notifier.notify(&Notice::error("Error", "Book not found."));
            return Err(RecordError::NotFound(id.to_string()));
        };

        let payload = record.submission_payload();
        match self
            .store
            .move_document(&self.collections.borrowed, id, &self.collections.submitted, &payload)
            .await
        {
            Ok(submitted_id) => {
                info!(%id, %submitted_id, "book submitted");
                self.notifier.notify(&Notice::success(
                    "Submitted!",
                    "Your submission has been recorded successfully.",
                ));
                self.reload().await;
                Ok(submitted_id)
            }
            Err(e) => {
                error!(%id, error = %e, "submitting book failed");
                self.notifier.notify(&Notice::error(
                    "Error",
                    format!("An error occurred while submitting the book: {e}"),
                ));
                Err(e.into())
            }
        }
    }

    /// File a user report. Does not touch the record cache.
    ///
    /// # Errors
    ///
    /// Returns the store error after notifying the user.
    pub async fn report_issue(&self, payload: &Fields) -> Result<String, RecordError> {
        match self.store.insert(&self.collections.reports, payload).await {
            Ok(id) => {
                info!(%id, "report submitted");
                self.notifier.notify(&Notice::success(
                    "Report Submitted!",
                    "Our team will review your report and take necessary actions to address the problem.",
                ));
                Ok(id)
            }
            Err(e) => {
                error!(error = %e, "submitting report failed");
                self.notifier.notify(&Notice::error(
                    "Error",
                    format!("An error occurred while submitting the report: {e}"),
                ));
                Err(e.into())
            }
        }
    }

    /// Refresh after a mutation. Failures were already surfaced by `refresh`.
    async fn reload(&self) {
        let _ = self.refresh().await;
    }
}

#[cfg(test)]
#[path = "records_test.rs"]
mod tests;
