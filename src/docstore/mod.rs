//! Document store seam: collection-scoped CRUD over open field maps.
//!
//! DESIGN
//! ======
//! Documents are `{ id, fields }` with no schema; `Fields` is a flat map of
//! string keys to JSON values, the same shape the record store hands out.
//! `move_document` is the one multi-document write and must be atomic:
//! either the source is deleted and the copy exists, or nothing changed.

pub mod firestore;
pub mod memory;

use std::collections::HashMap;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::ErrorCode;

/// Open key/value payload of a document. Alias to reduce noise in signatures.
pub type Fields = HashMap<String, serde_json::Value>;

/// A stored document with its backend-assigned id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub id: String,
    pub fields: Fields,
}

// =============================================================================
// ERROR
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("document not found: {collection}/{id}")]
    NotFound { collection: String, id: String },

    #[error("document already exists: {collection}/{id}")]
    AlreadyExists { collection: String, id: String },

    #[error("store request failed: {0}")]
    Request(String),

    #[error("store response error: status {status}: {message}")]
    Response { status: u16, message: String },

    #[error("store response parse failed: {0}")]
    Parse(String),

    #[error("store value encode failed: {0}")]
    Encode(String),

    #[error("HTTP client build failed: {0}")]
    HttpClientBuild(String),
}

impl ErrorCode for StoreError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::NotFound { .. } => "E_DOCUMENT_NOT_FOUND",
            Self::AlreadyExists { .. } => "E_DOCUMENT_EXISTS",
            Self::Request(_) => "E_STORE_REQUEST",
            Self::Response { .. } => "E_STORE_RESPONSE",
            Self::Parse(_) => "E_STORE_PARSE",
            Self::Encode(_) => "E_STORE_ENCODE",
            Self::HttpClientBuild(_) => "E_HTTP_CLIENT_BUILD",
        }
    }

    fn retryable(&self) -> bool {
        matches!(self, Self::Request(_) | Self::Response { status: 429 | 500..=599, .. })
    }
}

// =============================================================================
// STORE TRAIT
// =============================================================================

/// Async contract of the external document database. Enables mocking in tests.
#[async_trait::async_trait]
pub trait DocumentStore: Send + Sync {
    /// Read every document of `collection` in backend enumeration order.
    ///
    /// # Errors
    ///
    /// Returns a [`StoreError`] if the read fails.
    async fn list_all(&self, collection: &str) -> Result<Vec<Document>, StoreError>;

    /// Insert `fields` as a new document and return its generated id.
    ///
    /// # Errors
    ///
    /// Returns a [`StoreError`] if the write fails.
    async fn insert(&self, collection: &str, fields: &Fields) -> Result<String, StoreError>;

    /// Merge `patch` into an existing document. Keys absent from `patch` are untouched.
    /// An empty patch writes nothing but still requires the document to exist.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] if the document does not exist.
    async fn update_fields(&self, collection: &str, id: &str, patch: &Fields) -> Result<(), StoreError>;

    /// Delete a document by id.
    ///
    /// # Errors
    ///
    /// Returns a [`StoreError`] if the delete fails.
    async fn delete_by_id(&self, collection: &str, id: &str) -> Result<(), StoreError>;

    /// Atomically delete `from/id` and insert `fields` as a new document in `to`.
    /// Returns the id of the new document.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] if the source is gone; nothing is written then.
    async fn move_document(&self, from: &str, id: &str, to: &str, fields: &Fields) -> Result<String, StoreError>;
}

const DOCUMENT_ID_LEN: usize = 20;
const DOCUMENT_ID_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";

/// Generate a 20-character alphanumeric document id, the shape Firestore auto-ids take.
#[must_use]
pub fn generate_document_id() -> String {
    let mut rng = rand::rng();
    (0..DOCUMENT_ID_LEN)
        .map(|_| {
            let idx = rng.random_range(0..DOCUMENT_ID_ALPHABET.len());
            DOCUMENT_ID_ALPHABET[idx] as char
        })
        .collect()
}

#[cfg(test)]
#[path = "mod_test.rs"]
mod tests;
