//! Bookshelf: session and borrowed-book state for the book-borrowing tracker.
//!
//! ARCHITECTURE
//! ============
//! Two services sit between the presentation layer and hosted backends:
//! `SessionManager` wraps the identity provider, `RecordStore` wraps the
//! document store. Both take their collaborators as trait objects so the
//! Firebase adapters can be swapped for in-process doubles.

pub mod config;
pub mod docstore;
pub mod error;
pub mod identity;
pub mod notify;
pub mod services;
pub mod state;
