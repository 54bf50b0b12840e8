//! Domain services consumed by the presentation layer.
//!
//! ARCHITECTURE
//! ============
//! Each service owns its observable state and talks to exactly one backend
//! seam, so views only subscribe and call operations.

pub mod records;
pub mod session;
