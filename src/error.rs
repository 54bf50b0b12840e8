//! Shared error-code contract for service and adapter errors.

/// Grepable error code and retryable flag for errors surfaced to callers.
pub trait ErrorCode: std::fmt::Display {
    fn error_code(&self) -> &'static str;

    fn retryable(&self) -> bool {
        false
    }
}
