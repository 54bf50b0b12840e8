use super::*;

#[test]
fn generate_document_id_shape() {
    let id = generate_document_id();
    assert_eq!(id.len(), DOCUMENT_ID_LEN);
    assert!(id.chars().all(|c| c.is_ascii_alphanumeric()));
}

#[test]
fn generate_document_id_two_calls_differ() {
    assert_ne!(generate_document_id(), generate_document_id());
}

#[test]
fn store_error_codes() {
    let not_found = StoreError::NotFound { collection: "Books Borrowed".into(), id: "abc".into() };
    assert_eq!(not_found.error_code(), "E_DOCUMENT_NOT_FOUND");
    assert_eq!(not_found.to_string(), "document not found: Books Borrowed/abc");
    assert!(!not_found.retryable());
}

#[test]
fn store_error_retryable_statuses() {
    assert!(StoreError::Request("connection reset".into()).retryable());
    assert!(StoreError::Response { status: 503, message: "UNAVAILABLE".into() }.retryable());
    assert!(StoreError::Response { status: 429, message: "RESOURCE_EXHAUSTED".into() }.retryable());
    assert!(!StoreError::Response { status: 403, message: "PERMISSION_DENIED".into() }.retryable());
    assert!(!StoreError::Parse("eof".into()).retryable());
}
