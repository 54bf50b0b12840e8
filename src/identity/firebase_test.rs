use super::*;
use crate::identity::{CODE_EMAIL_EXISTS, CODE_WEAK_PASSWORD};

// =============================================================================
// endpoint_url
// =============================================================================

#[test]
fn endpoint_url_appends_key() {
    let url = endpoint_url("https://identitytoolkit.googleapis.com/v1", SIGN_UP_ENDPOINT, "abc");
    assert_eq!(url, "https://identitytoolkit.googleapis.com/v1/accounts:signUp?key=abc");
}

#[test]
fn sign_in_endpoint_name() {
    let url = endpoint_url("http://localhost:9099/identitytoolkit.googleapis.com/v1", SIGN_IN_ENDPOINT, "k");
    assert!(url.ends_with("/accounts:signInWithPassword?key=k"));
}

// =============================================================================
// request body
// =============================================================================

#[test]
fn password_request_uses_camel_case() {
    let body = PasswordRequest { email: "a@b.c", password: "hunter22", return_secure_token: true };
    let json = serde_json::to_value(&body).unwrap();
    assert_eq!(json["email"], "a@b.c");
    assert_eq!(json["password"], "hunter22");
    assert_eq!(json["returnSecureToken"], true);
}

// =============================================================================
// parse_identity
// =============================================================================

#[test]
fn parse_identity_reads_tokens() {
    let json = r#"{
        "kind": "identitytoolkit#SignupNewUserResponse",
        "idToken": "id-tok",
        "email": "reader@example.com",
        "refreshToken": "refresh-tok",
        "expiresIn": "3600",
        "localId": "uid-42"
    }"#;
    let identity = parse_identity(json).unwrap();
    assert_eq!(identity.uid, "uid-42");
    assert_eq!(identity.email.as_deref(), Some("reader@example.com"));
    assert_eq!(identity.id_token.as_deref(), Some("id-tok"));
    assert_eq!(identity.refresh_token.as_deref(), Some("refresh-tok"));
}

#[test]
fn parse_identity_rejects_missing_local_id() {
    let err = parse_identity(r#"{"email": "x@y.z"}"#).unwrap_err();
    assert_eq!(err.code, CODE_INTERNAL);
    assert!(err.message.starts_with("Firebase: "));
}

// =============================================================================
// parse_error
// =============================================================================

fn error_body(message: &str) -> String {
    serde_json::json!({
        "error": { "code": 400, "message": message, "errors": [{ "message": message, "domain": "global", "reason": "invalid" }] }
    })
    .to_string()
}

#[test]
fn parse_error_email_exists() {
    let err = parse_error(&error_body("EMAIL_EXISTS"));
    assert_eq!(err.code, CODE_EMAIL_EXISTS);
    assert_eq!(err.message, "Firebase: Error (auth/email-already-in-use).");
}

#[test]
fn parse_error_weak_password_keeps_detail() {
    let err = parse_error(&error_body("WEAK_PASSWORD : Password should be at least 6 characters"));
    assert_eq!(err.code, CODE_WEAK_PASSWORD);
    assert_eq!(err.message, "Firebase: Password should be at least 6 characters (auth/weak-password).");
}

#[test]
fn parse_error_sign_in_failures() {
    assert_eq!(parse_error(&error_body("EMAIL_NOT_FOUND")).code, "auth/user-not-found");
    assert_eq!(parse_error(&error_body("INVALID_PASSWORD")).code, "auth/wrong-password");
    assert_eq!(parse_error(&error_body("INVALID_LOGIN_CREDENTIALS")).code, "auth/invalid-credential");
    assert_eq!(parse_error(&error_body("USER_DISABLED")).code, "auth/user-disabled");
    assert_eq!(parse_error(&error_body("TOO_MANY_ATTEMPTS_TRY_LATER : Access disabled")).code, "auth/too-many-requests");
}

#[test]
fn parse_error_invalid_api_key_message() {
    let err = parse_error(&error_body("API key not valid. Please pass a valid API key."));
    assert_eq!(err.code, "auth/invalid-api-key");
}

#[test]
fn parse_error_unknown_key_is_internal() {
    let err = parse_error(&error_body("SOMETHING_NEW"));
    assert_eq!(err.code, CODE_INTERNAL);
}

#[test]
fn parse_error_non_json_body() {
    let err = parse_error("<html>bad gateway</html>");
    assert_eq!(err.code, CODE_INTERNAL);
    assert_eq!(err.message, "Firebase: Error (auth/internal-error).");
}

#[test]
fn too_many_requests_is_retryable() {
    use crate::error::ErrorCode;
    let err = parse_error(&error_body("TOO_MANY_ATTEMPTS_TRY_LATER"));
    assert!(err.retryable());
    assert!(!parse_error(&error_body("EMAIL_EXISTS")).retryable());
}

// =============================================================================
// client construction
// =============================================================================

#[test]
fn new_client_uses_configured_base_url() {
    let config = FirebaseConfig {
        api_key: "key".into(),
        project_id: "proj".into(),
        auth_base_url: "http://localhost:9099/identitytoolkit.googleapis.com/v1".into(),
        firestore_base_url: "http://localhost:8080/v1".into(),
        database: "(default)".into(),
    };
    let client = FirebaseAuth::new(&config, HttpTimeouts::default()).unwrap();
    assert_eq!(
        client.endpoint_url(SIGN_UP_ENDPOINT),
        "http://localhost:9099/identitytoolkit.googleapis.com/v1/accounts:signUp?key=key"
    );
}
