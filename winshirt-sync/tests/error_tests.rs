use std::time::Duration;
use winshirt_model::ModelError;
use winshirt_storage::StorageError;
use winshirt_sync::{RemoteError, RemoteErrorKind, SyncError};

// --- Display ---

#[test]
fn connectivity_display() {
    let err = RemoteError::Connectivity("connection refused".into());
    assert_eq!(err.to_string(), "remote store unreachable: connection refused");
}

#[test]
fn timeout_display() {
    let err = RemoteError::Timeout(Duration::from_secs(30));
    assert_eq!(err.to_string(), "remote call timed out after 30s");
}

#[test]
fn auth_display() {
    let err = RemoteError::Auth("JWT expired".into());
    assert_eq!(err.to_string(), "authentication failed: JWT expired");
}

#[test]
fn schema_display() {
    let err = RemoteError::Schema("relation missing".into());
    assert_eq!(err.to_string(), "schema mismatch: relation missing");
}

#[test]
fn rejected_display() {
    let err = RemoteError::Rejected("duplicate key".into());
    assert_eq!(err.to_string(), "data rejected: duplicate key");
}

#[test]
fn api_display() {
    let err = RemoteError::Api {
        status: 500,
        code: None,
        message: "boom".into(),
    };
    assert_eq!(err.to_string(), "remote request failed (500): boom");
}

#[test]
fn sync_error_wraps_remote_transparently() {
    let err: SyncError = RemoteError::Auth("nope".into()).into();
    assert_eq!(err.to_string(), "authentication failed: nope");
}

#[test]
fn sync_error_from_storage() {
    let err: SyncError = StorageError::LockPoisoned.into();
    assert!(err.to_string().starts_with("local cache error"));
}

#[test]
fn sync_error_from_model() {
    let err: SyncError = ModelError::MissingId.into();
    assert!(err.to_string().starts_with("invalid record"));
}

#[test]
fn config_display() {
    let err = SyncError::Config("missing anon_key".into());
    assert_eq!(err.to_string(), "invalid configuration: missing anon_key");
}

// --- Classification ---

#[test]
fn unauthorized_is_auth() {
    let err = RemoteError::from_response(401, r#"{"message":"Invalid API key"}"#);
    assert_eq!(err.kind(), RemoteErrorKind::Auth);
}

#[test]
fn expired_jwt_is_auth() {
    let err = RemoteError::from_response(400, r#"{"code":"PGRST301","message":"JWT expired"}"#);
    assert_eq!(err.kind(), RemoteErrorKind::Auth);
}

#[test]
fn row_level_security_is_auth() {
    let body = r#"{"code":"42501","message":"new row violates row-level security policy"}"#;
    assert_eq!(RemoteError::from_response(403, body).kind(), RemoteErrorKind::Auth);
}

#[test]
fn missing_relation_is_schema() {
    let body = r#"{"code":"42P01","message":"relation \"public.visuals\" does not exist"}"#;
    assert_eq!(RemoteError::from_response(404, body).kind(), RemoteErrorKind::Schema);
}

#[test]
fn schema_cache_miss_is_schema() {
    let body = r#"{"code":"PGRST205","message":"Could not find the table 'public.visuals' in the schema cache"}"#;
    assert_eq!(RemoteError::from_response(404, body).kind(), RemoteErrorKind::Schema);
}

#[test]
fn bodiless_not_found_is_schema() {
    let err = RemoteError::from_response(404, "");
    assert_eq!(err.kind(), RemoteErrorKind::Schema);
    assert!(err.is_systemic());
}

#[test]
fn unknown_column_is_schema() {
    let body = r#"{"code":"PGRST204","message":"Could not find the 'imageUrl' column of 'visuals' in the schema cache"}"#;
    assert_eq!(RemoteError::from_response(400, body).kind(), RemoteErrorKind::Schema);
}

#[test]
fn not_null_violation_is_validation() {
    let body = r#"{"code":"23502","message":"null value in column \"name\" violates not-null constraint"}"#;
    assert_eq!(RemoteError::from_response(400, body).kind(), RemoteErrorKind::Validation);
}

#[test]
fn conflict_is_validation() {
    let err = RemoteError::from_response(409, "");
    assert_eq!(err.kind(), RemoteErrorKind::Validation);
}

#[test]
fn gateway_errors_are_connectivity() {
    for status in [502, 503, 504] {
        assert_eq!(
            RemoteError::from_response(status, "").kind(),
            RemoteErrorKind::Connectivity
        );
    }
}

#[test]
fn server_error_is_other_and_keeps_code() {
    let err = RemoteError::from_response(500, r#"{"code":"XX000","message":"internal"}"#);
    assert_eq!(err.kind(), RemoteErrorKind::Other);
    assert!(matches!(err, RemoteError::Api { status: 500, code: Some(ref c), .. } if c == "XX000"));
}

#[test]
fn empty_body_falls_back_to_status() {
    let err = RemoteError::from_response(500, "");
    assert_eq!(err.to_string(), "remote request failed (500): HTTP 500");
}

#[test]
fn plain_text_body_is_kept() {
    let err = RemoteError::from_response(500, "upstream exploded");
    assert_eq!(err.to_string(), "remote request failed (500): upstream exploded");
}

#[test]
fn systemic_errors() {
    assert!(RemoteError::Connectivity("x".into()).is_systemic());
    assert!(RemoteError::Timeout(Duration::from_secs(1)).is_systemic());
    assert!(RemoteError::Auth("x".into()).is_systemic());
    assert!(RemoteError::Schema("x".into()).is_systemic());
    assert!(!RemoteError::Rejected("x".into()).is_systemic());
    assert!(!RemoteError::from_response(500, "").is_systemic());
}
