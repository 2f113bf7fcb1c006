use winshirt_model::{RecordId, Table};
use winshirt_sync::*;

// --- SyncOutcome ---

#[test]
fn push_without_failures_succeeds() {
    let outcome = SyncOutcome::pushed(Table::Products, 3, Vec::new(), None);
    assert!(outcome.succeeded);
    assert!(!outcome.is_failure());
}

#[test]
fn push_with_failed_ids_never_succeeds() {
    let outcome = SyncOutcome::pushed(Table::Products, 2, vec![RecordId::Int(3)], Some("x".into()));
    assert!(!outcome.succeeded);
    assert!(outcome.is_failure());
}

#[test]
fn nothing_to_sync_is_not_a_failure() {
    let outcome = SyncOutcome::skipped(Table::Orders, SkipReason::NothingToSync, None);
    assert!(!outcome.succeeded);
    assert!(!outcome.is_failure());
}

#[test]
fn empty_remote_counts_as_success() {
    let outcome = SyncOutcome::skipped(Table::Orders, SkipReason::RemoteEmpty, None);
    assert!(outcome.succeeded);
}

#[test]
fn connectivity_skip_is_a_failure() {
    let outcome = SyncOutcome::skipped(Table::Orders, SkipReason::Connectivity, Some("down".into()));
    assert!(outcome.is_failure());
}

#[test]
fn pulled_outcome() {
    let outcome = SyncOutcome::pulled(Table::Visuals, 4);
    assert!(outcome.succeeded);
    assert_eq!(outcome.pulled, 4);
    assert_eq!(outcome.descriptor().name, "visuals");
}

// --- SyncReport ---

#[test]
fn report_succeeds_when_only_benign_skips() {
    let report = SyncReport::new(
        uuid::Uuid::now_v7(),
        vec![
            SyncOutcome::pushed(Table::Products, 1, Vec::new(), None),
            SyncOutcome::skipped(Table::Orders, SkipReason::NothingToSync, None),
        ],
    );
    assert!(report.succeeded);
    assert!(report.failed_tables().is_empty());
}

#[test]
fn report_fails_when_any_table_fails() {
    let report = SyncReport::new(
        uuid::Uuid::now_v7(),
        vec![
            SyncOutcome::pushed(Table::Products, 1, Vec::new(), None),
            SyncOutcome::skipped(Table::Orders, SkipReason::Auth, Some("jwt".into())),
        ],
    );
    assert!(!report.succeeded);
    assert_eq!(report.failed_tables(), vec![Table::Orders]);
    assert!(report.outcome(Table::Orders).is_some());
    assert!(report.outcome(Table::Clients).is_none());
}

#[test]
fn outcome_serializes_table_by_name() {
    let outcome = SyncOutcome::skipped(Table::OrderItems, SkipReason::RemoteEmpty, None);
    let json = serde_json::to_value(&outcome).unwrap();
    assert_eq!(json["table"], "order_items");
    assert_eq!(json["skipped"], "remote_empty");
}

// --- Skip reasons ---

#[test]
fn skip_reason_follows_error_kind() {
    assert_eq!(
        SkipReason::from_remote(&RemoteError::Auth("x".into())),
        SkipReason::Auth
    );
    assert_eq!(
        SkipReason::from_remote(&RemoteError::Schema("x".into())),
        SkipReason::Schema
    );
    assert_eq!(
        SkipReason::from_remote(&RemoteError::Rejected("x".into())),
        SkipReason::Remote
    );
}

// --- Connectivity ---

#[test]
fn disconnected_status_carries_error() {
    let status = ConnectivityStatus::disconnected("refused");
    assert!(!status.connected);
    assert_eq!(status.error.as_deref(), Some("refused"));
}

#[test]
fn sync_mode_serializes_lowercase() {
    assert_eq!(serde_json::to_value(SyncMode::Offline).unwrap(), "offline");
}
