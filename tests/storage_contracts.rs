//! Integration test contracts for SessionStore and OutcomeLog
//!
//! Each contract is written against the trait object and run for every
//! implementation the crate ships.

use flyme::booking::BookingRequest;
use flyme::dialog::BookingDialog;
use flyme::storage::SessionStore;
use flyme::{
    InMemoryOutcomeLog, InMemorySessionStore, JsonFileOutcomeLog, Outcome, OutcomeLog, Session,
    StorageError,
};
use std::sync::Arc;
use tokio_test::assert_ok;

fn draft(origin: &str) -> BookingRequest {
    BookingRequest::new()
        .with_origin(origin)
        .with_destination("Rome")
        .with_budget("$300")
        .with_departure("2022-07-01".parse().unwrap())
        .with_return("2022-07-08".parse().unwrap())
}

/// Test the contract for SessionStore::create
///
/// This test verifies that:
/// - A new session can be created and returns the correct session ID
/// - Creating a duplicate session returns an error
#[tokio::test]
async fn test_session_store_create_contract() {
    let store = InMemorySessionStore::new();
    let session = Session::new();
    let session_id = session.id;

    let created = assert_ok!(store.create(session.clone()).await);
    assert_eq!(
        created, session_id,
        "SessionStore::create should return the session ID"
    );

    let duplicate = store.create(session).await;
    assert!(
        matches!(duplicate, Err(StorageError::AlreadyExists(_))),
        "SessionStore::create should fail for duplicate session ID"
    );
}

/// Test the contract for SessionStore::get and SessionStore::update
///
/// This test verifies that:
/// - Getting a non-existent session returns None
/// - A suspended booking dialog survives a write and read back
/// - Every accepted write returns the next version
/// - Updating a non-existent session returns NotFound
#[tokio::test]
async fn test_session_store_get_update_contract() {
    let store = InMemorySessionStore::new();
    let session = Session::new();
    let session_id = session.id;

    assert!(assert_ok!(store.get(&session_id).await).is_none());

    store.create(session).await.unwrap();

    let mut session = store.get(&session_id).await.unwrap().unwrap();
    let (dialog, _) = BookingDialog::begin(BookingRequest::new().with_origin("Paris"));
    session.start_booking(dialog.clone());
    assert_eq!(assert_ok!(store.update(&session_id, session).await), 1);

    let mut retrieved = store.get(&session_id).await.unwrap().unwrap();
    assert_eq!(
        retrieved.booking_dialog(),
        Some(&dialog),
        "SessionStore::get should return the updated conversation state"
    );

    retrieved.reset();
    assert_eq!(assert_ok!(store.update(&session_id, retrieved).await), 2);

    let missing = store.update(&Session::new().id, Session::new()).await;
    assert!(matches!(missing, Err(StorageError::NotFound(_))));
}

/// Two turns that loaded the same copy cannot both write it back
#[tokio::test]
async fn test_session_store_rejects_stale_write_contract() {
    let store: Arc<dyn SessionStore> = Arc::new(InMemorySessionStore::new());
    let session_id = store.create(Session::new()).await.unwrap();

    let mut accepted = store.get(&session_id).await.unwrap().unwrap();
    let mut stale = accepted.clone();

    let (dialog, _) = BookingDialog::begin(draft("Paris"));
    accepted.start_booking(dialog.clone());
    assert_ok!(store.update(&session_id, accepted).await);

    stale.reset();
    let result = store.update(&session_id, stale).await;
    assert!(
        matches!(result, Err(StorageError::Conflict(_))),
        "SessionStore::update should refuse a write based on an old version"
    );

    let stored = store.get(&session_id).await.unwrap().unwrap();
    assert_eq!(stored.booking_dialog(), Some(&dialog));
}

/// Test the contract for SessionStore::delete
#[tokio::test]
async fn test_session_store_delete_contract() {
    let store = InMemorySessionStore::new();

    let first = Session::new();
    let second = Session::new();
    store.create(first.clone()).await.unwrap();
    store.create(second.clone()).await.unwrap();

    assert_ok!(store.delete(&first.id).await);
    assert!(store.get(&first.id).await.unwrap().is_none());
    assert!(store.get(&second.id).await.unwrap().is_some());

    let again = store.delete(&first.id).await;
    assert!(
        matches!(again, Err(StorageError::NotFound(_))),
        "SessionStore::delete should fail for a deleted session"
    );
}

/// Test concurrent operations on SessionStore
#[tokio::test]
async fn test_session_store_concurrent_operations_contract() {
    let store: Arc<dyn SessionStore> = Arc::new(InMemorySessionStore::new());

    let creates = (0..20).map(|_| {
        let store = store.clone();
        async move { store.create(Session::new()).await }
    });
    let ids: Vec<_> = futures::future::join_all(creates)
        .await
        .into_iter()
        .map(|r| r.unwrap())
        .collect();

    let reads = ids.iter().map(|id| {
        let store = store.clone();
        let id = *id;
        async move { store.get(&id).await }
    });
    for result in futures::future::join_all(reads).await {
        let session = result.unwrap().unwrap();
        assert_eq!(session.version, 0);
    }
}

async fn outcome_log_contract(log: &dyn OutcomeLog) {
    let empty = assert_ok!(log.load().await);
    assert!(empty.is_empty(), "A fresh outcome log should be empty");

    assert_ok!(log.append(Outcome::Accepted, draft("Paris")).await);
    assert_ok!(log.append(Outcome::Abandoned, draft("Lyon")).await);
    assert_ok!(log.append(Outcome::Accepted, draft("Nice")).await);

    let records = log.load().await.unwrap();
    assert_eq!(records.successful.len(), 2);
    assert_eq!(records.unsuccessful.len(), 1);

    let origins: Vec<_> = records
        .bucket(Outcome::Accepted)
        .iter()
        .map(|r| r.origin_city.as_deref().unwrap())
        .collect();
    assert_eq!(origins, vec!["Paris", "Nice"], "Appends should keep their order");
    assert_eq!(records.unsuccessful[0], draft("Lyon"));
}

#[tokio::test]
async fn test_in_memory_outcome_log_contract() {
    outcome_log_contract(&InMemoryOutcomeLog::new()).await;
}

#[tokio::test]
async fn test_json_file_outcome_log_contract() {
    let dir = tempfile::tempdir().unwrap();
    let log = JsonFileOutcomeLog::new(dir.path().join("performances.json"));
    outcome_log_contract(&log).await;
}

/// The file written by one log instance is read back by a fresh one
#[tokio::test]
async fn test_json_file_outcome_log_persists_across_instances() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("performances.json");

    JsonFileOutcomeLog::new(&path)
        .append(Outcome::Accepted, draft("Paris"))
        .await
        .unwrap();

    let reopened = JsonFileOutcomeLog::new(&path);
    let records = reopened.load().await.unwrap();
    assert_eq!(records.successful, vec![draft("Paris")]);

    let raw: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(raw["successful"][0]["or_city"], "Paris");
    assert_eq!(raw["successful"][0]["str_date"], "2022-07-01");
    assert_eq!(raw["unsuccessful"], serde_json::json!([]));
}

/// Test that the trait objects can be shared across tasks
#[tokio::test]
async fn test_thread_safety_contract() {
    let store: Arc<dyn SessionStore> = Arc::new(InMemorySessionStore::new());
    let log: Arc<dyn OutcomeLog> = Arc::new(InMemoryOutcomeLog::new());

    let handle = tokio::spawn({
        let store = store.clone();
        let log = log.clone();
        async move {
            let id = store.create(Session::new()).await.unwrap();
            log.append(Outcome::Abandoned, BookingRequest::new()).await.unwrap();
            id
        }
    });
    let session_id = handle.await.unwrap();

    assert!(store.get(&session_id).await.unwrap().is_some());
    assert_eq!(log.load().await.unwrap().unsuccessful.len(), 1);
}
