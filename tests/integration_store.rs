use assert_matches::assert_matches;
use chrono::{Local, TimeZone};
use tempfile::TempDir;

use stint::error::{StoreError, TimerError};
use stint::kv::{KvStore, SqliteKv};
use stint::session::StoredSession;
use stint::store::{KvSessionStore, SessionStore, SESSIONS_KEY};
use stint::timer::{Status, TimerSession};

fn temp_store() -> (TempDir, std::path::PathBuf) {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("nested").join("sessions.db");
    (dir, path)
}

fn record(note: &str) -> StoredSession {
    let start = Local.with_ymd_and_hms(2024, 3, 9, 9, 0, 0).unwrap();
    StoredSession::new(start, start + chrono::Duration::seconds(90), 90, note, Vec::new())
}

#[test]
fn journal_survives_reopen() {
    let (_dir, path) = temp_store();
    let id = {
        let store = KvSessionStore::new(SqliteKv::open(&path).unwrap());
        store.insert(record("morning")).unwrap()
    };

    let store = KvSessionStore::new(SqliteKv::open(&path).unwrap());
    let all = store.list_all().unwrap();
    assert_eq!(all.len(), 1);
    assert_eq!(all[0].id, id);
    assert_eq!(all[0].note, "morning");
}

#[test]
fn timer_commit_lands_in_sqlite_with_wire_layout() {
    let (_dir, path) = temp_store();
    let store = KvSessionStore::new(SqliteKv::open(&path).unwrap());

    let started = Local.with_ymd_and_hms(2024, 3, 9, 9, 0, 0).unwrap();
    let mut timer = TimerSession::new(3600);
    timer.start(started).unwrap();
    for _ in 0..5 {
        timer.tick();
    }
    timer.annotate("check email").unwrap();
    for _ in 0..5 {
        timer.tick();
    }
    timer.finish().unwrap();
    let id = timer
        .commit(&store, "focused well", started + chrono::Duration::seconds(10))
        .unwrap();
    assert_eq!(timer.status(), Status::Idle);

    let raw = store.kv().get(SESSIONS_KEY).unwrap().unwrap();
    let blob: serde_json::Value = serde_json::from_str(&raw).unwrap();
    let entry = &blob[0];
    assert_eq!(entry["id"], id.as_str());
    assert_eq!(entry["duration"], 10);
    assert_eq!(entry["note"], "focused well");
    assert_eq!(entry["logs"][0]["time"], 5);
    assert_eq!(entry["logs"][0]["note"], "check email");
    assert!(entry["startedAt"].is_string());
    assert!(entry["endedAt"].is_string());
}

#[test]
fn corrupt_blob_is_reported_then_backed_up_on_write() {
    let (_dir, path) = temp_store();
    let store = KvSessionStore::new(SqliteKv::open(&path).unwrap());
    store.kv().set(SESSIONS_KEY, "{not json").unwrap();

    assert_matches!(store.list_all(), Err(StoreError::DeserializationFailure(_)));

    store.insert(record("fresh start")).unwrap();
    let all = store.list_all().unwrap();
    assert_eq!(all.len(), 1);
    assert_eq!(
        store.kv().get(&store.backup_key()).unwrap().as_deref(),
        Some("{not json")
    );
}

#[test]
fn quota_failure_keeps_timer_completed() {
    let (_dir, path) = temp_store();
    let store = KvSessionStore::new(SqliteKv::open(&path).unwrap().with_quota(16));

    let started = Local::now();
    let mut timer = TimerSession::new(3600);
    timer.start(started).unwrap();
    timer.tick();
    timer.finish().unwrap();

    let err = timer.commit(&store, "too big", Local::now()).unwrap_err();
    assert_matches!(err, TimerError::Store(ref e) if e.is_storage_failure());
    assert_eq!(timer.status(), Status::Completed);
    assert_eq!(timer.elapsed_seconds(), 1);
    assert!(store.list_all().unwrap().is_empty());
}

#[test]
fn legacy_field_names_are_read() {
    let (_dir, path) = temp_store();
    let store = KvSessionStore::new(SqliteKv::open(&path).unwrap());
    store
        .kv()
        .set(
            SESSIONS_KEY,
            r#"[{"id":"old","startTime":"2024-03-09T09:00:00+00:00","endTime":"2024-03-09T09:25:00+00:00","duration":1500}]"#,
        )
        .unwrap();

    let all = store.list_all().unwrap();
    assert_eq!(all.len(), 1);
    assert_eq!(all[0].duration_seconds, 1500);
    assert!(all[0].note.is_empty());
    assert!(all[0].annotations.is_empty());

    assert!(store.delete_by_id("old").unwrap());
    assert!(store.list_all().unwrap().is_empty());
}

#[test]
fn clear_all_empties_journal() {
    let (_dir, path) = temp_store();
    let store = KvSessionStore::new(SqliteKv::open(&path).unwrap());
    store.insert(record("a")).unwrap();
    store.insert(record("b")).unwrap();
    store.clear_all().unwrap();
    assert!(store.list_all().unwrap().is_empty());
}
