// Drives the non-interactive subcommands of the compiled binary against a
// throwaway journal.

use assert_cmd::Command;
use chrono::{Local, TimeZone};
use tempfile::TempDir;

use stint::kv::SqliteKv;
use stint::session::{Annotation, StoredSession};
use stint::store::{KvSessionStore, SessionStore};

fn seeded_db(dir: &TempDir) -> std::path::PathBuf {
    let path = dir.path().join("sessions.db");
    let store = KvSessionStore::new(SqliteKv::open(&path).unwrap());
    let start = Local.with_ymd_and_hms(2024, 3, 9, 9, 0, 0).unwrap();
    let mut s = StoredSession::new(
        start,
        start + chrono::Duration::seconds(1500),
        1500,
        "deep work",
        vec![Annotation::new(65, "water")],
    );
    s.id = "first".into();
    store.insert(s).unwrap();
    path
}

fn stint(dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("stint").unwrap();
    // keep the log file out of the real state dir
    cmd.env("HOME", dir.path());
    cmd
}

#[test]
fn history_prints_day_sections() {
    let dir = TempDir::new().unwrap();
    let db = seeded_db(&dir);
    let out = stint(&dir)
        .arg("--db")
        .arg(&db)
        .arg("history")
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let text = String::from_utf8(out).unwrap();
    assert!(text.contains("Sat, March 9, 2024"));
    assert!(text.contains("25:00  deep work  [first]"));
    assert!(text.contains("01:05  water"));
}

#[test]
fn export_writes_csv_file() {
    let dir = TempDir::new().unwrap();
    let db = seeded_db(&dir);
    let csv_path = dir.path().join("out.csv");
    stint(&dir)
        .arg("--db")
        .arg(&db)
        .arg("export")
        .arg("--output")
        .arg(&csv_path)
        .assert()
        .success();

    let text = std::fs::read_to_string(csv_path).unwrap();
    let mut lines = text.lines();
    assert_eq!(
        lines.next(),
        Some("id,started_at,ended_at,duration_seconds,note,annotations")
    );
    let row = lines.next().unwrap();
    assert!(row.starts_with("first,"));
    assert!(row.ends_with(",1500,deep work,01:05 water"));
}

#[test]
fn delete_and_clear() {
    let dir = TempDir::new().unwrap();
    let db = seeded_db(&dir);

    stint(&dir)
        .arg("--db")
        .arg(&db)
        .args(["delete", "missing"])
        .assert()
        .success()
        .stdout("No session with id missing\n");

    stint(&dir)
        .arg("--db")
        .arg(&db)
        .args(["delete", "first"])
        .assert()
        .success();

    let store = KvSessionStore::new(SqliteKv::open(&db).unwrap());
    assert!(store.list_all().unwrap().is_empty());
    drop(store);

    stint(&dir)
        .arg("--db")
        .arg(&db)
        .args(["clear", "--yes"])
        .assert()
        .success();
}

#[test]
fn interactive_mode_needs_a_tty() {
    let dir = TempDir::new().unwrap();
    let db = dir.path().join("sessions.db");
    stint(&dir).arg("--db").arg(&db).assert().failure();
}
