#![allow(dead_code)]

use candle_sync::db::{connection, migrate};
use diesel::QueryableByName;
use diesel::prelude::*;
use diesel::sql_types::{Integer, Text};
use std::path::PathBuf;
use tempfile::TempDir;
use tick_feed::models::tick::{TickEvent, TickQuote};

#[derive(QueryableByName)]
struct JournalMode {
    #[diesel(sql_type = Text)]
    journal_mode: String,
}
#[derive(QueryableByName)]
struct ForeignKeys {
    #[diesel(sql_type = Integer)]
    foreign_keys: i32,
}
#[derive(QueryableByName)]
struct BusyTimeout {
    #[diesel(sql_type = Integer, column_name = "timeout")]
    busy_timeout: i32,
}

pub struct TestDb {
    _dir: TempDir,    // keep alive for the life of the test
    pub path: String, // <tmpdir>/candles.db
}

pub fn temp_db() -> TestDb {
    let dir = TempDir::new().expect("tempdir");
    let mut p = PathBuf::from(dir.path());
    p.push("candles.db");
    let path = p.to_string_lossy().to_string();
    TestDb { _dir: dir, path }
}

pub fn setup_db() -> (TestDb, SqliteConnection) {
    let db = temp_db();
    migrate::run_sqlite(&db.path).expect("migrations");
    let conn = connection::connect_sqlite(&db.path).expect("connect");
    (db, conn)
}

pub fn assert_sqlite_pragmas(conn: &mut SqliteConnection) {
    use diesel::sql_query;

    let jm: JournalMode = sql_query("PRAGMA journal_mode;").get_result(conn).unwrap();
    assert_eq!(jm.journal_mode.to_lowercase(), "wal");

    let fk: ForeignKeys = sql_query("PRAGMA foreign_keys;").get_result(conn).unwrap();
    assert_eq!(fk.foreign_keys, 1);

    let bt: BusyTimeout = sql_query("PRAGMA busy_timeout;").get_result(conn).unwrap();
    assert_eq!(bt.busy_timeout, 5000);
}

pub fn tick(ts: i64, o: f64, h: f64, l: f64, c: f64) -> TickEvent {
    TickEvent::new(TickQuote::new(o, h, l, c)).with_timestamp(ts)
}
