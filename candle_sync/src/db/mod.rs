//! Database utilities for connections and schema migrations.
//!
//! This module provides:
//! - SQLite connection helpers: [`connection::connect_sqlite`] applies WAL, foreign_keys=ON, and a 5000ms busy_timeout.
//! - Embedded Diesel migrations: [`migrate::run_pending`] on an open connection and
//!   [`migrate::run_sqlite`] for a database URL.
//!
//! Example:
//! ```no_run
//! use candle_sync::db::{migrate, connection};
//!
//! let db_path = std::env::temp_dir().join("candle_sync_example.db");
//! migrate::run_sqlite(db_path.to_str().unwrap()).expect("migrations");
//!
//! let _conn = connection::connect_sqlite(db_path.to_str().unwrap()).expect("connect");
//! ```

pub mod connection;
pub mod migrate;
