//! SQLite persistence layer for rates, channels and users

use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use rusqlite::{Connection, ErrorCode, OptionalExtension, Row, params};
use tracing::debug;

use super::{
    Channel, ChannelStore, CurrencyRate, RateStore, StoreError, StoreResult, User, UserStore,
};

const SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS users (
        id       INTEGER PRIMARY KEY AUTOINCREMENT,
        tg_id    INTEGER NOT NULL UNIQUE,
        name     TEXT,
        is_admin INTEGER NOT NULL DEFAULT 0,
        created  TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now')),
        updated  TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now'))
    );

    CREATE TABLE IF NOT EXISTS channels (
        id         INTEGER PRIMARY KEY AUTOINCREMENT,
        channel_id TEXT NOT NULL UNIQUE,
        created    TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now')),
        updated    TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now'))
    );

    CREATE TABLE IF NOT EXISTS rates (
        id       INTEGER PRIMARY KEY AUTOINCREMENT,
        currency TEXT NOT NULL UNIQUE,
        rate     REAL NOT NULL,
        created  TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now')),
        updated  TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now'))
    );
";

const NOW: &str = "strftime('%Y-%m-%dT%H:%M:%fZ', 'now')";

/// SQLite-backed store. Pass `":memory:"` for an ephemeral database (useful
/// for tests).
pub struct Database {
    conn: Mutex<Connection>,
}

impl Database {
    /// Open (or create) a SQLite database at `path` and ensure all tables exist
    pub fn open(path: &str) -> StoreResult<Self> {
        let conn = Connection::open(path)
            .map_err(|e| StoreError::Backend(format!("failed to open database at {path}: {e}")))?;

        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA busy_timeout = 5000;",
        )
        .map_err(backend)?;

        conn.execute_batch(SCHEMA).map_err(backend)?;

        debug!(path, "database ready");
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Open a fresh in-memory database
    pub fn in_memory() -> StoreResult<Self> {
        Self::open(":memory:")
    }

    fn conn(&self) -> StoreResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| StoreError::Backend(format!("connection lock poisoned: {e}")))
    }
}

fn backend(err: rusqlite::Error) -> StoreError {
    StoreError::Backend(err.to_string())
}

/// Map constraint violations to `Duplicate`, everything else to `Backend`
fn classify(err: rusqlite::Error, what: impl FnOnce() -> String) -> StoreError {
    let is_constraint = matches!(
        &err,
        rusqlite::Error::SqliteFailure(e, _) if e.code == ErrorCode::ConstraintViolation
    );
    if is_constraint {
        StoreError::Duplicate(what())
    } else {
        backend(err)
    }
}

fn timestamp(row: &Row<'_>, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let raw: String = row.get(idx)?;
    raw.parse::<DateTime<Utc>>().map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
    })
}

fn rate_from_row(row: &Row<'_>) -> rusqlite::Result<CurrencyRate> {
    Ok(CurrencyRate {
        id: row.get(0)?,
        name: row.get(1)?,
        rate: row.get(2)?,
        created: timestamp(row, 3)?,
        updated: timestamp(row, 4)?,
    })
}

fn channel_from_row(row: &Row<'_>) -> rusqlite::Result<Channel> {
    Ok(Channel {
        id: row.get(0)?,
        identifier: row.get(1)?,
        created: timestamp(row, 2)?,
        updated: timestamp(row, 3)?,
    })
}

fn user_from_row(row: &Row<'_>) -> rusqlite::Result<User> {
    Ok(User {
        id: row.get(0)?,
        tg_id: row.get(1)?,
        name: row.get(2)?,
        is_admin: row.get(3)?,
        created: timestamp(row, 4)?,
        updated: timestamp(row, 5)?,
    })
}

const RATE_COLUMNS: &str = "id, currency, rate, created, updated";
const CHANNEL_COLUMNS: &str = "id, channel_id, created, updated";
const USER_COLUMNS: &str = "id, tg_id, name, is_admin, created, updated";

impl RateStore for Database {
    fn add_rate(&self, name: &str, rate: f64) -> StoreResult<CurrencyRate> {
        let conn = self.conn()?;
        conn.query_row(
            &format!("INSERT INTO rates (currency, rate) VALUES (?1, ?2) RETURNING {RATE_COLUMNS}"),
            params![name, rate],
            rate_from_row,
        )
        .map_err(|e| classify(e, || format!("rate {name}")))
    }

    fn get_rate(&self, id: i64) -> StoreResult<CurrencyRate> {
        let conn = self.conn()?;
        conn.query_row(
            &format!("SELECT {RATE_COLUMNS} FROM rates WHERE id = ?1"),
            params![id],
            rate_from_row,
        )
        .optional()
        .map_err(backend)?
        .ok_or_else(|| StoreError::NotFound(format!("rate {id}")))
    }

    fn list_rates(&self) -> StoreResult<Vec<CurrencyRate>> {
        let conn = self.conn()?;
        let mut stmt = conn
            .prepare(&format!("SELECT {RATE_COLUMNS} FROM rates ORDER BY id"))
            .map_err(backend)?;
        let rows = stmt.query_map([], rate_from_row).map_err(backend)?;
        rows.collect::<rusqlite::Result<Vec<_>>>().map_err(backend)
    }

    fn update_rate(&self, id: i64, rate: f64) -> StoreResult<CurrencyRate> {
        let conn = self.conn()?;
        conn.query_row(
            &format!(
                "UPDATE rates SET rate = ?2, updated = {NOW} WHERE id = ?1 RETURNING {RATE_COLUMNS}"
            ),
            params![id, rate],
            rate_from_row,
        )
        .optional()
        .map_err(backend)?
        .ok_or_else(|| StoreError::NotFound(format!("rate {id}")))
    }

    fn remove_rate(&self, id: i64) -> StoreResult<()> {
        let conn = self.conn()?;
        let affected = conn
            .execute("DELETE FROM rates WHERE id = ?1", params![id])
            .map_err(backend)?;
        if affected == 0 {
            return Err(StoreError::NotFound(format!("rate {id}")));
        }
        Ok(())
    }
}

impl ChannelStore for Database {
    fn add_channel(&self, identifier: &str) -> StoreResult<Channel> {
        let conn = self.conn()?;
        conn.query_row(
            &format!("INSERT INTO channels (channel_id) VALUES (?1) RETURNING {CHANNEL_COLUMNS}"),
            params![identifier],
            channel_from_row,
        )
        .map_err(|e| classify(e, || format!("channel {identifier}")))
    }

    fn get_channel(&self, id: i64) -> StoreResult<Channel> {
        let conn = self.conn()?;
        conn.query_row(
            &format!("SELECT {CHANNEL_COLUMNS} FROM channels WHERE id = ?1"),
            params![id],
            channel_from_row,
        )
        .optional()
        .map_err(backend)?
        .ok_or_else(|| StoreError::NotFound(format!("channel {id}")))
    }

    fn list_channels(&self) -> StoreResult<Vec<Channel>> {
        let conn = self.conn()?;
        let mut stmt = conn
            .prepare(&format!("SELECT {CHANNEL_COLUMNS} FROM channels ORDER BY id"))
            .map_err(backend)?;
        let rows = stmt.query_map([], channel_from_row).map_err(backend)?;
        rows.collect::<rusqlite::Result<Vec<_>>>().map_err(backend)
    }

    fn remove_channel(&self, identifier: &str) -> StoreResult<()> {
        let conn = self.conn()?;
        let affected = conn
            .execute("DELETE FROM channels WHERE channel_id = ?1", params![identifier])
            .map_err(backend)?;
        if affected == 0 {
            return Err(StoreError::NotFound(format!("channel {identifier}")));
        }
        Ok(())
    }
}

impl UserStore for Database {
    fn ensure_user(&self, tg_id: i64, name: Option<&str>) -> StoreResult<User> {
        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO users (tg_id, name) VALUES (?1, ?2) ON CONFLICT(tg_id) DO NOTHING",
            params![tg_id, name],
        )
        .map_err(backend)?;
        conn.query_row(
            &format!("SELECT {USER_COLUMNS} FROM users WHERE tg_id = ?1"),
            params![tg_id],
            user_from_row,
        )
        .map_err(backend)
    }

    fn is_admin(&self, tg_id: i64) -> StoreResult<bool> {
        let conn = self.conn()?;
        let flag: Option<bool> = conn
            .query_row(
                "SELECT is_admin FROM users WHERE tg_id = ?1",
                params![tg_id],
                |row| row.get(0),
            )
            .optional()
            .map_err(backend)?;
        Ok(flag.unwrap_or(false))
    }

    fn set_admin(&self, tg_id: i64, is_admin: bool) -> StoreResult<()> {
        let conn = self.conn()?;
        conn.execute(
            &format!(
                "INSERT INTO users (tg_id, is_admin) VALUES (?1, ?2)
                 ON CONFLICT(tg_id) DO UPDATE SET is_admin = excluded.is_admin, updated = {NOW}"
            ),
            params![tg_id, is_admin],
        )
        .map_err(backend)?;
        Ok(())
    }
}
