use rusqlite::{Connection, OptionalExtension};
use serde_json::Value;
use std::path::Path;

use crate::model::Identity;

pub const DB_FILE: &str = "kesehatan.sqlite3";
/// Fixed key the signed-in identity lives under.
pub const SESSION_KEY: &str = "currentUser";

pub fn open_db(workspace: &Path) -> anyhow::Result<Connection> {
    std::fs::create_dir_all(workspace)?;
    let db_path = workspace.join(DB_FILE);
    let conn = Connection::open(db_path)?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS settings(
            key TEXT PRIMARY KEY,
            value_json TEXT NOT NULL,
            updated_at TEXT
        )",
        [],
    )?;

    Ok(conn)
}

pub fn settings_get_json(conn: &Connection, key: &str) -> anyhow::Result<Option<Value>> {
    let raw: Option<String> = conn
        .query_row(
            "SELECT value_json FROM settings WHERE key = ?",
            [key],
            |r| r.get(0),
        )
        .optional()?;
    match raw {
        Some(s) => Ok(Some(serde_json::from_str(&s)?)),
        None => Ok(None),
    }
}

pub fn settings_set_json(conn: &Connection, key: &str, value: &Value) -> anyhow::Result<()> {
    conn.execute(
        "INSERT INTO settings(key, value_json, updated_at) VALUES(?, ?, ?)
         ON CONFLICT(key) DO UPDATE SET value_json = excluded.value_json, updated_at = excluded.updated_at",
        (
            key,
            serde_json::to_string(value)?,
            chrono::Utc::now().to_rfc3339(),
        ),
    )?;
    Ok(())
}

pub fn settings_delete(conn: &Connection, key: &str) -> anyhow::Result<()> {
    conn.execute("DELETE FROM settings WHERE key = ?", [key])?;
    Ok(())
}

/// A stored value that no longer parses as an identity is treated as signed out.
pub fn session_load(conn: &Connection) -> anyhow::Result<Option<Identity>> {
    let Some(v) = settings_get_json(conn, SESSION_KEY)? else {
        return Ok(None);
    };
    match serde_json::from_value::<Identity>(v) {
        Ok(identity) => Ok(Some(identity)),
        Err(e) => {
            tracing::warn!(error = %e, "discarding unreadable session record");
            settings_delete(conn, SESSION_KEY)?;
            Ok(None)
        }
    }
}

pub fn session_save(conn: &Connection, identity: &Identity) -> anyhow::Result<()> {
    settings_set_json(conn, SESSION_KEY, &serde_json::to_value(identity)?)
}

pub fn session_clear(conn: &Connection) -> anyhow::Result<()> {
    settings_delete(conn, SESSION_KEY)
}
