use crate::credential::Credential;
use anyhow::{anyhow, Result};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;

pub const YOUTUBE_PROVIDER: &str = "youtube";

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS credentials (
    provider TEXT PRIMARY KEY,
    token_json TEXT NOT NULL,
    last_refreshed INTEGER
);
";

pub fn open_or_create(path: &Path) -> Result<Connection> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    let conn = Connection::open(path)?;
    run_migrations(&conn)?;
    Ok(conn)
}

pub fn run_migrations(conn: &Connection) -> Result<()> {
    conn.execute_batch(SCHEMA)?;
    Ok(())
}

/// Upsert the serialized credential for `provider`.
pub fn save_credential_raw(conn: &Connection, provider: &str, json_blob: &str) -> Result<()> {
    conn.execute(
        "INSERT INTO credentials (provider, token_json, last_refreshed) \
         VALUES (?1, ?2, strftime('%s','now')) \
         ON CONFLICT(provider) DO UPDATE SET token_json = excluded.token_json, \
         last_refreshed = strftime('%s','now')",
        params![provider, json_blob],
    )?;
    Ok(())
}

pub fn load_credential_raw(conn: &Connection, provider: &str) -> Result<Option<String>> {
    let json = conn
        .query_row(
            "SELECT token_json FROM credentials WHERE provider = ?1 LIMIT 1",
            params![provider],
            |r| r.get::<_, String>(0),
        )
        .optional()?;
    Ok(json)
}

pub fn save_credential(conn: &Connection, cred: &Credential) -> Result<()> {
    let json = serde_json::to_string(cred)?;
    save_credential_raw(conn, YOUTUBE_PROVIDER, &json)
}

/// Load the stored YouTube credential, if any.
pub fn load_credential(conn: &Connection) -> Result<Option<Credential>> {
    match load_credential_raw(conn, YOUTUBE_PROVIDER)? {
        Some(json) => {
            let cred: Credential =
                serde_json::from_str(&json).map_err(|e| anyhow!("parse credential json: {}", e))?;
            Ok(Some(cred))
        }
        None => Ok(None),
    }
}

/// Forget the stored credential. Returns true if a row was removed.
pub fn delete_credential(conn: &Connection) -> Result<bool> {
    let removed = conn.execute(
        "DELETE FROM credentials WHERE provider = ?1",
        params![YOUTUBE_PROVIDER],
    )?;
    Ok(removed > 0)
}
