//! Schema upgrades for the settings database.
//!
//! The applied schema version lives in SQLite's `user_version` pragma; each
//! entry in [`SCHEMA`] moves it up by one.

use libsql::Connection;

use crate::error::DatabaseError;

/// Schema steps, oldest first. Position `i` upgrades version `i` to `i + 1`.
const SCHEMA: &[(&str, &str)] = &[(
    "settings",
    "CREATE TABLE IF NOT EXISTS settings (
        user_id TEXT NOT NULL,
        key TEXT NOT NULL,
        value TEXT NOT NULL,
        updated_at TEXT NOT NULL DEFAULT (datetime('now')),
        PRIMARY KEY (user_id, key)
    );",
)];

/// Latest schema version this build knows about.
pub const SCHEMA_VERSION: i64 = SCHEMA.len() as i64;

/// Bring the database up to [`SCHEMA_VERSION`].
pub async fn run_migrations(conn: &Connection) -> Result<(), DatabaseError> {
    let from = schema_version(conn).await?;
    if from > SCHEMA_VERSION {
        return Err(DatabaseError::Migration(format!(
            "database schema v{from} is newer than supported v{SCHEMA_VERSION}"
        )));
    }

    for (index, (name, sql)) in SCHEMA.iter().enumerate().skip(from as usize) {
        let version = index as i64 + 1;
        tracing::info!(version, name, "Upgrading settings schema");
        conn.execute_batch(&format!(
            "BEGIN;\n{sql}\nPRAGMA user_version = {version};\nCOMMIT;"
        ))
        .await
        .map_err(|e| DatabaseError::Migration(format!("schema v{version} ({name}): {e}")))?;
    }

    Ok(())
}

async fn schema_version(conn: &Connection) -> Result<i64, DatabaseError> {
    let mut rows = conn
        .query("PRAGMA user_version", ())
        .await
        .map_err(|e| DatabaseError::Migration(format!("read schema version: {e}")))?;

    match rows
        .next()
        .await
        .map_err(|e| DatabaseError::Migration(format!("read schema version: {e}")))?
    {
        Some(row) => row
            .get::<i64>(0)
            .map_err(|e| DatabaseError::Migration(format!("parse schema version: {e}"))),
        None => Ok(0),
    }
}
