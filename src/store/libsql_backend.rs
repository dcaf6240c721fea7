//! libSQL-backed [`SettingsStore`].

use std::path::Path;

use async_trait::async_trait;
use chrono::Utc;
use libsql::{Builder, Connection, Database, params};
use tracing::{info, warn};

use crate::error::DatabaseError;
use crate::store::migrations;
use crate::store::traits::SettingsStore;

/// Settings held in a local libSQL file, or in memory.
pub struct LibSqlBackend {
    // Owns the database the connection points into.
    _db: Database,
    conn: Connection,
}

impl LibSqlBackend {
    /// Open (or create) the database file, creating parent directories.
    pub async fn new_local(path: &Path) -> Result<Self, DatabaseError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| DatabaseError::Pool(format!("create {}: {e}", parent.display())))?;
        }
        let backend = Self::open(Builder::new_local(path).build().await).await?;
        info!(path = %path.display(), "Settings database opened");
        Ok(backend)
    }

    pub async fn new_memory() -> Result<Self, DatabaseError> {
        Self::open(Builder::new_local(":memory:").build().await).await
    }

    async fn open(built: libsql::Result<Database>) -> Result<Self, DatabaseError> {
        let db = built.map_err(|e| DatabaseError::Pool(format!("open libSQL database: {e}")))?;
        let conn = db
            .connect()
            .map_err(|e| DatabaseError::Pool(format!("connect: {e}")))?;
        migrations::run_migrations(&conn).await?;
        Ok(Self { _db: db, conn })
    }
}

#[async_trait]
impl SettingsStore for LibSqlBackend {
    async fn get_setting(
        &self,
        user_id: &str,
        key: &str,
    ) -> Result<Option<serde_json::Value>, DatabaseError> {
        let conn = &self.conn;
        let mut rows = conn
            .query(
                "SELECT value FROM settings WHERE user_id = ?1 AND key = ?2",
                params![user_id, key],
            )
            .await
            .map_err(|e| DatabaseError::Query(format!("get_setting: {e}")))?;

        match rows.next().await {
            Ok(Some(row)) => {
                let value_str: String = row
                    .get(0)
                    .map_err(|e| DatabaseError::Query(format!("get_setting {key}: {e}")))?;
                let value = serde_json::from_str(&value_str).unwrap_or_else(|e| {
                    warn!(user_id, key, error = %e, "Stored setting is not valid JSON");
                    serde_json::Value::Null
                });
                Ok(Some(value))
            }
            Ok(None) => Ok(None),
            Err(e) => Err(DatabaseError::Query(format!("get_setting: {e}"))),
        }
    }

    async fn set_setting(
        &self,
        user_id: &str,
        key: &str,
        value: &serde_json::Value,
    ) -> Result<(), DatabaseError> {
        let conn = &self.conn;
        let now = Utc::now().to_rfc3339();
        let value_str = serde_json::to_string(value)
            .map_err(|e| DatabaseError::Serialization(e.to_string()))?;

        conn.execute(
            "INSERT INTO settings (user_id, key, value, updated_at) VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT (user_id, key) DO UPDATE SET value = ?3, updated_at = ?4",
            params![user_id, key, value_str, now],
        )
        .await
        .map_err(|e| DatabaseError::Query(format!("set_setting: {e}")))?;

        Ok(())
    }

    async fn delete_setting(&self, user_id: &str, key: &str) -> Result<bool, DatabaseError> {
        let conn = &self.conn;
        let count = conn
            .execute(
                "DELETE FROM settings WHERE user_id = ?1 AND key = ?2",
                params![user_id, key],
            )
            .await
            .map_err(|e| DatabaseError::Query(format!("delete_setting: {e}")))?;
        Ok(count > 0)
    }
}

impl LibSqlBackend {
    /// Store `raw` verbatim, bypassing JSON encoding.
    #[cfg(test)]
    pub(crate) async fn set_raw_setting(&self, user_id: &str, key: &str, raw: &str) {
        self.conn
            .execute(
                "INSERT INTO settings (user_id, key, value) VALUES (?1, ?2, ?3)
                 ON CONFLICT (user_id, key) DO UPDATE SET value = ?3",
                params![user_id, key, raw],
            )
            .await
            .unwrap();
    }
}
