//! Per-user JSON slots behind an async seam.

use async_trait::async_trait;

use crate::error::DatabaseError;

/// Durable per-user JSON slots.
///
/// Values that fail to parse come back as `Value::Null` rather than an
/// error, so a corrupted slot never blocks a read.
#[async_trait]
pub trait SettingsStore: Send + Sync {
    /// `None` if the slot was never written.
    async fn get_setting(
        &self,
        user_id: &str,
        key: &str,
    ) -> Result<Option<serde_json::Value>, DatabaseError>;

    async fn set_setting(
        &self,
        user_id: &str,
        key: &str,
        value: &serde_json::Value,
    ) -> Result<(), DatabaseError>;

    /// Returns whether a slot was removed.
    async fn delete_setting(&self, user_id: &str, key: &str) -> Result<bool, DatabaseError>;
}
