//! Bearer credential kept in the local settings slot.

use std::sync::Arc;

use secrecy::{ExposeSecret, SecretString};

use crate::error::DatabaseError;
use crate::profile::model::settings_keys;
use crate::store::SettingsStore;

/// Reads, writes and clears the remote credential.
#[derive(Clone)]
pub struct CredentialStore {
    db: Arc<dyn SettingsStore>,
}

impl CredentialStore {
    pub fn new(db: Arc<dyn SettingsStore>) -> Self {
        Self { db }
    }

    /// The stored token, if any. Blank or non-string values count as absent.
    pub async fn get(&self) -> Result<Option<SecretString>, DatabaseError> {
        let value = self
            .db
            .get_setting(settings_keys::DEFAULT_USER, settings_keys::AUTH_TOKEN)
            .await?;
        Ok(value
            .as_ref()
            .and_then(|v| v.as_str())
            .filter(|s| !s.trim().is_empty())
            .map(|s| SecretString::from(s.to_string())))
    }

    pub async fn set(&self, token: &SecretString) -> Result<(), DatabaseError> {
        self.db
            .set_setting(
                settings_keys::DEFAULT_USER,
                settings_keys::AUTH_TOKEN,
                &serde_json::Value::String(token.expose_secret().to_string()),
            )
            .await
    }

    /// Forget the token. Returns whether one was stored.
    pub async fn clear(&self) -> Result<bool, DatabaseError> {
        let removed = self
            .db
            .delete_setting(settings_keys::DEFAULT_USER, settings_keys::AUTH_TOKEN)
            .await?;
        if removed {
            tracing::info!("Cleared stored profile credential");
        }
        Ok(removed)
    }
}
