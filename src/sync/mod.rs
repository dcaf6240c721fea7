//! Remote profile sync: the backend user-profile endpoint and the bearer
//! credential used to reach it.

pub mod credentials;
pub mod http;

use async_trait::async_trait;
use secrecy::SecretString;

use crate::error::SyncError;
use crate::profile::Profile;

pub use credentials::CredentialStore;
pub use http::HttpProfileSource;

/// A remote source of truth for the profile.
#[async_trait]
pub trait ProfileSource: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &str;

    /// Fetch the stored profile as a JSON object to be merged over defaults.
    async fn fetch(&self, token: &SecretString) -> Result<serde_json::Value, SyncError>;

    /// Push the full profile. Best-effort; callers log failures.
    async fn push(&self, token: &SecretString, profile: &Profile) -> Result<(), SyncError>;
}
