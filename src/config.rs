//! Configuration types.

use std::path::PathBuf;
use std::time::Duration;

use crate::error::ConfigError;
use crate::profile::Stats;

/// Counters shown until the owning features report real numbers.
const DEFAULT_STATS: Stats = Stats {
    ai_interactions: 12,
    saved_schemes: 5,
    saved_resources: 8,
    roadmap_progress: 35,
};

/// Engine and server configuration.
#[derive(Debug, Clone)]
pub struct DashboardConfig {
    /// Local libSQL database holding the profile slot and credential.
    pub db_path: PathBuf,
    /// Remote user-profile endpoint. Remote sync is off when unset.
    pub profile_api_url: Option<String>,
    /// Credential to store at startup (replaces any stored one).
    pub auth_token: Option<String>,
    /// Port for the dashboard HTTP surface.
    pub http_port: u16,
    /// Delay before the wizard opens on its own.
    pub auto_open_delay: Duration,
    /// Timeout for remote profile requests.
    pub request_timeout: Duration,
    /// Usage counters served alongside the profile.
    pub stats: Stats,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            db_path: PathBuf::from("./data/founder-profile.db"),
            profile_api_url: None,
            auth_token: None,
            http_port: 8080,
            auto_open_delay: Duration::from_millis(500),
            request_timeout: Duration::from_secs(10),
            stats: DEFAULT_STATS,
        }
    }
}

impl DashboardConfig {
    /// Build config from `PROFILE_*` environment variables, falling back to
    /// defaults for anything unset or unparseable.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`from_env`](Self::from_env) with an injectable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();

        let parsed = |key: &str| -> Option<u64> {
            let raw = lookup(key)?;
            match raw.trim().parse() {
                Ok(v) => Some(v),
                Err(_) => {
                    tracing::warn!(key, value = %raw, "Ignoring unparseable config value");
                    None
                }
            }
        };
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let stats = Stats {
            ai_interactions: parsed("PROFILE_STATS_AI_INTERACTIONS")
                .map(|v| v.min(u64::from(u32::MAX)) as u32)
                .unwrap_or(defaults.stats.ai_interactions),
            saved_schemes: parsed("PROFILE_STATS_SAVED_SCHEMES")
                .map(|v| v.min(u64::from(u32::MAX)) as u32)
                .unwrap_or(defaults.stats.saved_schemes),
            saved_resources: parsed("PROFILE_STATS_SAVED_RESOURCES")
                .map(|v| v.min(u64::from(u32::MAX)) as u32)
                .unwrap_or(defaults.stats.saved_resources),
            roadmap_progress: parsed("PROFILE_STATS_ROADMAP_PROGRESS")
                .map(|v| v.min(100) as u8)
                .unwrap_or(defaults.stats.roadmap_progress),
        };

        Self {
            db_path: non_empty("PROFILE_DB_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.db_path),
            profile_api_url: non_empty("PROFILE_API_URL"),
            auth_token: non_empty("PROFILE_AUTH_TOKEN"),
            http_port: parsed("PROFILE_HTTP_PORT")
                .and_then(|v| u16::try_from(v).ok())
                .unwrap_or(defaults.http_port),
            auto_open_delay: parsed("PROFILE_AUTO_OPEN_DELAY_MS")
                .map(Duration::from_millis)
                .unwrap_or(defaults.auto_open_delay),
            request_timeout: parsed("PROFILE_REQUEST_TIMEOUT_SECS")
                .map(Duration::from_secs)
                .unwrap_or(defaults.request_timeout),
            stats,
        }
    }

    /// Reject values that parse but cannot work.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(ref url) = self.profile_api_url {
            if !(url.starts_with("http://") || url.starts_with("https://")) {
                return Err(ConfigError::InvalidValue {
                    key: "PROFILE_API_URL".to_string(),
                    message: format!("expected an http(s) URL, got {url:?}"),
                });
            }
        }
        Ok(())
    }
}
