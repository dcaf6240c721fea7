//! Error types for the founder profile engine.

use crate::onboarding::WizardStep;

/// Top-level error type for the engine.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),

    #[error("Sync error: {0}")]
    Sync(#[from] SyncError),

    #[error("Onboarding error: {0}")]
    Onboarding(#[from] OnboardingError),
}

/// Configuration-related errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },
}

/// Local persistence errors.
#[derive(Debug, thiserror::Error)]
pub enum DatabaseError {
    #[error("Connection pool error: {0}")]
    Pool(String),

    #[error("Query failed: {0}")]
    Query(String),

    #[error("Migration failed: {0}")]
    Migration(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Remote profile sync errors.
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    #[error("Request to {endpoint} failed: {reason}")]
    Network { endpoint: String, reason: String },

    /// The endpoint rejected the credential (401 or 403).
    #[error("Credential rejected by {endpoint} ({status})")]
    Unauthorized { endpoint: String, status: u16 },

    #[error("{endpoint} returned status {status}")]
    Status { endpoint: String, status: u16 },

    #[error("Invalid response body from {endpoint}: {reason}")]
    InvalidBody { endpoint: String, reason: String },
}

impl SyncError {
    /// Whether the remote rejected the stored credential.
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Unauthorized { .. })
    }
}

/// Wizard state machine errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum OnboardingError {
    #[error("Onboarding is not open")]
    NotOpen,

    #[error("Already at the first onboarding step")]
    AtFirstStep,

    #[error("Action requires step {expected}, wizard is on step {actual}")]
    WrongStep {
        expected: WizardStep,
        actual: WizardStep,
    },
}

/// Result type alias for the engine.
pub type Result<T> = std::result::Result<T, Error>;
