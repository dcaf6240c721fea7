//! Persistence layer: libSQL-backed key/value settings.

pub mod libsql_backend;
pub mod migrations;
pub mod traits;

pub use libsql_backend::LibSqlBackend;
pub use traits::SettingsStore;
