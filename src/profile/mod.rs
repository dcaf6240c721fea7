//! Founder profile: the record itself, its completion score, the store that
//! owns it and the read-only usage counters shown beside it.

pub mod completion;
pub mod model;
pub mod stats;
pub mod store;

pub use completion::{CompletionReport, CompletionStatus, MissingField, report, score};
pub use model::{ExperienceLevel, Location, Profile, ProfileUpdate, StartupStage};
pub use stats::{FixedStats, Stats, StatsProvider};
pub use store::{LoadSource, ProfileEvent, ProfileStore};
