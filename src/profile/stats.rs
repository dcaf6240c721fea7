//! Read-only usage counters shown next to the profile.
//!
//! Interaction logging, bookmarking and roadmap tracking own these numbers;
//! the engine only hands out snapshots.

use serde::{Deserialize, Serialize};

/// Usage counters snapshot.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Stats {
    pub ai_interactions: u32,
    pub saved_schemes: u32,
    pub saved_resources: u32,
    /// Percent, `0..=100`.
    pub roadmap_progress: u8,
}

/// Source of the counters record.
pub trait StatsProvider: Send + Sync {
    fn snapshot(&self) -> Stats;
}

/// Serves a snapshot fixed at construction.
#[derive(Debug, Clone, Default)]
pub struct FixedStats {
    stats: Stats,
}

impl FixedStats {
    pub fn new(mut stats: Stats) -> Self {
        stats.roadmap_progress = stats.roadmap_progress.min(100);
        Self { stats }
    }
}

impl StatsProvider for FixedStats {
    fn snapshot(&self) -> Stats {
        self.stats
    }
}
