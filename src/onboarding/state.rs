//! Wizard steps and the ephemeral session that walks them.

use serde::{Deserialize, Serialize};

use crate::profile::Profile;

use super::draft::ProfileDraft;

/// The onboarding wizard's steps.
///
/// Progresses linearly: Name → Background → Location → Interests → Stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WizardStep {
    Name,
    /// Experience level and education.
    Background,
    Location,
    Interests,
    Stage,
}

impl WizardStep {
    pub const ALL: [WizardStep; 5] = [
        Self::Name,
        Self::Background,
        Self::Location,
        Self::Interests,
        Self::Stage,
    ];

    pub const COUNT: usize = Self::ALL.len();

    /// Zero-based position in the wizard.
    pub fn index(&self) -> usize {
        match self {
            Self::Name => 0,
            Self::Background => 1,
            Self::Location => 2,
            Self::Interests => 3,
            Self::Stage => 4,
        }
    }

    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    /// Next step, `None` on the last one.
    pub fn next(&self) -> Option<WizardStep> {
        Self::from_index(self.index() + 1)
    }

    /// Previous step, `None` on the first one.
    pub fn prev(&self) -> Option<WizardStep> {
        self.index().checked_sub(1).and_then(Self::from_index)
    }

    pub fn is_first(&self) -> bool {
        self.prev().is_none()
    }

    pub fn is_last(&self) -> bool {
        self.next().is_none()
    }

    /// Heading shown above the step.
    pub fn title(&self) -> &'static str {
        match self {
            Self::Name => "Your Name",
            Self::Background => "Experience",
            Self::Location => "Location",
            Self::Interests => "Interests",
            Self::Stage => "Startup Stage",
        }
    }
}

impl Default for WizardStep {
    fn default() -> Self {
        Self::Name
    }
}

impl std::fmt::Display for WizardStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Name => "name",
            Self::Background => "background",
            Self::Location => "location",
            Self::Interests => "interests",
            Self::Stage => "stage",
        };
        write!(f, "{s}")
    }
}

/// One open onboarding flow: the current step plus the staged edits.
#[derive(Debug, Clone, PartialEq)]
pub struct WizardSession {
    pub step: WizardStep,
    pub draft: ProfileDraft,
}

impl WizardSession {
    /// Start at the first step with a draft copied from `profile`.
    pub fn seeded(profile: &Profile) -> Self {
        Self {
            step: WizardStep::Name,
            draft: ProfileDraft::from(profile),
        }
    }
}
