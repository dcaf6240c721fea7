//! Profile completion scoring.
//!
//! The score is a weighted sum over a fixed set of checks. Each check awards
//! its whole weight when the field is present and nothing otherwise.

use serde::Serialize;

use super::model::Profile;

/// A single scored field.
struct Check {
    weight: u8,
    present: fn(&Profile) -> bool,
}

/// Weights sum to 100.
const CHECKS: [Check; 8] = [
    Check {
        weight: 20,
        present: |p| !p.display_name.is_empty(),
    },
    Check {
        weight: 15,
        present: |p| p.experience_level.is_set(),
    },
    Check {
        weight: 10,
        present: |p| !p.education_level.is_empty(),
    },
    Check {
        weight: 10,
        present: |p| !p.location.country.is_empty(),
    },
    Check {
        weight: 5,
        present: |p| !p.location.state.is_empty(),
    },
    Check {
        weight: 5,
        present: |p| !p.location.city.is_empty(),
    },
    Check {
        weight: 20,
        present: |p| !p.industry_interests.is_empty(),
    },
    Check {
        weight: 15,
        present: |p| p.startup_stage.is_set(),
    },
];

/// Completion percentage in `0..=100`.
pub fn score(profile: &Profile) -> u8 {
    CHECKS
        .iter()
        .filter(|check| (check.present)(profile))
        .map(|check| check.weight)
        .sum()
}

/// Coarse completion tier shown next to the percentage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CompletionStatus {
    Complete,
    AlmostThere,
    GoodProgress,
    JustStarted,
}

impl CompletionStatus {
    pub fn from_percentage(percentage: u8) -> Self {
        match percentage {
            100.. => Self::Complete,
            80..=99 => Self::AlmostThere,
            50..=79 => Self::GoodProgress,
            _ => Self::JustStarted,
        }
    }

    pub fn message(&self) -> &'static str {
        match self {
            Self::Complete => "Your profile is complete! Enjoy personalized recommendations.",
            Self::AlmostThere => {
                "Almost there! Just a few more details to unlock full personalization."
            }
            Self::GoodProgress => {
                "Good progress! Complete your profile for better recommendations."
            }
            Self::JustStarted => "Complete your profile to get personalized guidance.",
        }
    }
}

/// Headline fields the dashboard nudges the user to fill in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MissingField {
    DisplayName,
    ExperienceLevel,
    StartupStage,
    IndustryInterests,
}

impl MissingField {
    pub fn hint(&self) -> &'static str {
        match self {
            Self::DisplayName => "Add your display name",
            Self::ExperienceLevel => "Select your experience level",
            Self::StartupStage => "Set your startup stage",
            Self::IndustryInterests => "Choose your industry interests",
        }
    }
}

/// Everything the completion widget renders, derived from one snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CompletionReport {
    pub percentage: u8,
    pub status: CompletionStatus,
    pub message: &'static str,
    pub missing: Vec<MissingField>,
}

/// Build the full completion report for a profile.
pub fn report(profile: &Profile) -> CompletionReport {
    let percentage = score(profile);
    let status = CompletionStatus::from_percentage(percentage);

    let mut missing = Vec::new();
    if percentage < 100 {
        if profile.display_name.is_empty() {
            missing.push(MissingField::DisplayName);
        }
        if !profile.experience_level.is_set() {
            missing.push(MissingField::ExperienceLevel);
        }
        if !profile.startup_stage.is_set() {
            missing.push(MissingField::StartupStage);
        }
        if profile.industry_interests.is_empty() {
            missing.push(MissingField::IndustryInterests);
        }
    }

    CompletionReport {
        percentage,
        status,
        message: status.message(),
        missing,
    }
}
