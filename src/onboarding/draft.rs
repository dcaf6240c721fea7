//! The wizard's working copy of the editable profile fields.

use serde::{Deserialize, Serialize};

use crate::profile::{ExperienceLevel, Location, Profile, ProfileUpdate, StartupStage};

/// Staged edits, isolated from the stored profile until a step advances.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileDraft {
    pub display_name: String,
    pub experience_level: ExperienceLevel,
    pub education_level: String,
    pub location: Location,
    pub industry_interests: Vec<String>,
    pub startup_stage: StartupStage,
}

impl From<&Profile> for ProfileDraft {
    fn from(profile: &Profile) -> Self {
        Self {
            display_name: profile.display_name.clone(),
            experience_level: profile.experience_level,
            education_level: profile.education_level.clone(),
            location: profile.location.clone(),
            industry_interests: profile.industry_interests.clone(),
            startup_stage: profile.startup_stage,
        }
    }
}

impl ProfileDraft {
    /// The whole draft as an update; every editable field is carried.
    pub fn to_update(&self) -> ProfileUpdate {
        ProfileUpdate {
            display_name: Some(self.display_name.clone()),
            experience_level: Some(self.experience_level),
            education_level: Some(self.education_level.clone()),
            location: Some(self.location.clone()),
            industry_interests: Some(self.industry_interests.clone()),
            startup_stage: Some(self.startup_stage),
            onboarding_completed: None,
        }
    }

    /// Add `industry` if absent, remove it if present. Returns whether it is
    /// selected afterwards.
    pub fn toggle_interest(&mut self, industry: &str) -> bool {
        if let Some(pos) = self.industry_interests.iter().position(|i| i == industry) {
            self.industry_interests.remove(pos);
            false
        } else {
            self.industry_interests.push(industry.to_string());
            true
        }
    }

    pub fn apply_patch(&mut self, patch: &DraftPatch) {
        if let Some(ref name) = patch.display_name {
            self.display_name = name.clone();
        }
        if let Some(level) = patch.experience_level {
            self.experience_level = level;
        }
        if let Some(ref education) = patch.education_level {
            self.education_level = education.clone();
        }
        if let Some(ref country) = patch.country {
            self.location.country = country.clone();
        }
        if let Some(ref state) = patch.state {
            self.location.state = state.clone();
        }
        if let Some(ref city) = patch.city {
            self.location.city = city.clone();
        }
        if let Some(stage) = patch.startup_stage {
            self.startup_stage = stage;
        }
    }
}

/// Field edits the wizard's inputs produce. Location parts are edited one
/// at a time, so they are flattened here.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DraftPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub experience_level: Option<ExperienceLevel>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub education_level: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub startup_stage: Option<StartupStage>,
}
