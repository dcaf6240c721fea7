//! Founder profile data model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// How much founding experience the user has.
///
/// `Unset` travels as the empty string on the wire.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExperienceLevel {
    Student,
    Beginner,
    Professional,
    SerialEntrepreneur,
    #[default]
    #[serde(rename = "")]
    Unset,
}

impl ExperienceLevel {
    /// Every selectable level, in the order the wizard offers them.
    pub const ALL: [ExperienceLevel; 4] = [
        Self::Student,
        Self::Beginner,
        Self::Professional,
        Self::SerialEntrepreneur,
    ];

    pub fn is_set(&self) -> bool {
        !matches!(self, Self::Unset)
    }

    /// Human-readable label, `None` when unset.
    pub fn label(&self) -> Option<&'static str> {
        match self {
            Self::Student => Some("Student"),
            Self::Beginner => Some("Beginner"),
            Self::Professional => Some("Working Professional"),
            Self::SerialEntrepreneur => Some("Serial Entrepreneur"),
            Self::Unset => None,
        }
    }
}

impl std::fmt::Display for ExperienceLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Student => "student",
            Self::Beginner => "beginner",
            Self::Professional => "professional",
            Self::SerialEntrepreneur => "serial_entrepreneur",
            Self::Unset => "",
        };
        write!(f, "{s}")
    }
}

/// Where the user's startup currently is.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StartupStage {
    Idea,
    Validation,
    Prototype,
    EarlyRevenue,
    #[default]
    #[serde(rename = "")]
    Unset,
}

impl StartupStage {
    pub const ALL: [StartupStage; 4] = [
        Self::Idea,
        Self::Validation,
        Self::Prototype,
        Self::EarlyRevenue,
    ];

    pub fn is_set(&self) -> bool {
        !matches!(self, Self::Unset)
    }

    pub fn label(&self) -> Option<&'static str> {
        match self {
            Self::Idea => Some("Idea Stage"),
            Self::Validation => Some("Validation"),
            Self::Prototype => Some("Prototype"),
            Self::EarlyRevenue => Some("Early Revenue"),
            Self::Unset => None,
        }
    }

    /// Percent along the idea → growth founder journey.
    pub fn journey_position(&self) -> u8 {
        match self {
            Self::Idea => 12,
            Self::Validation => 35,
            Self::Prototype => 55,
            Self::EarlyRevenue => 75,
            Self::Unset => 0,
        }
    }
}

impl std::fmt::Display for StartupStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Idea => "idea",
            Self::Validation => "validation",
            Self::Prototype => "prototype",
            Self::EarlyRevenue => "early_revenue",
            Self::Unset => "",
        };
        write!(f, "{s}")
    }
}

/// Country / state / city. Empty strings mean "not given".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    #[serde(default)]
    pub country: String,
    #[serde(default)]
    pub state: String,
    #[serde(default)]
    pub city: String,
}

impl Location {
    /// "City, State, Country" with blank parts left out.
    pub fn display(&self) -> String {
        [&self.city, &self.state, &self.country]
            .into_iter()
            .filter(|part| !part.is_empty())
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// The user profile driving personalization and completion scoring.
///
/// Persisted as camelCase JSON under [`settings_keys::USER_PROFILE`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    pub id: String,
    pub display_name: String,
    pub email: String,
    pub experience_level: ExperienceLevel,
    pub education_level: String,
    pub location: Location,
    pub industry_interests: Vec<String>,
    pub startup_stage: StartupStage,
    pub onboarding_completed: bool,
    pub created_at: DateTime<Utc>,
}

impl Default for Profile {
    fn default() -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            display_name: String::new(),
            email: String::new(),
            experience_level: ExperienceLevel::Unset,
            education_level: String::new(),
            location: Location::default(),
            industry_interests: Vec::new(),
            startup_stage: StartupStage::Unset,
            onboarding_completed: false,
            created_at: Utc::now(),
        }
    }
}

impl Profile {
    /// Name used in greetings; falls back to a generic title.
    pub fn greeting_name(&self) -> &str {
        if self.display_name.is_empty() {
            "Entrepreneur"
        } else {
            &self.display_name
        }
    }

    /// Whether the wizard should pop up on its own for this profile.
    pub fn needs_onboarding(&self) -> bool {
        !self.onboarding_completed && self.display_name.is_empty()
    }

    /// Overlay fields from a JSON object onto this profile.
    ///
    /// Tolerant of partial or malformed input: each recognised key with a
    /// value of the right type wins, anything else keeps its current value.
    /// Returns the number of fields that were applied.
    pub fn merge_value(&mut self, value: &Value) -> usize {
        let Some(obj) = value.as_object() else {
            if !value.is_null() {
                tracing::warn!(kind = json_kind(value), "Ignoring non-object profile data");
            }
            return 0;
        };

        let mut applied = 0;

        if let Some(id) = string_field(obj, "id") {
            self.id = id;
            applied += 1;
        }
        if let Some(name) = string_field(obj, "displayName") {
            self.display_name = name;
            applied += 1;
        }
        if let Some(email) = string_field(obj, "email") {
            self.email = email;
            applied += 1;
        }
        if let Some(level) = enum_field::<ExperienceLevel>(obj, "experienceLevel") {
            self.experience_level = level;
            applied += 1;
        }
        if let Some(education) = string_field(obj, "educationLevel") {
            self.education_level = education;
            applied += 1;
        }
        if let Some(location) = obj.get("location") {
            match location.as_object() {
                Some(loc) => {
                    if let Some(country) = string_field(loc, "country") {
                        self.location.country = country;
                    }
                    if let Some(state) = string_field(loc, "state") {
                        self.location.state = state;
                    }
                    if let Some(city) = string_field(loc, "city") {
                        self.location.city = city;
                    }
                    applied += 1;
                }
                None => tracing::warn!(field = "location", "Ignoring malformed profile field"),
            }
        }
        if let Some(interests) = obj.get("industryInterests") {
            match interests.as_array() {
                Some(items) => {
                    self.industry_interests =
                        dedup_interests(items.iter().filter_map(|v| v.as_str().map(String::from)));
                    applied += 1;
                }
                None => tracing::warn!(
                    field = "industryInterests",
                    "Ignoring malformed profile field"
                ),
            }
        }
        if let Some(stage) = enum_field::<StartupStage>(obj, "startupStage") {
            self.startup_stage = stage;
            applied += 1;
        }
        if let Some(done) = obj.get("onboardingCompleted") {
            match done.as_bool() {
                Some(done) => {
                    self.onboarding_completed = done;
                    applied += 1;
                }
                None => tracing::warn!(
                    field = "onboardingCompleted",
                    "Ignoring malformed profile field"
                ),
            }
        }
        if let Some(created) = obj.get("createdAt") {
            match serde_json::from_value::<DateTime<Utc>>(created.clone()) {
                Ok(ts) => {
                    self.created_at = ts;
                    applied += 1;
                }
                Err(e) => tracing::warn!(field = "createdAt", error = %e, "Ignoring malformed profile field"),
            }
        }

        applied
    }
}

/// A partial profile: every present field replaces the current one wholesale.
///
/// `id`, `email` and `createdAt` are deliberately absent; they never change
/// after creation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub experience_level: Option<ExperienceLevel>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub education_level: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<Location>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub industry_interests: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub startup_stage: Option<StartupStage>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub onboarding_completed: Option<bool>,
}

impl ProfileUpdate {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Shallow-merge this update into `profile`.
    ///
    /// `onboarding_completed` only ever moves from false to true here.
    pub fn apply(&self, profile: &mut Profile) {
        if let Some(ref name) = self.display_name {
            profile.display_name = name.clone();
        }
        if let Some(level) = self.experience_level {
            profile.experience_level = level;
        }
        if let Some(ref education) = self.education_level {
            profile.education_level = education.clone();
        }
        if let Some(ref location) = self.location {
            profile.location = location.clone();
        }
        if let Some(ref interests) = self.industry_interests {
            profile.industry_interests = dedup_interests(interests.iter().cloned());
        }
        if let Some(stage) = self.startup_stage {
            profile.startup_stage = stage;
        }
        match self.onboarding_completed {
            Some(true) => profile.onboarding_completed = true,
            Some(false) if profile.onboarding_completed => {
                tracing::debug!("Ignoring attempt to reset onboarding_completed");
            }
            _ => {}
        }
    }

    /// Fold a later update into this one; fields present in `later` win.
    pub fn absorb(&mut self, later: &ProfileUpdate) {
        if later.display_name.is_some() {
            self.display_name.clone_from(&later.display_name);
        }
        if later.experience_level.is_some() {
            self.experience_level = later.experience_level;
        }
        if later.education_level.is_some() {
            self.education_level.clone_from(&later.education_level);
        }
        if later.location.is_some() {
            self.location.clone_from(&later.location);
        }
        if later.industry_interests.is_some() {
            self.industry_interests.clone_from(&later.industry_interests);
        }
        if later.startup_stage.is_some() {
            self.startup_stage = later.startup_stage;
        }
        if later.onboarding_completed.is_some() {
            self.onboarding_completed = self.onboarding_completed.max(later.onboarding_completed);
        }
    }
}

/// Suggestion lists offered by the onboarding wizard.
pub mod catalog {
    pub const EDUCATION_LEVELS: &[&str] = &[
        "High School",
        "Undergraduate",
        "Graduate",
        "Post Graduate",
        "PhD",
        "Other",
    ];

    pub const INDUSTRIES: &[&str] = &[
        "Technology",
        "Healthcare",
        "Fintech",
        "E-commerce",
        "Education",
        "Agriculture",
        "Manufacturing",
        "Real Estate",
        "Food & Beverage",
        "Media",
    ];
}

/// Settings keys used for profile persistence.
pub mod settings_keys {
    /// Key for the profile JSON blob.
    pub const USER_PROFILE: &str = "userProfile";
    /// Key for the remote bearer credential.
    pub const AUTH_TOKEN: &str = "authToken";
    /// Default user ID (one profile per session).
    pub const DEFAULT_USER: &str = "default";
}

fn dedup_interests(items: impl IntoIterator<Item = String>) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for item in items {
        if !out.contains(&item) {
            out.push(item);
        }
    }
    out
}

fn string_field(obj: &Map<String, Value>, key: &str) -> Option<String> {
    let value = obj.get(key)?;
    match value.as_str() {
        Some(s) => Some(s.to_string()),
        None => {
            tracing::warn!(field = key, kind = json_kind(value), "Ignoring malformed profile field");
            None
        }
    }
}

/// Unknown enum strings collapse to the `Unset` default.
fn enum_field<T>(obj: &Map<String, Value>, key: &str) -> Option<T>
where
    T: serde::de::DeserializeOwned + Default,
{
    let value = obj.get(key)?;
    if !value.is_string() {
        tracing::warn!(field = key, kind = json_kind(value), "Ignoring malformed profile field");
        return None;
    }
    match serde_json::from_value::<T>(value.clone()) {
        Ok(v) => Some(v),
        Err(_) => {
            tracing::warn!(field = key, value = %value, "Unknown enum value, treating as unset");
            Some(T::default())
        }
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn default_profile_is_blank() {
        let p = Profile::default();
        assert!(p.display_name.is_empty());
        assert_eq!(p.experience_level, ExperienceLevel::Unset);
        assert_eq!(p.startup_stage, StartupStage::Unset);
        assert!(p.industry_interests.is_empty());
        assert!(!p.onboarding_completed);
        assert!(!p.id.is_empty());
        assert!(p.needs_onboarding());
    }

    #[test]
    fn unset_enums_serialize_as_empty_string() {
        assert_eq!(serde_json::to_string(&ExperienceLevel::Unset).unwrap(), "\"\"");
        assert_eq!(serde_json::to_string(&StartupStage::Unset).unwrap(), "\"\"");

        let level: ExperienceLevel = serde_json::from_str("\"serial_entrepreneur\"").unwrap();
        assert_eq!(level, ExperienceLevel::SerialEntrepreneur);
        let stage: StartupStage = serde_json::from_str("\"early_revenue\"").unwrap();
        assert_eq!(stage, StartupStage::EarlyRevenue);
    }

    #[test]
    fn display_matches_serde() {
        for level in ExperienceLevel::ALL {
            let json = serde_json::to_string(&level).unwrap();
            assert_eq!(format!("\"{level}\""), json);
        }
        for stage in StartupStage::ALL {
            let json = serde_json::to_string(&stage).unwrap();
            assert_eq!(format!("\"{stage}\""), json);
        }
    }

    #[test]
    fn profile_uses_camel_case_keys() {
        let value = serde_json::to_value(Profile::default()).unwrap();
        assert!(value.get("displayName").is_some());
        assert!(value.get("industryInterests").is_some());
        assert!(value.get("onboardingCompleted").is_some());
        assert_eq!(value["experienceLevel"], "");
    }

    #[test]
    fn labels_and_journey_positions() {
        assert_eq!(ExperienceLevel::Professional.label(), Some("Working Professional"));
        assert_eq!(ExperienceLevel::Unset.label(), None);
        assert_eq!(StartupStage::Idea.label(), Some("Idea Stage"));
        assert_eq!(StartupStage::Prototype.journey_position(), 55);
        assert_eq!(StartupStage::Unset.journey_position(), 0);
    }

    #[test]
    fn greeting_name_falls_back() {
        let mut p = Profile::default();
        assert_eq!(p.greeting_name(), "Entrepreneur");
        p.display_name = "Asha".into();
        assert_eq!(p.greeting_name(), "Asha");
    }

    #[test]
    fn location_display_skips_blanks() {
        let loc = Location {
            country: "India".into(),
            state: String::new(),
            city: "Pune".into(),
        };
        assert_eq!(loc.display(), "Pune, India");
        assert_eq!(Location::default().display(), "");
    }

    #[test]
    fn merge_value_overlays_known_fields() {
        let mut p = Profile::default();
        let applied = p.merge_value(&json!({
            "displayName": "Asha",
            "experienceLevel": "beginner",
            "location": { "country": "India" },
            "industryInterests": ["Fintech", "Media"],
            "startupStage": "idea",
            "unknownKey": 42
        }));
        assert_eq!(applied, 5);
        assert_eq!(p.display_name, "Asha");
        assert_eq!(p.experience_level, ExperienceLevel::Beginner);
        assert_eq!(p.location.country, "India");
        assert!(p.location.city.is_empty());
        assert_eq!(p.industry_interests, vec!["Fintech", "Media"]);
        assert_eq!(p.startup_stage, StartupStage::Idea);
    }

    #[test]
    fn merge_value_keeps_defaults_for_malformed_fields() {
        let mut p = Profile::default();
        p.merge_value(&json!({
            "displayName": 17,
            "experienceLevel": "wizard",
            "industryInterests": "Fintech",
            "onboardingCompleted": "yes",
            "createdAt": "not a date",
            "educationLevel": "PhD"
        }));
        assert!(p.display_name.is_empty());
        // Unknown enum strings become the explicit unset sentinel.
        assert_eq!(p.experience_level, ExperienceLevel::Unset);
        assert!(p.industry_interests.is_empty());
        assert!(!p.onboarding_completed);
        assert_eq!(p.education_level, "PhD");
    }

    #[test]
    fn merge_value_ignores_non_objects() {
        let mut p = Profile::default();
        let before = p.clone();
        assert_eq!(p.merge_value(&json!([1, 2, 3])), 0);
        assert_eq!(p.merge_value(&Value::Null), 0);
        assert_eq!(p, before);
    }

    #[test]
    fn merge_value_dedups_interests() {
        let mut p = Profile::default();
        p.merge_value(&json!({
            "industryInterests": ["Media", "Fintech", "Media", 3]
        }));
        assert_eq!(p.industry_interests, vec!["Media", "Fintech"]);
    }

    #[test]
    fn update_applies_only_present_fields() {
        let mut p = Profile {
            display_name: "Old".into(),
            education_level: "PhD".into(),
            ..Default::default()
        };
        let update = ProfileUpdate {
            display_name: Some("New".into()),
            location: Some(Location {
                city: "Pune".into(),
                ..Default::default()
            }),
            ..Default::default()
        };
        update.apply(&mut p);
        assert_eq!(p.display_name, "New");
        assert_eq!(p.education_level, "PhD");
        assert_eq!(p.location.city, "Pune");
    }

    #[test]
    fn update_never_clears_completion() {
        let mut p = Profile {
            onboarding_completed: true,
            ..Default::default()
        };
        ProfileUpdate {
            onboarding_completed: Some(false),
            ..Default::default()
        }
        .apply(&mut p);
        assert!(p.onboarding_completed);
    }

    #[test]
    fn update_deserializes_from_partial_json() {
        let update: ProfileUpdate =
            serde_json::from_value(json!({ "startupStage": "validation" })).unwrap();
        assert_eq!(update.startup_stage, Some(StartupStage::Validation));
        assert!(update.display_name.is_none());
        assert!(!update.is_empty());
        assert!(ProfileUpdate::default().is_empty());
    }

    #[test]
    fn absorb_prefers_later_fields() {
        let mut first = ProfileUpdate {
            display_name: Some("A".into()),
            education_level: Some("PhD".into()),
            onboarding_completed: Some(true),
            ..Default::default()
        };
        first.absorb(&ProfileUpdate {
            display_name: Some("B".into()),
            onboarding_completed: Some(false),
            ..Default::default()
        });
        assert_eq!(first.display_name.as_deref(), Some("B"));
        assert_eq!(first.education_level.as_deref(), Some("PhD"));
        assert_eq!(first.onboarding_completed, Some(true));
    }
}
