//! Onboarding wizard: a five-step flow that collects the founder profile.
//!
//! The wizard stages edits in a draft and commits the whole draft to the
//! profile store each time a step advances. It opens on its own shortly
//! after startup when the profile has no name and onboarding was never
//! completed, and can be reopened manually at any time.

pub mod controller;
pub mod draft;
pub mod state;

pub use controller::{AdvanceOutcome, OnboardingController, OnboardingStatus};
pub use draft::{DraftPatch, ProfileDraft};
pub use state::{WizardSession, WizardStep};
