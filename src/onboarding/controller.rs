//! OnboardingController: owns the wizard session, stages edits in its
//! draft and commits them to the [`ProfileStore`] as steps advance.

use std::sync::{Arc, Mutex, Weak};
use std::time::Duration;

use serde::Serialize;
use tokio::sync::{RwLock, broadcast};
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::error::OnboardingError;
use crate::profile::{ProfileEvent, ProfileStore, ProfileUpdate};

use super::draft::{DraftPatch, ProfileDraft};
use super::state::{WizardSession, WizardStep};

/// Result of advancing the wizard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", content = "step", rename_all = "snake_case")]
pub enum AdvanceOutcome {
    /// Moved on to this step.
    Moved(WizardStep),
    /// Final step committed; onboarding is complete and the wizard closed.
    Completed,
}

/// Wizard status handed to the presentation layer.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OnboardingStatus {
    pub is_open: bool,
    pub onboarding_completed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub step: Option<WizardStep>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub step_index: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub step_title: Option<&'static str>,
    /// Back is unavailable on the first step.
    pub can_go_back: bool,
    /// Advancing from here completes onboarding.
    pub on_final_step: bool,
    pub total_steps: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub draft: Option<ProfileDraft>,
}

/// Drives the onboarding wizard.
pub struct OnboardingController {
    store: Arc<ProfileStore>,
    session: RwLock<Option<WizardSession>>,
    auto_open_delay: Duration,
    auto_open: Mutex<Option<JoinHandle<()>>>,
}

impl OnboardingController {
    pub fn new(store: Arc<ProfileStore>, auto_open_delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            store,
            session: RwLock::new(None),
            auto_open_delay,
            auto_open: Mutex::new(None),
        })
    }

    pub async fn is_open(&self) -> bool {
        self.session.read().await.is_some()
    }

    /// Current step, `None` while closed.
    pub async fn current_step(&self) -> Option<WizardStep> {
        self.session.read().await.as_ref().map(|s| s.step)
    }

    /// Copy of the open session's draft.
    pub async fn draft(&self) -> Option<ProfileDraft> {
        self.session.read().await.as_ref().map(|s| s.draft.clone())
    }

    pub async fn status(&self) -> OnboardingStatus {
        let onboarding_completed = self.store.get().await.onboarding_completed;
        let session = self.session.read().await;
        let step = session.as_ref().map(|s| s.step);
        OnboardingStatus {
            is_open: session.is_some(),
            onboarding_completed,
            step,
            step_index: step.map(|s| s.index()),
            step_title: step.map(|s| s.title()),
            can_go_back: step.is_some_and(|s| !s.is_first()),
            on_final_step: step.is_some_and(|s| s.is_last()),
            total_steps: WizardStep::COUNT,
            draft: session.as_ref().map(|s| s.draft.clone()),
        }
    }

    /// Open the wizard at the first step with a draft seeded from the latest
    /// profile. A no-op when already open.
    pub async fn open(&self) -> OnboardingStatus {
        self.cancel_auto_open();
        self.open_session("manual").await;
        self.status().await
    }

    /// `true` opens (see [`open`](Self::open)); `false` closes without
    /// committing, like [`skip`](Self::skip).
    pub async fn set_open(&self, open: bool) -> OnboardingStatus {
        if open {
            self.open().await
        } else {
            self.cancel_auto_open();
            let _ = self.skip().await;
            self.status().await
        }
    }

    /// Commit the whole draft, then move to the next step or, from the last
    /// step, mark onboarding complete and close.
    pub async fn advance(&self) -> Result<AdvanceOutcome, OnboardingError> {
        let mut guard = self.session.write().await;
        let session = guard.as_mut().ok_or(OnboardingError::NotOpen)?;

        match session.step.next() {
            Some(next) => {
                self.store.commit(session.draft.to_update()).await;
                debug!(from = %session.step, to = %next, "Onboarding advanced");
                session.step = next;
                Ok(AdvanceOutcome::Moved(next))
            }
            None => {
                self.store
                    .commit(ProfileUpdate {
                        onboarding_completed: Some(true),
                        ..session.draft.to_update()
                    })
                    .await;
                *guard = None;
                info!("Onboarding completed");
                Ok(AdvanceOutcome::Completed)
            }
        }
    }

    /// Step back without committing anything.
    pub async fn back(&self) -> Result<WizardStep, OnboardingError> {
        let mut guard = self.session.write().await;
        let session = guard.as_mut().ok_or(OnboardingError::NotOpen)?;
        let prev = session.step.prev().ok_or(OnboardingError::AtFirstStep)?;
        session.step = prev;
        Ok(prev)
    }

    /// Close the wizard and discard the draft. Nothing is committed.
    pub async fn skip(&self) -> Result<(), OnboardingError> {
        let mut guard = self.session.write().await;
        let session = guard.take().ok_or(OnboardingError::NotOpen)?;
        info!(step = %session.step, "Onboarding skipped");
        Ok(())
    }

    /// Toggle an industry in the draft. Only valid on the interests step.
    /// Returns whether the industry is selected afterwards.
    pub async fn toggle_interest(&self, industry: &str) -> Result<bool, OnboardingError> {
        let mut guard = self.session.write().await;
        let session = guard.as_mut().ok_or(OnboardingError::NotOpen)?;
        if session.step != WizardStep::Interests {
            return Err(OnboardingError::WrongStep {
                expected: WizardStep::Interests,
                actual: session.step,
            });
        }
        Ok(session.draft.toggle_interest(industry))
    }

    /// Apply field edits to the draft.
    pub async fn edit_draft(&self, patch: &DraftPatch) -> Result<ProfileDraft, OnboardingError> {
        let mut guard = self.session.write().await;
        let session = guard.as_mut().ok_or(OnboardingError::NotOpen)?;
        session.draft.apply_patch(patch);
        Ok(session.draft.clone())
    }

    /// Open the wizard once the configured delay has passed and the profile
    /// load has resolved, if the loaded profile still needs onboarding. Any
    /// profile change that removes the need, a manual open, or
    /// [`shutdown`](Self::shutdown) cancels it.
    ///
    /// Returns whether a timer was scheduled.
    pub async fn schedule_auto_open(self: &Arc<Self>) -> bool {
        if !self.store.get().await.needs_onboarding() || self.is_open().await {
            return false;
        }

        // Subscribe before sampling the flag so a load resolving in between
        // still arrives as an event.
        let events = self.store.subscribe();
        let loaded = self.store.is_loaded().await;
        let handle = tokio::spawn(auto_open_task(
            Arc::downgrade(self),
            events,
            self.auto_open_delay,
            loaded,
        ));

        let mut slot = self.auto_open.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(previous) = slot.replace(handle) {
            previous.abort();
        }
        debug!(delay_ms = self.auto_open_delay.as_millis() as u64, "Auto-open scheduled");
        true
    }

    /// Abort a pending auto-open, if any.
    pub fn cancel_auto_open(&self) {
        let mut slot = self.auto_open.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(handle) = slot.take() {
            handle.abort();
        }
    }

    /// Tear down: cancel the timer and drop any open session uncommitted.
    pub async fn shutdown(&self) {
        self.cancel_auto_open();
        self.session.write().await.take();
    }

    async fn open_session(&self, trigger: &'static str) -> bool {
        let mut guard = self.session.write().await;
        if guard.is_some() {
            return false;
        }
        let profile = self.store.get().await;
        *guard = Some(WizardSession::seeded(&profile));
        info!(trigger, "Onboarding opened");
        true
    }

    async fn fire_auto_open(&self) {
        if !self.store.get().await.needs_onboarding() {
            debug!("Auto-open condition no longer holds at fire time");
            return;
        }
        self.open_session("auto").await;
    }
}

impl Drop for OnboardingController {
    fn drop(&mut self) {
        let slot = self.auto_open.get_mut().unwrap_or_else(|e| e.into_inner());
        if let Some(handle) = slot.take() {
            handle.abort();
        }
    }
}

/// Waits for both the delay and a resolved load, standing down as soon as
/// any profile snapshot stops needing onboarding.
async fn auto_open_task(
    controller: Weak<OnboardingController>,
    mut events: broadcast::Receiver<ProfileEvent>,
    delay: Duration,
    mut loaded: bool,
) {
    let sleep = tokio::time::sleep(delay);
    tokio::pin!(sleep);
    let mut elapsed = false;

    while !(elapsed && loaded) {
        tokio::select! {
            _ = &mut sleep, if !elapsed => {
                elapsed = true;
                if !loaded {
                    debug!("Auto-open delay passed; waiting for profile load");
                }
            }
            event = events.recv() => match event {
                Ok(event) => {
                    if !event.profile().needs_onboarding() {
                        debug!("Profile no longer needs onboarding; auto-open cancelled");
                        return;
                    }
                    if matches!(event, ProfileEvent::Loaded(_)) {
                        loaded = true;
                    }
                }
                Err(broadcast::error::RecvError::Lagged(_)) => {
                    let Some(controller) = controller.upgrade() else {
                        return;
                    };
                    loaded = controller.store.is_loaded().await;
                }
                Err(broadcast::error::RecvError::Closed) => return,
            },
        }
    }

    if let Some(controller) = controller.upgrade() {
        controller.fire_auto_open().await;
    }
}
