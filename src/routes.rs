//! REST surface for the dashboard: profile, completion, stats and the
//! onboarding wizard. Handlers only forward to the engine.

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, patch, post, put};
use axum::{Json, Router};
use serde::Deserialize;
use tower_http::cors::{Any, CorsLayer};

use crate::config::DashboardConfig;
use crate::error::{OnboardingError, Result};
use crate::onboarding::{DraftPatch, OnboardingController, WizardStep};
use crate::profile::model::catalog;
use crate::profile::{
    ExperienceLevel, FixedStats, ProfileStore, ProfileUpdate, StartupStage, StatsProvider, report,
};
use crate::store::{LibSqlBackend, SettingsStore};
use crate::sync::{CredentialStore, HttpProfileSource, ProfileSource};

/// Shared state for dashboard routes.
#[derive(Clone)]
pub struct DashboardState {
    pub store: Arc<ProfileStore>,
    pub onboarding: Arc<OnboardingController>,
    pub stats: Arc<dyn StatsProvider>,
}

impl DashboardState {
    /// Wire the engine from config: open the database, store a configured
    /// credential, and build the remote source, store and controller.
    ///
    /// Neither loads the profile nor schedules auto-open.
    pub async fn build(config: &DashboardConfig) -> Result<Self> {
        config.validate()?;

        let db: Arc<dyn SettingsStore> =
            Arc::new(LibSqlBackend::new_local(&config.db_path).await?);

        if let Some(ref token) = config.auth_token {
            CredentialStore::new(Arc::clone(&db))
                .set(&secrecy::SecretString::from(token.clone()))
                .await?;
            tracing::info!("Stored credential from PROFILE_AUTH_TOKEN");
        }

        let remote: Option<Arc<dyn ProfileSource>> = match config.profile_api_url {
            Some(ref url) => {
                let source = HttpProfileSource::new(url.clone(), config.request_timeout)?;
                tracing::info!(endpoint = source.endpoint(), "Remote profile sync enabled");
                Some(Arc::new(source))
            }
            None => None,
        };

        let store = ProfileStore::new(db, remote);
        let onboarding = OnboardingController::new(Arc::clone(&store), config.auto_open_delay);
        Ok(Self {
            store,
            onboarding,
            stats: Arc::new(FixedStats::new(config.stats)),
        })
    }
}

#[derive(Deserialize)]
struct OpenRequest {
    open: bool,
}

#[derive(Deserialize)]
struct ToggleRequest {
    industry: String,
}

fn conflict(err: OnboardingError) -> Response {
    (
        StatusCode::CONFLICT,
        Json(serde_json::json!({"error": err.to_string()})),
    )
        .into_response()
}

async fn health() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// GET /api/profile
///
/// Everything the overview renders from one profile snapshot.
async fn get_profile(State(state): State<DashboardState>) -> impl IntoResponse {
    let profile = state.store.get().await;
    let completion = report(&profile);
    let onboarding = state.onboarding.status().await;
    let hints: Vec<&str> = completion.missing.iter().map(|m| m.hint()).collect();
    Json(serde_json::json!({
        "greetingName": profile.greeting_name(),
        "journeyPosition": profile.startup_stage.journey_position(),
        "locationLine": profile.location.display(),
        "completionPercentage": completion.percentage,
        "completion": completion,
        "hints": hints,
        "stats": state.stats.snapshot(),
        "onboarding": onboarding,
        "profile": profile,
    }))
}

/// PATCH /api/profile
async fn update_profile(
    State(state): State<DashboardState>,
    Json(update): Json<ProfileUpdate>,
) -> impl IntoResponse {
    let profile = state.store.commit(update).await;
    let completion_percentage = report(&profile).percentage;
    Json(serde_json::json!({
        "profile": profile,
        "completionPercentage": completion_percentage,
    }))
}

/// GET /api/onboarding
async fn get_onboarding(State(state): State<DashboardState>) -> impl IntoResponse {
    Json(state.onboarding.status().await)
}

/// GET /api/onboarding/options
///
/// Choices the wizard offers on each step.
async fn get_options() -> impl IntoResponse {
    let steps: Vec<_> = WizardStep::ALL
        .iter()
        .map(|s| serde_json::json!({"step": s, "title": s.title()}))
        .collect();
    let experience_levels: Vec<_> = ExperienceLevel::ALL
        .iter()
        .map(|l| serde_json::json!({"value": l, "label": l.label()}))
        .collect();
    let startup_stages: Vec<_> = StartupStage::ALL
        .iter()
        .map(|s| serde_json::json!({"value": s, "label": s.label()}))
        .collect();
    Json(serde_json::json!({
        "steps": steps,
        "experienceLevels": experience_levels,
        "educationLevels": catalog::EDUCATION_LEVELS,
        "industries": catalog::INDUSTRIES,
        "startupStages": startup_stages,
    }))
}

/// PUT /api/onboarding/open
async fn set_open(
    State(state): State<DashboardState>,
    Json(body): Json<OpenRequest>,
) -> impl IntoResponse {
    Json(state.onboarding.set_open(body.open).await)
}

/// POST /api/onboarding/advance
async fn advance(State(state): State<DashboardState>) -> Response {
    match state.onboarding.advance().await {
        Ok(outcome) => Json(outcome).into_response(),
        Err(e) => conflict(e),
    }
}

/// POST /api/onboarding/back
async fn back(State(state): State<DashboardState>) -> Response {
    match state.onboarding.back().await {
        Ok(step) => Json(serde_json::json!({"step": step})).into_response(),
        Err(e) => conflict(e),
    }
}

/// POST /api/onboarding/skip
async fn skip(State(state): State<DashboardState>) -> Response {
    match state.onboarding.skip().await {
        Ok(()) => Json(serde_json::json!({"status": "skipped"})).into_response(),
        Err(e) => conflict(e),
    }
}

/// PATCH /api/onboarding/draft
async fn edit_draft(
    State(state): State<DashboardState>,
    Json(patch): Json<DraftPatch>,
) -> Response {
    match state.onboarding.edit_draft(&patch).await {
        Ok(draft) => Json(draft).into_response(),
        Err(e) => conflict(e),
    }
}

/// POST /api/onboarding/interests/toggle
async fn toggle_interest(
    State(state): State<DashboardState>,
    Json(body): Json<ToggleRequest>,
) -> Response {
    match state.onboarding.toggle_interest(&body.industry).await {
        Ok(selected) => Json(serde_json::json!({
            "industry": body.industry,
            "selected": selected,
        }))
        .into_response(),
        Err(e) => conflict(e),
    }
}

/// Build the dashboard REST routes.
pub fn dashboard_routes(state: DashboardState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health))
        .route("/api/profile", get(get_profile).patch(update_profile))
        .route("/api/onboarding", get(get_onboarding))
        .route("/api/onboarding/options", get(get_options))
        .route("/api/onboarding/open", put(set_open))
        .route("/api/onboarding/advance", post(advance))
        .route("/api/onboarding/back", post(back))
        .route("/api/onboarding/skip", post(skip))
        .route("/api/onboarding/draft", patch(edit_draft))
        .route("/api/onboarding/interests/toggle", post(toggle_interest))
        .layer(cors)
        .with_state(state)
}
