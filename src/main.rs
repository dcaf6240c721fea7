use std::sync::Arc;

use founder_profile::config::DashboardConfig;
use founder_profile::routes::{DashboardState, dashboard_routes};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let config = DashboardConfig::from_env();

    eprintln!("Founder Profile v{}", env!("CARGO_PKG_VERSION"));
    eprintln!("   Database: {}", config.db_path.display());
    eprintln!(
        "   Remote profile: {}",
        config.profile_api_url.as_deref().unwrap_or("(disabled)")
    );
    eprintln!("   API: http://0.0.0.0:{}/api/profile\n", config.http_port);

    let state = DashboardState::build(&config).await?;
    state.onboarding.schedule_auto_open().await;

    let load_store = Arc::clone(&state.store);
    tokio::spawn(async move {
        let source = load_store.load().await;
        tracing::info!(?source, "Profile ready");
    });

    let store = Arc::clone(&state.store);
    let onboarding = Arc::clone(&state.onboarding);
    let app = dashboard_routes(state);

    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", config.http_port)).await?;
    tracing::info!(port = config.http_port, "Dashboard server started");

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await?;

    onboarding.shutdown().await;
    store.flush().await;
    tracing::info!("Shut down cleanly");
    Ok(())
}
