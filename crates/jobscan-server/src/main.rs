use std::sync::Arc;

use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use jobscan_core::aggregator::Aggregator;
use jobscan_core::config::EngineConfig;
use jobscan_core::filter::EligibilityFilter;
use jobscan_core::seen::SeenJobs;
use jobscan_providers::{ProviderCredentials, build_providers};
use jobscan_server::digest::{LogDigestSink, SmtpDigestSink};
use jobscan_server::routes;
use jobscan_server::scheduler::{self, SchedulerConfig};
use jobscan_server::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("jobscan=info".parse()?))
        .with_target(false)
        .init();

    let port = std::env::var("JOBSCAN_PORT").unwrap_or_else(|_| "3000".to_string());
    let addr = format!("0.0.0.0:{port}");

    let config = EngineConfig::from_env()?;
    let credentials = ProviderCredentials::from_env()?;
    let providers = build_providers(&credentials, &config)?;
    let engine = Aggregator::new(providers, config)?;

    let state = Arc::new(AppState {
        engine,
        filter: EligibilityFilter::from_env(),
        seen: SeenJobs::default(),
        scan_keywords: AppState::scan_keywords_from_env(),
    });

    let token = CancellationToken::new();
    let scheduler_config = SchedulerConfig::from_env()?;
    let scheduler_handle = match SmtpDigestSink::from_env()? {
        Some(sink) => {
            tracing::info!("SMTP digest delivery enabled");
            tokio::spawn(scheduler::run(
                state.clone(),
                scheduler_config,
                sink,
                token.clone(),
            ))
        }
        None => {
            tracing::info!("No SMTP configured; digests go to the log");
            tokio::spawn(scheduler::run(
                state.clone(),
                scheduler_config,
                LogDigestSink,
                token.clone(),
            ))
        }
    };

    let app = routes::router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    tracing::info!("Starting server on {addr}");
    let listener = TcpListener::bind(&addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    token.cancel();
    scheduler_handle.await?;

    Ok(())
}

async fn shutdown_signal() {
    tokio::signal::ctrl_c()
        .await
        .expect("Failed to install CTRL+C handler");
    tracing::info!("Shutdown signal received");
}
