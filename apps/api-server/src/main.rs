//! # Yatube API Server
//!
//! The main entry point for the Actix-web HTTP server.

use actix_web::{App, HttpServer, web};
use anyhow::Context;
use tracing_actix_web::TracingLogger;

use api_server::config::AppConfig;
use api_server::handlers;
use api_server::observability::RequestIdMiddleware;
use api_server::state::AppState;
use api_server::telemetry::{TelemetryConfig, init_telemetry};

#[cfg(feature = "rate-limit")]
use api_server::middleware::rate_limit::RateLimitMiddleware;
#[cfg(feature = "rate-limit")]
use std::sync::Arc;
#[cfg(feature = "rate-limit")]
use yatube_infra::InMemoryRateLimiter;

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    init_telemetry(&TelemetryConfig::from_env());

    let config = AppConfig::from_env();

    tracing::info!(
        "Starting Yatube API Server on {}:{}",
        config.host,
        config.port
    );

    let state = web::Data::new(AppState::new(&config).await);

    #[cfg(feature = "rate-limit")]
    let limiter: Arc<dyn yatube_core::ports::RateLimiter> =
        Arc::new(InMemoryRateLimiter::new(config.rate_limit.clone()));

    HttpServer::new(move || {
        let app = App::new()
            .app_data(state.clone())
            .configure(handlers::configure_routes);

        #[cfg(feature = "rate-limit")]
        let app = app.wrap(RateLimitMiddleware::new(limiter.clone()));

        // Registered last so it runs first.
        app.wrap(TracingLogger::default()).wrap(RequestIdMiddleware)
    })
    .bind((config.host.as_str(), config.port))
    .with_context(|| format!("failed to bind {}:{}", config.host, config.port))?
    .run()
    .await
    .context("server terminated with an error")
}
