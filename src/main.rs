//! Rentwear Backend Server
//!
//! Serves the rental lifecycle API: rental requests, approvals with overlap
//! resolution, delivery tracking, extensions, returns and the seller wallet.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::http::{header, HeaderValue, Method};
use tokio::signal;
use tower_http::cors::CorsLayer;

use rentwear_server::auth::AuthKeys;
use rentwear_server::config::Config;
use rentwear_server::middleware::RateLimiter;
use rentwear_server::rental::{settlement::settlement_loop, RentalService};
use rentwear_server::routes::app_router;
use rentwear_server::state::AppState;
use rentwear_server::wallet::WalletService;
use rentwear_server::websocket::WsState;
use rentwear_server::db;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = match Config::from_env() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.log_level)),
        )
        .with_target(true)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true)
        .init();

    tracing::info!(
        environment = config.environment.as_str(),
        overlap_policy = ?config.overlap_policy,
        "Starting Rentwear server"
    );

    let db_pool = db::create_pool(&config).await?;
    db::run_migrations(&db_pool).await?;

    let ws_state = WsState::new();
    let rental_service = Arc::new(RentalService::new(db_pool.clone(), config.overlap_policy));
    let wallet_service = Arc::new(WalletService::new(db_pool.clone()));
    let auth_keys = Arc::new(AuthKeys::new(config.jwt_secret.clone()));

    let app_state = AppState::new(
        db_pool.clone(),
        rental_service.clone(),
        wallet_service,
        auth_keys,
        ws_state.clone(),
    );

    // Complete returned rentals in the background
    let settlement_service = rental_service.clone();
    let settlement_ws = ws_state.clone();
    let settlement_interval = config.settlement_interval;
    tokio::spawn(async move {
        settlement_loop(settlement_service, settlement_ws, settlement_interval).await;
        tracing::error!("Settlement loop exited unexpectedly");
    });

    let rate_limiter = RateLimiter::new(config.rate_limit_rps);
    rate_limiter.spawn_eviction(Duration::from_secs(300));

    let app = app_router(app_state, rate_limiter).layer(configure_cors(&config));

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("Server listening on {}", addr);
    tracing::info!("WebSocket available at ws://{}/ws", addr);
    tracing::info!("Health check at http://{}/health", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server shutdown complete");
    Ok(())
}

fn configure_cors(config: &Config) -> CorsLayer {
    let allowed = config.cors_allowed_origins.as_deref().unwrap_or_default();

    if allowed.is_empty() {
        if config.environment.is_production() {
            tracing::warn!("CORS_ALLOWED_ORIGINS not set in production, allowing all origins");
        }
        return CorsLayer::permissive();
    }

    let origins: Vec<HeaderValue> = allowed
        .split(',')
        .filter_map(|s| s.trim().parse().ok())
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating graceful shutdown...");
        }
        _ = terminate => {
            tracing::info!("Received SIGTERM, initiating graceful shutdown...");
        }
    }
}
