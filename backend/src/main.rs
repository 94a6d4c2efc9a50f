//! Userbase Backend
//!
//! User-account service: registration, login/logout, token refresh,
//! password change, profile update, and avatar/cover-image upload.
//!
//! ## Architecture
//!
//! - Routes: HTTP request handling and routing
//! - Services: session lifecycle and account logic
//! - Store: credential persistence (PostgreSQL)
//! - Media: third-party image-hosting client

use anyhow::Result;
use std::sync::Arc;
use tokio::signal;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use userbase_backend::{
    config, db, media::MediaClient, routes, state::AppState, store::PgCredentialStore,
};

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    init_tracing();

    let config = config::AppConfig::load()?;

    info!(
        version = env!("CARGO_PKG_VERSION"),
        env = if config::AppConfig::is_production() {
            "production"
        } else {
            "development"
        },
        "Starting Userbase Backend"
    );

    if config::AppConfig::is_production() {
        validate_production_config(&config)?;
    }

    info!("Connecting to database...");
    let pool = db::create_pool(&config.database.url, config.database.max_connections).await?;

    // Run migrations (skip in production if using a separate migration job)
    if !config::AppConfig::is_production() {
        db::run_migrations(&pool).await?;
    }

    let store = Arc::new(PgCredentialStore::new(pool));
    let media = MediaClient::new(&config.media)?;
    let state = AppState::new(store, media, config.clone());

    let app = routes::create_router(state);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    info!(address = %addr, "Server listening");

    let listener = tokio::net::TcpListener::bind(&addr).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shutdown complete");
    Ok(())
}

/// Initialize tracing/logging
fn init_tracing() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if config::AppConfig::is_production() {
            "userbase_backend=info,tower_http=info".into()
        } else {
            "userbase_backend=debug,tower_http=debug,sqlx=warn".into()
        }
    });

    let subscriber = tracing_subscriber::registry().with(env_filter);

    if config::AppConfig::is_production() {
        subscriber
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        subscriber
            .with(tracing_subscriber::fmt::layer().pretty())
            .init();
    }
}

/// Validate configuration for production deployment
fn validate_production_config(config: &config::AppConfig) -> Result<()> {
    let mut errors = Vec::new();

    for (name, secret) in [
        ("access token secret", &config.jwt.access_token_secret),
        ("refresh token secret", &config.jwt.refresh_token_secret),
    ] {
        if secret.contains("development") || secret.len() < 32 {
            errors.push(format!(
                "{name} must be at least 32 characters and not contain 'development'"
            ));
        }
    }

    // Possession of one token class must not forge the other.
    if config.jwt.access_token_secret == config.jwt.refresh_token_secret {
        errors.push("access and refresh token secrets must differ".to_string());
    }

    if config.media.api_key.contains("development") {
        errors.push("media api key must not contain 'development'".to_string());
    }

    if !errors.is_empty() {
        for err in &errors {
            error!("Configuration error: {}", err);
        }
        anyhow::bail!("Invalid production configuration");
    }

    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, starting graceful shutdown");
        }
        _ = terminate => {
            info!("Received SIGTERM, starting graceful shutdown");
        }
    }
}
