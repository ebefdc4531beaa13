//! Local Library server
//!
//! Serves the catalog pages, account pages and health endpoints.

use std::{net::SocketAddr, sync::Arc};

use anyhow::Context;
use sqlx::postgres::PgPoolOptions;
use tower_governor::{governor::GovernorConfigBuilder, GovernorLayer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use local_library::{
    api,
    config::AppConfig,
    repository::Repository,
    services::{redis::RedisService, sessions::MemorySessionStore, sessions::SessionStore, Services},
    views::JsonShellRenderer,
    AppState,
};

const IN_MEMORY: &str = "memory";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    let config = AppConfig::load().context("Failed to load configuration")?;

    // Initialize tracing
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| format!("local_library={},tower_http=debug", config.logging.level).into());

    if config.logging.format == "json" {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }

    tracing::info!("Starting Local Library v{}", env!("CARGO_PKG_VERSION"));

    let repository = if config.database.url == IN_MEMORY {
        tracing::warn!("Using the in-memory store; data is lost on restart");
        Repository::memory()
    } else {
        let pool = PgPoolOptions::new()
            .max_connections(config.database.max_connections)
            .min_connections(config.database.min_connections)
            .connect(&config.database.url)
            .await
            .context("Failed to connect to database")?;
        tracing::info!("Connected to database");

        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .context("Failed to run database migrations")?;
        tracing::info!("Database migrations completed");

        Repository::new(pool)
    };

    let sessions: Arc<dyn SessionStore> = if config.redis.url == IN_MEMORY {
        Arc::new(MemorySessionStore::new())
    } else {
        let redis = RedisService::new(&config.redis.url)
            .await
            .context("Failed to connect to Redis")?;
        tracing::info!("Connected to Redis");
        Arc::new(redis)
    };

    let services = Services::new(repository, sessions);
    if let Some(admin) = &config.auth.bootstrap_admin {
        services
            .auth
            .ensure_bootstrap_admin(admin)
            .await
            .context("Failed to create bootstrap admin")?;
    }

    let addr = SocketAddr::new(
        config.server.host.parse().context("Invalid host address")?,
        config.server.port,
    );

    // Budget of `per_minute` requests per client IP, replenished evenly
    let governor = GovernorConfigBuilder::default()
        .per_millisecond(60_000 / u64::from(config.rate_limit.per_minute.max(1)))
        .burst_size(config.rate_limit.per_minute.max(1))
        .finish()
        .context("Invalid rate limit configuration")?;

    let state = AppState {
        config: Arc::new(config),
        services: Arc::new(services),
        renderer: Arc::new(JsonShellRenderer),
    };

    let app = api::router(state).layer(GovernorLayer {
        config: Box::leak(Box::new(governor)),
    });

    tracing::info!("Server listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>()).await?;

    Ok(())
}
