// Main entry point for the LeadScout API server

use std::sync::Arc;

use anyhow::{Context, Result};
use leadscout_core::domains::auth::JwtService;
use leadscout_core::domains::leads::{PgLeadJobStore, PipelineOptions};
use leadscout_core::kernel::{
    BasePlaceSearch, ContactCrawler, CrawlerOptions, EmailExtractor, NoopPlaceSearch,
    PlacesClient, ServerDeps,
};
use leadscout_core::server::build_app;
use leadscout_core::Config;
use sqlx::postgres::PgPoolOptions;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,leadscout_core=debug,sqlx=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting LeadScout API");

    // Load configuration
    let config = Config::from_env().context("Failed to load configuration")?;
    tracing::info!("Configuration loaded");

    // Connect to database
    tracing::info!("Connecting to database...");
    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(&config.database_url)
        .await
        .context("Failed to connect to database")?;
    tracing::info!("Database connected");

    // Run migrations
    tracing::info!("Running database migrations...");
    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .context("Failed to run migrations")?;
    tracing::info!("Migrations complete");

    // Wire dependencies
    let place_search_configured = config.places_api_key.is_some();
    let place_search: Arc<dyn BasePlaceSearch> = match config.places_api_key.clone() {
        Some(key) => Arc::new(PlacesClient::new(key)?),
        None => {
            tracing::warn!("PLACES_API_KEY not set - job starts will be rejected");
            Arc::new(NoopPlaceSearch)
        }
    };

    let extractor = EmailExtractor::new(&config.email_domain_blocklist);
    let site_crawler = Arc::new(ContactCrawler::new(extractor, CrawlerOptions::default())?);

    let jwt_service = Arc::new(JwtService::new(&config.jwt_secret, config.jwt_issuer.clone()));

    let deps = Arc::new(ServerDeps::new(
        Arc::new(PgLeadJobStore::new(pool.clone())),
        place_search,
        site_crawler,
        jwt_service,
        place_search_configured,
        config.admin_identifiers.clone(),
    ));

    let app = build_app(pool, deps, PipelineOptions::default());

    // Start server
    let addr = format!("0.0.0.0:{}", config.port);
    tracing::info!("Starting server on {}", addr);
    tracing::info!("Health check: http://localhost:{}/health", config.port);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .context("Failed to bind to address")?;

    axum::serve(listener, app).await.context("Server error")?;

    Ok(())
}
