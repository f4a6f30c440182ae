//! Campus Market Backend Service
//!
//! Main entry point for the Campus Market backend.
//! This service provides:
//! - REST API under `/api` for the web client
//! - Wallet top-ups through Stripe (simulated without a key)
//! - Support chatbot proxy with canned fallbacks

use actix_web::{middleware::Logger, web, App, HttpServer};
use campus_market::database::{create_pool, run_migrations};
use campus_market::{routes, AppConfig, AppError, AppResult, AppState};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[actix_web::main]
async fn main() -> AppResult<()> {
    // Load environment variables first
    dotenv::dotenv().ok();

    // Load configuration
    let config = AppConfig::from_env().map_err(|e| {
        eprintln!("Configuration error: {}", e);
        AppError::Config(e)
    })?;

    // Initialize tracing/logging with config
    init_tracing(&config);

    info!("╔══════════════════════════════════════════════════════════╗");
    info!("║           Campus Market Backend Starting                 ║");
    info!("╚══════════════════════════════════════════════════════════╝");
    info!("Environment: {}", config.environment);
    info!("Log level: {}", config.log_level);
    info!("HTTP address: {}", config.bind_address());

    // =========================================================================
    // DATABASE SETUP
    // =========================================================================
    info!("Connecting to database...");

    let pool = create_pool(&config.database).await.map_err(|e| {
        error!("Failed to create database pool: {}", e);
        AppError::Database(e)
    })?;

    info!("Database connection pool created successfully");
    info!("Max connections: {}", config.database.max_connections);

    // Run migrations
    info!("Running database migrations...");
    run_migrations(&pool, None).await.map_err(|e| {
        error!("Database migration failed: {}", e);
        AppError::Database(e)
    })?;

    info!("Database migrations completed successfully");

    // =========================================================================
    // SERVICES
    // =========================================================================
    info!("Initializing services...");

    let bind_address = config.bind_address();
    let environment = config.environment.clone();
    let state = web::Data::new(AppState::new(pool, config).map_err(|e| {
        error!("Failed to initialize application state: {}", e);
        e
    })?);
    info!("✓ Application state initialized");

    // =========================================================================
    // START SERVER
    // =========================================================================
    let server = HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .wrap(Logger::default())
            .configure(routes::configure)
    })
    .bind(&bind_address)
    .map_err(|e| AppError::Message(format!("Failed to bind {}: {}", bind_address, e)))?;

    info!("╔══════════════════════════════════════════════════════════╗");
    info!("║           Campus Market Backend Ready!                   ║");
    info!("╠══════════════════════════════════════════════════════════╣");
    info!("║  REST API:     http://{}/api", bind_address);
    info!("║  Environment:  {}", environment);
    info!("╚══════════════════════════════════════════════════════════╝");
    info!("Press Ctrl+C to shutdown gracefully");

    // actix handles SIGINT/SIGTERM and drains in-flight requests
    server
        .run()
        .await
        .map_err(|e| AppError::Message(format!("HTTP server error: {}", e)))?;

    info!("Campus Market backend shutdown complete");
    Ok(())
}

fn init_tracing(config: &AppConfig) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        format!(
            "campus_market={},sqlx=warn,actix_web=info",
            config.log_level
        )
        .into()
    });

    if config.log_format == "json" {
        tracing_subscriber::fmt().with_env_filter(filter).json().init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}
