//! services/api/src/bin/api.rs

use api_lib::{
    adapters::{
        CannedFlashcardsAdapter, DbAdapter, MokaCacheAdapter, OpenAiFlashcardsAdapter,
        RedisCacheAdapter,
    },
    config::Config,
    error::ApiError,
    web::{build_router, AppState},
};
use async_openai::{config::OpenAIConfig, Client};
use flashmind_core::{
    ports::{CacheService, DatabaseService, FlashcardGenerationService},
    service::{ResourceService, ServiceSettings},
    MemoryStore,
};
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), ApiError> {
    // --- 1. Load Configuration & Set Up Logging ---
    let config = Arc::new(Config::from_env()?);
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(config.log_level.to_string()))
        .with(tracing_subscriber::fmt::layer())
        .init();
    info!("Configuration loaded. Starting server...");

    // --- 2. Connect to the Store & Run Migrations ---
    let pg_adapter = match &config.database_url {
        Some(url) => {
            info!("Connecting to database...");
            let pool = PgPoolOptions::new().max_connections(5).connect(url).await?;
            let adapter = Arc::new(DbAdapter::new(pool));
            info!("Running database migrations...");
            adapter.run_migrations().await?;
            info!("Database migrations complete.");
            Some(adapter)
        }
        None => None,
    };
    let db: Arc<dyn DatabaseService> = match &pg_adapter {
        Some(adapter) => adapter.clone(),
        None => {
            warn!("DATABASE_URL is not set; data lives in memory and is lost on exit.");
            Arc::new(MemoryStore::new())
        }
    };

    // --- 3. Connect to the Cache ---
    let cache: Arc<dyn CacheService> = match &config.redis_url {
        Some(url) => Arc::new(RedisCacheAdapter::connect(url).await?),
        None => {
            info!("REDIS_URL is not set; using the in-process cache.");
            Arc::new(MokaCacheAdapter::default())
        }
    };

    // --- 4. Initialize the Generator ---
    let generator: Arc<dyn FlashcardGenerationService> = match &config.openai_api_key {
        Some(key) => {
            let openai_client = Client::with_config(OpenAIConfig::new().with_api_key(key));
            Arc::new(OpenAiFlashcardsAdapter::new(
                openai_client,
                config.flashcard_model.clone(),
            ))
        }
        None => {
            warn!("OPENAI_API_KEY is not set; generation returns the sample deck.");
            Arc::new(CannedFlashcardsAdapter)
        }
    };

    // --- 5. Build the Shared AppState ---
    let resources = Arc::new(ResourceService::new(
        db.clone(),
        cache,
        generator,
        ServiceSettings {
            cache_ttl: config.cache_ttl,
            generation_timeout: config.generation_timeout,
        },
    ));
    let app_state = Arc::new(AppState {
        db,
        config: config.clone(),
        resources,
    });
    let app = build_router(app_state)?;

    // --- 6. Start the Server ---
    info!("Starting server on {}", config.bind_address);
    info!(
        "Swagger UI available at http://{}/swagger-ui",
        config.bind_address
    );
    let listener = tokio::net::TcpListener::bind(&config.bind_address).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    if let Some(adapter) = pg_adapter {
        adapter.close().await;
        info!("Database pool closed.");
    }
    info!("Server stopped.");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for the shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received; draining connections.");
}
