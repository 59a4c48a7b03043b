//! services/api/src/bin/api.rs

use api_lib::{
    adapters::{CmsRepository, MemoryKeyValueStore, PgKeyValueStore, StaticJsonRepository},
    catalog::Catalog,
    config::Config,
    error::ApiError,
    web::{build_router, state::AppState},
};
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use webinar_catalog_core::ports::KeyValueStore;

#[tokio::main]
async fn main() -> Result<(), ApiError> {
    // --- 1. Load Configuration & Set Up Logging ---
    let config = Arc::new(Config::from_env()?);
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(config.log_level.to_string()))
        .with(tracing_subscriber::fmt::layer())
        .init();
    info!("Configuration loaded. Starting server...");

    // --- 2. Load the Catalog ---
    let catalog = match &config.cms {
        Some(cms) => {
            info!("Loading webinars from the CMS space '{}'...", cms.space_id);
            Catalog::load(&CmsRepository::new(cms.clone())?).await
        }
        None => {
            info!("Loading webinars from {}...", config.webinars_path.display());
            Catalog::load(&StaticJsonRepository::new(config.webinars_path.clone())).await
        }
    };
    info!("Catalog ready with {} webinars.", catalog.webinars().len());

    // --- 3. Connect to the Visitor Store & Run Migrations ---
    let store: Arc<dyn KeyValueStore> = match &config.database_url {
        Some(database_url) => {
            info!("Connecting to database...");
            let db_pool = PgPoolOptions::new()
                .max_connections(5)
                .connect(database_url)
                .await?;
            let store = PgKeyValueStore::new(db_pool);
            info!("Running database migrations...");
            store.run_migrations().await?;
            info!("Database migrations complete.");
            Arc::new(store)
        }
        None => {
            warn!("DATABASE_URL not set. Visitor state will not survive a restart.");
            Arc::new(MemoryKeyValueStore::new())
        }
    };

    // --- 4. Build the Shared AppState & Router ---
    let app_state = Arc::new(AppState {
        catalog: Arc::new(catalog),
        store,
        config: config.clone(),
        visitor_locks: Arc::default(),
    });
    let app = build_router(app_state);

    // --- 5. Start the Server ---
    info!("Starting server on {}", config.bind_address);
    info!(
        "Swagger UI available at http://{}/swagger-ui",
        config.bind_address
    );
    let listener = tokio::net::TcpListener::bind(&config.bind_address).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
