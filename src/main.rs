use jersey_geeks::{
    AppState,
    config::{AppConfig, Env, StorageBackend},
    create_router,
    repository::{MemoryRepository, MongoRepository, RepositoryState},
};
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// main
///
/// Loads configuration, starts logging, connects the document store and serves HTTP.
#[tokio::main]
async fn main() {
    // 1. Configuration (fail-fast). A local .env file may seed the environment.
    dotenv::dotenv().ok();
    let config = AppConfig::load();

    // 2. Logging. RUST_LOG wins over the default filter.
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "jersey_geeks=debug,tower_http=info,axum=trace".into());

    match config.env {
        Env::Local => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().pretty())
                .init();
        }
        Env::Production => {
            // JSON lines for the log aggregator.
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        }
    }

    tracing::info!("Application starting in {:?} mode", config.env);

    // 3. Document store. Constructed once here and handed to every request via AppState.
    let repo: RepositoryState = match config.storage {
        StorageBackend::Mongo => {
            let repo = MongoRepository::connect(&config.db_url, &config.db_name)
                .await
                .expect("FATAL: Failed to configure the MongoDB client. Check MONGODB_URI.");
            tracing::info!(db = %config.db_name, "MongoDB client ready");
            Arc::new(repo) as RepositoryState
        }
        StorageBackend::Memory => {
            tracing::warn!("Using the in-memory store; data is lost on exit");
            Arc::new(MemoryRepository::new()) as RepositoryState
        }
    };

    let port = config.port;
    let app = create_router(AppState { repo, config });

    // 4. Server.
    let listener = TcpListener::bind(("0.0.0.0", port))
        .await
        .expect("FATAL: Failed to bind the HTTP port.");

    tracing::info!("Jersey Geeks running on port {}", port);
    tracing::info!("API Documentation (Swagger UI) available at: http://localhost:{}/swagger-ui", port);

    axum::serve(listener, app)
        .await
        .expect("FATAL: HTTP server terminated unexpectedly.");
}
