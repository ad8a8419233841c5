// Server binary entry point
//
// Usage: cargo run --bin rox_server
// Configuration comes from the environment (DATA_DIR, OUTPUT_DIR, PORT, ...).

use rox_semantic_ui::{create_router, AppState, ServerConfig};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing (structured logging)
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| {
                    // Default log level: info for our crate, warn for others
                    "rox_semantic_ui=info,tower_http=debug,axum=debug,warn".into()
                }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting RoX Semantic Model UI...");

    let config = ServerConfig::from_env();

    tracing::info!("Configuration:");
    tracing::info!("  DATA_DIR: {}", config.data_dir.display());
    tracing::info!("  DCAT_CSV: {}", config.dcat_file);
    tracing::info!("  OPCUA_CSV: {}", config.opcua_file);
    tracing::info!("  OUTPUT_DIR: {}", config.output_dir.display());
    tracing::info!("  SESSION_TTL_SECS: {}", config.session_ttl.as_secs());

    // Loads both lookup tables and builds the search index
    tracing::info!("Initializing application state...");
    let state = AppState::new(&config)?;
    tracing::info!("Application state initialized successfully");

    let app = create_router(state);

    let addr = config.bind_address();
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on {}", addr);

    axum::serve(listener, app)
        .await?;

    Ok(())
}
