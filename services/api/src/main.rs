use access::{Catalog, Identity, InMemoryDirectory, PermissionStore};
use anyhow::Result;
use api::{AppState, create_router, middleware::TokenVerifier};
use common::config::AccessConfig;
use tokio::net::TcpListener;
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    let config = AccessConfig::from_env()?;
    common::telemetry::init(&config.log_level)?;

    info!("Starting API service");

    let verifier = TokenVerifier::from_config(&config)?;

    let directory = InMemoryDirectory::sample().with_latency(config.simulated_latency());
    let store = PermissionStore::new(directory, Catalog::school(), config.retry_policy());

    // The service evaluates callers against its own, fully loaded view
    let service = Identity::new("api-service", "api-service@school.local", "admin");
    store.load(service).await?;
    info!("Loaded {} staff records", store.staff_members().len());

    let app = create_router(AppState::new(store, verifier));

    let listener = TcpListener::bind(&config.bind_address).await?;
    info!("API service listening on {}", config.bind_address);

    axum::serve(listener, app).await?;

    Ok(())
}
