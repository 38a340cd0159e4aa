use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use api_rest::{router, AppState};
use clinic_core::constants::{
    DEFAULT_REST_ADDR, ENV_REST_ADDR, ENV_SEED_FILE, ENV_STORE_BACKEND, ENV_STORE_KEY,
    ENV_STORE_URL,
};
use clinic_core::{open_store, StoreConfig};

/// Main entry point for the clinic REST service
///
/// Resolves the store configuration once, opens the appointment store and serves the REST API
/// (with Swagger UI under `/swagger-ui`).
///
/// # Environment Variables
/// - `CLINIC_STORE_BACKEND`: `postgrest` (default) or `memory`
/// - `CLINIC_STORE_URL`: base URL of the hosted store (postgrest backend)
/// - `CLINIC_STORE_KEY`: API key of the hosted store (postgrest backend)
/// - `CLINIC_SEED_FILE`: optional JSON seed file (memory backend)
/// - `CLINIC_REST_ADDR`: REST server address (default: "0.0.0.0:3000")
///
/// # Returns
/// * `Ok(())` - If the server starts and runs successfully
/// * `Err(anyhow::Error)` - If configuration is invalid or the server fails
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("clinic_run=info".parse()?)
                .add_directive("clinic_core=info".parse()?),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cfg = StoreConfig::from_env_values(
        std::env::var(ENV_STORE_BACKEND).ok(),
        std::env::var(ENV_STORE_URL).ok(),
        std::env::var(ENV_STORE_KEY).ok(),
        std::env::var(ENV_SEED_FILE).ok(),
    )?;
    let store = open_store(&cfg)?;

    let rest_addr = std::env::var(ENV_REST_ADDR).unwrap_or_else(|_| DEFAULT_REST_ADDR.into());
    tracing::info!("++ Starting clinic REST on {}", rest_addr);

    let app = router(AppState::new(store));
    let listener = tokio::net::TcpListener::bind(&rest_addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
