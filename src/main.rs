use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use api_rest::{AppState, router};
use dualcode_core::{
    CoreConfig, DEFAULT_REST_ADDR,
    config::{bundle_data_dir_from_env_value, max_bundle_bytes_from_env_value},
};

/// Main entry point for the dualcode application
///
/// Starts the REST server that accepts dual-coded FHIR Bundles.
///
/// # Environment Variables
/// - `DUALCODE_REST_ADDR`: REST server address (default: "0.0.0.0:3000")
/// - `BUNDLE_DATA_DIR`: Directory for accepted bundles (unset keeps them in memory)
/// - `DUALCODE_MAX_BUNDLE_BYTES`: Upload size limit in bytes (default: 10 MiB)
///
/// # Returns
/// * `Ok(())` - If the server starts and runs successfully
/// * `Err(anyhow::Error)` - If configuration, startup or the server itself fails
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("dualcode=info".parse()?)
                .add_directive("dualcode_core=info".parse()?)
                .add_directive("api_rest=info".parse()?),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let rest_addr =
        std::env::var("DUALCODE_REST_ADDR").unwrap_or_else(|_| DEFAULT_REST_ADDR.into());

    let cfg = CoreConfig::new(
        bundle_data_dir_from_env_value(std::env::var("BUNDLE_DATA_DIR").ok()),
        max_bundle_bytes_from_env_value(std::env::var("DUALCODE_MAX_BUNDLE_BYTES").ok())?,
    )?;
    let store = cfg.open_store()?;

    let app = router(AppState::new(&cfg, store));

    tracing::info!("-- Starting dualcode REST API on {}", rest_addr);
    tracing::info!(
        "-- Accepting bundles up to {} bytes",
        cfg.max_bundle_bytes()
    );

    let listener = tokio::net::TcpListener::bind(&rest_addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
