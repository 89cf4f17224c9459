//! Standalone REST API server binary.
//!
//! ## Purpose
//! Runs the DocPlus REST API on its own, with OpenAPI/Swagger UI.
//!
//! ## Intended use
//! Useful during development. The workspace's `docplus-run` binary serves the same router.

use api_rest::{app, config};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Main entry point for the DocPlus REST API server.
///
/// # Environment Variables
/// - `DOCPLUS_REST_ADDR`: Server address (default: "0.0.0.0:4000")
/// - `TOKEN_SECRET`, `ADMIN_EMAIL`, `ADMIN_PASSWORD`: required, see [`config::state_from_env`]
///
/// # Errors
/// Returns an error if:
/// - the logging/tracing configuration cannot be initialised,
/// - the configuration is missing or invalid,
/// - the server address cannot be bound, or
/// - the HTTP server fails while running.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("api_rest=info".parse()?),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let state = config::state_from_env()?;
    let addr = config::rest_addr_from_env();

    tracing::info!("-- Starting DocPlus REST API on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app(state)).await?;

    Ok(())
}
