use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use api_rest::{app, config};
use docplus_core::audit_slots;

/// Main entry point for the DocPlus booking service
///
/// Loads configuration, runs a slot consistency audit over the data directory and then serves the
/// REST API (with Swagger UI at `/swagger-ui`).
///
/// # Environment Variables
/// - `DOCPLUS_REST_ADDR`: REST server address (default: "0.0.0.0:4000")
/// - `DOCPLUS_DATA_DIR`: Directory for booking data (default: "booking_data")
/// - `TOKEN_SECRET`, `ADMIN_EMAIL`, `ADMIN_PASSWORD`: required
/// - `PAYMENT_GATEWAY`: `sandbox` (default) or `razorpay`
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("docplus=info".parse()?)
                .add_directive("docplus_core=info".parse()?)
                .add_directive("api_rest=info".parse()?),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cfg = std::sync::Arc::new(config::core_config_from_env()?);
    let report = audit_slots(&docplus_core::DocumentStore::open(cfg)?);
    if report.is_consistent() {
        tracing::info!(
            doctors = report.doctors_checked,
            appointments = report.appointments_checked,
            "booked slots are consistent"
        );
    } else {
        tracing::warn!(
            findings = report.findings.len(),
            "booked slots disagree with appointments, run `docplus audit-slots` for details"
        );
    }

    let state = config::state_from_env()?;
    let rest_addr = config::rest_addr_from_env();

    tracing::info!("++ Starting DocPlus REST on {}", rest_addr);

    let listener = tokio::net::TcpListener::bind(&rest_addr).await?;
    axum::serve(listener, app(state)).await?;

    Ok(())
}
