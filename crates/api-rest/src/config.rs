//! Startup configuration for the REST server.
//!
//! Everything is read from the environment once, before the router is built.

use crate::AppState;
use anyhow::Context;
use api_shared::{AdminCredentials, TokenService};
use docplus_core::config::{currency_from_env_value, offered_slots_from_env_value};
use docplus_core::constants::DEFAULT_DATA_DIR;
use docplus_core::{CoreConfig, DocumentStore, EmailAddress, PaymentSettings};
use std::path::PathBuf;
use std::sync::Arc;

pub const DEFAULT_REST_ADDR: &str = "0.0.0.0:4000";
pub const DEFAULT_TOKEN_TTL_HOURS: i64 = 24;

fn env_opt(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn env_required(key: &str) -> anyhow::Result<String> {
    env_opt(key).with_context(|| format!("{key} must be set"))
}

/// Listen address from `DOCPLUS_REST_ADDR`.
pub fn rest_addr_from_env() -> String {
    env_opt("DOCPLUS_REST_ADDR").unwrap_or_else(|| DEFAULT_REST_ADDR.into())
}

/// Core configuration from `DOCPLUS_DATA_DIR`, `DOCPLUS_CURRENCY` and `DOCPLUS_SLOT_TIMES`.
pub fn core_config_from_env() -> anyhow::Result<CoreConfig> {
    let data_dir = PathBuf::from(
        env_opt("DOCPLUS_DATA_DIR").unwrap_or_else(|| DEFAULT_DATA_DIR.into()),
    );
    let currency = currency_from_env_value(env_opt("DOCPLUS_CURRENCY"));
    let offered_slots = offered_slots_from_env_value(env_opt("DOCPLUS_SLOT_TIMES"))
        .context("DOCPLUS_SLOT_TIMES is invalid")?;

    Ok(CoreConfig::new(data_dir, currency, offered_slots)?)
}

/// Builds the full application state from the environment.
///
/// # Errors
///
/// Fails if `TOKEN_SECRET`, `ADMIN_EMAIL` or `ADMIN_PASSWORD` is missing, if any value is
/// malformed, or if the data directory cannot be created.
pub fn state_from_env() -> anyhow::Result<AppState> {
    let cfg = Arc::new(core_config_from_env()?);
    let store = DocumentStore::open(cfg.clone()).with_context(|| {
        format!("cannot open data directory {}", cfg.data_dir().display())
    })?;

    let token_secret = env_required("TOKEN_SECRET")?;
    let ttl_hours = match env_opt("TOKEN_TTL_HOURS") {
        Some(v) => v
            .trim()
            .parse::<i64>()
            .context("TOKEN_TTL_HOURS must be a whole number of hours")?,
        None => DEFAULT_TOKEN_TTL_HOURS,
    };
    let tokens = TokenService::new(token_secret.clone(), ttl_hours)?;

    let admin_email = EmailAddress::parse(env_required("ADMIN_EMAIL")?)
        .context("ADMIN_EMAIL is not a valid email address")?;
    let admin = AdminCredentials::new(admin_email, env_required("ADMIN_PASSWORD")?)?;

    let payment = PaymentSettings::from_env_values(
        env_opt("PAYMENT_GATEWAY"),
        env_opt("RAZORPAY_KEY_ID"),
        env_opt("RAZORPAY_KEY_SECRET"),
        env_opt("SANDBOX_PAYMENT_SECRET"),
        &token_secret,
    )?;
    let gateway = payment.build();

    tracing::info!(
        data_dir = %cfg.data_dir().display(),
        currency = cfg.currency(),
        gateway = gateway.name(),
        "configuration loaded"
    );

    Ok(AppState::new(store, gateway, tokens, admin))
}
