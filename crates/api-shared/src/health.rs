use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Health check response body.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct HealthRes {
    pub ok: bool,
    pub message: String,
}

/// Simple health service for the REST API and operator tooling.
#[derive(Clone, Default)]
pub struct HealthService;

impl HealthService {
    /// Static health check; does not touch storage.
    pub fn check_health() -> HealthRes {
        HealthRes {
            ok: true,
            message: "DocPlus is alive".into(),
        }
    }
}
