//! # API Shared
//!
//! Shared definitions for the DocPlus REST API and operator tooling.
//!
//! Contains:
//! - Request/response bodies (`dto` module) with OpenAPI schemas
//! - Session tokens and admin credentials (`auth` module)
//! - `HealthService`

pub mod auth;
pub mod dto;
pub mod health;

pub use auth::{AdminCredentials, AuthError, Claims, Role, TokenService};
pub use health::{HealthRes, HealthService};
