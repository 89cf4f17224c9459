//! Request extractors: JSON bodies with uniform error bodies, and per-role sessions.
//!
//! Session tokens travel in role-specific headers: `token` for patients, `dtoken` for doctors
//! and `atoken` for admins.

use crate::error::ApiError;
use crate::AppState;
use api_shared::{AuthError, Claims, Role};
use axum::extract::{FromRequest, FromRequestParts};
use axum::http::request::Parts;
use docplus_core::RecordId;

pub const PATIENT_TOKEN_HEADER: &str = "token";
pub const DOCTOR_TOKEN_HEADER: &str = "dtoken";
pub const ADMIN_TOKEN_HEADER: &str = "atoken";

/// `axum::Json` whose rejection is rendered like every other API error.
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct ApiJson<T>(pub T);

fn claims_from_header(
    parts: &Parts,
    state: &AppState,
    header: &str,
    role: Role,
) -> Result<Claims, AuthError> {
    let token = parts
        .headers
        .get(header)
        .and_then(|v| v.to_str().ok())
        .ok_or(AuthError::Missing)?;

    state.tokens.verify(token, role)
}

fn subject_id(claims: &Claims) -> Result<RecordId, AuthError> {
    RecordId::parse(&claims.sub).map_err(|_| AuthError::Malformed)
}

/// A verified patient session.
#[derive(Clone, Copy, Debug)]
pub struct PatientSession(pub RecordId);

#[axum::async_trait]
impl FromRequestParts<AppState> for PatientSession {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, ApiError> {
        let claims = claims_from_header(parts, state, PATIENT_TOKEN_HEADER, Role::Patient)?;
        Ok(PatientSession(subject_id(&claims)?))
    }
}

/// A verified doctor session.
#[derive(Clone, Copy, Debug)]
pub struct DoctorSession(pub RecordId);

#[axum::async_trait]
impl FromRequestParts<AppState> for DoctorSession {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, ApiError> {
        let claims = claims_from_header(parts, state, DOCTOR_TOKEN_HEADER, Role::Doctor)?;
        Ok(DoctorSession(subject_id(&claims)?))
    }
}

/// A verified admin session.
#[derive(Clone, Copy, Debug)]
pub struct AdminSession;

#[axum::async_trait]
impl FromRequestParts<AppState> for AdminSession {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, ApiError> {
        let claims = claims_from_header(parts, state, ADMIN_TOKEN_HEADER, Role::Admin)?;
        if claims.sub != state.admin.email().as_str() {
            return Err(AuthError::BadSignature.into());
        }
        Ok(AdminSession)
    }
}
