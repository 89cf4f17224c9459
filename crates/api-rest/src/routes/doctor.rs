//! Doctor endpoints under `/api/doctor`. The listing and login are public.

use crate::error::ApiError;
use crate::extract::{ApiJson, DoctorSession};
use crate::AppState;
use api_shared::dto::{
    AppointmentDto, AppointmentIdReq, AppointmentRes, AppointmentsRes, DoctorDashboardDto,
    DoctorDashboardRes, DoctorDto, DoctorListRes, DoctorProfileRes, LoginReq, MessageRes,
    TokenRes, UpdateDoctorProfileReq,
};
use api_shared::Role;
use axum::extract::{Query, State};
use axum::response::Json;
use axum::routing::{get, post};
use axum::Router;
use docplus_core::validation::{email, record_id};
use docplus_core::{Actor, DoctorProfilePatch, Fees};
use serde::Deserialize;
use utoipa::IntoParams;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/list", get(list_doctors))
        .route("/login", post(login))
        .route("/appointments", get(list_appointments))
        .route("/complete-appointment", post(complete_appointment))
        .route("/cancel-appointment", post(cancel_appointment))
        .route("/dashboard", get(dashboard))
        .route("/profile", get(profile))
        .route("/update-profile", post(update_profile))
}

#[derive(Debug, Default, Deserialize, IntoParams)]
pub(crate) struct DoctorListQuery {
    /// Only doctors with this speciality (case-insensitive).
    speciality: Option<String>,
}

#[utoipa::path(
    get,
    path = "/api/doctor/list",
    params(DoctorListQuery),
    responses(
        (status = 200, description = "Public doctor listing", body = DoctorListRes)
    )
)]
#[axum::debug_handler]
pub(crate) async fn list_doctors(
    State(state): State<AppState>,
    Query(query): Query<DoctorListQuery>,
) -> Result<Json<DoctorListRes>, ApiError> {
    let doctors = state.doctors.list(query.speciality.as_deref());
    Ok(Json(DoctorListRes {
        success: true,
        doctors: doctors.iter().map(DoctorDto::public).collect(),
    }))
}

#[utoipa::path(
    post,
    path = "/api/doctor/login",
    request_body = LoginReq,
    responses(
        (status = 200, description = "Logged in", body = TokenRes),
        (status = 401, description = "Invalid credentials", body = MessageRes)
    )
)]
#[axum::debug_handler]
pub(crate) async fn login(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<LoginReq>,
) -> Result<Json<TokenRes>, ApiError> {
    let email = email("email", &req.email)?;
    let doctor = state.doctors.login(&email, &req.password)?;
    let token = state.tokens.issue(Role::Doctor, &doctor.id.to_string())?;

    Ok(Json(TokenRes {
        success: true,
        token,
    }))
}

#[utoipa::path(
    get,
    path = "/api/doctor/appointments",
    params(("dtoken" = String, Header, description = "Doctor session token")),
    responses(
        (status = 200, description = "The doctor's appointments, newest first", body = AppointmentsRes)
    )
)]
#[axum::debug_handler]
pub(crate) async fn list_appointments(
    State(state): State<AppState>,
    DoctorSession(doctor_id): DoctorSession,
) -> Result<Json<AppointmentsRes>, ApiError> {
    let appointments = state.appointments.for_doctor(&doctor_id);
    Ok(Json(AppointmentsRes {
        success: true,
        appointments: appointments.iter().map(AppointmentDto::from).collect(),
    }))
}

#[utoipa::path(
    post,
    path = "/api/doctor/complete-appointment",
    params(("dtoken" = String, Header, description = "Doctor session token")),
    request_body = AppointmentIdReq,
    responses(
        (status = 200, description = "Appointment completed", body = AppointmentRes),
        (status = 403, description = "Not this doctor's appointment", body = MessageRes),
        (status = 409, description = "Appointment not paid, or cancelled", body = MessageRes)
    )
)]
#[axum::debug_handler]
pub(crate) async fn complete_appointment(
    State(state): State<AppState>,
    DoctorSession(doctor_id): DoctorSession,
    ApiJson(req): ApiJson<AppointmentIdReq>,
) -> Result<Json<AppointmentRes>, ApiError> {
    let appointment_id = record_id("appointmentId", &req.appointment_id)?;
    let appointment = state
        .lifecycle
        .complete(Actor::Doctor(doctor_id), &appointment_id)?;

    Ok(Json(AppointmentRes {
        success: true,
        message: "Appointment completed".into(),
        appointment: AppointmentDto::from(&appointment),
    }))
}

#[utoipa::path(
    post,
    path = "/api/doctor/cancel-appointment",
    params(("dtoken" = String, Header, description = "Doctor session token")),
    request_body = AppointmentIdReq,
    responses(
        (status = 200, description = "Appointment cancelled", body = AppointmentRes),
        (status = 403, description = "Not this doctor's appointment", body = MessageRes)
    )
)]
#[axum::debug_handler]
pub(crate) async fn cancel_appointment(
    State(state): State<AppState>,
    DoctorSession(doctor_id): DoctorSession,
    ApiJson(req): ApiJson<AppointmentIdReq>,
) -> Result<Json<AppointmentRes>, ApiError> {
    let appointment_id = record_id("appointmentId", &req.appointment_id)?;
    let appointment = state
        .lifecycle
        .cancel(Actor::Doctor(doctor_id), &appointment_id)?;

    Ok(Json(AppointmentRes {
        success: true,
        message: "Appointment cancelled".into(),
        appointment: AppointmentDto::from(&appointment),
    }))
}

#[utoipa::path(
    get,
    path = "/api/doctor/dashboard",
    params(("dtoken" = String, Header, description = "Doctor session token")),
    responses(
        (status = 200, description = "Earnings, counts and latest appointments", body = DoctorDashboardRes)
    )
)]
#[axum::debug_handler]
pub(crate) async fn dashboard(
    State(state): State<AppState>,
    DoctorSession(doctor_id): DoctorSession,
) -> Result<Json<DoctorDashboardRes>, ApiError> {
    let dash = state.dashboards.doctor(&doctor_id)?;
    Ok(Json(DoctorDashboardRes {
        success: true,
        dash_data: DoctorDashboardDto::from(&dash),
    }))
}

#[utoipa::path(
    get,
    path = "/api/doctor/profile",
    params(("dtoken" = String, Header, description = "Doctor session token")),
    responses(
        (status = 200, description = "The doctor's own profile", body = DoctorProfileRes)
    )
)]
#[axum::debug_handler]
pub(crate) async fn profile(
    State(state): State<AppState>,
    DoctorSession(doctor_id): DoctorSession,
) -> Result<Json<DoctorProfileRes>, ApiError> {
    let doctor = state.doctors.get(&doctor_id)?;
    Ok(Json(DoctorProfileRes {
        success: true,
        profile_data: DoctorDto::full(&doctor),
    }))
}

#[utoipa::path(
    post,
    path = "/api/doctor/update-profile",
    params(("dtoken" = String, Header, description = "Doctor session token")),
    request_body = UpdateDoctorProfileReq,
    responses(
        (status = 200, description = "Profile updated", body = DoctorProfileRes),
        (status = 400, description = "Invalid fees", body = MessageRes)
    )
)]
/// Update fees, address or availability. Existing appointments keep their booked amount.
#[axum::debug_handler]
pub(crate) async fn update_profile(
    State(state): State<AppState>,
    DoctorSession(doctor_id): DoctorSession,
    ApiJson(req): ApiJson<UpdateDoctorProfileReq>,
) -> Result<Json<DoctorProfileRes>, ApiError> {
    let patch = DoctorProfilePatch {
        fees: req.fees.map(Fees::new).transpose()?,
        address: req.address.map(Into::into),
        available: req.available,
    };

    let doctor = state.doctors.update_profile(&doctor_id, patch)?;
    Ok(Json(DoctorProfileRes {
        success: true,
        profile_data: DoctorDto::full(&doctor),
    }))
}
