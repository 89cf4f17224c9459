//! Admin endpoints under `/api/admin`.

use crate::error::ApiError;
use crate::extract::{AdminSession, ApiJson};
use crate::AppState;
use api_shared::dto::{
    AddDoctorReq, AdminDashboardDto, AdminDashboardRes, AppointmentDto, AppointmentIdReq,
    AppointmentRes, AppointmentsRes, DocIdReq, DoctorDto, DoctorListRes, DoctorRes, LoginReq,
    MessageRes, TokenRes,
};
use api_shared::Role;
use axum::extract::State;
use axum::response::Json;
use axum::routing::{get, post};
use axum::Router;
use docplus_core::validation::{email, optional_text, record_id, required_text};
use docplus_core::{Actor, BookingError, DoctorProfile, Fees};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/login", post(login))
        .route("/add-doctor", post(add_doctor))
        .route("/all-doctors", get(all_doctors))
        .route("/change-availability", post(change_availability))
        .route("/appointments", get(list_appointments))
        .route("/cancel-appointment", post(cancel_appointment))
        .route("/complete-appointment", post(complete_appointment))
        .route("/dashboard", get(dashboard))
}

#[utoipa::path(
    post,
    path = "/api/admin/login",
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
    if !state.admin.matches(&req.email, &req.password) {
        return Err(BookingError::InvalidCredentials.into());
    }

    let token = state
        .tokens
        .issue(Role::Admin, state.admin.email().as_str())?;
    Ok(Json(TokenRes {
        success: true,
        token,
    }))
}

#[utoipa::path(
    post,
    path = "/api/admin/add-doctor",
    params(("atoken" = String, Header, description = "Admin session token")),
    request_body = AddDoctorReq,
    responses(
        (status = 200, description = "Doctor added", body = DoctorRes),
        (status = 400, description = "Missing or invalid field", body = MessageRes),
        (status = 409, description = "Email already registered", body = MessageRes)
    )
)]
/// Add a doctor. All profile fields are required; fees must be positive.
#[axum::debug_handler]
pub(crate) async fn add_doctor(
    State(state): State<AppState>,
    _admin: AdminSession,
    ApiJson(req): ApiJson<AddDoctorReq>,
) -> Result<Json<DoctorRes>, ApiError> {
    let profile = DoctorProfile {
        name: required_text("name", &req.name)?,
        speciality: required_text("speciality", &req.speciality)?,
        degree: required_text("degree", &req.degree)?,
        experience: required_text("experience", &req.experience)?,
        about: required_text("about", &req.about)?,
        fees: Fees::new(req.fees)?,
        address: req.address.into(),
        image: optional_text(req.image),
    };
    let email = email("email", &req.email)?;

    let doctor = state.doctors.add(profile, email, &req.password)?;
    Ok(Json(DoctorRes {
        success: true,
        message: "Doctor added".into(),
        doctor: DoctorDto::full(&doctor),
    }))
}

#[utoipa::path(
    get,
    path = "/api/admin/all-doctors",
    params(("atoken" = String, Header, description = "Admin session token")),
    responses(
        (status = 200, description = "Every doctor, oldest first", body = DoctorListRes)
    )
)]
#[axum::debug_handler]
pub(crate) async fn all_doctors(
    State(state): State<AppState>,
    _admin: AdminSession,
) -> Result<Json<DoctorListRes>, ApiError> {
    let doctors = state.doctors.all();
    Ok(Json(DoctorListRes {
        success: true,
        doctors: doctors.iter().map(DoctorDto::full).collect(),
    }))
}

#[utoipa::path(
    post,
    path = "/api/admin/change-availability",
    params(("atoken" = String, Header, description = "Admin session token")),
    request_body = DocIdReq,
    responses(
        (status = 200, description = "Availability toggled", body = DoctorRes),
        (status = 404, description = "Doctor not found", body = MessageRes)
    )
)]
#[axum::debug_handler]
pub(crate) async fn change_availability(
    State(state): State<AppState>,
    _admin: AdminSession,
    ApiJson(req): ApiJson<DocIdReq>,
) -> Result<Json<DoctorRes>, ApiError> {
    let doctor_id = record_id("docId", &req.doc_id)?;
    let doctor = state.doctors.change_availability(&doctor_id)?;

    Ok(Json(DoctorRes {
        success: true,
        message: "Availability changed".into(),
        doctor: DoctorDto::full(&doctor),
    }))
}

#[utoipa::path(
    get,
    path = "/api/admin/appointments",
    params(("atoken" = String, Header, description = "Admin session token")),
    responses(
        (status = 200, description = "All appointments, newest first", body = AppointmentsRes)
    )
)]
#[axum::debug_handler]
pub(crate) async fn list_appointments(
    State(state): State<AppState>,
    _admin: AdminSession,
) -> Result<Json<AppointmentsRes>, ApiError> {
    let appointments = state.appointments.all();
    Ok(Json(AppointmentsRes {
        success: true,
        appointments: appointments.iter().map(AppointmentDto::from).collect(),
    }))
}

#[utoipa::path(
    post,
    path = "/api/admin/cancel-appointment",
    params(("atoken" = String, Header, description = "Admin session token")),
    request_body = AppointmentIdReq,
    responses(
        (status = 200, description = "Appointment cancelled", body = AppointmentRes),
        (status = 409, description = "Appointment already completed", body = MessageRes)
    )
)]
#[axum::debug_handler]
pub(crate) async fn cancel_appointment(
    State(state): State<AppState>,
    _admin: AdminSession,
    ApiJson(req): ApiJson<AppointmentIdReq>,
) -> Result<Json<AppointmentRes>, ApiError> {
    let appointment_id = record_id("appointmentId", &req.appointment_id)?;
    let appointment = state.lifecycle.cancel(Actor::Admin, &appointment_id)?;

    Ok(Json(AppointmentRes {
        success: true,
        message: "Appointment cancelled".into(),
        appointment: AppointmentDto::from(&appointment),
    }))
}

#[utoipa::path(
    post,
    path = "/api/admin/complete-appointment",
    params(("atoken" = String, Header, description = "Admin session token")),
    request_body = AppointmentIdReq,
    responses(
        (status = 200, description = "Appointment completed", body = AppointmentRes),
        (status = 409, description = "Appointment not paid, or cancelled", body = MessageRes)
    )
)]
#[axum::debug_handler]
pub(crate) async fn complete_appointment(
    State(state): State<AppState>,
    _admin: AdminSession,
    ApiJson(req): ApiJson<AppointmentIdReq>,
) -> Result<Json<AppointmentRes>, ApiError> {
    let appointment_id = record_id("appointmentId", &req.appointment_id)?;
    let appointment = state.lifecycle.complete(Actor::Admin, &appointment_id)?;

    Ok(Json(AppointmentRes {
        success: true,
        message: "Appointment completed".into(),
        appointment: AppointmentDto::from(&appointment),
    }))
}

#[utoipa::path(
    get,
    path = "/api/admin/dashboard",
    params(("atoken" = String, Header, description = "Admin session token")),
    responses(
        (status = 200, description = "Counts and latest appointments", body = AdminDashboardRes)
    )
)]
#[axum::debug_handler]
pub(crate) async fn dashboard(
    State(state): State<AppState>,
    _admin: AdminSession,
) -> Result<Json<AdminDashboardRes>, ApiError> {
    let dash = state.dashboards.admin();
    Ok(Json(AdminDashboardRes {
        success: true,
        dash_data: AdminDashboardDto::from(&dash),
    }))
}

