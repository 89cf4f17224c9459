//! Patient-facing endpoints under `/api/user`.

use crate::error::ApiError;
use crate::extract::{ApiJson, PatientSession};
use crate::AppState;
use api_shared::dto::{
    AppointmentDto, AppointmentIdReq, AppointmentRes, AppointmentsRes, BookAppointmentReq,
    LoginReq, MessageRes, PaymentOrderDto, PaymentOrderRes, PatientDto, RegisterReq, TokenRes,
    UpdateUserProfileReq, UserProfileRes, VerifyPaymentReq,
};
use api_shared::Role;
use axum::extract::State;
use axum::response::Json;
use axum::routing::{get, post};
use axum::Router;
use docplus_core::validation::{email, iso_date, optional_text, record_id, required_text};
use docplus_core::{
    Actor, PatientProfileUpdate, PaymentConfirmation, ReservationRequest, SlotDate, SlotTime,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/get-profile", get(get_profile))
        .route("/update-profile", post(update_profile))
        .route("/book-appointment", post(book_appointment))
        .route("/appointments", get(list_appointments))
        .route("/cancel-appointment", post(cancel_appointment))
        .route("/payment-razorpay", post(payment_razorpay))
        .route("/verifyRazorpay", post(verify_razorpay))
}

#[utoipa::path(
    post,
    path = "/api/user/register",
    request_body = RegisterReq,
    responses(
        (status = 200, description = "Patient registered", body = TokenRes),
        (status = 400, description = "Invalid input", body = MessageRes),
        (status = 409, description = "Email already registered", body = MessageRes)
    )
)]
/// Register a patient account and return a patient session token.
#[axum::debug_handler]
pub(crate) async fn register(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<RegisterReq>,
) -> Result<Json<TokenRes>, ApiError> {
    let name = required_text("name", &req.name)?;
    let email = email("email", &req.email)?;

    let patient = state.patients.register(name, email, &req.password)?;
    let token = state.tokens.issue(Role::Patient, &patient.id.to_string())?;

    Ok(Json(TokenRes {
        success: true,
        token,
    }))
}

#[utoipa::path(
    post,
    path = "/api/user/login",
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
    let patient = state.patients.login(&email, &req.password)?;
    let token = state.tokens.issue(Role::Patient, &patient.id.to_string())?;

    Ok(Json(TokenRes {
        success: true,
        token,
    }))
}

#[utoipa::path(
    get,
    path = "/api/user/get-profile",
    params(("token" = String, Header, description = "Patient session token")),
    responses(
        (status = 200, description = "Patient profile", body = UserProfileRes),
        (status = 401, description = "Missing or invalid session", body = MessageRes)
    )
)]
#[axum::debug_handler]
pub(crate) async fn get_profile(
    State(state): State<AppState>,
    PatientSession(patient_id): PatientSession,
) -> Result<Json<UserProfileRes>, ApiError> {
    let patient = state.patients.profile(&patient_id)?;
    Ok(Json(UserProfileRes {
        success: true,
        user_data: PatientDto::from(&patient),
    }))
}

#[utoipa::path(
    post,
    path = "/api/user/update-profile",
    params(("token" = String, Header, description = "Patient session token")),
    request_body = UpdateUserProfileReq,
    responses(
        (status = 200, description = "Profile updated", body = UserProfileRes),
        (status = 400, description = "Missing or invalid field", body = MessageRes)
    )
)]
/// Replace the patient's profile. Name, phone, date of birth and gender are required.
#[axum::debug_handler]
pub(crate) async fn update_profile(
    State(state): State<AppState>,
    PatientSession(patient_id): PatientSession,
    ApiJson(req): ApiJson<UpdateUserProfileReq>,
) -> Result<Json<UserProfileRes>, ApiError> {
    let update = PatientProfileUpdate {
        name: required_text("name", &req.name)?,
        phone: required_text("phone", &req.phone)?,
        address: req.address.into(),
        dob: iso_date("dob", &req.dob)?,
        gender: required_text("gender", &req.gender)?,
        image: optional_text(req.image),
    };

    let patient = state.patients.update_profile(&patient_id, update)?;
    Ok(Json(UserProfileRes {
        success: true,
        user_data: PatientDto::from(&patient),
    }))
}

#[utoipa::path(
    post,
    path = "/api/user/book-appointment",
    params(("token" = String, Header, description = "Patient session token")),
    request_body = BookAppointmentReq,
    responses(
        (status = 200, description = "Appointment booked", body = AppointmentRes),
        (status = 400, description = "Invalid date or time", body = MessageRes),
        (status = 404, description = "Doctor not found", body = MessageRes),
        (status = 409, description = "Doctor unavailable or slot already booked", body = MessageRes)
    )
)]
/// Reserve a slot with a doctor. The appointment starts `pending` at the doctor's current fee.
#[axum::debug_handler]
pub(crate) async fn book_appointment(
    State(state): State<AppState>,
    PatientSession(patient_id): PatientSession,
    ApiJson(req): ApiJson<BookAppointmentReq>,
) -> Result<Json<AppointmentRes>, ApiError> {
    let request = ReservationRequest {
        doctor_id: record_id("docId", &req.doc_id)?,
        patient_id,
        slot_date: SlotDate::parse(&req.slot_date)?,
        slot_time: SlotTime::parse(&req.slot_time)?,
    };

    let appointment = state.reservations.reserve(request)?;
    Ok(Json(AppointmentRes {
        success: true,
        message: "Appointment booked".into(),
        appointment: AppointmentDto::from(&appointment),
    }))
}

#[utoipa::path(
    get,
    path = "/api/user/appointments",
    params(("token" = String, Header, description = "Patient session token")),
    responses(
        (status = 200, description = "The patient's appointments, newest first", body = AppointmentsRes)
    )
)]
#[axum::debug_handler]
pub(crate) async fn list_appointments(
    State(state): State<AppState>,
    PatientSession(patient_id): PatientSession,
) -> Result<Json<AppointmentsRes>, ApiError> {
    let appointments = state.appointments.for_patient(&patient_id);
    Ok(Json(AppointmentsRes {
        success: true,
        appointments: appointments.iter().map(AppointmentDto::from).collect(),
    }))
}

#[utoipa::path(
    post,
    path = "/api/user/cancel-appointment",
    params(("token" = String, Header, description = "Patient session token")),
    request_body = AppointmentIdReq,
    responses(
        (status = 200, description = "Appointment cancelled", body = AppointmentRes),
        (status = 403, description = "Not the patient's appointment", body = MessageRes),
        (status = 409, description = "Appointment already completed", body = MessageRes)
    )
)]
#[axum::debug_handler]
pub(crate) async fn cancel_appointment(
    State(state): State<AppState>,
    PatientSession(patient_id): PatientSession,
    ApiJson(req): ApiJson<AppointmentIdReq>,
) -> Result<Json<AppointmentRes>, ApiError> {
    let appointment_id = record_id("appointmentId", &req.appointment_id)?;
    let appointment = state
        .lifecycle
        .cancel(Actor::Patient(patient_id), &appointment_id)?;

    Ok(Json(AppointmentRes {
        success: true,
        message: "Appointment cancelled".into(),
        appointment: AppointmentDto::from(&appointment),
    }))
}

#[utoipa::path(
    post,
    path = "/api/user/payment-razorpay",
    params(("token" = String, Header, description = "Patient session token")),
    request_body = AppointmentIdReq,
    responses(
        (status = 200, description = "Payment order created", body = PaymentOrderRes),
        (status = 409, description = "Appointment is not pending", body = MessageRes),
        (status = 502, description = "Payment gateway failure", body = MessageRes)
    )
)]
/// Open a gateway order for a pending appointment.
#[axum::debug_handler]
pub(crate) async fn payment_razorpay(
    State(state): State<AppState>,
    PatientSession(patient_id): PatientSession,
    ApiJson(req): ApiJson<AppointmentIdReq>,
) -> Result<Json<PaymentOrderRes>, ApiError> {
    let appointment_id = record_id("appointmentId", &req.appointment_id)?;
    let order = state
        .lifecycle
        .initiate_payment(Actor::Patient(patient_id), &appointment_id)
        .await?;

    Ok(Json(PaymentOrderRes {
        success: true,
        order: PaymentOrderDto::from(order),
    }))
}

#[utoipa::path(
    post,
    path = "/api/user/verifyRazorpay",
    params(("token" = String, Header, description = "Patient session token")),
    request_body = VerifyPaymentReq,
    responses(
        (status = 200, description = "Payment verified, appointment paid", body = AppointmentRes),
        (status = 400, description = "Signature or order mismatch", body = MessageRes)
    )
)]
/// Verify a checkout callback and mark the appointment paid.
#[axum::debug_handler]
pub(crate) async fn verify_razorpay(
    State(state): State<AppState>,
    PatientSession(patient_id): PatientSession,
    ApiJson(req): ApiJson<VerifyPaymentReq>,
) -> Result<Json<AppointmentRes>, ApiError> {
    let actor = Actor::Patient(patient_id);
    let confirmation = PaymentConfirmation {
        order_id: req.razorpay_order_id,
        payment_id: req.razorpay_payment_id,
        signature: req.razorpay_signature,
    };

    let appointment = match optional_text(req.appointment_id) {
        Some(id) => {
            let appointment_id = record_id("appointmentId", &id)?;
            state
                .lifecycle
                .confirm_payment(actor, &appointment_id, confirmation)
                .await?
        }
        None => state.lifecycle.confirm_order_payment(actor, confirmation).await?,
    };

    Ok(Json(AppointmentRes {
        success: true,
        message: "Payment successful".into(),
        appointment: AppointmentDto::from(&appointment),
    }))
}
