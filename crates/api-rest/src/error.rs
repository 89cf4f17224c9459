//! Mapping of domain and auth failures onto HTTP responses.
//!
//! Every failure is rendered as `{"success": false, "message": ...}`. Storage and other
//! server-side failures are logged and reported with a generic message.

use api_shared::dto::MessageRes;
use api_shared::AuthError;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use docplus_core::BookingError;

#[derive(Debug)]
pub enum ApiError {
    Booking(BookingError),
    Auth(AuthError),
    BadRequest(String),
}

impl From<BookingError> for ApiError {
    fn from(err: BookingError) -> Self {
        ApiError::Booking(err)
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        ApiError::Auth(err)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Auth(AuthError::Misconfigured(_)) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Auth(_) => StatusCode::UNAUTHORIZED,
            ApiError::Booking(err) => match err {
                BookingError::NotFound(_) => StatusCode::NOT_FOUND,
                BookingError::Unavailable
                | BookingError::SlotTaken { .. }
                | BookingError::InvalidTransition { .. }
                | BookingError::PaymentRequired
                | BookingError::EmailTaken => StatusCode::CONFLICT,
                BookingError::InvalidInput(_)
                | BookingError::PaymentVerificationFailed
                | BookingError::Uuid(_)
                | BookingError::Text(_) => StatusCode::BAD_REQUEST,
                BookingError::Unauthorized(_) => StatusCode::FORBIDDEN,
                BookingError::InvalidCredentials => StatusCode::UNAUTHORIZED,
                BookingError::PaymentGateway(_) => StatusCode::BAD_GATEWAY,
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            },
        }
    }

    fn message(&self) -> String {
        match self {
            ApiError::BadRequest(msg) => msg.clone(),
            ApiError::Auth(AuthError::Misconfigured(_)) => "Internal error".into(),
            ApiError::Auth(err) => err.to_string(),
            ApiError::Booking(BookingError::PaymentGateway(_)) => {
                "Payment gateway is unavailable, try again later".into()
            }
            ApiError::Booking(err) if err.is_client_error() => err.to_string(),
            ApiError::Booking(_) => "Internal error".into(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!("request failed: {:?}", self);
        } else {
            tracing::debug!("request rejected ({}): {:?}", status, self);
        }

        (status, Json(MessageRes::error(self.message()))).into_response()
    }
}
