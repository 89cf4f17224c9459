//! # API REST
//!
//! REST API for DocPlus.
//!
//! Handles:
//! - HTTP endpoints with axum under `/api/user`, `/api/doctor` and `/api/admin`
//! - Role-scoped session headers (`token`, `dtoken`, `atoken`)
//! - OpenAPI/Swagger documentation
//! - REST-specific concerns (JSON bodies, status codes, CORS)
//!
//! Uses `api-shared` for request/response bodies and tokens, and `docplus-core` for every
//! booking operation.

#![warn(rust_2018_idioms)]

pub mod config;
pub mod error;
pub mod extract;
pub mod routes;

use api_shared::dto::{
    AddDoctorReq, AddressDto, AdminDashboardDto, AdminDashboardRes, AppointmentDto,
    AppointmentIdReq, AppointmentRes, AppointmentsRes, BookAppointmentReq, DocIdReq,
    DoctorDashboardDto, DoctorDashboardRes, DoctorDto, DoctorListRes, DoctorProfileRes,
    DoctorRes, LoginReq, MessageRes, PartySummary, PatientDto, PaymentOrderDto, PaymentOrderRes,
    RegisterReq, TokenRes, UpdateDoctorProfileReq, UpdateUserProfileReq, UserProfileRes,
    VerifyPaymentReq,
};
use api_shared::{AdminCredentials, HealthRes, HealthService, TokenService};
use axum::extract::State;
use axum::response::Json;
use axum::routing::get;
use axum::Router;
use docplus_core::{
    AppointmentQueries, DashboardService, DocumentStore, DoctorService, LifecycleService,
    PatientService, PaymentGateway, ReservationService,
};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

/// Application state shared across REST handlers.
///
/// Every service shares one [`DocumentStore`], and so one write lock.
#[derive(Clone)]
pub struct AppState {
    pub tokens: Arc<TokenService>,
    pub admin: Arc<AdminCredentials>,
    pub doctors: DoctorService,
    pub patients: PatientService,
    pub appointments: AppointmentQueries,
    pub reservations: ReservationService,
    pub lifecycle: LifecycleService,
    pub dashboards: DashboardService,
}

impl AppState {
    pub fn new(
        store: DocumentStore,
        gateway: Arc<dyn PaymentGateway>,
        tokens: TokenService,
        admin: AdminCredentials,
    ) -> Self {
        Self {
            tokens: Arc::new(tokens),
            admin: Arc::new(admin),
            doctors: DoctorService::new(store.clone()),
            patients: PatientService::new(store.clone()),
            appointments: AppointmentQueries::new(store.clone()),
            reservations: ReservationService::new(store.clone()),
            lifecycle: LifecycleService::new(store.clone(), gateway),
            dashboards: DashboardService::new(store),
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health,
        routes::user::register,
        routes::user::login,
        routes::user::get_profile,
        routes::user::update_profile,
        routes::user::book_appointment,
        routes::user::list_appointments,
        routes::user::cancel_appointment,
        routes::user::payment_razorpay,
        routes::user::verify_razorpay,
        routes::doctor::list_doctors,
        routes::doctor::login,
        routes::doctor::list_appointments,
        routes::doctor::complete_appointment,
        routes::doctor::cancel_appointment,
        routes::doctor::dashboard,
        routes::doctor::profile,
        routes::doctor::update_profile,
        routes::admin::login,
        routes::admin::add_doctor,
        routes::admin::all_doctors,
        routes::admin::change_availability,
        routes::admin::list_appointments,
        routes::admin::cancel_appointment,
        routes::admin::complete_appointment,
        routes::admin::dashboard,
    ),
    components(schemas(
        HealthRes,
        MessageRes,
        TokenRes,
        RegisterReq,
        LoginReq,
        AddressDto,
        PatientDto,
        UserProfileRes,
        UpdateUserProfileReq,
        DoctorDto,
        DoctorListRes,
        DoctorProfileRes,
        UpdateDoctorProfileReq,
        AddDoctorReq,
        DoctorRes,
        DocIdReq,
        PartySummary,
        AppointmentDto,
        BookAppointmentReq,
        AppointmentIdReq,
        AppointmentRes,
        AppointmentsRes,
        PaymentOrderDto,
        PaymentOrderRes,
        VerifyPaymentReq,
        DoctorDashboardDto,
        DoctorDashboardRes,
        AdminDashboardDto,
        AdminDashboardRes,
    ))
)]
pub struct ApiDoc;

/// Builds the full router: API routes, health, Swagger UI and CORS.
pub fn app(state: AppState) -> Router {
    let api = Router::new()
        .nest("/user", routes::user::router())
        .nest("/doctor", routes::doctor::router())
        .nest("/admin", routes::admin::router());

    Router::new()
        .route("/health", get(health))
        .nest("/api", api)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Health check response", body = HealthRes)
    )
)]
/// Health check endpoint for monitoring and load balancers.
#[axum::debug_handler]
async fn health(State(_state): State<AppState>) -> Json<HealthRes> {
    Json(HealthService::check_health())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{header, Request, StatusCode};
    use docplus_core::{CoreConfig, EmailAddress, OfferedSlots, SandboxGateway};
    use http_body_util::BodyExt;
    use serde_json::{json, Value};
    use std::path::Path;
    use tempfile::TempDir;
    use tower::ServiceExt;

    const ADMIN_EMAIL: &str = "admin@docplus.example";
    const ADMIN_PASSWORD: &str = "admin-password";

    fn test_app(dir: &Path) -> (Router, Arc<SandboxGateway>) {
        let cfg = CoreConfig::new(dir.to_path_buf(), "INR".into(), OfferedSlots::default())
            .expect("config");
        let store = DocumentStore::open(Arc::new(cfg)).expect("open store");
        let gateway = Arc::new(SandboxGateway::new("sandbox-secret"));
        let tokens = TokenService::new("test-token-secret", 24).expect("tokens");
        let admin = AdminCredentials::new(
            EmailAddress::parse(ADMIN_EMAIL).expect("email"),
            ADMIN_PASSWORD.into(),
        )
        .expect("admin");

        let state = AppState::new(store, gateway.clone(), tokens, admin);
        (app(state), gateway)
    }

    async fn send(
        app: &Router,
        method: &str,
        uri: &str,
        auth: Option<(&str, &str)>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some((name, token)) = auth {
            builder = builder.header(name, token);
        }
        let body = match body {
            Some(value) => {
                builder = builder.header(header::CONTENT_TYPE, "application/json");
                Body::from(value.to_string())
            }
            None => Body::empty(),
        };

        let response = app
            .clone()
            .oneshot(builder.body(body).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, value)
    }

    fn token_of(body: &Value) -> String {
        body["token"].as_str().expect("token in response").to_string()
    }

    async fn admin_token(app: &Router) -> String {
        let (status, body) = send(
            app,
            "POST",
            "/api/admin/login",
            None,
            Some(json!({ "email": ADMIN_EMAIL, "password": ADMIN_PASSWORD })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        token_of(&body)
    }

    async fn add_doctor(app: &Router, atoken: &str) -> String {
        let (status, body) = send(
            app,
            "POST",
            "/api/admin/add-doctor",
            Some(("atoken", atoken)),
            Some(json!({
                "name": "Dr. Asha Rao",
                "email": "asha@clinic.example",
                "password": "doctor-password",
                "speciality": "Cardiologist",
                "degree": "MBBS",
                "experience": "4 Years",
                "about": "Heart health",
                "fees": 500,
                "address": { "line1": "12 Park Street", "line2": "Kolkata" }
            })),
        )
        .await;
        assert_eq!(status, StatusCode::OK, "{body}");
        body["doctor"]["_id"].as_str().unwrap().to_string()
    }

    async fn register_patient(app: &Router, email: &str) -> String {
        let (status, body) = send(
            app,
            "POST",
            "/api/user/register",
            None,
            Some(json!({ "name": "Ravi", "email": email, "password": "patient-password" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK, "{body}");
        token_of(&body)
    }

    #[tokio::test]
    async fn test_health() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let (app, _) = test_app(temp_dir.path());

        let (status, body) = send(&app, "GET", "/health", None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["ok"], true);
    }

    #[tokio::test]
    async fn test_book_pay_and_complete_over_http() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let (app, gateway) = test_app(temp_dir.path());

        let atoken = admin_token(&app).await;
        let doctor_id = add_doctor(&app, &atoken).await;
        let token = register_patient(&app, "ravi@mail.example").await;

        let (status, body) = send(&app, "GET", "/api/doctor/list", None, None).await;
        assert_eq!(status, StatusCode::OK);
        let listed = &body["doctors"][0];
        assert_eq!(listed["_id"], doctor_id.as_str());
        assert!(listed.get("email").is_none());

        let booking = json!({ "docId": doctor_id, "slotDate": "2030-01-10", "slotTime": "10:00 AM" });
        let (status, body) = send(
            &app,
            "POST",
            "/api/user/book-appointment",
            Some(("token", token.as_str())),
            Some(booking.clone()),
        )
        .await;
        assert_eq!(status, StatusCode::OK, "{body}");
        let appointment_id = body["appointment"]["_id"].as_str().unwrap().to_string();
        assert_eq!(body["appointment"]["amount"], 500);
        assert_eq!(body["appointment"]["payment"], false);

        let other = register_patient(&app, "meera@mail.example").await;
        let (status, body) = send(
            &app,
            "POST",
            "/api/user/book-appointment",
            Some(("token", other.as_str())),
            Some(booking),
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["success"], false);

        let (status, body) = send(
            &app,
            "POST",
            "/api/user/payment-razorpay",
            Some(("token", token.as_str())),
            Some(json!({ "appointmentId": appointment_id })),
        )
        .await;
        assert_eq!(status, StatusCode::OK, "{body}");
        assert_eq!(body["order"]["amount"], 50_000);
        let order_id = body["order"]["id"].as_str().unwrap().to_string();

        let (payment_id, signature) = gateway.checkout(&order_id).unwrap();
        let (status, body) = send(
            &app,
            "POST",
            "/api/user/verifyRazorpay",
            Some(("token", token.as_str())),
            Some(json!({
                "razorpay_order_id": order_id,
                "razorpay_payment_id": payment_id,
                "razorpay_signature": signature
            })),
        )
        .await;
        assert_eq!(status, StatusCode::OK, "{body}");
        assert_eq!(body["appointment"]["payment"], true);

        let (status, body) = send(
            &app,
            "POST",
            "/api/doctor/login",
            None,
            Some(json!({ "email": "asha@clinic.example", "password": "doctor-password" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let dtoken = token_of(&body);

        let (status, body) = send(
            &app,
            "POST",
            "/api/doctor/complete-appointment",
            Some(("dtoken", dtoken.as_str())),
            Some(json!({ "appointmentId": appointment_id })),
        )
        .await;
        assert_eq!(status, StatusCode::OK, "{body}");
        assert_eq!(body["appointment"]["isCompleted"], true);

        let (status, body) =
            send(&app, "GET", "/api/doctor/dashboard", Some(("dtoken", dtoken.as_str())), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["dashData"]["earnings"], 500);
        assert_eq!(body["dashData"]["patients"], 1);
    }

    #[tokio::test]
    async fn test_sessions_are_role_scoped() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let (app, _) = test_app(temp_dir.path());
        let token = register_patient(&app, "ravi@mail.example").await;

        let (status, body) = send(&app, "GET", "/api/user/appointments", None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["success"], false);

        let (status, _) = send(
            &app,
            "GET",
            "/api/admin/dashboard",
            Some(("atoken", token.as_str())),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let (status, body) = send(
            &app,
            "GET",
            "/api/user/appointments",
            Some(("token", token.as_str())),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["appointments"], json!([]));
    }

    #[tokio::test]
    async fn test_malformed_body_is_a_bad_request() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let (app, _) = test_app(temp_dir.path());

        let (status, body) = send(
            &app,
            "POST",
            "/api/user/register",
            None,
            Some(json!({ "name": "Ravi" })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["success"], false);
    }
}
