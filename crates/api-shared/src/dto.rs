//! Request and response bodies for the REST API.
//!
//! Field names are camelCase and records carry their id as `_id`, which is what existing web
//! and mobile clients read. Every response has a `success` flag; failures are a
//! [`MessageRes`] with `success: false`.

use docplus_core::{Address, Appointment, Doctor, Patient, PaymentOrder};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use utoipa::ToSchema;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct MessageRes {
    pub success: bool,
    pub message: String,
}

impl MessageRes {
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct TokenRes {
    pub success: bool,
    pub token: String,
}

// ============================================================================
// ACCOUNTS
// ============================================================================

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct RegisterReq {
    pub name: String,
    pub email: String,
    pub password: String,
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct LoginReq {
    pub email: String,
    pub password: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct AddressDto {
    #[serde(default)]
    pub line1: String,
    #[serde(default)]
    pub line2: String,
}

impl From<&Address> for AddressDto {
    fn from(address: &Address) -> Self {
        Self {
            line1: address.line1.clone(),
            line2: address.line2.clone(),
        }
    }
}

impl From<AddressDto> for Address {
    fn from(dto: AddressDto) -> Self {
        Address {
            line1: dto.line1.trim().to_string(),
            line2: dto.line2.trim().to_string(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PatientDto {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
    pub email: String,
    pub image: Option<String>,
    pub phone: Option<String>,
    pub address: AddressDto,
    pub gender: Option<String>,
    /// `YYYY-MM-DD`
    pub dob: Option<String>,
}

impl From<&Patient> for PatientDto {
    fn from(patient: &Patient) -> Self {
        Self {
            id: patient.id.to_string(),
            name: patient.name.to_string(),
            email: patient.email.to_string(),
            image: patient.image.clone(),
            phone: patient.phone.clone(),
            address: AddressDto::from(&patient.address),
            gender: patient.gender.clone(),
            dob: patient.dob.map(|d| d.format("%Y-%m-%d").to_string()),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserProfileRes {
    pub success: bool,
    pub user_data: PatientDto,
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUserProfileReq {
    pub name: String,
    pub phone: String,
    #[serde(default)]
    pub address: AddressDto,
    pub dob: String,
    pub gender: String,
    #[serde(default)]
    pub image: Option<String>,
}

// ============================================================================
// DOCTORS
// ============================================================================

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DoctorDto {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    pub image: Option<String>,
    pub speciality: String,
    pub degree: String,
    pub experience: String,
    pub about: String,
    pub available: bool,
    pub fees: u64,
    pub address: AddressDto,
    /// Creation time, milliseconds since the Unix epoch.
    pub date: i64,
    /// Booked time labels keyed by `YYYY-MM-DD`.
    #[serde(rename = "slots_booked")]
    pub slots_booked: BTreeMap<String, Vec<String>>,
}

impl DoctorDto {
    /// Listing view without contact details.
    pub fn public(doctor: &Doctor) -> Self {
        let mut dto = Self::full(doctor);
        dto.email = None;
        dto
    }

    pub fn full(doctor: &Doctor) -> Self {
        let slots_booked = doctor
            .booked_slots()
            .iter()
            .map(|(date, times)| {
                (
                    date.to_string(),
                    times.iter().map(ToString::to_string).collect(),
                )
            })
            .collect();

        Self {
            id: doctor.id.to_string(),
            name: doctor.name.to_string(),
            email: Some(doctor.email.to_string()),
            image: doctor.image.clone(),
            speciality: doctor.speciality.to_string(),
            degree: doctor.degree.to_string(),
            experience: doctor.experience.to_string(),
            about: doctor.about.to_string(),
            available: doctor.available,
            fees: doctor.fees.amount(),
            address: AddressDto::from(&doctor.address),
            date: doctor.created_at.timestamp_millis(),
            slots_booked,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct DoctorListRes {
    pub success: bool,
    pub doctors: Vec<DoctorDto>,
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DoctorProfileRes {
    pub success: bool,
    pub profile_data: DoctorDto,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateDoctorProfileReq {
    #[serde(default)]
    pub fees: Option<u64>,
    #[serde(default)]
    pub address: Option<AddressDto>,
    #[serde(default)]
    pub available: Option<bool>,
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AddDoctorReq {
    pub name: String,
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub image: Option<String>,
    pub speciality: String,
    pub degree: String,
    pub experience: String,
    pub about: String,
    pub fees: u64,
    #[serde(default)]
    pub address: AddressDto,
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct DoctorRes {
    pub success: bool,
    pub message: String,
    pub doctor: DoctorDto,
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DocIdReq {
    pub doc_id: String,
}

// ============================================================================
// APPOINTMENTS
// ============================================================================

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct PartySummary {
    pub name: String,
}

/// An appointment as clients see it.
///
/// `status` is authoritative. `cancelled`, `payment` and `isCompleted` are derived from it for
/// older clients.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AppointmentDto {
    #[serde(rename = "_id")]
    pub id: String,
    pub user_id: String,
    pub doc_id: String,
    pub slot_date: String,
    pub slot_time: String,
    pub amount: u64,
    /// Booking time, milliseconds since the Unix epoch.
    pub date: i64,
    pub status: String,
    pub cancelled: bool,
    pub payment: bool,
    pub is_completed: bool,
    pub user_data: PartySummary,
    pub doc_data: PartySummary,
}

impl From<&Appointment> for AppointmentDto {
    fn from(appointment: &Appointment) -> Self {
        use docplus_core::AppointmentStatus;

        let status = appointment.status();
        Self {
            id: appointment.id.to_string(),
            user_id: appointment.patient_id.to_string(),
            doc_id: appointment.doctor_id.to_string(),
            slot_date: appointment.slot_date.to_string(),
            slot_time: appointment.slot_time.to_string(),
            amount: appointment.amount,
            date: appointment.created_at.timestamp_millis(),
            status: status.to_string(),
            cancelled: status == AppointmentStatus::Cancelled,
            payment: status.is_paid(),
            is_completed: status == AppointmentStatus::Completed,
            user_data: PartySummary {
                name: appointment.patient_name.clone(),
            },
            doc_data: PartySummary {
                name: appointment.doctor_name.clone(),
            },
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BookAppointmentReq {
    pub doc_id: String,
    pub slot_date: String,
    pub slot_time: String,
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AppointmentIdReq {
    pub appointment_id: String,
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct AppointmentRes {
    pub success: bool,
    pub message: String,
    pub appointment: AppointmentDto,
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct AppointmentsRes {
    pub success: bool,
    pub appointments: Vec<AppointmentDto>,
}

// ============================================================================
// PAYMENT
// ============================================================================

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct PaymentOrderDto {
    pub id: String,
    /// Minor currency units.
    pub amount: u64,
    pub currency: String,
    pub receipt: String,
}

impl From<PaymentOrder> for PaymentOrderDto {
    fn from(order: PaymentOrder) -> Self {
        Self {
            id: order.id,
            amount: order.amount,
            currency: order.currency,
            receipt: order.receipt,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct PaymentOrderRes {
    pub success: bool,
    pub order: PaymentOrderDto,
}

/// Checkout callback. Field names follow the gateway's checkout response.
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct VerifyPaymentReq {
    /// When absent the appointment is taken from the order receipt.
    #[serde(rename = "appointmentId", default)]
    pub appointment_id: Option<String>,
    pub razorpay_order_id: String,
    pub razorpay_payment_id: String,
    pub razorpay_signature: String,
}

// ============================================================================
// DASHBOARDS
// ============================================================================

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DoctorDashboardDto {
    pub earnings: u64,
    pub appointments: usize,
    pub patients: usize,
    pub latest_appointments: Vec<AppointmentDto>,
}

impl From<&docplus_core::DoctorDashboard> for DoctorDashboardDto {
    fn from(dash: &docplus_core::DoctorDashboard) -> Self {
        Self {
            earnings: dash.earnings,
            appointments: dash.appointments,
            patients: dash.patients,
            latest_appointments: dash
                .latest_appointments
                .iter()
                .map(AppointmentDto::from)
                .collect(),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DoctorDashboardRes {
    pub success: bool,
    pub dash_data: DoctorDashboardDto,
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AdminDashboardDto {
    pub doctors: usize,
    pub appointments: usize,
    pub patients: usize,
    pub latest_appointments: Vec<AppointmentDto>,
}

impl From<&docplus_core::AdminDashboard> for AdminDashboardDto {
    fn from(dash: &docplus_core::AdminDashboard) -> Self {
        Self {
            doctors: dash.doctors,
            appointments: dash.appointments,
            patients: dash.patients,
            latest_appointments: dash
                .latest_appointments
                .iter()
                .map(AppointmentDto::from)
                .collect(),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AdminDashboardRes {
    pub success: bool,
    pub dash_data: AdminDashboardDto,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verify_request_uses_gateway_field_names() {
        let req: VerifyPaymentReq = serde_json::from_value(serde_json::json!({
            "razorpay_order_id": "order_1",
            "razorpay_payment_id": "pay_1",
            "razorpay_signature": "ab"
        }))
        .unwrap();

        assert_eq!(req.appointment_id, None);
        assert_eq!(req.razorpay_order_id, "order_1");
    }

    #[test]
    fn test_book_request_is_camel_case() {
        let req: BookAppointmentReq = serde_json::from_str(
            r#"{"docId":"d","slotDate":"2024-01-10","slotTime":"10:00 AM"}"#,
        )
        .unwrap();
        assert_eq!(req.doc_id, "d");
        assert_eq!(req.slot_time, "10:00 AM");
    }

    #[test]
    fn test_message_res_shape() {
        let json = serde_json::to_value(MessageRes::error("slot not available")).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"success": false, "message": "slot not available"})
        );
    }
}
