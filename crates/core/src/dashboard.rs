//! Aggregate views for the doctor and admin dashboards.

use crate::appointment::Appointment;
use crate::constants::LATEST_APPOINTMENTS_LIMIT;
use crate::doctor::Doctor;
use crate::error::BookingResult;
use crate::patient::Patient;
use crate::repositories::appointments::newest_first;
use crate::store::DocumentStore;
use docplus_uuid::RecordId;
use std::collections::HashSet;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DoctorDashboard {
    /// Sum of amounts of paid and completed appointments, in major units.
    pub earnings: u64,
    pub appointments: usize,
    pub patients: usize,
    pub latest_appointments: Vec<Appointment>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AdminDashboard {
    pub doctors: usize,
    pub appointments: usize,
    pub patients: usize,
    pub latest_appointments: Vec<Appointment>,
}

#[derive(Clone, Debug)]
pub struct DashboardService {
    store: DocumentStore,
}

impl DashboardService {
    pub fn new(store: DocumentStore) -> Self {
        Self { store }
    }

    pub fn doctor(&self, doctor_id: &RecordId) -> BookingResult<DoctorDashboard> {
        // Unknown doctors are an error rather than an empty dashboard.
        self.store.load::<Doctor>(doctor_id)?;

        let mut appointments: Vec<Appointment> = self
            .store
            .list::<Appointment>()
            .into_iter()
            .filter(|a| a.doctor_id == *doctor_id)
            .collect();
        newest_first(&mut appointments);

        let earnings = appointments
            .iter()
            .filter(|a| a.status().is_paid())
            .map(|a| a.amount)
            .sum();
        let patients = appointments
            .iter()
            .map(|a| a.patient_id)
            .collect::<HashSet<_>>()
            .len();

        Ok(DoctorDashboard {
            earnings,
            appointments: appointments.len(),
            patients,
            latest_appointments: latest(appointments),
        })
    }

    pub fn admin(&self) -> AdminDashboard {
        let mut appointments = self.store.list::<Appointment>();
        newest_first(&mut appointments);

        AdminDashboard {
            doctors: self.store.list::<Doctor>().len(),
            appointments: appointments.len(),
            patients: self.store.list::<Patient>().len(),
            latest_appointments: latest(appointments),
        }
    }
}

fn latest(mut appointments: Vec<Appointment>) -> Vec<Appointment> {
    appointments.truncate(LATEST_APPOINTMENTS_LIMIT);
    appointments
}
