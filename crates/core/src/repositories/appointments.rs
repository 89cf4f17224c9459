//! Read-side appointment queries. All listings are newest first.

use crate::appointment::Appointment;
use crate::error::BookingResult;
use crate::store::DocumentStore;
use docplus_uuid::RecordId;

#[derive(Clone, Debug)]
pub struct AppointmentQueries {
    store: DocumentStore,
}

impl AppointmentQueries {
    pub fn new(store: DocumentStore) -> Self {
        Self { store }
    }

    pub fn get(&self, id: &RecordId) -> BookingResult<Appointment> {
        self.store.load(id)
    }

    pub fn for_patient(&self, patient_id: &RecordId) -> Vec<Appointment> {
        self.filtered(|a| a.patient_id == *patient_id)
    }

    pub fn for_doctor(&self, doctor_id: &RecordId) -> Vec<Appointment> {
        self.filtered(|a| a.doctor_id == *doctor_id)
    }

    pub fn all(&self) -> Vec<Appointment> {
        self.filtered(|_| true)
    }

    fn filtered(&self, keep: impl Fn(&Appointment) -> bool) -> Vec<Appointment> {
        let mut appointments: Vec<Appointment> = self
            .store
            .list::<Appointment>()
            .into_iter()
            .filter(|a| keep(a))
            .collect();
        newest_first(&mut appointments);
        appointments
    }
}

pub(crate) fn newest_first(appointments: &mut [Appointment]) {
    appointments.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::appointment::NewAppointment;
    use crate::slot::{SlotDate, SlotTime};
    use crate::store::test_support::test_store;
    use chrono::Duration;
    use tempfile::TempDir;

    fn appointment(doctor: RecordId, patient: RecordId, minutes_ago: i64) -> Appointment {
        let mut a = Appointment::pending(NewAppointment {
            doctor_id: doctor,
            patient_id: patient,
            doctor_name: "Dr Q".into(),
            patient_name: "P".into(),
            slot_date: SlotDate::parse("2024-03-01").unwrap(),
            slot_time: SlotTime::parse("09:00 AM").unwrap(),
            amount: 100,
        });
        a.created_at -= Duration::minutes(minutes_ago);
        a
    }

    #[test]
    fn test_queries_filter_and_sort_newest_first() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let store = test_store(temp_dir.path());
        let queries = AppointmentQueries::new(store.clone());

        let (doc_a, doc_b) = (RecordId::new(), RecordId::new());
        let (pat_a, pat_b) = (RecordId::new(), RecordId::new());

        let older = appointment(doc_a, pat_a, 30);
        let newer = appointment(doc_a, pat_b, 5);
        let other = appointment(doc_b, pat_a, 10);
        for a in [&older, &newer, &other] {
            store.save(a).unwrap();
        }

        let for_doc_a: Vec<_> = queries.for_doctor(&doc_a).into_iter().map(|a| a.id).collect();
        assert_eq!(for_doc_a, vec![newer.id, older.id]);

        let for_pat_a: Vec<_> = queries.for_patient(&pat_a).into_iter().map(|a| a.id).collect();
        assert_eq!(for_pat_a, vec![other.id, older.id]);

        assert_eq!(queries.all().len(), 3);
        assert_eq!(queries.get(&other.id).unwrap(), other);
    }
}
