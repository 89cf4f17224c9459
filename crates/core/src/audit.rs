//! Offline consistency check between booked slots and appointments.
//!
//! For every doctor and date, the times of non-cancelled appointments must equal the doctor's
//! booked set. The audit reports each slot that breaks this, without repairing anything.

use crate::appointment::Appointment;
use crate::doctor::Doctor;
use crate::slot::{SlotDate, SlotTime};
use crate::store::DocumentStore;
use docplus_uuid::RecordId;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum SlotIssue {
    /// An active appointment whose slot is not in the doctor's booked set.
    MissingFromDoctor,
    /// A booked slot with no active appointment behind it.
    Orphaned,
    /// More than one active appointment for the same slot.
    DoubleBooked,
}

impl fmt::Display for SlotIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SlotIssue::MissingFromDoctor => "missing from doctor",
            SlotIssue::Orphaned => "orphaned",
            SlotIssue::DoubleBooked => "double booked",
        };
        f.write_str(s)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct SlotFinding {
    pub doctor_id: RecordId,
    pub slot_date: SlotDate,
    pub slot_time: SlotTime,
    pub issue: SlotIssue,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SlotAuditReport {
    pub doctors_checked: usize,
    pub appointments_checked: usize,
    pub findings: Vec<SlotFinding>,
}

impl SlotAuditReport {
    pub fn is_consistent(&self) -> bool {
        self.findings.is_empty()
    }
}

type SlotKey = (RecordId, SlotDate, SlotTime);

/// Compares every doctor's booked slots with the active appointments in the store.
pub fn audit_slots(store: &DocumentStore) -> SlotAuditReport {
    let doctors = store.list::<Doctor>();
    let appointments = store.list::<Appointment>();

    let mut active: BTreeMap<SlotKey, usize> = BTreeMap::new();
    for appointment in appointments.iter().filter(|a| a.status().holds_slot()) {
        *active
            .entry((appointment.doctor_id, appointment.slot_date, appointment.slot_time))
            .or_default() += 1;
    }

    let booked: BTreeSet<SlotKey> = doctors
        .iter()
        .flat_map(|doctor| {
            doctor.booked_slots().iter().flat_map(move |(date, times)| {
                times.iter().map(move |time| (doctor.id, *date, *time))
            })
        })
        .collect();

    let mut findings = Vec::new();
    for (&(doctor_id, slot_date, slot_time), &count) in &active {
        let key = (doctor_id, slot_date, slot_time);
        if !booked.contains(&key) {
            findings.push(SlotFinding {
                doctor_id,
                slot_date,
                slot_time,
                issue: SlotIssue::MissingFromDoctor,
            });
        }
        if count > 1 {
            findings.push(SlotFinding {
                doctor_id,
                slot_date,
                slot_time,
                issue: SlotIssue::DoubleBooked,
            });
        }
    }
    for &(doctor_id, slot_date, slot_time) in booked.iter().filter(|k| !active.contains_key(*k)) {
        findings.push(SlotFinding {
            doctor_id,
            slot_date,
            slot_time,
            issue: SlotIssue::Orphaned,
        });
    }
    findings.sort();

    for finding in &findings {
        tracing::warn!(
            doctor_id = %finding.doctor_id,
            "slot {} {} is {}",
            finding.slot_date,
            finding.slot_time,
            finding.issue
        );
    }

    SlotAuditReport {
        doctors_checked: doctors.len(),
        appointments_checked: appointments.len(),
        findings,
    }
}
