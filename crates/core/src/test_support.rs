use crate::models::{Appointment, AppointmentStatus};
use chrono::{DateTime, Utc};
use std::num::NonZeroU32;

/// Builds an appointment scheduled at `time` (RFC 3339) with placeholder patient details.
pub fn appointment(id: &str, time: &str, status: AppointmentStatus) -> Appointment {
    let scheduled: DateTime<Utc> = time.parse().expect("valid RFC 3339 timestamp");
    Appointment {
        id: id.into(),
        patient_name: format!("Patient {id}"),
        patient_age: NonZeroU32::new(40).expect("non-zero age"),
        symptoms: "Headache".into(),
        appointment_time: scheduled,
        status,
        doctor_name: "Dr. Reyes".into(),
        patient_email: None,
        contact_number: None,
        created_at: scheduled,
        updated_at: scheduled,
        prescriptions: Vec::new(),
    }
}
