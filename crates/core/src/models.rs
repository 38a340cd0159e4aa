//! Appointment and prescription records as exchanged with the store.
//!
//! Field names follow the store's column names so rows deserialize directly.

use crate::error::FormError;
use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use clinic_types::NonEmptyText;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::num::NonZeroU32;
use std::str::FromStr;
use utoipa::ToSchema;

macro_rules! opaque_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, ToSchema)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(id: &str) -> Self {
                Self::new(id)
            }
        }

        impl From<String> for $name {
            fn from(id: String) -> Self {
                Self(id)
            }
        }
    };
}

opaque_id!(
    /// Store-assigned appointment identifier.
    AppointmentId
);
opaque_id!(
    /// Store-assigned prescription identifier.
    PrescriptionId
);

/// Lifecycle status of an appointment.
///
/// The only legal moves are `Pending -> Completed` and `Pending -> Cancelled`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum AppointmentStatus {
    Pending,
    Completed,
    Cancelled,
}

impl AppointmentStatus {
    pub const ALL: [AppointmentStatus; 3] = [
        AppointmentStatus::Pending,
        AppointmentStatus::Completed,
        AppointmentStatus::Cancelled,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AppointmentStatus::Pending => "pending",
            AppointmentStatus::Completed => "completed",
            AppointmentStatus::Cancelled => "cancelled",
        }
    }

    pub fn can_transition_to(self, next: AppointmentStatus) -> bool {
        matches!(
            (self, next),
            (AppointmentStatus::Pending, AppointmentStatus::Completed)
                | (AppointmentStatus::Pending, AppointmentStatus::Cancelled)
        )
    }
}

impl fmt::Display for AppointmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown appointment status: {0}")]
pub struct UnknownStatus(pub String);

impl FromStr for AppointmentStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pending" => Ok(AppointmentStatus::Pending),
            "completed" => Ok(AppointmentStatus::Completed),
            "cancelled" => Ok(AppointmentStatus::Cancelled),
            _ => Err(UnknownStatus(s.to_string())),
        }
    }
}

/// A medication record attached to exactly one appointment. Immutable once stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Prescription {
    pub id: PrescriptionId,
    pub appointment_id: AppointmentId,
    pub medicine: String,
    pub dosage: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// A scheduled patient/doctor encounter, with its prescriptions joined in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Appointment {
    pub id: AppointmentId,
    pub patient_name: String,
    #[schema(value_type = u32, minimum = 1)]
    pub patient_age: NonZeroU32,
    pub symptoms: String,
    pub appointment_time: DateTime<Utc>,
    pub status: AppointmentStatus,
    pub doctor_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub patient_email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contact_number: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub prescriptions: Vec<Prescription>,
}

impl Appointment {
    /// Calendar date of the scheduled time as seen from `tz`.
    pub fn scheduled_date<Tz: TimeZone>(&self, tz: &Tz) -> NaiveDate {
        self.appointment_time.with_timezone(tz).date_naive()
    }

    pub fn is_pending(&self) -> bool {
        self.status == AppointmentStatus::Pending
    }

    /// Whether the details page offers the "create prescription" action.
    pub fn offers_prescription(&self) -> bool {
        self.is_pending() && self.prescriptions.is_empty()
    }
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<Vec<Prescription>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Vec<Prescription>>::deserialize(deserializer)?.unwrap_or_default())
}

/// A prescription payload before the store has assigned an id and creation time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewPrescription {
    pub appointment_id: AppointmentId,
    pub medicine: NonEmptyText,
    pub dosage: NonEmptyText,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<NonEmptyText>,
}

impl NewPrescription {
    /// Validates raw form input: medicine and dosage must be non-blank after trimming and a
    /// blank note is dropped.
    pub fn from_fields(
        appointment_id: AppointmentId,
        medicine: &str,
        dosage: &str,
        note: Option<&str>,
    ) -> Result<Self, FormError> {
        let medicine = NonEmptyText::new(medicine).map_err(|_| FormError::MissingMedicine)?;
        let dosage = NonEmptyText::new(dosage).map_err(|_| FormError::MissingDosage)?;
        Ok(Self {
            appointment_id,
            medicine,
            dosage,
            note: note.and_then(NonEmptyText::optional),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ROW: &str = r#"{
        "id": "A1",
        "patient_name": "Maya Patel",
        "patient_age": 34,
        "symptoms": "Persistent cough",
        "appointment_time": "2026-10-18T09:30:00+00:00",
        "status": "pending",
        "doctor_name": "Dr. Okafor",
        "patient_email": null,
        "contact_number": "555-0101",
        "created_at": "2026-10-01T08:00:00+00:00",
        "updated_at": "2026-10-01T08:00:00+00:00",
        "prescriptions": null
    }"#;

    #[test]
    fn store_row_deserializes_with_null_prescriptions() {
        let appointment: Appointment = serde_json::from_str(ROW).unwrap();
        assert_eq!(appointment.id.as_str(), "A1");
        assert_eq!(appointment.status, AppointmentStatus::Pending);
        assert_eq!(appointment.patient_email, None);
        assert_eq!(appointment.contact_number.as_deref(), Some("555-0101"));
        assert!(appointment.prescriptions.is_empty());
        assert!(appointment.offers_prescription());
    }

    #[test]
    fn zero_age_is_rejected() {
        let row = ROW.replace("\"patient_age\": 34", "\"patient_age\": 0");
        assert!(serde_json::from_str::<Appointment>(&row).is_err());
    }

    #[test]
    fn only_pending_appointments_can_move() {
        use AppointmentStatus::*;
        assert!(Pending.can_transition_to(Completed));
        assert!(Pending.can_transition_to(Cancelled));
        assert!(!Pending.can_transition_to(Pending));
        for from in [Completed, Cancelled] {
            for to in AppointmentStatus::ALL {
                assert!(!from.can_transition_to(to), "{from} -> {to}");
            }
        }
    }

    #[test]
    fn status_parses_case_insensitively() {
        assert_eq!(
            "Cancelled".parse::<AppointmentStatus>(),
            Ok(AppointmentStatus::Cancelled)
        );
        assert!("archived".parse::<AppointmentStatus>().is_err());
    }

    #[test]
    fn new_prescription_trims_and_drops_blank_note() {
        let draft = NewPrescription::from_fields(
            "A1".into(),
            " Amoxicillin ",
            "500mg twice daily",
            Some("   "),
        )
        .unwrap();
        assert_eq!(draft.medicine.as_str(), "Amoxicillin");
        assert_eq!(draft.note, None);

        let json = serde_json::to_value(&draft).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "appointment_id": "A1",
                "medicine": "Amoxicillin",
                "dosage": "500mg twice daily"
            })
        );
    }

    #[test]
    fn new_prescription_requires_medicine_and_dosage() {
        assert_eq!(
            NewPrescription::from_fields("A1".into(), " ", "1 tablet", None),
            Err(FormError::MissingMedicine)
        );
        assert_eq!(
            NewPrescription::from_fields("A1".into(), "Ibuprofen", "", None),
            Err(FormError::MissingDosage)
        );
    }
}
