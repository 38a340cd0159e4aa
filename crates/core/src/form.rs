use crate::error::FormError;
use crate::models::{Appointment, AppointmentId, NewPrescription};
use serde::{Deserialize, Serialize};

/// State of the modal prescription form for one appointment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrescriptionForm {
    appointment_id: AppointmentId,
    patient_name: String,
    pub medicine: String,
    pub dosage: String,
    pub note: String,
    submitting: bool,
}

impl PrescriptionForm {
    pub fn for_appointment(appointment: &Appointment) -> Self {
        Self {
            appointment_id: appointment.id.clone(),
            patient_name: appointment.patient_name.clone(),
            medicine: String::new(),
            dosage: String::new(),
            note: String::new(),
            submitting: false,
        }
    }

    pub fn appointment_id(&self) -> &AppointmentId {
        &self.appointment_id
    }

    pub fn patient_name(&self) -> &str {
        &self.patient_name
    }

    pub fn is_submitting(&self) -> bool {
        self.submitting
    }

    /// Submission is disabled while a required field is blank or a submission is in flight.
    pub fn can_submit(&self) -> bool {
        !self.submitting && !self.medicine.trim().is_empty() && !self.dosage.trim().is_empty()
    }

    /// The trimmed payload for the workflow.
    pub fn to_draft(&self) -> Result<NewPrescription, FormError> {
        if self.submitting {
            return Err(FormError::InFlight);
        }
        NewPrescription::from_fields(
            self.appointment_id.clone(),
            &self.medicine,
            &self.dosage,
            Some(&self.note),
        )
    }

    /// Clears the entered fields, keeping the target appointment.
    pub fn reset(&mut self) {
        self.medicine.clear();
        self.dosage.clear();
        self.note.clear();
        self.submitting = false;
    }

    pub(crate) fn set_submitting(&mut self, submitting: bool) {
        self.submitting = submitting;
    }
}
