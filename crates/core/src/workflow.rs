//! Prescription creation and status changes.
//!
//! Creating a prescription is two independent writes followed by a reload:
//!
//! 1. insert the prescription,
//! 2. mark its appointment `completed`,
//! 3. reload the appointment collection.
//!
//! Each step runs only after the previous one succeeded. There is no rollback: if step 2
//! fails the prescription stays stored against a pending appointment, and the error says so
//! (`WorkflowError::StatusUpdate`).

use crate::error::{StatusChangeError, WorkflowError};
use crate::models::{Appointment, AppointmentId, AppointmentStatus, NewPrescription, Prescription};
use crate::store::AppointmentStore;

/// Result of a successful prescription workflow.
#[derive(Debug, Clone)]
pub struct WorkflowOutcome {
    pub prescription: Prescription,
    /// The collection as reloaded after both writes.
    pub appointments: Vec<Appointment>,
}

impl WorkflowOutcome {
    /// The refreshed version of the prescribed appointment, if the reload returned it.
    pub fn appointment(&self) -> Option<&Appointment> {
        self.appointments
            .iter()
            .find(|a| a.id == self.prescription.appointment_id)
    }
}

pub struct PrescriptionWorkflow<'a, S: ?Sized> {
    store: &'a S,
}

impl<'a, S: AppointmentStore + ?Sized> PrescriptionWorkflow<'a, S> {
    pub fn new(store: &'a S) -> Self {
        Self { store }
    }

    /// Runs insert, complete and reload in order.
    ///
    /// `known` is the caller's current collection. If it holds the target appointment and that
    /// appointment is no longer pending, nothing is written.
    ///
    /// # Errors
    ///
    /// Returns a `WorkflowError` naming the step that failed; later steps are not attempted.
    pub async fn run(
        &self,
        draft: &NewPrescription,
        known: &[Appointment],
    ) -> Result<WorkflowOutcome, WorkflowError> {
        let target = &draft.appointment_id;
        if let Some(current) = known.iter().find(|a| &a.id == target) {
            if !current.status.can_transition_to(AppointmentStatus::Completed) {
                return Err(WorkflowError::NotPending {
                    id: target.clone(),
                    status: current.status,
                });
            }
        }

        tracing::info!(appointment_id = %target, "creating prescription");
        let prescription = self
            .store
            .create_prescription(draft)
            .await
            .map_err(WorkflowError::Insert)?;

        if let Err(source) = self
            .store
            .set_appointment_status(target, AppointmentStatus::Completed)
            .await
        {
            tracing::warn!(
                appointment_id = %target,
                prescription_id = %prescription.id,
                "prescription stored but appointment not completed"
            );
            return Err(WorkflowError::StatusUpdate {
                prescription: Box::new(prescription),
                source,
            });
        }

        let appointments = match self.store.list_appointments().await {
            Ok(appointments) => appointments,
            Err(source) => {
                return Err(WorkflowError::Reload {
                    prescription: Box::new(prescription),
                    source,
                })
            }
        };

        tracing::info!(
            appointment_id = %target,
            prescription_id = %prescription.id,
            "prescription created and appointment completed"
        );
        Ok(WorkflowOutcome {
            prescription,
            appointments,
        })
    }
}

/// Moves one appointment to `to` and reloads the collection.
///
/// The transition is checked against `known` before anything is written.
pub async fn change_status<S: AppointmentStore + ?Sized>(
    store: &S,
    id: &AppointmentId,
    to: AppointmentStatus,
    known: &[Appointment],
) -> Result<Vec<Appointment>, StatusChangeError> {
    if let Some(current) = known.iter().find(|a| &a.id == id) {
        if !current.status.can_transition_to(to) {
            return Err(StatusChangeError::InvalidTransition {
                id: id.clone(),
                from: current.status,
                to,
            });
        }
    }

    tracing::info!(appointment_id = %id, status = %to, "changing appointment status");
    store
        .set_appointment_status(id, to)
        .await
        .map_err(StatusChangeError::Update)?;
    store
        .list_appointments()
        .await
        .map_err(StatusChangeError::Reload)
}
