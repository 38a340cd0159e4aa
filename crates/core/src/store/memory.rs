use super::AppointmentStore;
use crate::error::{ConfigError, StoreError, StoreResult};
use crate::models::{
    Appointment, AppointmentId, AppointmentStatus, NewPrescription, Prescription, PrescriptionId,
};
use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashSet;
use std::path::Path;
use std::sync::{Mutex, MutexGuard, PoisonError};

/// The three store operations, used to script failures and to inspect call order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreOperation {
    ListAppointments,
    SetAppointmentStatus,
    CreatePrescription,
}

#[derive(Debug, Default)]
struct MemoryState {
    appointments: Vec<Appointment>,
    prescriptions: Vec<Prescription>,
    fail_next: HashSet<StoreOperation>,
    /// `None` unless the store was built with [`MemoryStore::recording`].
    calls: Option<Vec<StoreOperation>>,
}

/// In-process store with the same contract as the hosted backend.
///
/// Prescriptions are kept in their own table and joined on read, mirroring the hosted schema.
/// Failures can be scripted per operation with [`MemoryStore::fail_next`].
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: Mutex<MemoryState>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store holding `appointments`; embedded prescriptions move to their own table.
    pub fn with_appointments(appointments: Vec<Appointment>) -> Self {
        let mut state = MemoryState::default();
        for mut appointment in appointments {
            state.prescriptions.append(&mut appointment.prescriptions);
            state.appointments.push(appointment);
        }
        Self {
            state: Mutex::new(state),
        }
    }

    /// Loads a JSON array of appointments (the same shape the hosted store returns).
    pub fn from_seed_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(ConfigError::SeedRead)?;
        let appointments: Vec<Appointment> =
            serde_json::from_str(&contents).map_err(ConfigError::SeedParse)?;
        Ok(Self::with_appointments(appointments))
    }

    /// Makes the next call of `operation` fail with `StoreError::Unavailable`.
    pub fn fail_next(&self, operation: StoreOperation) {
        self.lock().fail_next.insert(operation);
    }

    /// Keeps a log of every operation issued from now on, for [`MemoryStore::calls`].
    pub fn recording(self) -> Self {
        self.lock().calls.get_or_insert_with(Vec::new);
        self
    }

    /// Operations issued so far, in order, including failed ones. Empty unless recording.
    pub fn calls(&self) -> Vec<StoreOperation> {
        self.lock().calls.clone().unwrap_or_default()
    }

    fn lock(&self) -> MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn begin(state: &mut MemoryState, operation: StoreOperation) -> StoreResult<()> {
        if let Some(calls) = state.calls.as_mut() {
            calls.push(operation);
        }
        if state.fail_next.remove(&operation) {
            return Err(StoreError::Unavailable(format!(
                "injected failure for {operation:?}"
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl AppointmentStore for MemoryStore {
    async fn list_appointments(&self) -> StoreResult<Vec<Appointment>> {
        let mut state = self.lock();
        Self::begin(&mut state, StoreOperation::ListAppointments)?;

        let mut appointments = state.appointments.clone();
        for appointment in &mut appointments {
            let mut attached: Vec<Prescription> = state
                .prescriptions
                .iter()
                .filter(|p| p.appointment_id == appointment.id)
                .cloned()
                .collect();
            attached.sort_by_key(|p| p.created_at);
            appointment.prescriptions = attached;
        }
        appointments.sort_by(|a, b| b.appointment_time.cmp(&a.appointment_time));
        Ok(appointments)
    }

    async fn set_appointment_status(
        &self,
        id: &AppointmentId,
        status: AppointmentStatus,
    ) -> StoreResult<()> {
        let mut state = self.lock();
        Self::begin(&mut state, StoreOperation::SetAppointmentStatus)?;

        let appointment = state
            .appointments
            .iter_mut()
            .find(|a| &a.id == id)
            .ok_or_else(|| StoreError::NotFound {
                entity: "appointment",
                id: id.to_string(),
            })?;
        appointment.status = status;
        appointment.updated_at = Utc::now();
        Ok(())
    }

    async fn create_prescription(
        &self,
        prescription: &NewPrescription,
    ) -> StoreResult<Prescription> {
        let mut state = self.lock();
        Self::begin(&mut state, StoreOperation::CreatePrescription)?;

        if !state
            .appointments
            .iter()
            .any(|a| a.id == prescription.appointment_id)
        {
            return Err(StoreError::Rejected {
                status: 409,
                message: format!(
                    "insert on table \"prescriptions\" violates foreign key constraint: appointment {} does not exist",
                    prescription.appointment_id
                ),
            });
        }

        let created = Prescription {
            id: PrescriptionId::new(uuid::Uuid::new_v4().to_string()),
            appointment_id: prescription.appointment_id.clone(),
            medicine: prescription.medicine.to_string(),
            dosage: prescription.dosage.to_string(),
            note: prescription.note.as_ref().map(|n| n.to_string()),
            created_at: Utc::now(),
        };
        state.prescriptions.push(created.clone());
        Ok(created)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::appointment;
    use std::io::Write;

    #[tokio::test]
    async fn lists_newest_first_with_prescriptions_joined() {
        let store = MemoryStore::with_appointments(vec![
            appointment("A1", "2026-10-17T09:00:00Z", AppointmentStatus::Pending),
            appointment("A2", "2026-10-18T09:00:00Z", AppointmentStatus::Pending),
        ]);
        let draft =
            NewPrescription::from_fields("A1".into(), "Amoxicillin", "500mg", None).unwrap();
        let created = store.create_prescription(&draft).await.unwrap();

        let listed = store.list_appointments().await.unwrap();
        let ids: Vec<&str> = listed.iter().map(|a| a.id.as_str()).collect();
        assert_eq!(ids, ["A2", "A1"]);
        assert_eq!(listed[1].prescriptions, vec![created]);
        assert!(listed[0].prescriptions.is_empty());
    }

    #[tokio::test]
    async fn insert_for_unknown_appointment_is_rejected() {
        let store = MemoryStore::new();
        let draft = NewPrescription::from_fields("missing".into(), "Ibuprofen", "200mg", None)
            .unwrap();
        let err = store.create_prescription(&draft).await.unwrap_err();
        assert!(matches!(err, StoreError::Rejected { status: 409, .. }));
    }

    #[tokio::test]
    async fn calls_are_not_kept_unless_recording() {
        let store = MemoryStore::with_appointments(vec![appointment(
            "A1",
            "2026-10-18T09:00:00Z",
            AppointmentStatus::Pending,
        )]);
        for _ in 0..100 {
            store.list_appointments().await.unwrap();
        }
        assert!(store.calls().is_empty());
        assert!(store.lock().calls.is_none());
    }

    #[tokio::test]
    async fn status_update_for_unknown_appointment_is_not_found() {
        let store = MemoryStore::new();
        let err = store
            .set_appointment_status(&"missing".into(), AppointmentStatus::Completed)
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::NotFound { .. }));
    }

    #[tokio::test]
    async fn injected_failure_applies_once_and_is_logged() {
        let store = MemoryStore::with_appointments(vec![appointment(
            "A1",
            "2026-10-18T09:00:00Z",
            AppointmentStatus::Pending,
        )])
        .recording();
        store.fail_next(StoreOperation::ListAppointments);

        assert!(store.list_appointments().await.is_err());
        assert_eq!(store.list_appointments().await.unwrap().len(), 1);
        assert_eq!(
            store.calls(),
            vec![
                StoreOperation::ListAppointments,
                StoreOperation::ListAppointments
            ]
        );
    }

    #[test]
    fn seed_file_loads_embedded_prescriptions() {
        let mut seed = tempfile::NamedTempFile::new().expect("Failed to create temp file");
        let mut row = appointment("A1", "2026-10-18T09:00:00Z", AppointmentStatus::Completed);
        row.prescriptions.push(Prescription {
            id: "P1".into(),
            appointment_id: "A1".into(),
            medicine: "Cetirizine".into(),
            dosage: "10mg daily".into(),
            note: None,
            created_at: "2026-10-18T10:00:00Z".parse().unwrap(),
        });
        write!(seed, "{}", serde_json::to_string(&vec![row]).unwrap()).unwrap();

        let store = MemoryStore::from_seed_file(seed.path()).unwrap();
        let state = store.lock();
        assert_eq!(state.appointments.len(), 1);
        assert!(state.appointments[0].prescriptions.is_empty());
        assert_eq!(state.prescriptions.len(), 1);
    }

    #[test]
    fn malformed_seed_file_is_a_config_error() {
        let mut seed = tempfile::NamedTempFile::new().expect("Failed to create temp file");
        write!(seed, "{{\"not\": \"an array\"}}").unwrap();
        assert!(matches!(
            MemoryStore::from_seed_file(seed.path()),
            Err(ConfigError::SeedParse(_))
        ));
    }
}
