//! Typed access to the appointment store.
//!
//! `AppointmentStore` is the seam between the clinic logic and the hosted backend. Every call
//! is a round trip to the store; nothing is cached on this side.

mod memory;
mod postgrest;

pub use memory::{MemoryStore, StoreOperation};
pub use postgrest::PostgrestStore;

use crate::config::{StoreBackend, StoreConfig};
use crate::error::{ConfigError, StoreResult};
use crate::models::{Appointment, AppointmentId, AppointmentStatus, NewPrescription, Prescription};
use async_trait::async_trait;
use std::sync::Arc;

#[async_trait]
pub trait AppointmentStore: Send + Sync {
    /// All appointments, newest scheduled time first, each with its prescriptions attached.
    async fn list_appointments(&self) -> StoreResult<Vec<Appointment>>;

    /// Overwrites one appointment's status. Callers reload to observe the change.
    async fn set_appointment_status(
        &self,
        id: &AppointmentId,
        status: AppointmentStatus,
    ) -> StoreResult<()>;

    /// Inserts a prescription and returns it with its store-assigned id and timestamp.
    async fn create_prescription(&self, prescription: &NewPrescription)
        -> StoreResult<Prescription>;
}

#[async_trait]
impl<S: AppointmentStore + ?Sized> AppointmentStore for Arc<S> {
    async fn list_appointments(&self) -> StoreResult<Vec<Appointment>> {
        (**self).list_appointments().await
    }

    async fn set_appointment_status(
        &self,
        id: &AppointmentId,
        status: AppointmentStatus,
    ) -> StoreResult<()> {
        (**self).set_appointment_status(id, status).await
    }

    async fn create_prescription(
        &self,
        prescription: &NewPrescription,
    ) -> StoreResult<Prescription> {
        (**self).create_prescription(prescription).await
    }
}

/// Builds the store selected by `cfg`.
///
/// # Errors
///
/// Returns a `ConfigError` if the HTTP client cannot be built or the seed file cannot be read.
pub fn open_store(cfg: &StoreConfig) -> Result<Arc<dyn AppointmentStore>, ConfigError> {
    match cfg.backend() {
        StoreBackend::Postgrest(postgrest) => {
            tracing::info!("using hosted store at {}", postgrest.base_url());
            Ok(Arc::new(PostgrestStore::new(postgrest)?))
        }
        StoreBackend::Memory { seed_file } => {
            let store = match seed_file {
                Some(path) => {
                    tracing::info!("using in-memory store seeded from {}", path.display());
                    MemoryStore::from_seed_file(path)?
                }
                None => {
                    tracing::info!("using empty in-memory store");
                    MemoryStore::new()
                }
            };
            Ok(Arc::new(store))
        }
    }
}
