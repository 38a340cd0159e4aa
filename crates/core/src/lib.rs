//! # Clinic Core
//!
//! Core logic for the clinic front-end.
//!
//! This crate contains the data model and everything that operates on it:
//! - Typed access to the hosted appointment store (`store`)
//! - The prescription creation workflow (`workflow`)
//! - Derived dashboard statistics and list filtering (`stats`, `listing`)
//! - The prescription form and the page/view controller (`form`, `view`)
//!
//! **No API concerns**: HTTP servers, OpenAPI documents and terminal rendering belong in
//! `api-rest`, `api-shared` or `clinic-cli`.

pub mod config;
pub mod constants;
pub mod error;
pub mod form;
pub mod listing;
pub mod models;
pub mod stats;
pub mod store;
pub mod view;
pub mod workflow;

pub use clinic_types::{NonEmptyText, TextError};
pub use config::{StoreBackend, StoreConfig};
pub use error::{
    ConfigError, FormError, StatusChangeError, StoreError, StoreResult, SubmitError,
    WorkflowError,
};
pub use form::PrescriptionForm;
pub use listing::{AppointmentQuery, SortKey, StatusFilter};
pub use models::{
    Appointment, AppointmentId, AppointmentStatus, NewPrescription, Prescription,
    PrescriptionId,
};
pub use stats::DashboardStats;
pub use store::{open_store, AppointmentStore, MemoryStore, PostgrestStore, StoreOperation};
pub use view::{AppController, Notification, NotificationKind, Page, ViewState};
pub use workflow::{PrescriptionWorkflow, WorkflowOutcome};

#[cfg(test)]
pub(crate) mod test_support;
