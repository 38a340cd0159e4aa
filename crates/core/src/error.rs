use crate::constants::{MSG_PRESCRIPTION_FAILED, MSG_STATUS_FAILED};
use crate::models::{AppointmentId, AppointmentStatus, Prescription};

/// Any failure talking to the appointment store.
///
/// Network errors, rejections by the backend and missing rows all surface through this one type.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("store request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("store rejected request (HTTP {status}): {message}")]
    Rejected { status: u16, message: String },
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },
    #[error("failed to decode store response: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Failure of the prescription creation workflow.
///
/// The two writes are not atomic. `StatusUpdate` means the prescription row exists but its
/// appointment is still pending; the stored prescription is carried so callers can report it.
#[derive(Debug, thiserror::Error)]
pub enum WorkflowError {
    #[error("appointment {id} is {status}; prescriptions can only be attached to pending appointments")]
    NotPending {
        id: AppointmentId,
        status: AppointmentStatus,
    },
    #[error("failed to insert prescription: {0}")]
    Insert(#[source] StoreError),
    #[error(
        "prescription {} was stored but appointment {} was not completed: {source}",
        .prescription.id,
        .prescription.appointment_id
    )]
    StatusUpdate {
        prescription: Box<Prescription>,
        #[source]
        source: StoreError,
    },
    #[error(
        "prescription {} was stored and appointment {} completed, but reloading failed: {source}",
        .prescription.id,
        .prescription.appointment_id
    )]
    Reload {
        prescription: Box<Prescription>,
        #[source]
        source: StoreError,
    },
}

impl WorkflowError {
    /// The single notification text shown for any workflow failure.
    pub fn user_message(&self) -> &'static str {
        MSG_PRESCRIPTION_FAILED
    }

    /// The prescription left behind on a still-pending appointment, if any.
    pub fn orphaned_prescription(&self) -> Option<&Prescription> {
        match self {
            WorkflowError::StatusUpdate { prescription, .. } => Some(prescription.as_ref()),
            _ => None,
        }
    }

    /// The prescription when both writes landed and only the reload failed.
    pub fn completed_prescription(&self) -> Option<&Prescription> {
        match self {
            WorkflowError::Reload { prescription, .. } => Some(prescription.as_ref()),
            _ => None,
        }
    }
}

/// Failure of a stand-alone status change (e.g. cancelling an appointment).
#[derive(Debug, thiserror::Error)]
pub enum StatusChangeError {
    #[error("appointment {id} cannot move from {from} to {to}")]
    InvalidTransition {
        id: AppointmentId,
        from: AppointmentStatus,
        to: AppointmentStatus,
    },
    #[error("failed to update appointment status: {0}")]
    Update(#[source] StoreError),
    #[error("failed to reload appointments: {0}")]
    Reload(#[source] StoreError),
}

impl StatusChangeError {
    pub fn user_message(&self) -> &'static str {
        MSG_STATUS_FAILED
    }
}

/// Prescription form validation failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FormError {
    #[error("medicine is required")]
    MissingMedicine,
    #[error("dosage is required")]
    MissingDosage,
    #[error("no appointment is selected")]
    NoSelection,
    #[error("the prescription form is not open")]
    NotOpen,
    #[error("a prescription submission is already in flight")]
    InFlight,
}

/// Failure of submitting the prescription form through the controller.
#[derive(Debug, thiserror::Error)]
pub enum SubmitError {
    #[error(transparent)]
    Form(#[from] FormError),
    #[error(transparent)]
    Workflow(#[from] WorkflowError),
}

/// Startup configuration failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("missing required setting {0}")]
    Missing(&'static str),
    #[error("invalid {name}: {reason}")]
    Invalid { name: &'static str, reason: String },
    #[error("failed to read seed file: {0}")]
    SeedRead(std::io::Error),
    #[error("failed to parse seed file: {0}")]
    SeedParse(serde_json::Error),
    #[error("failed to build HTTP client: {0}")]
    HttpClient(reqwest::Error),
}
