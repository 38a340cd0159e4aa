//! Request and response bodies.

use clinic_core::{Appointment, AppointmentStatus, DashboardStats, Prescription};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct HealthRes {
    pub ok: bool,
    pub message: String,
}

/// Everything the dashboard page shows.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct DashboardRes {
    pub stats: DashboardStats,
    /// Appointments scheduled for today, newest first.
    pub today: Vec<Appointment>,
    /// The most recent appointments.
    pub recent: Vec<Appointment>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ListAppointmentsRes {
    pub appointments: Vec<Appointment>,
    /// Counts over the whole collection, not just the filtered page.
    pub stats: DashboardStats,
    /// Set when `appointments` is empty.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub empty_message: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CreatePrescriptionReq {
    pub medicine: String,
    pub dosage: String,
    #[serde(default)]
    pub note: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CreatePrescriptionRes {
    pub prescription: Prescription,
    /// The appointment as reloaded after completion.
    pub appointment: Option<Appointment>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UpdateStatusReq {
    pub status: AppointmentStatus,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UpdateStatusRes {
    pub appointment: Option<Appointment>,
}
