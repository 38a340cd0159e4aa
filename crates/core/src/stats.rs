//! Dashboard statistics derived from the appointment collection.
//!
//! Nothing here is stored: every value is recomputed from the collection it is given.

use crate::constants::RECENT_APPOINTMENTS;
use crate::models::{Appointment, AppointmentStatus};
use chrono::{Local, NaiveDate, TimeZone};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Counts shown on the dashboard and the appointments page header.
///
/// `pending + completed + cancelled == total` for any collection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct DashboardStats {
    pub total: usize,
    pub pending: usize,
    pub completed: usize,
    pub cancelled: usize,
    /// Appointments whose scheduled calendar date is today.
    pub today: usize,
}

impl DashboardStats {
    /// Computes the stats with `today` interpreted in time zone `tz`.
    pub fn compute<Tz: TimeZone>(appointments: &[Appointment], today: NaiveDate, tz: &Tz) -> Self {
        appointments
            .iter()
            .fold(Self::default(), |mut stats, appointment| {
                stats.total += 1;
                match appointment.status {
                    AppointmentStatus::Pending => stats.pending += 1,
                    AppointmentStatus::Completed => stats.completed += 1,
                    AppointmentStatus::Cancelled => stats.cancelled += 1,
                }
                if appointment.scheduled_date(tz) == today {
                    stats.today += 1;
                }
                stats
            })
    }

    /// Computes the stats against the viewer's local calendar date.
    pub fn for_local_today(appointments: &[Appointment]) -> Self {
        Self::compute(appointments, Local::now().date_naive(), &Local)
    }

    pub fn count(&self, status: AppointmentStatus) -> usize {
        match status {
            AppointmentStatus::Pending => self.pending,
            AppointmentStatus::Completed => self.completed,
            AppointmentStatus::Cancelled => self.cancelled,
        }
    }
}

/// Appointments scheduled on `today` (in `tz`), in collection order.
pub fn todays_schedule<'a, Tz: TimeZone>(
    appointments: &'a [Appointment],
    today: NaiveDate,
    tz: &Tz,
) -> Vec<&'a Appointment> {
    appointments
        .iter()
        .filter(|a| a.scheduled_date(tz) == today)
        .collect()
}

/// The first few appointments of the collection, which the store orders newest first.
pub fn recent(appointments: &[Appointment]) -> &[Appointment] {
    &appointments[..appointments.len().min(RECENT_APPOINTMENTS)]
}
