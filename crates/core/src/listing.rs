//! Search, status filter and sort for the appointments page.

use crate::constants::{EMPTY_LIST_FILTERED, EMPTY_LIST_UNFILTERED};
use crate::models::{Appointment, AppointmentStatus, UnknownStatus};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;
use utoipa::ToSchema;

/// Sort order of the appointments page.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum SortKey {
    /// Scheduled time, newest first.
    #[default]
    Date,
    /// Patient name, ascending, ignoring case.
    Name,
    /// Status name, ascending.
    Status,
}

impl SortKey {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortKey::Date => "date",
            SortKey::Name => "name",
            SortKey::Status => "status",
        }
    }

    fn compare(&self, a: &Appointment, b: &Appointment) -> Ordering {
        match self {
            SortKey::Date => b.appointment_time.cmp(&a.appointment_time),
            SortKey::Name => a
                .patient_name
                .to_lowercase()
                .cmp(&b.patient_name.to_lowercase()),
            SortKey::Status => a.status.as_str().cmp(b.status.as_str()),
        }
    }
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown sort key: {0} (expected date, name or status)")]
pub struct UnknownSortKey(pub String);

impl FromStr for SortKey {
    type Err = UnknownSortKey;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "date" => Ok(SortKey::Date),
            "name" => Ok(SortKey::Name),
            "status" => Ok(SortKey::Status),
            _ => Err(UnknownSortKey(s.to_string())),
        }
    }
}

/// Either every status or exactly one.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum StatusFilter {
    #[default]
    All,
    Only(AppointmentStatus),
}

impl StatusFilter {
    pub fn accepts(&self, status: AppointmentStatus) -> bool {
        match self {
            StatusFilter::All => true,
            StatusFilter::Only(wanted) => *wanted == status,
        }
    }
}

impl fmt::Display for StatusFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StatusFilter::All => f.write_str("all"),
            StatusFilter::Only(status) => status.fmt(f),
        }
    }
}

impl FromStr for StatusFilter {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().eq_ignore_ascii_case("all") {
            return Ok(StatusFilter::All);
        }
        s.parse().map(StatusFilter::Only)
    }
}

/// The appointments page's search term, status filter and sort key.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AppointmentQuery {
    pub search: String,
    pub status: StatusFilter,
    pub sort: SortKey,
}

impl AppointmentQuery {
    /// Case-insensitive substring match on patient name, symptoms or doctor name, combined
    /// with the status filter.
    pub fn matches(&self, appointment: &Appointment) -> bool {
        self.status.accepts(appointment.status) && self.matches_search(appointment)
    }

    fn matches_search(&self, appointment: &Appointment) -> bool {
        let term = self.search.to_lowercase();
        [
            &appointment.patient_name,
            &appointment.symptoms,
            &appointment.doctor_name,
        ]
        .iter()
        .any(|field| field.to_lowercase().contains(&term))
    }

    /// Filters then sorts. The sort is stable, so ties keep collection order.
    pub fn apply<'a>(&self, appointments: &'a [Appointment]) -> Vec<&'a Appointment> {
        let mut selected: Vec<&Appointment> =
            appointments.iter().filter(|a| self.matches(a)).collect();
        selected.sort_by(|a, b| self.sort.compare(a, b));
        selected
    }

    /// True when a search term or a status filter narrows the list.
    pub fn is_filtered(&self) -> bool {
        !self.search.is_empty() || self.status != StatusFilter::All
    }

    /// Message shown when `apply` returns nothing.
    pub fn empty_state_message(&self) -> &'static str {
        if self.is_filtered() {
            EMPTY_LIST_FILTERED
        } else {
            EMPTY_LIST_UNFILTERED
        }
    }
}
