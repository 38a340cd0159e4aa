//! Page routing and the application state behind the front-end.
//!
//! `ViewState` is a plain serializable struct mutated only through its named transitions.
//! `AppController` pairs it with a store and runs the asynchronous operations (initial load,
//! prescription submission, cancellation), turning their failures into notifications.

use crate::constants::{
    MSG_LOAD_FAILED, MSG_PRESCRIPTION_CREATED, NO_PRESCRIPTION_CLOSED, NO_PRESCRIPTION_PENDING,
};
use crate::error::{FormError, StatusChangeError, SubmitError};
use crate::form::PrescriptionForm;
use crate::listing::AppointmentQuery;
use crate::models::{Appointment, AppointmentId, AppointmentStatus, Prescription};
use crate::stats::{self, DashboardStats};
use crate::store::AppointmentStore;
use crate::workflow::{self, PrescriptionWorkflow};
use chrono::{Local, NaiveDate, TimeZone};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Page {
    #[default]
    Dashboard,
    Appointments,
    AppointmentDetails,
    Patients,
    Prescriptions,
}

impl Page {
    /// Pages reachable from the navigation bar.
    pub const NAVIGATION: [Page; 4] = [
        Page::Dashboard,
        Page::Appointments,
        Page::Patients,
        Page::Prescriptions,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Page::Dashboard => "dashboard",
            Page::Appointments => "appointments",
            Page::AppointmentDetails => "appointment-details",
            Page::Patients => "patients",
            Page::Prescriptions => "prescriptions",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            Page::Dashboard => "Dashboard",
            Page::Appointments => "Appointments",
            Page::AppointmentDetails => "Appointment Details",
            Page::Patients => "Patients Management",
            Page::Prescriptions => "Prescriptions Management",
        }
    }

    /// Pages that exist in navigation but have no backing data yet.
    pub fn is_placeholder(&self) -> bool {
        matches!(self, Page::Patients | Page::Prescriptions)
    }
}

impl fmt::Display for Page {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown page: {0}")]
pub struct UnknownPage(pub String);

impl FromStr for Page {
    type Err = UnknownPage;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "dashboard" => Ok(Page::Dashboard),
            "appointments" => Ok(Page::Appointments),
            "appointment-details" => Ok(Page::AppointmentDetails),
            "patients" => Ok(Page::Patients),
            "prescriptions" => Ok(Page::Prescriptions),
            _ => Err(UnknownPage(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationKind {
    Success,
    Error,
}

/// A toast-style message for the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub kind: NotificationKind,
    pub title: String,
    pub description: String,
}

impl Notification {
    pub fn success(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            kind: NotificationKind::Success,
            title: title.into(),
            description: description.into(),
        }
    }

    pub fn error(description: impl Into<String>) -> Self {
        Self {
            kind: NotificationKind::Error,
            title: "Error".into(),
            description: description.into(),
        }
    }
}

/// Everything the front-end renders from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViewState {
    page: Page,
    selected: Option<Appointment>,
    appointments: Vec<Appointment>,
    loading: bool,
    prescription_form: Option<PrescriptionForm>,
    notifications: Vec<Notification>,
}

impl Default for ViewState {
    fn default() -> Self {
        Self {
            page: Page::Dashboard,
            selected: None,
            appointments: Vec::new(),
            loading: true,
            prescription_form: None,
            notifications: Vec::new(),
        }
    }
}

impl ViewState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn page(&self) -> Page {
        self.page
    }

    pub fn selected(&self) -> Option<&Appointment> {
        self.selected.as_ref()
    }

    pub fn appointments(&self) -> &[Appointment] {
        &self.appointments
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn prescription_form(&self) -> Option<&PrescriptionForm> {
        self.prescription_form.as_ref()
    }

    pub fn prescription_form_mut(&mut self) -> Option<&mut PrescriptionForm> {
        self.prescription_form.as_mut()
    }

    pub fn notifications(&self) -> &[Notification] {
        &self.notifications
    }

    /// Removes and returns the pending notifications.
    pub fn take_notifications(&mut self) -> Vec<Notification> {
        std::mem::take(&mut self.notifications)
    }

    pub fn notify(&mut self, notification: Notification) {
        self.notifications.push(notification);
    }

    // ------------------------------------------------------------------
    // Transitions
    // ------------------------------------------------------------------

    /// Opens the details page for `appointment`.
    pub fn select(&mut self, appointment: Appointment) {
        self.selected = Some(appointment);
        self.page = Page::AppointmentDetails;
    }

    /// Opens the details page for the appointment with `id` from the loaded collection.
    ///
    /// Returns `false` (and changes nothing) if no such appointment is loaded.
    pub fn select_by_id(&mut self, id: &AppointmentId) -> bool {
        match self.appointments.iter().find(|a| &a.id == id).cloned() {
            Some(appointment) => {
                self.select(appointment);
                true
            }
            None => false,
        }
    }

    pub fn back_to_appointments(&mut self) {
        self.selected = None;
        self.prescription_form = None;
        self.page = Page::Appointments;
    }

    pub fn back_to_dashboard(&mut self) {
        self.selected = None;
        self.prescription_form = None;
        self.page = Page::Dashboard;
    }

    /// Direct navigation; the selection is left as it is.
    pub fn navigate(&mut self, page: Page) {
        self.page = page;
    }

    /// Opens the prescription form for the selected appointment.
    pub fn open_prescription_form(&mut self) -> Result<&mut PrescriptionForm, FormError> {
        let selected = self.selected.as_ref().ok_or(FormError::NoSelection)?;
        let form = PrescriptionForm::for_appointment(selected);
        Ok(self.prescription_form.insert(form))
    }

    /// Closes the form and discards what was typed.
    pub fn close_prescription_form(&mut self) {
        self.prescription_form = None;
    }

    /// Replaces the collection wholesale and ends the initial loading phase.
    pub fn replace_appointments(&mut self, appointments: Vec<Appointment>) {
        self.appointments = appointments;
        self.loading = false;
    }

    pub fn finish_loading(&mut self) {
        self.loading = false;
    }

    /// If `id` is the selected appointment, swaps in its version from the current collection.
    pub fn refresh_selection(&mut self, id: &AppointmentId) {
        let Some(selected) = self.selected.as_mut() else {
            return;
        };
        if &selected.id != id {
            return;
        }
        if let Some(fresh) = self.appointments.iter().find(|a| &a.id == id) {
            *selected = fresh.clone();
        }
    }

    /// Applies a stored prescription and its completed appointment to the local collection
    /// when the store could not be re-read.
    pub fn record_completion(&mut self, prescription: Prescription) {
        let id = prescription.appointment_id.clone();
        if let Some(appointment) = self.appointments.iter_mut().find(|a| a.id == id) {
            appointment.status = AppointmentStatus::Completed;
            if !appointment.prescriptions.iter().any(|p| p.id == prescription.id) {
                appointment.prescriptions.push(prescription);
            }
        }
        self.refresh_selection(&id);
    }

    // ------------------------------------------------------------------
    // Derived values
    // ------------------------------------------------------------------

    pub fn stats(&self) -> DashboardStats {
        DashboardStats::for_local_today(&self.appointments)
    }

    pub fn stats_at<Tz: TimeZone>(&self, today: NaiveDate, tz: &Tz) -> DashboardStats {
        DashboardStats::compute(&self.appointments, today, tz)
    }

    pub fn todays_schedule(&self) -> Vec<&Appointment> {
        stats::todays_schedule(&self.appointments, Local::now().date_naive(), &Local)
    }

    pub fn recent(&self) -> &[Appointment] {
        stats::recent(&self.appointments)
    }

    pub fn listing(&self, query: &AppointmentQuery) -> Vec<&Appointment> {
        query.apply(&self.appointments)
    }
}

/// Message shown in place of an empty prescription list on the details page.
pub fn empty_prescriptions_message(appointment: &Appointment) -> &'static str {
    if appointment.status == AppointmentStatus::Pending {
        NO_PRESCRIPTION_PENDING
    } else {
        NO_PRESCRIPTION_CLOSED
    }
}

/// Owns the view state and the store, and runs the operations that touch both.
pub struct AppController<S> {
    store: S,
    state: ViewState,
}

impl<S: AppointmentStore> AppController<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            state: ViewState::new(),
        }
    }

    pub fn state(&self) -> &ViewState {
        &self.state
    }

    pub fn state_mut(&mut self) -> &mut ViewState {
        &mut self.state
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Loads (or reloads) the collection.
    ///
    /// On failure the previous collection is kept and an error notification is queued. The
    /// loading flag is cleared either way. Returns whether the load succeeded.
    pub async fn load(&mut self) -> bool {
        match self.store.list_appointments().await {
            Ok(appointments) => {
                tracing::info!(count = appointments.len(), "loaded appointments");
                self.state.replace_appointments(appointments);
                if let Some(id) = self.state.selected().map(|a| a.id.clone()) {
                    self.state.refresh_selection(&id);
                }
                true
            }
            Err(e) => {
                tracing::error!("Error loading appointments: {e}");
                self.state.finish_loading();
                self.state.notify(Notification::error(MSG_LOAD_FAILED));
                false
            }
        }
    }

    /// Submits the open prescription form through the workflow.
    ///
    /// On success the collection and selection are refreshed, the form is closed and a success
    /// notification is queued. On failure the form stays open with its values and one error
    /// notification is queued.
    pub async fn submit_prescription(&mut self) -> Result<Prescription, SubmitError> {
        let form = self
            .state
            .prescription_form
            .as_mut()
            .ok_or(FormError::NotOpen)?;
        let draft = form.to_draft()?;
        let patient_name = form.patient_name().to_string();
        form.set_submitting(true);

        let result = PrescriptionWorkflow::new(&self.store)
            .run(&draft, &self.state.appointments)
            .await;

        match result {
            Ok(outcome) => {
                self.state.replace_appointments(outcome.appointments);
                self.state.refresh_selection(&draft.appointment_id);
                self.state.close_prescription_form();
                self.state.notify(Notification::success(
                    MSG_PRESCRIPTION_CREATED,
                    format!("Prescription created successfully for {patient_name}"),
                ));
                Ok(outcome.prescription)
            }
            Err(e) => {
                tracing::error!("Error creating prescription: {e}");
                match e.completed_prescription() {
                    // Both writes landed; only the reload failed. Nothing is left to retry.
                    Some(prescription) => {
                        self.state.record_completion(prescription.clone());
                        self.state.close_prescription_form();
                    }
                    None => {
                        if let Some(form) = self.state.prescription_form.as_mut() {
                            form.set_submitting(false);
                        }
                    }
                }
                self.state.notify(Notification::error(e.user_message()));
                Err(e.into())
            }
        }
    }

    /// Cancels a pending appointment and reloads.
    pub async fn cancel(&mut self, id: &AppointmentId) -> Result<(), StatusChangeError> {
        match workflow::change_status(
            &self.store,
            id,
            AppointmentStatus::Cancelled,
            &self.state.appointments,
        )
        .await
        {
            Ok(appointments) => {
                self.state.replace_appointments(appointments);
                self.state.refresh_selection(id);
                Ok(())
            }
            Err(e) => {
                tracing::error!("Error updating appointment: {e}");
                self.state.notify(Notification::error(e.user_message()));
                Err(e)
            }
        }
    }
}
