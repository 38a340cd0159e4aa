//! Plain-text rendering of the clinic pages.
//!
//! Every function returns a `String`; nothing here touches the terminal or the store.

use chrono::{DateTime, Local, NaiveDate, TimeZone, Utc};
use clinic_core::constants::NO_APPOINTMENTS_TODAY;
use clinic_core::view::empty_prescriptions_message;
use clinic_core::{
    stats, Appointment, AppointmentQuery, DashboardStats, Notification, NotificationKind, Page,
    PrescriptionForm, StatusFilter, ViewState,
};

const APP_NAME: &str = "MediCare Pro";
const RULE: &str = "----------------------------------------";

/// Renders pages relative to a calendar day in a time zone.
pub struct Renderer<Tz: TimeZone> {
    tz: Tz,
    /// `None` follows the clock, so a long-running shell moves past midnight.
    today: Option<NaiveDate>,
}

impl Renderer<Local> {
    pub fn local() -> Self {
        Self::following_clock(Local)
    }
}

impl<Tz: TimeZone> Renderer<Tz> {
    /// Pinned to `today`.
    pub fn new(tz: Tz, today: NaiveDate) -> Self {
        Self {
            tz,
            today: Some(today),
        }
    }

    /// Takes "today" from the current time in `tz` on every render.
    pub fn following_clock(tz: Tz) -> Self {
        Self { tz, today: None }
    }

    pub fn today(&self) -> NaiveDate {
        self.today
            .unwrap_or_else(|| Utc::now().with_timezone(&self.tz).date_naive())
    }

    fn date(&self, t: &DateTime<Utc>) -> String {
        t.with_timezone(&self.tz)
            .naive_local()
            .format("%b %-d, %Y")
            .to_string()
    }

    fn time(&self, t: &DateTime<Utc>) -> String {
        t.with_timezone(&self.tz)
            .naive_local()
            .format("%H:%M")
            .to_string()
    }

    /// The page the state is on, including the open form and any notifications.
    ///
    /// `listed` holds what the appointments page shows, so numbers match the shell's `open <n>`.
    pub fn page(
        &self,
        state: &ViewState,
        query: &AppointmentQuery,
        listed: &[&Appointment],
    ) -> String {
        let mut out = navigation(state.page());
        out.push('\n');

        if state.is_loading() {
            out.push_str(&loading());
        } else {
            let body = match state.page() {
                Page::Dashboard => self.dashboard(state),
                Page::Appointments => self.appointments(state, query, listed),
                Page::AppointmentDetails => match state.selected() {
                    Some(appointment) => self.details(appointment),
                    None => String::new(),
                },
                page => placeholder(page),
            };
            out.push_str(&body);
        }

        if let Some(form) = state.prescription_form() {
            out.push('\n');
            out.push_str(&prescription_form(form));
        }
        for notification in state.notifications() {
            out.push('\n');
            out.push_str(&notification_line(notification));
        }
        out
    }

    pub fn dashboard(&self, state: &ViewState) -> String {
        let appointments = state.appointments();
        let today = self.today();
        let mut lines = vec![
            format!("Welcome to {APP_NAME}"),
            String::new(),
            stats_line(&state.stats_at(today, &self.tz)),
            String::new(),
            "Today's Schedule".to_string(),
        ];

        let schedule = stats::todays_schedule(appointments, today, &self.tz);
        if schedule.is_empty() {
            lines.push(format!("  {NO_APPOINTMENTS_TODAY}"));
        }
        lines.extend(schedule.iter().map(|a| {
            format!(
                "  {}  {} ({})  {}",
                self.time(&a.appointment_time),
                a.patient_name,
                a.doctor_name,
                a.status
            )
        }));
        lines.push(String::new());
        lines.push("Recent Appointments".to_string());

        let mut out = block(lines);
        for a in stats::recent(appointments) {
            out.push_str(&self.card(a));
        }
        out
    }

    pub fn appointments(
        &self,
        state: &ViewState,
        query: &AppointmentQuery,
        listed: &[&Appointment],
    ) -> String {
        let mut out = block(vec![
            "Appointments Management".to_string(),
            String::new(),
            stats_line(&state.stats_at(self.today(), &self.tz)),
            String::new(),
            query_summary(query),
            String::new(),
        ]);

        if listed.is_empty() {
            out.push_str(&block(vec![
                "No appointments found".to_string(),
                query.empty_state_message().to_string(),
            ]));
            return out;
        }
        for (n, a) in listed.iter().enumerate() {
            out.push_str(&format!("[{}]\n", n + 1));
            out.push_str(&self.card(a));
        }
        out
    }

    /// One appointment summary as shown in lists.
    pub fn card(&self, a: &Appointment) -> String {
        block(vec![
            RULE.to_string(),
            format!("{}  (Age: {})  [{}]", a.patient_name, a.patient_age, a.status),
            format!(
                "{} {}",
                self.date(&a.appointment_time),
                self.time(&a.appointment_time)
            ),
            format!("Symptoms: {}", a.symptoms),
            format!("Doctor: {}", a.doctor_name),
            format!("id: {}", a.id),
        ])
    }

    pub fn details(&self, a: &Appointment) -> String {
        let mut lines = vec![
            "< Back to Appointments".to_string(),
            String::new(),
            format!("{}  [{}]", a.patient_name, a.status),
            format!("Age: {} years", a.patient_age),
            format!("Appointment Date: {}", self.date(&a.appointment_time)),
            format!("Time: {}", self.time(&a.appointment_time)),
        ];
        if let Some(email) = &a.patient_email {
            lines.push(format!("Email: {email}"));
        }
        if let Some(phone) = &a.contact_number {
            lines.push(format!("Phone: {phone}"));
        }
        lines.push(format!("Assigned Doctor: {}", a.doctor_name));
        lines.push(format!("Symptoms: {}", a.symptoms));
        lines.push(String::new());

        lines.push("Prescriptions".to_string());
        if a.prescriptions.is_empty() {
            lines.push(format!("  {}", empty_prescriptions_message(a)));
        }
        for p in &a.prescriptions {
            lines.push(format!("  {}", p.medicine));
            lines.push(format!("    Dosage: {}", p.dosage));
            if let Some(note) = &p.note {
                lines.push(format!("    Note: {note}"));
            }
            lines.push(format!("    Created {}", self.date(&p.created_at)));
        }

        let actions = if a.offers_prescription() {
            Some("prescribe, cancel")
        } else if a.is_pending() {
            Some("cancel")
        } else {
            None
        };
        if let Some(actions) = actions {
            lines.push(String::new());
            lines.push(format!("Actions: {actions}"));
        }
        block(lines)
    }
}

/// Newline-terminated lines joined into one string.
fn block(lines: Vec<String>) -> String {
    lines.into_iter().map(|line| line + "\n").collect()
}

pub fn navigation(current: Page) -> String {
    let items: Vec<String> = Page::NAVIGATION
        .iter()
        .map(|page| {
            let active = current == *page
                || (current == Page::AppointmentDetails && *page == Page::Appointments);
            if active {
                format!("[{}]", page.title())
            } else {
                page.title().to_string()
            }
        })
        .collect();
    format!("{APP_NAME} | {}\n", items.join(" | "))
}

pub fn stats_line(stats: &DashboardStats) -> String {
    format!(
        "Total: {}  Pending: {}  Completed: {}  Cancelled: {}  Today: {}",
        stats.total, stats.pending, stats.completed, stats.cancelled, stats.today
    )
}

fn query_summary(query: &AppointmentQuery) -> String {
    let status = match query.status {
        StatusFilter::All => "All Statuses".to_string(),
        StatusFilter::Only(status) => status.to_string(),
    };
    let search = if query.search.trim().is_empty() {
        "-".to_string()
    } else {
        format!("\"{}\"", query.search.trim())
    };
    format!("Search: {search}  Status: {status}  Sort: {}", query.sort.as_str())
}

pub fn prescription_form(form: &PrescriptionForm) -> String {
    let mut lines = vec![
        "Create Prescription".to_string(),
        format!("Patient: {}", form.patient_name()),
        format!("Medicine *: {}", form.medicine),
        format!("Dosage *: {}", form.dosage),
        format!("Additional Notes: {}", form.note),
    ];
    if form.is_submitting() {
        lines.push("Creating...".to_string());
    }
    block(lines)
}

pub fn placeholder(page: Page) -> String {
    format!("{}\nThis feature is coming soon!\n", page.title())
}

pub fn loading() -> String {
    "Loading appointments...\n".to_string()
}

pub fn notification_line(n: &Notification) -> String {
    match n.kind {
        NotificationKind::Success => format!("* {}: {}\n", n.title, n.description),
        NotificationKind::Error => format!("! {}: {}\n", n.title, n.description),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::FixedOffset;
    use clinic_core::AppointmentStatus;
    use serde_json::json;

    fn appointment(id: &str, time: &str, status: &str) -> Appointment {
        serde_json::from_value(json!({
            "id": id,
            "patient_name": format!("Patient {id}"),
            "patient_age": 40,
            "symptoms": "Headache",
            "appointment_time": time,
            "status": status,
            "doctor_name": "Dr. Reyes",
            "created_at": "2026-10-01T08:00:00Z",
            "updated_at": "2026-10-01T08:00:00Z"
        }))
        .unwrap()
    }

    fn renderer() -> Renderer<FixedOffset> {
        Renderer::new(
            FixedOffset::east_opt(0).unwrap(),
            NaiveDate::from_ymd_opt(2026, 10, 18).unwrap(),
        )
    }

    fn loaded(appointments: Vec<Appointment>) -> ViewState {
        let mut state = ViewState::new();
        state.replace_appointments(appointments);
        state
    }

    #[test]
    fn navigation_marks_appointments_while_on_details() {
        let nav = navigation(Page::AppointmentDetails);
        assert!(nav.contains("[Appointments]"));
        assert!(!nav.contains("[Dashboard]"));
    }

    #[test]
    fn loading_state_hides_page_body() {
        let state = ViewState::new();
        let out = renderer().page(&state, &AppointmentQuery::default(), &[]);
        assert!(out.contains("Loading appointments..."));
        assert!(!out.contains("Today's Schedule"));
    }

    #[test]
    fn dashboard_shows_empty_schedule_message() {
        let state = loaded(vec![appointment("A1", "2026-10-20T09:00:00Z", "pending")]);
        let out = renderer().dashboard(&state);
        assert!(out.contains(NO_APPOINTMENTS_TODAY));
        assert!(out.contains("Total: 1  Pending: 1"));
        assert!(out.contains("Patient A1"));
    }

    #[test]
    fn dashboard_lists_todays_appointments() {
        let state = loaded(vec![appointment("A1", "2026-10-18T09:30:00Z", "pending")]);
        let out = renderer().dashboard(&state);
        assert!(out.contains("09:30  Patient A1 (Dr. Reyes)  pending"));
        assert!(out.contains("Today: 1"));
    }

    #[test]
    fn empty_filtered_list_suggests_adjusting_filters() {
        let state = loaded(vec![appointment("A1", "2026-10-18T09:30:00Z", "pending")]);
        let query = AppointmentQuery {
            search: "nobody".into(),
            ..Default::default()
        };
        let out = renderer().appointments(&state, &query, &[]);
        assert!(out.contains("No appointments found"));
        assert!(out.contains("Try adjusting your search or filter criteria"));
    }

    #[test]
    fn details_offer_prescribe_only_for_pending_without_prescriptions() {
        let pending = appointment("A1", "2026-10-18T09:30:00Z", "pending");
        let out = renderer().details(&pending);
        assert!(out.contains("Actions: prescribe, cancel"));

        let mut done = pending.clone();
        done.status = AppointmentStatus::Completed;
        let out = renderer().details(&done);
        assert!(!out.contains("Actions"));
        assert!(out.contains("No prescription was created for this appointment."));
    }

    #[test]
    fn placeholder_pages_are_coming_soon() {
        assert_eq!(
            placeholder(Page::Patients),
            "Patients Management\nThis feature is coming soon!\n"
        );
    }

    #[test]
    fn error_notifications_are_flagged() {
        let line = notification_line(&Notification::error("Failed to load appointments"));
        assert_eq!(line, "! Error: Failed to load appointments\n");
    }

    #[test]
    fn clock_renderer_reads_today_at_render_time() {
        let tz = FixedOffset::east_opt(9 * 3600).unwrap();
        let clock = Renderer::following_clock(tz);
        let before = Utc::now().with_timezone(&tz).date_naive();
        let today = clock.today();
        let after = Utc::now().with_timezone(&tz).date_naive();
        assert!(today == before || today == after);

        assert_eq!(
            renderer().today(),
            NaiveDate::from_ymd_opt(2026, 10, 18).unwrap()
        );
    }

    #[test]
    fn card_is_one_line_per_field() {
        let out = renderer().card(&appointment("A1", "2026-10-18T09:30:00Z", "pending"));
        assert_eq!(
            out,
            format!(
                "{RULE}\nPatient A1  (Age: 40)  [pending]\nOct 18, 2026 09:30\n\
                 Symptoms: Headache\nDoctor: Dr. Reyes\nid: A1\n"
            )
        );
    }
}
