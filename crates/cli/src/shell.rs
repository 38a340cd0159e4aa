//! Interactive page navigation over the view controller.

use crate::render::Renderer;
use chrono::TimeZone;
use clinic_core::{
    AppController, AppointmentId, AppointmentQuery, AppointmentStore, Page, SortKey,
    StatusFilter, SubmitError,
};
use std::str::FromStr;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, Lines};

const HELP: &str = "\
Commands:
  dashboard | appointments | patients | prescriptions   go to a page
  open <n|id>        open an appointment (n = number in the list)
  back               back to the appointments list
  home               back to the dashboard
  search [text]      set or clear the search term
  filter <status>    all, pending, completed or cancelled
  sort <key>         date, name or status
  prescribe          create a prescription for the open appointment
  submit             retry the open prescription form
  close              discard the open prescription form
  cancel             cancel the open appointment
  reload             reload appointments
  quit
";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShellCommand {
    Go(Page),
    Open(String),
    Back,
    Home,
    Search(String),
    Filter(StatusFilter),
    Sort(SortKey),
    Prescribe,
    Submit,
    Close,
    Cancel,
    Reload,
    Help,
    Quit,
}

impl FromStr for ShellCommand {
    type Err = String;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let line = line.trim();
        let (word, rest) = match line.split_once(char::is_whitespace) {
            Some((word, rest)) => (word, rest.trim()),
            None => (line, ""),
        };
        let command = match word.to_ascii_lowercase().as_str() {
            "dashboard" | "appointments" | "patients" | "prescriptions" => {
                ShellCommand::Go(word.parse().map_err(|e| format!("{e}"))?)
            }
            "open" if rest.is_empty() => return Err("usage: open <n|id>".into()),
            "open" => ShellCommand::Open(rest.to_string()),
            "back" => ShellCommand::Back,
            "home" => ShellCommand::Home,
            "search" => ShellCommand::Search(rest.to_string()),
            "filter" if rest.is_empty() => ShellCommand::Filter(StatusFilter::All),
            "filter" => ShellCommand::Filter(rest.parse().map_err(|e| format!("{e}"))?),
            "sort" if rest.is_empty() => ShellCommand::Sort(SortKey::default()),
            "sort" => ShellCommand::Sort(rest.parse().map_err(|e| format!("{e}"))?),
            "prescribe" => ShellCommand::Prescribe,
            "submit" => ShellCommand::Submit,
            "close" => ShellCommand::Close,
            "cancel" => ShellCommand::Cancel,
            "reload" => ShellCommand::Reload,
            "help" | "?" => ShellCommand::Help,
            "quit" | "exit" => ShellCommand::Quit,
            other => return Err(format!("unknown command: {other} (try `help`)")),
        };
        Ok(command)
    }
}

pub struct Shell<S, Tz: TimeZone> {
    controller: AppController<S>,
    query: AppointmentQuery,
    renderer: Renderer<Tz>,
}

impl<S: AppointmentStore, Tz: TimeZone> Shell<S, Tz> {
    pub fn new(controller: AppController<S>, renderer: Renderer<Tz>) -> Self {
        Self {
            controller,
            query: AppointmentQuery::default(),
            renderer,
        }
    }

    pub fn controller(&self) -> &AppController<S> {
        &self.controller
    }

    /// Reads commands from `input` until `quit` or end of input, rendering the page after each.
    pub async fn run<R, W>(&mut self, input: R, mut output: W) -> anyhow::Result<()>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let mut lines = input.lines();
        self.controller.load().await;
        self.show(&mut output).await?;

        loop {
            write(&mut output, "> ").await?;
            let Some(line) = lines.next_line().await? else {
                break;
            };
            if line.trim().is_empty() {
                continue;
            }
            let command = match line.parse::<ShellCommand>() {
                Ok(command) => command,
                Err(message) => {
                    write(&mut output, &format!("{message}\n")).await?;
                    continue;
                }
            };
            if command == ShellCommand::Quit {
                break;
            }
            if command == ShellCommand::Help {
                write(&mut output, HELP).await?;
                continue;
            }
            self.execute(command, &mut lines, &mut output).await?;
            self.show(&mut output).await?;
        }
        Ok(())
    }

    async fn execute<R, W>(
        &mut self,
        command: ShellCommand,
        lines: &mut Lines<R>,
        output: &mut W,
    ) -> anyhow::Result<()>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        tracing::debug!(?command, "shell command");
        match command {
            ShellCommand::Go(page) => self.controller.state_mut().navigate(page),
            ShellCommand::Back => self.controller.state_mut().back_to_appointments(),
            ShellCommand::Home => self.controller.state_mut().back_to_dashboard(),
            ShellCommand::Open(target) => {
                let id = self.resolve(&target);
                if !self.controller.state_mut().select_by_id(&id) {
                    write(output, &format!("No appointment matches {target}\n")).await?;
                }
            }
            ShellCommand::Search(term) => {
                self.query.search = term;
                self.controller.state_mut().navigate(Page::Appointments);
            }
            ShellCommand::Filter(status) => {
                self.query.status = status;
                self.controller.state_mut().navigate(Page::Appointments);
            }
            ShellCommand::Sort(sort) => {
                self.query.sort = sort;
                self.controller.state_mut().navigate(Page::Appointments);
            }
            ShellCommand::Prescribe => self.prescribe(lines, output).await?,
            ShellCommand::Submit => self.submit(output).await?,
            ShellCommand::Close => self.controller.state_mut().close_prescription_form(),
            ShellCommand::Cancel => {
                let Some(id) = self.controller.state().selected().map(|a| a.id.clone()) else {
                    write(output, "Open an appointment first\n").await?;
                    return Ok(());
                };
                // A failure is already queued as a notification.
                let _ = self.controller.cancel(&id).await;
            }
            ShellCommand::Reload => {
                self.controller.load().await;
            }
            ShellCommand::Help | ShellCommand::Quit => {}
        }
        Ok(())
    }

    /// A list number refers to the current listing; anything else is taken as an id.
    fn resolve(&self, target: &str) -> AppointmentId {
        if let Ok(n) = target.parse::<usize>() {
            let listed = self.controller.state().listing(&self.query);
            if let Some(appointment) = n.checked_sub(1).and_then(|i| listed.get(i)) {
                return appointment.id.clone();
            }
        }
        AppointmentId::from(target)
    }

    async fn prescribe<R, W>(&mut self, lines: &mut Lines<R>, output: &mut W) -> anyhow::Result<()>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let Some(selected) = self.controller.state().selected() else {
            write(output, "Open an appointment first\n").await?;
            return Ok(());
        };
        if !selected.offers_prescription() {
            write(
                output,
                "Prescriptions can only be created for pending appointments without one\n",
            )
            .await?;
            return Ok(());
        }
        self.controller.state_mut().open_prescription_form()?;

        let mut fields = Vec::with_capacity(3);
        for label in ["Medicine *: ", "Dosage *: ", "Additional Notes: "] {
            write(output, label).await?;
            match lines.next_line().await? {
                Some(value) => fields.push(value),
                None => {
                    self.controller.state_mut().close_prescription_form();
                    return Ok(());
                }
            }
        }
        if let Some(form) = self.controller.state_mut().prescription_form_mut() {
            form.note = fields.pop().unwrap_or_default();
            form.dosage = fields.pop().unwrap_or_default();
            form.medicine = fields.pop().unwrap_or_default();
        }
        self.submit(output).await
    }

    async fn submit<W: AsyncWrite + Unpin>(&mut self, output: &mut W) -> anyhow::Result<()> {
        let Some(form) = self.controller.state().prescription_form() else {
            write(output, "No prescription form is open\n").await?;
            return Ok(());
        };
        if !form.can_submit() {
            write(output, "Medicine and dosage are required\n").await?;
            return Ok(());
        }
        match self.controller.submit_prescription().await {
            Ok(_) => {}
            Err(SubmitError::Form(e)) => write(output, &format!("{e}\n")).await?,
            Err(SubmitError::Workflow(_)) => {
                if self.controller.state().prescription_form().is_some() {
                    write(output, "Type `submit` to retry or `close` to discard\n").await?
                }
            }
        }
        Ok(())
    }

    async fn show<W: AsyncWrite + Unpin>(&mut self, output: &mut W) -> anyhow::Result<()> {
        let state = self.controller.state();
        let listed = state.listing(&self.query);
        let page = self.renderer.page(state, &self.query, &listed);
        write(output, &page).await?;
        self.controller.state_mut().take_notifications();
        Ok(())
    }
}

async fn write<W: AsyncWrite + Unpin>(output: &mut W, text: &str) -> std::io::Result<()> {
    output.write_all(text.as_bytes()).await?;
    output.flush().await
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{FixedOffset, NaiveDate};
    use clinic_core::{Appointment, AppointmentStatus, MemoryStore, StoreOperation};
    use serde_json::json;
    use std::sync::Arc;

    fn appointment(id: &str, name: &str, time: &str, status: &str) -> Appointment {
        serde_json::from_value(json!({
            "id": id,
            "patient_name": name,
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

    fn store() -> Arc<MemoryStore> {
        Arc::new(MemoryStore::with_appointments(vec![
            appointment("A1", "Maya Patel", "2026-10-18T09:30:00Z", "pending"),
            appointment("A2", "Liam Chen", "2026-10-17T14:00:00Z", "cancelled"),
        ]))
    }

    fn shell(store: Arc<MemoryStore>) -> Shell<Arc<MemoryStore>, FixedOffset> {
        Shell::new(
            AppController::new(store),
            Renderer::new(
                FixedOffset::east_opt(0).unwrap(),
                NaiveDate::from_ymd_opt(2026, 10, 18).unwrap(),
            ),
        )
    }

    async fn run(shell: &mut Shell<Arc<MemoryStore>, FixedOffset>, script: &str) -> String {
        let mut output = Vec::new();
        shell.run(script.as_bytes(), &mut output).await.unwrap();
        String::from_utf8(output).unwrap()
    }

    #[test]
    fn parses_commands_with_arguments() {
        assert_eq!(
            "open 2".parse::<ShellCommand>(),
            Ok(ShellCommand::Open("2".into()))
        );
        assert_eq!(
            "filter pending".parse::<ShellCommand>(),
            Ok(ShellCommand::Filter(StatusFilter::Only(AppointmentStatus::Pending)))
        );
        assert_eq!(
            "sort name".parse::<ShellCommand>(),
            Ok(ShellCommand::Sort(SortKey::Name))
        );
        assert_eq!(
            "search  chest pain ".parse::<ShellCommand>(),
            Ok(ShellCommand::Search("chest pain".into()))
        );
        assert_eq!(
            "Patients".parse::<ShellCommand>(),
            Ok(ShellCommand::Go(Page::Patients))
        );
    }

    #[test]
    fn rejects_unknown_input() {
        assert!("open".parse::<ShellCommand>().is_err());
        assert!("filter archived".parse::<ShellCommand>().is_err());
        assert!("dance".parse::<ShellCommand>().is_err());
    }

    #[tokio::test]
    async fn prescribing_from_the_list_completes_the_appointment() {
        let store = store();
        let mut shell = shell(store.clone());
        let out = run(
            &mut shell,
            "appointments\nopen 1\nprescribe\nAmoxicillin\n500mg twice daily\n\nquit\n",
        )
        .await;

        assert!(out.contains("Prescription created successfully for Maya Patel"));
        let state = shell.controller().state();
        assert!(state.prescription_form().is_none());
        let selected = state.selected().unwrap();
        assert_eq!(selected.status, AppointmentStatus::Completed);
        assert_eq!(selected.prescriptions[0].medicine, "Amoxicillin");
        assert_eq!(selected.prescriptions[0].note, None);
    }

    #[tokio::test]
    async fn failed_submission_keeps_the_form_for_retry() {
        let store = store();
        store.fail_next(StoreOperation::CreatePrescription);
        let mut shell = shell(store.clone());
        let out = run(&mut shell, "open A1\nprescribe\nIbuprofen\n200mg\nwith food\n").await;

        assert!(out.contains("! Error: Failed to create prescription"));
        let form = shell.controller().state().prescription_form().unwrap();
        assert_eq!(form.medicine, "Ibuprofen");
        assert_eq!(form.note, "with food");
        assert!(!form.is_submitting());

        let out = run(&mut shell, "submit\n").await;
        assert!(out.contains("Prescription created successfully for Maya Patel"));
    }

    #[tokio::test]
    async fn closed_appointments_do_not_offer_prescribing() {
        let mut shell = shell(store());
        let out = run(&mut shell, "open A2\nprescribe\n").await;
        assert!(out.contains("Prescriptions can only be created for pending appointments"));
        assert!(shell.controller().state().prescription_form().is_none());
    }

    #[tokio::test]
    async fn search_without_matches_shows_empty_state() {
        let mut shell = shell(store());
        let out = run(&mut shell, "search nobody\n").await;
        assert!(out.contains("Try adjusting your search or filter criteria"));
        assert_eq!(shell.controller().state().page(), Page::Appointments);
    }

    #[tokio::test]
    async fn load_failure_is_reported_once_and_reload_recovers() {
        let store = store();
        store.fail_next(StoreOperation::ListAppointments);
        let mut shell = shell(store);
        let out = run(&mut shell, "reload\n").await;
        assert_eq!(out.matches("Failed to load appointments").count(), 1);
        assert_eq!(shell.controller().state().appointments().len(), 2);
    }

    #[tokio::test]
    async fn cancelling_the_open_appointment() {
        let mut shell = shell(store());
        run(&mut shell, "open A1\ncancel\nback\n").await;
        let state = shell.controller().state();
        assert_eq!(state.page(), Page::Appointments);
        assert!(state.selected().is_none());
        assert_eq!(
            state.appointments()[0].status,
            AppointmentStatus::Cancelled
        );
    }
}
