use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use clinic_core::{
    open_store, AppController, AppointmentId, AppointmentQuery, AppointmentStore, SortKey,
    StatusFilter, StoreConfig,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod render;
mod shell;

use render::Renderer;
use shell::Shell;

#[derive(Parser)]
#[command(name = "clinic")]
#[command(about = "Clinic appointments and prescriptions CLI")]
struct Cli {
    /// Store backend: postgrest or memory
    #[arg(long, global = true, env = "CLINIC_STORE_BACKEND")]
    backend: Option<String>,
    /// Base URL of the hosted store
    #[arg(long, global = true, env = "CLINIC_STORE_URL")]
    url: Option<String>,
    /// API key of the hosted store
    #[arg(long, global = true, env = "CLINIC_STORE_KEY", hide_env_values = true)]
    key: Option<String>,
    /// JSON seed file for the memory backend
    #[arg(long, global = true, env = "CLINIC_SEED_FILE")]
    seed_file: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Show dashboard statistics, today's schedule and recent appointments
    Dashboard,
    /// List appointments
    List {
        /// Match patient name, symptoms or doctor name
        #[arg(long)]
        search: Option<String>,
        /// all, pending, completed or cancelled
        #[arg(long, default_value = "all")]
        status: StatusFilter,
        /// date, name or status
        #[arg(long, default_value = "date")]
        sort: SortKey,
    },
    /// Show one appointment with its prescriptions
    Show {
        /// Appointment id
        id: String,
    },
    /// Create a prescription and complete the appointment
    Prescribe {
        /// Appointment id
        id: String,
        #[arg(long)]
        medicine: String,
        #[arg(long)]
        dosage: String,
        #[arg(long)]
        note: Option<String>,
    },
    /// Cancel a pending appointment
    Cancel {
        /// Appointment id
        id: String,
    },
    /// Interactive page navigation
    Shell,
}

type Controller = AppController<std::sync::Arc<dyn AppointmentStore>>;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::from_default_env().add_directive("clinic_core=warn".parse()?))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let Some(command) = cli.command else {
        println!("Use 'clinic --help' for commands");
        return Ok(());
    };

    let cfg = StoreConfig::from_env_values(cli.backend, cli.url, cli.key, cli.seed_file)?;
    let mut controller = AppController::new(open_store(&cfg)?);
    let renderer = Renderer::local();

    if let Commands::Shell = command {
        let mut shell = Shell::new(controller, renderer);
        return shell
            .run(tokio::io::BufReader::new(tokio::io::stdin()), tokio::io::stdout())
            .await;
    }

    load(&mut controller).await?;

    match command {
        Commands::Dashboard => {
            print!("{}", renderer.dashboard(controller.state()));
        }
        Commands::List {
            search,
            status,
            sort,
        } => {
            let query = AppointmentQuery {
                search: search.unwrap_or_default(),
                status,
                sort,
            };
            let state = controller.state();
            print!("{}", renderer.appointments(state, &query, &state.listing(&query)));
        }
        Commands::Show { id } => {
            let appointment = select(&mut controller, &id)?;
            print!("{}", renderer.details(appointment));
        }
        Commands::Prescribe {
            id,
            medicine,
            dosage,
            note,
        } => {
            select(&mut controller, &id)?;
            let form = controller.state_mut().open_prescription_form()?;
            form.medicine = medicine;
            form.dosage = dosage;
            form.note = note.unwrap_or_default();

            let result = controller.submit_prescription().await;
            print_notifications(&mut controller);
            let prescription = result.context("prescription was not created")?;
            println!("Prescription {} stored", prescription.id);
        }
        Commands::Cancel { id } => {
            select(&mut controller, &id)?;
            let result = controller.cancel(&AppointmentId::from(id.as_str())).await;
            print_notifications(&mut controller);
            result.context("appointment was not cancelled")?;
            if let Some(appointment) = controller.state().selected() {
                print!("{}", renderer.details(appointment));
            }
        }
        Commands::Shell => {}
    }

    Ok(())
}

async fn load(controller: &mut Controller) -> anyhow::Result<()> {
    if !controller.load().await {
        print_notifications(controller);
        bail!("could not load appointments");
    }
    Ok(())
}

fn select<'a>(
    controller: &'a mut Controller,
    id: &str,
) -> anyhow::Result<&'a clinic_core::Appointment> {
    let id = AppointmentId::from(id);
    if !controller.state_mut().select_by_id(&id) {
        bail!("appointment {id} not found");
    }
    controller
        .state()
        .selected()
        .context("selection was not kept")
}

fn print_notifications(controller: &mut Controller) {
    for notification in controller.state_mut().take_notifications() {
        eprint!("{}", render::notification_line(&notification));
    }
}
