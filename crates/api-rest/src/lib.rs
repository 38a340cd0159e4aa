//! # API REST
//!
//! REST API for the clinic front-end.
//!
//! Handles:
//! - HTTP endpoints with axum
//! - OpenAPI/Swagger documentation
//! - REST-specific concerns (JSON serialization, CORS, status codes)
//!
//! Uses `api-shared` for wire types and `clinic-core` for every operation.

#![warn(rust_2018_idioms)]

use api_shared::{
    CreatePrescriptionReq, CreatePrescriptionRes, DashboardRes, HealthRes, HealthService,
    ListAppointmentsRes, UpdateStatusReq, UpdateStatusRes,
};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
    routing::{get, post, put},
    Router,
};
use clinic_core::constants::MSG_LOAD_FAILED;
use clinic_core::{
    stats, workflow, Appointment, AppointmentId, AppointmentQuery, AppointmentStatus,
    AppointmentStore, DashboardStats, FormError, NewPrescription, Prescription,
    PrescriptionWorkflow, SortKey, StatusChangeError, StatusFilter, WorkflowError,
};
use chrono::{Local, NaiveDate};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use utoipa::{IntoParams, OpenApi};
use utoipa_swagger_ui::SwaggerUi;

type ApiError = (StatusCode, &'static str);

/// Application state shared across REST handlers.
#[derive(Clone)]
pub struct AppState {
    store: Arc<dyn AppointmentStore>,
}

impl AppState {
    pub fn new(store: Arc<dyn AppointmentStore>) -> Self {
        Self { store }
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health,
        dashboard,
        list_appointments,
        get_appointment,
        create_prescription,
        update_status,
    ),
    components(schemas(
        HealthRes,
        DashboardRes,
        ListAppointmentsRes,
        CreatePrescriptionReq,
        CreatePrescriptionRes,
        UpdateStatusReq,
        UpdateStatusRes,
        Appointment,
        AppointmentId,
        AppointmentStatus,
        Prescription,
        clinic_core::PrescriptionId,
        DashboardStats,
        SortKey,
    ))
)]
pub struct ApiDoc;

/// Builds the REST router over `state`, including the Swagger UI.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/dashboard", get(dashboard))
        .route("/appointments", get(list_appointments))
        .route("/appointments/:id", get(get_appointment))
        .route("/appointments/:id/prescriptions", post(create_prescription))
        .route("/appointments/:id/status", put(update_status))
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn load(state: &AppState) -> Result<Vec<Appointment>, ApiError> {
    state.store.list_appointments().await.map_err(|e| {
        tracing::error!("Error loading appointments: {e}");
        (StatusCode::BAD_GATEWAY, MSG_LOAD_FAILED)
    })
}

fn find(appointments: Vec<Appointment>, id: &AppointmentId) -> Option<Appointment> {
    appointments.into_iter().find(|a| &a.id == id)
}

#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Health check response", body = HealthRes)
    )
)]
/// Health check endpoint for the REST API
async fn health(State(_state): State<AppState>) -> Json<HealthRes> {
    Json(HealthService::check_health())
}

#[utoipa::path(
    get,
    path = "/dashboard",
    responses(
        (status = 200, description = "Dashboard stats and schedule", body = DashboardRes),
        (status = 502, description = "Appointment store unavailable")
    )
)]
/// Dashboard statistics, today's schedule and the most recent appointments.
///
/// "Today" is the server's local calendar date.
async fn dashboard(State(state): State<AppState>) -> Result<Json<DashboardRes>, ApiError> {
    let appointments = load(&state).await?;
    let today = local_today();
    let stats = DashboardStats::compute(&appointments, today, &Local);
    let schedule = stats::todays_schedule(&appointments, today, &Local)
        .into_iter()
        .cloned()
        .collect();
    let recent = stats::recent(&appointments).to_vec();
    Ok(Json(DashboardRes {
        stats,
        today: schedule,
        recent,
    }))
}

fn local_today() -> NaiveDate {
    Local::now().date_naive()
}

/// Query parameters of the appointments list.
#[derive(Debug, Default, serde::Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListParams {
    /// Case-insensitive text matched against patient name, symptoms and doctor name.
    search: Option<String>,
    /// `all`, `pending`, `completed` or `cancelled`.
    status: Option<String>,
    /// `date` (default), `name` or `status`.
    sort: Option<String>,
}

impl ListParams {
    fn into_query(self) -> Result<AppointmentQuery, ApiError> {
        let status = match self.status.as_deref() {
            Some(s) if !s.is_empty() => s
                .parse()
                .map_err(|_| (StatusCode::BAD_REQUEST, "invalid status filter"))?,
            _ => StatusFilter::All,
        };
        let sort = match self.sort.as_deref() {
            Some(s) if !s.is_empty() => s
                .parse()
                .map_err(|_| (StatusCode::BAD_REQUEST, "invalid sort key"))?,
            _ => SortKey::default(),
        };
        Ok(AppointmentQuery {
            search: self.search.unwrap_or_default(),
            status,
            sort,
        })
    }
}

#[utoipa::path(
    get,
    path = "/appointments",
    params(ListParams),
    responses(
        (status = 200, description = "Filtered and sorted appointments", body = ListAppointmentsRes),
        (status = 400, description = "Invalid status filter or sort key"),
        (status = 502, description = "Appointment store unavailable")
    )
)]
/// List appointments with search, status filter and sort applied.
///
/// # Errors
/// Returns `400 Bad Request` for an unknown status or sort key and `502 Bad Gateway` if the
/// store cannot be read.
async fn list_appointments(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> Result<Json<ListAppointmentsRes>, ApiError> {
    let query = params.into_query()?;
    let appointments = load(&state).await?;
    let stats = DashboardStats::compute(&appointments, local_today(), &Local);
    let listed: Vec<Appointment> = query.apply(&appointments).into_iter().cloned().collect();
    let empty_message = listed
        .is_empty()
        .then(|| query.empty_state_message().to_string());
    Ok(Json(ListAppointmentsRes {
        appointments: listed,
        stats,
        empty_message,
    }))
}

#[utoipa::path(
    get,
    path = "/appointments/{id}",
    params(("id" = String, Path, description = "Appointment id")),
    responses(
        (status = 200, description = "The appointment with its prescriptions", body = Appointment),
        (status = 404, description = "Appointment not found"),
        (status = 502, description = "Appointment store unavailable")
    )
)]
/// Fetch one appointment with its prescriptions.
async fn get_appointment(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Appointment>, ApiError> {
    let id = AppointmentId::from(id);
    let appointments = load(&state).await?;
    find(appointments, &id)
        .map(Json)
        .ok_or((StatusCode::NOT_FOUND, "Appointment not found"))
}

#[utoipa::path(
    post,
    path = "/appointments/{id}/prescriptions",
    params(("id" = String, Path, description = "Appointment id")),
    request_body = CreatePrescriptionReq,
    responses(
        (status = 201, description = "Prescription created and appointment completed", body = CreatePrescriptionRes),
        (status = 400, description = "Medicine or dosage missing"),
        (status = 404, description = "Appointment not found"),
        (status = 409, description = "Appointment is not pending"),
        (status = 502, description = "Store failure; the prescription may exist on a still-pending appointment")
    )
)]
/// Create a prescription and complete its appointment.
///
/// Runs insert, status update and reload in order. A `502` after the insert succeeded means the
/// prescription was stored but the appointment is still pending; no rollback is attempted.
///
/// # Errors
/// Returns `400` for blank fields, `404` for an unknown appointment, `409` if the appointment is
/// no longer pending and `502` for any store failure.
async fn create_prescription(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<CreatePrescriptionReq>,
) -> Result<(StatusCode, Json<CreatePrescriptionRes>), ApiError> {
    let id = AppointmentId::from(id);
    let draft = NewPrescription::from_fields(id.clone(), &req.medicine, &req.dosage, req.note.as_deref())
        .map_err(|e| {
            let message = match e {
                FormError::MissingMedicine => "medicine is required",
                FormError::MissingDosage => "dosage is required",
                _ => "invalid prescription",
            };
            (StatusCode::BAD_REQUEST, message)
        })?;

    let known = load(&state).await?;
    if !known.iter().any(|a| a.id == id) {
        return Err((StatusCode::NOT_FOUND, "Appointment not found"));
    }

    match PrescriptionWorkflow::new(state.store.as_ref())
        .run(&draft, &known)
        .await
    {
        Ok(outcome) => {
            let appointment = outcome.appointment().cloned();
            Ok((
                StatusCode::CREATED,
                Json(CreatePrescriptionRes {
                    prescription: outcome.prescription,
                    appointment,
                }),
            ))
        }
        Err(WorkflowError::NotPending { .. }) => Err((
            StatusCode::CONFLICT,
            "Prescriptions can only be added to pending appointments",
        )),
        Err(e) => {
            tracing::error!("Create prescription error: {e}");
            Err((StatusCode::BAD_GATEWAY, e.user_message()))
        }
    }
}

#[utoipa::path(
    put,
    path = "/appointments/{id}/status",
    params(("id" = String, Path, description = "Appointment id")),
    request_body = UpdateStatusReq,
    responses(
        (status = 200, description = "Status changed", body = UpdateStatusRes),
        (status = 404, description = "Appointment not found"),
        (status = 409, description = "Transition not allowed"),
        (status = 502, description = "Appointment store unavailable")
    )
)]
/// Change an appointment's status. Only pending appointments can move.
async fn update_status(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<UpdateStatusReq>,
) -> Result<Json<UpdateStatusRes>, ApiError> {
    let id = AppointmentId::from(id);
    let known = load(&state).await?;
    if !known.iter().any(|a| a.id == id) {
        return Err((StatusCode::NOT_FOUND, "Appointment not found"));
    }

    match workflow::change_status(state.store.as_ref(), &id, req.status, &known).await {
        Ok(reloaded) => Ok(Json(UpdateStatusRes {
            appointment: find(reloaded, &id),
        })),
        Err(StatusChangeError::InvalidTransition { .. }) => {
            Err((StatusCode::CONFLICT, "Status transition not allowed"))
        }
        Err(e) => {
            tracing::error!("Update status error: {e}");
            Err((StatusCode::BAD_GATEWAY, e.user_message()))
        }
    }
}
