//! Drives `PostgrestStore` against a small axum server that imitates the hosted REST backend.

use axum::{
    extract::{Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use clinic_core::config::PostgrestConfig;
use clinic_core::{
    AppointmentStatus, AppointmentStore, NewPrescription, PostgrestStore, PrescriptionWorkflow,
    StoreError,
};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

const KEY: &str = "test-key";

#[derive(Default)]
struct Backend {
    appointments: Vec<Value>,
    prescriptions: Vec<Value>,
    next_id: u32,
    fail_patch: bool,
}

type Shared = Arc<Mutex<Backend>>;

fn authorised(headers: &HeaderMap) -> bool {
    let apikey = headers.get("apikey").and_then(|v| v.to_str().ok());
    let bearer = headers.get("authorization").and_then(|v| v.to_str().ok());
    apikey == Some(KEY) && bearer == Some("Bearer test-key")
}

fn unauthorised() -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(json!({ "message": "Invalid API key" })),
    )
        .into_response()
}

async fn list(
    State(db): State<Shared>,
    headers: HeaderMap,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    if !authorised(&headers) {
        return unauthorised();
    }
    assert_eq!(params.get("select").map(String::as_str), Some("*,prescriptions(*)"));
    assert_eq!(params.get("order").map(String::as_str), Some("appointment_time.desc"));

    let db = db.lock().unwrap();
    let mut rows: Vec<Value> = db
        .appointments
        .iter()
        .map(|a| {
            let mut row = a.clone();
            let attached: Vec<Value> = db
                .prescriptions
                .iter()
                .filter(|p| p["appointment_id"] == a["id"])
                .cloned()
                .collect();
            row["prescriptions"] = Value::Array(attached);
            row
        })
        .collect();
    rows.sort_by(|a, b| {
        b["appointment_time"]
            .as_str()
            .cmp(&a["appointment_time"].as_str())
    });
    Json(Value::Array(rows)).into_response()
}

async fn update(
    State(db): State<Shared>,
    headers: HeaderMap,
    Query(params): Query<HashMap<String, String>>,
    Json(body): Json<Value>,
) -> Response {
    if !authorised(&headers) {
        return unauthorised();
    }
    assert_eq!(
        headers.get("prefer").and_then(|v| v.to_str().ok()),
        Some("return=representation")
    );
    let mut db = db.lock().unwrap();
    if db.fail_patch {
        return (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({ "message": "database is restarting" })),
        )
            .into_response();
    }
    let id = params
        .get("id")
        .and_then(|f| f.strip_prefix("eq."))
        .unwrap_or_default()
        .to_string();
    let updated: Vec<Value> = db
        .appointments
        .iter_mut()
        .filter(|a| a["id"] == id.as_str())
        .map(|a| {
            a["status"] = body["status"].clone();
            a.clone()
        })
        .collect();
    Json(Value::Array(updated)).into_response()
}

async fn insert(State(db): State<Shared>, headers: HeaderMap, Json(body): Json<Value>) -> Response {
    if !authorised(&headers) {
        return unauthorised();
    }
    let mut db = db.lock().unwrap();
    let mut created = Vec::new();
    for row in body.as_array().cloned().unwrap_or_default() {
        if !db.appointments.iter().any(|a| a["id"] == row["appointment_id"]) {
            return (
                StatusCode::CONFLICT,
                Json(json!({
                    "code": "23503",
                    "message": "insert or update on table \"prescriptions\" violates foreign key constraint"
                })),
            )
                .into_response();
        }
        db.next_id += 1;
        let mut stored = row.clone();
        stored["id"] = json!(format!("P{}", db.next_id));
        stored["created_at"] = json!("2026-10-18T10:00:00+00:00");
        db.prescriptions.push(stored.clone());
        created.push(stored);
    }
    (StatusCode::CREATED, Json(Value::Array(created))).into_response()
}

fn appointment_row(id: &str, time: &str, status: &str) -> Value {
    json!({
        "id": id,
        "patient_name": format!("Patient {id}"),
        "patient_age": 52,
        "symptoms": "Chest tightness",
        "appointment_time": time,
        "status": status,
        "doctor_name": "Dr. Haddad",
        "patient_email": null,
        "contact_number": null,
        "created_at": "2026-10-01T08:00:00+00:00",
        "updated_at": "2026-10-01T08:00:00+00:00"
    })
}

async fn start_backend() -> (Shared, String) {
    let db: Shared = Arc::new(Mutex::new(Backend {
        appointments: vec![
            appointment_row("A1", "2026-10-18T09:00:00+00:00", "pending"),
            appointment_row("A2", "2026-10-19T09:00:00+00:00", "completed"),
        ],
        ..Default::default()
    }));
    let app = Router::new()
        .route("/rest/v1/appointments", get(list).patch(update))
        .route("/rest/v1/prescriptions", post(insert))
        .with_state(db.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind test listener");
    let addr = listener.local_addr().expect("listener has an address");
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("test server failed");
    });
    (db, format!("http://{addr}"))
}

fn store(base_url: &str, key: &str) -> PostgrestStore {
    let cfg = PostgrestConfig::new(base_url, key).expect("valid store config");
    PostgrestStore::new(&cfg).expect("client builds")
}

#[tokio::test]
async fn lists_appointments_newest_first_with_prescriptions() {
    let (_db, url) = start_backend().await;
    let appointments = store(&url, KEY).list_appointments().await.unwrap();

    let ids: Vec<&str> = appointments.iter().map(|a| a.id.as_str()).collect();
    assert_eq!(ids, ["A2", "A1"]);
    assert!(appointments.iter().all(|a| a.prescriptions.is_empty()));
    assert_eq!(appointments[1].status, AppointmentStatus::Pending);
}

#[tokio::test]
async fn wrong_key_is_a_rejection_with_backend_message() {
    let (_db, url) = start_backend().await;
    let err = store(&url, "wrong").list_appointments().await.unwrap_err();
    match err {
        StoreError::Rejected { status, message } => {
            assert_eq!(status, 401);
            assert_eq!(message, "Invalid API key");
        }
        other => panic!("unexpected error {other:?}"),
    }
}

#[tokio::test]
async fn unknown_appointment_status_update_is_not_found() {
    let (_db, url) = start_backend().await;
    let err = store(&url, KEY)
        .set_appointment_status(&"missing".into(), AppointmentStatus::Cancelled)
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::NotFound { .. }));
}

#[tokio::test]
async fn foreign_key_violation_is_rejected() {
    let (_db, url) = start_backend().await;
    let draft = NewPrescription::from_fields("missing".into(), "Ibuprofen", "200mg", None).unwrap();
    let err = store(&url, KEY).create_prescription(&draft).await.unwrap_err();
    assert!(matches!(err, StoreError::Rejected { status: 409, .. }));
}

#[tokio::test]
async fn workflow_over_http_completes_the_appointment() {
    let (_db, url) = start_backend().await;
    let store = store(&url, KEY);
    let draft = NewPrescription::from_fields(
        "A1".into(),
        "Amoxicillin",
        "500mg twice daily",
        Some("finish the course"),
    )
    .unwrap();

    let outcome = PrescriptionWorkflow::new(&store)
        .run(&draft, &[])
        .await
        .unwrap();

    assert_eq!(outcome.prescription.id.as_str(), "P1");
    assert_eq!(outcome.prescription.note.as_deref(), Some("finish the course"));
    let a1 = outcome.appointment().unwrap();
    assert_eq!(a1.status, AppointmentStatus::Completed);
    assert_eq!(a1.prescriptions.len(), 1);
}

#[tokio::test]
async fn backend_outage_during_completion_leaves_prescription_behind() {
    let (db, url) = start_backend().await;
    db.lock().unwrap().fail_patch = true;
    let store = store(&url, KEY);
    let draft = NewPrescription::from_fields("A1".into(), "Amoxicillin", "500mg", None).unwrap();

    let err = PrescriptionWorkflow::new(&store)
        .run(&draft, &[])
        .await
        .unwrap_err();
    assert!(err.orphaned_prescription().is_some());

    let reread = store.list_appointments().await.unwrap();
    let a1 = reread.iter().find(|a| a.id.as_str() == "A1").unwrap();
    assert_eq!(a1.status, AppointmentStatus::Pending);
    assert_eq!(a1.prescriptions.len(), 1);
}
