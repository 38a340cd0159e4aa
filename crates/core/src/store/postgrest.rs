use super::AppointmentStore;
use crate::config::PostgrestConfig;
use crate::constants::{APPOINTMENTS_TABLE, PRESCRIPTIONS_TABLE, REST_PATH};
use crate::error::{ConfigError, StoreError, StoreResult};
use crate::models::{Appointment, AppointmentId, AppointmentStatus, NewPrescription, Prescription};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;

const PREFER_REPRESENTATION: (&str, &str) = ("Prefer", "return=representation");

/// Client for the hosted store's PostgREST-style interface.
#[derive(Debug, Clone)]
pub struct PostgrestStore {
    client: Client,
    base_url: String,
}

#[derive(serde::Deserialize)]
struct ErrorBody {
    message: String,
}

impl PostgrestStore {
    /// Builds a client that sends the API key with every request.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the key is not a valid header value or the client cannot be built.
    pub fn new(cfg: &PostgrestConfig) -> Result<Self, ConfigError> {
        let key = cfg.api_key().as_str();
        let invalid_key = |_| ConfigError::Invalid {
            name: "store API key",
            reason: "not a valid HTTP header value".into(),
        };

        let mut headers = HeaderMap::new();
        headers.insert("apikey", HeaderValue::from_str(key).map_err(invalid_key)?);
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {key}")).map_err(invalid_key)?,
        );

        let client = Client::builder()
            .default_headers(headers)
            .build()
            .map_err(ConfigError::HttpClient)?;

        Ok(Self {
            client,
            base_url: cfg.base_url().trim_end_matches('/').to_string(),
        })
    }

    fn table_url(&self, table: &str) -> String {
        format!("{}/{}/{}", self.base_url, REST_PATH, table)
    }

    async fn send<T: DeserializeOwned>(request: RequestBuilder) -> StoreResult<T> {
        let response = Self::check(request.send().await?).await?;
        let body = response.bytes().await?;
        Ok(serde_json::from_slice(&body)?)
    }

    /// Turns a non-2xx response into `StoreError::Rejected`, preferring the backend's message.
    async fn check(response: Response) -> StoreResult<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ErrorBody>(&body)
            .map(|b| b.message)
            .unwrap_or(body);
        Err(StoreError::Rejected {
            status: status.as_u16(),
            message,
        })
    }
}

#[async_trait]
impl AppointmentStore for PostgrestStore {
    async fn list_appointments(&self) -> StoreResult<Vec<Appointment>> {
        tracing::debug!("listing appointments");
        let request = self.client.get(self.table_url(APPOINTMENTS_TABLE)).query(&[
            ("select", "*,prescriptions(*)"),
            ("order", "appointment_time.desc"),
            ("prescriptions.order", "created_at.asc"),
        ]);
        Self::send(request).await
    }

    async fn set_appointment_status(
        &self,
        id: &AppointmentId,
        status: AppointmentStatus,
    ) -> StoreResult<()> {
        tracing::debug!(appointment_id = %id, %status, "updating appointment status");
        let request = self
            .client
            .patch(self.table_url(APPOINTMENTS_TABLE))
            .query(&[("id", format!("eq.{id}"))])
            .header(PREFER_REPRESENTATION.0, PREFER_REPRESENTATION.1)
            .json(&serde_json::json!({ "status": status }));

        let updated: Vec<serde_json::Value> = Self::send(request).await?;
        if updated.is_empty() {
            return Err(StoreError::NotFound {
                entity: "appointment",
                id: id.to_string(),
            });
        }
        Ok(())
    }

    async fn create_prescription(
        &self,
        prescription: &NewPrescription,
    ) -> StoreResult<Prescription> {
        tracing::debug!(appointment_id = %prescription.appointment_id, "inserting prescription");
        let request = self
            .client
            .post(self.table_url(PRESCRIPTIONS_TABLE))
            .header(PREFER_REPRESENTATION.0, PREFER_REPRESENTATION.1)
            .json(std::slice::from_ref(prescription));

        let created: Vec<Prescription> = Self::send(request).await?;
        created.into_iter().next().ok_or_else(|| {
            StoreError::Unavailable("store returned no row for the inserted prescription".into())
        })
    }
}
