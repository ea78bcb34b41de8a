//! HTTP client for the aircraft service.
//!
//! `GET {base_url}/aircraft/{id}`:
//!
//! | Response | Result |
//! |----------|--------|
//! | 2xx | exists |
//! | 404 | [`ExistenceError::NotFound`] |
//! | anything else, or no response | [`ExistenceError::Unavailable`] |

use crate::config::AircraftConfig;
use flights_core::aircraft::{ExistenceError, ExistenceValidator};
use flights_core::flight::AircraftId;
use reqwest::StatusCode;
use std::future::Future;
use std::pin::Pin;

/// [`ExistenceValidator`] backed by the aircraft service's REST API.
#[derive(Clone, Debug)]
pub struct HttpAircraftValidator {
    client: reqwest::Client,
    base_url: String,
}

impl HttpAircraftValidator {
    /// Build a client with the configured request timeout.
    ///
    /// # Errors
    ///
    /// Returns the reqwest error if the HTTP client cannot be constructed.
    pub fn new(config: &AircraftConfig) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()?;
        Ok(Self::with_client(client, config.base_url.clone()))
    }

    /// Use an existing client.
    #[must_use]
    pub fn with_client(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { client, base_url }
    }

    /// URL checked for an aircraft
    #[must_use]
    pub fn url_for(&self, aircraft_id: AircraftId) -> String {
        format!("{}/aircraft/{aircraft_id}", self.base_url)
    }

    async fn check(&self, aircraft_id: AircraftId) -> Result<(), ExistenceError> {
        let response = self
            .client
            .get(self.url_for(aircraft_id))
            .send()
            .await
            .map_err(|e| {
                record("unavailable");
                tracing::warn!(aircraft_id = %aircraft_id, error = %e, "Aircraft service request failed");
                ExistenceError::Unavailable(e.to_string())
            })?;

        let result = classify_status(aircraft_id, response.status());
        record(match &result {
            Ok(()) => "exists",
            Err(ExistenceError::NotFound(_)) => "not_found",
            Err(ExistenceError::Unavailable(_)) => "unavailable",
        });
        result
    }
}

impl ExistenceValidator for HttpAircraftValidator {
    fn exists(
        &self,
        aircraft_id: AircraftId,
    ) -> Pin<Box<dyn Future<Output = Result<(), ExistenceError>> + Send + '_>> {
        Box::pin(self.check(aircraft_id))
    }
}

fn classify_status(aircraft_id: AircraftId, status: StatusCode) -> Result<(), ExistenceError> {
    if status.is_success() {
        Ok(())
    } else if status == StatusCode::NOT_FOUND {
        Err(ExistenceError::NotFound(aircraft_id))
    } else {
        Err(ExistenceError::Unavailable(format!(
            "aircraft service responded with {status}"
        )))
    }
}

fn record(result: &'static str) {
    metrics::counter!("flights_aircraft_checks_total", "result" => result).increment(1);
}
