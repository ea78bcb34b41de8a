//! Prometheus metrics for the flights service.
//!
//! Every crate in the workspace records through the `metrics` facade; this
//! module installs the Prometheus recorder and serves `/metrics` on its own
//! listener.
//!
//! # Example
//!
//! ```rust,no_run
//! use flights_service::metrics::MetricsServer;
//! use tokio_util::sync::CancellationToken;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let mut server = MetricsServer::new("0.0.0.0:9090".parse()?);
//! server.start(CancellationToken::new()).await?;
//! // Metrics available at http://localhost:9090/metrics
//! # Ok(())
//! # }
//! ```

use axum::Router;
use axum::routing::get;
use metrics::{describe_counter, describe_histogram};
use metrics_exporter_prometheus::{Matcher, PrometheusBuilder, PrometheusHandle};
use std::net::SocketAddr;
use thiserror::Error;
use tokio_util::sync::CancellationToken;

/// Errors from metrics setup.
#[derive(Error, Debug)]
pub enum MetricsError {
    /// Failed to build metrics exporter
    #[error("Failed to build metrics exporter: {0}")]
    Build(String),
    /// Failed to install metrics exporter
    #[error("Failed to install metrics exporter: {0}")]
    Install(String),
    /// Failed to bind HTTP listener
    #[error("Failed to bind metrics server: {0}")]
    Bind(#[from] std::io::Error),
}

/// Prometheus exporter and scrape endpoint.
pub struct MetricsServer {
    addr: SocketAddr,
    handle: Option<PrometheusHandle>,
}

impl MetricsServer {
    /// Create a server that will listen on `addr`.
    #[must_use]
    pub const fn new(addr: SocketAddr) -> Self {
        Self { addr, handle: None }
    }

    /// Install the recorder and start serving `/metrics` until `shutdown` fires.
    ///
    /// # Errors
    ///
    /// Returns [`MetricsError`] if the exporter cannot be built or installed, or
    /// the listener cannot bind.
    pub async fn start(&mut self, shutdown: CancellationToken) -> Result<(), MetricsError> {
        let handle = install_recorder()?;
        self.handle = Some(handle.clone());

        let listener = tokio::net::TcpListener::bind(self.addr).await?;
        let app = Router::new().route(
            "/metrics",
            get(move || {
                let handle = handle.clone();
                async move { handle.render() }
            }),
        );

        tokio::spawn(async move {
            let served = axum::serve(listener, app)
                .with_graceful_shutdown(async move { shutdown.cancelled().await })
                .await;
            if let Err(e) = served {
                tracing::error!(error = %e, "Metrics server stopped");
            }
        });

        tracing::info!(addr = %self.addr, "Metrics available at http://{}/metrics", self.addr);
        Ok(())
    }

    /// Render current metrics in Prometheus format.
    ///
    /// Returns `None` if the server hasn't been started.
    #[must_use]
    pub fn render(&self) -> Option<String> {
        self.handle.as_ref().map(PrometheusHandle::render)
    }
}

/// Install the global recorder, then describe every metric against it.
fn install_recorder() -> Result<PrometheusHandle, MetricsError> {
    let handle = PrometheusBuilder::new()
        .set_buckets_for_metric(
            Matcher::Suffix("duration_seconds".to_string()),
            &[0.0005, 0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.0, 5.0],
        )
        .map_err(|e| MetricsError::Build(e.to_string()))?
        .install_recorder()
        .map_err(|e| MetricsError::Install(e.to_string()))?;

    register_metrics();
    Ok(handle)
}

/// Register descriptions for every metric the service emits.
///
/// Descriptions go to whichever recorder is installed at the time of the call.
pub fn register_metrics() {
    // Orchestration
    describe_counter!("flights_created_total", "Flights successfully created");
    describe_counter!(
        "flights_create_failures_total",
        "Flight creations that failed, by error kind"
    );
    describe_counter!(
        "flights_lookups_total",
        "Flight lookups served, by source (cache or store)"
    );
    describe_counter!(
        "flights_best_effort_failures_total",
        "Swallowed cache and publish failures, by operation"
    );

    // Collaborators
    describe_counter!(
        "flights_store_operations_total",
        "Flight store operations, by operation and result"
    );
    describe_counter!(
        "flights_cache_operations_total",
        "Flight cache operations, by operation and result"
    );
    describe_counter!(
        "flights_aircraft_checks_total",
        "Aircraft existence checks, by result"
    );

    // Event publishing
    describe_counter!(
        "flights_kafka_messages_produced_total",
        "Events accepted by the producer"
    );
    describe_counter!(
        "flights_kafka_errors_total",
        "Events not accepted by the producer, by kind"
    );
    describe_counter!(
        "flights_kafka_deliveries_total",
        "Delivery reports, by result"
    );
    describe_counter!(
        "flights_kafka_producer_errors_total",
        "Producer-level errors, by class (fatal, retriable, non_fatal)"
    );
    describe_histogram!(
        "flights_kafka_serialization_duration_seconds",
        "Time taken to encode an event"
    );
    describe_histogram!(
        "flights_kafka_enqueue_duration_seconds",
        "Time taken for the producer to accept an event"
    );
}
