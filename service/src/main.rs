//! Flights service server.
//!
//! Wires configuration, the Postgres store, the optional Redis cache, the
//! aircraft client and the Kafka publisher into a [`FlightService`] and serves
//! it over HTTP until SIGINT or SIGTERM.
//!
//! # Usage
//!
//! ```bash
//! DATABASE_URL=postgres://localhost/flights \
//! KAFKA_BROKERS=localhost:9092 \
//! AIRCRAFT_SERVICE_URL=http://localhost:8082 \
//! cargo run -p flights-service
//! ```

use anyhow::Context;
use flights_core::cache::{FlightCache, NoopFlightCache};
use flights_postgres::PostgresFlightStore;
use flights_redis::RedisFlightCache;
use flights_redpanda::{EventPublisher, RdKafkaBroker};
use flights_service::metrics::MetricsServer;
use flights_service::server::{AppState, build_router};
use flights_service::{Config, FlightService, HttpAircraftValidator};
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    if dotenvy::dotenv().is_err() {
        eprintln!("No .env file found, relying on environment variables");
    }

    let config = Config::from_env().context("Failed to load configuration")?;

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("{},sqlx=warn,rdkafka=warn", config.server.log_level).into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting flights service");

    let shutdown = CancellationToken::new();

    let mut metrics = MetricsServer::new(config.metrics.addr()?);
    metrics
        .start(shutdown.clone())
        .await
        .context("Failed to start metrics server")?;

    let pool = PgPoolOptions::new()
        .max_connections(config.postgres.max_connections)
        .min_connections(config.postgres.min_connections)
        .acquire_timeout(config.postgres.connect_timeout)
        .connect(&config.postgres.url)
        .await
        .context("Failed to connect to PostgreSQL")?;
    let store = PostgresFlightStore::new(pool);
    store.migrate().await.context("Failed to run migrations")?;

    let cache: Arc<dyn FlightCache> = match &config.redis.url {
        Some(url) => match RedisFlightCache::new(url, config.redis.ttl).await {
            Ok(cache) => Arc::new(cache),
            Err(e) => {
                tracing::warn!(error = %e, "Failed to initialise cache, continuing without it");
                Arc::new(NoopFlightCache)
            }
        },
        None => {
            tracing::info!("CACHE_URL not set, running without a cache");
            Arc::new(NoopFlightCache)
        }
    };

    let broker = RdKafkaBroker::builder()
        .brokers(&config.kafka.brokers)
        .client_id(&config.kafka.client_id)
        .acks(&config.kafka.acks)
        .compression(&config.kafka.compression)
        .message_timeout(config.kafka.message_timeout)
        .retries(config.kafka.retries)
        .queue_full_timeout(config.kafka.enqueue_timeout)
        .build()
        .context("Failed to create Kafka producer")?;
    let publisher = Arc::new(
        EventPublisher::builder(broker)
            .topic(&config.kafka.topic)
            .enqueue_timeout(config.kafka.enqueue_timeout)
            .flush_timeout(config.kafka.flush_timeout)
            .start()
            .context("Failed to start event publisher")?,
    );

    let aircraft =
        HttpAircraftValidator::new(&config.aircraft).context("Failed to build aircraft client")?;

    let service = FlightService::builder(Arc::new(store), Arc::new(aircraft))
        .cache(cache)
        .publisher(publisher.clone())
        .build();
    let app = build_router(AppState::new(Arc::new(service)));

    let addr = config.server.addr()?;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    tracing::info!(%addr, "Flights service listening");

    let stop = shutdown.clone();
    let server = tokio::spawn(async move {
        axum::serve(listener, app)
            .with_graceful_shutdown(async move { stop.cancelled().await })
            .await
    });

    shutdown_signal().await;
    tracing::info!("Shutting down gracefully");
    shutdown.cancel();

    match tokio::time::timeout(config.server.shutdown_timeout, server).await {
        Ok(Ok(Ok(()))) => {}
        Ok(Ok(Err(e))) => tracing::error!(error = %e, "Server error"),
        Ok(Err(e)) => tracing::error!(error = %e, "Server task failed"),
        Err(_) => tracing::warn!(
            timeout = ?config.server.shutdown_timeout,
            "In-flight requests did not finish before the shutdown timeout"
        ),
    }

    if let Some(summary) = publisher.shutdown().await {
        tracing::info!(
            delivered = summary.delivered,
            failed = summary.failed,
            "Event publisher stopped"
        );
    }

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }
}
