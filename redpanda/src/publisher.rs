//! The produce/confirm pipeline.
//!
//! ```text
//!  publish()                                 drain task (one per publisher)
//!  ─────────                                 ──────────────────────────────
//!  encode ──► produce on blocking pool       recv DeliveryReport
//!               │                              ├─ Delivered      → debug + metric
//!     select! { accepted | 2s timer | cancel } ├─ Failed         → error + metric
//!               │                              └─ ProducerError  → by class
//!          Ok / EnqueueTimeout / Cancelled
//! ```
//!
//! `publish` returns as soon as the broker client has *accepted* the message.
//! Whether it was *delivered* is only observed by the drain task, which owns the
//! client's delivery report stream until [`EventPublisher::shutdown`].
//!
//! Every produce attempt is tracked until it returns, including attempts whose
//! caller already gave up. Shutdown waits for them before flushing, so a
//! message accepted late still reaches the broker and the drain summary.

use crate::codec::BincodeCodec;
use chrono::Utc;
use flights_core::broker::{
    BrokerClient, BrokerError, DeliveryReport, DeliveryReports, OutboundMessage,
    ProducerErrorClass,
};
use flights_core::codec::EventCodec;
use flights_core::event::{
    EVENT_TYPE_HEADER, FLIGHT_CREATED, FlightCreated, SCHEMA_VERSION, SCHEMA_VERSION_HEADER,
};
use flights_core::flight::Flight;
use flights_core::publisher::{FlightEventPublisher, PublishError};
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tokio::task::{JoinError, JoinHandle};
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;

/// Header carrying the codec's content type.
pub const CONTENT_TYPE_HEADER: &str = "contentType";

/// Header carrying the id of the `tracing` span the event was published from.
///
/// Span ids are local to the publishing process. The value correlates the
/// message with that process's logs; consumers cannot continue a trace from it.
pub const PUBLISHER_SPAN_HEADER: &str = "publisherSpanId";

/// Default bound on waiting for the broker client to accept a message.
pub const DEFAULT_ENQUEUE_TIMEOUT: Duration = Duration::from_secs(2);

/// Default bound on flushing buffered messages at shutdown.
pub const DEFAULT_FLUSH_TIMEOUT: Duration = Duration::from_secs(5);

/// Delivery outcomes observed by the drain task over its lifetime.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DrainSummary {
    /// Messages acknowledged by the broker
    pub delivered: u64,
    /// Messages the broker rejected
    pub failed: u64,
    /// Fatal producer errors
    pub fatal: u64,
    /// Retriable producer errors
    pub retriable: u64,
    /// Non-fatal producer errors
    pub non_fatal: u64,
}

/// Publishes [`FlightCreated`] events through a [`BrokerClient`].
///
/// Starting a publisher spawns its drain task, so it must happen inside a tokio
/// runtime. Call [`shutdown`](Self::shutdown) before dropping it to flush
/// buffered messages.
///
/// # Example
///
/// ```no_run
/// use flights_redpanda::{EventPublisher, RdKafkaBroker};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let broker = RdKafkaBroker::builder().brokers("localhost:9092").build()?;
/// let publisher = EventPublisher::builder(broker).topic("flights").start()?;
///
/// // ... publish events ...
///
/// publisher.shutdown().await;
/// # Ok(())
/// # }
/// ```
pub struct EventPublisher<B: BrokerClient> {
    broker: Arc<B>,
    codec: Arc<dyn EventCodec>,
    topic: String,
    enqueue_timeout: Duration,
    flush_timeout: Duration,
    closed: AtomicBool,
    in_flight: TaskTracker,
    drain: Mutex<Option<JoinHandle<DrainSummary>>>,
}

impl<B: BrokerClient> EventPublisher<B> {
    /// Create a builder around a broker client.
    #[must_use]
    pub fn builder(broker: B) -> EventPublisherBuilder<B> {
        EventPublisherBuilder {
            broker,
            codec: None,
            topic: None,
            enqueue_timeout: None,
            flush_timeout: None,
        }
    }

    /// Destination topic
    #[must_use]
    pub fn topic(&self) -> &str {
        &self.topic
    }

    /// Encode and hand a `FlightCreated` event to the broker client.
    ///
    /// The partition key is the flight id. Returns once the message is accepted,
    /// the enqueue timeout elapses or `cancel` fires, whichever comes first. A
    /// produce attempt that has already returned wins over a cancellation or
    /// timeout observed at the same moment. One that loses the race keeps running
    /// on the blocking pool; its result is dropped, but shutdown still waits for
    /// it.
    ///
    /// # Errors
    ///
    /// - [`PublishError::Serialization`] if the event cannot be encoded
    /// - [`PublishError::EnqueueTimeout`] if the client does not accept it in time
    /// - [`PublishError::Produce`] if the client refuses it
    /// - [`PublishError::Cancelled`] if `cancel` fires first
    /// - [`PublishError::Closed`] after [`shutdown`](Self::shutdown)
    pub async fn publish(
        &self,
        flight: &Flight,
        cancel: &CancellationToken,
    ) -> Result<(), PublishError> {
        let result = self.try_publish(flight, cancel).await;

        match &result {
            Ok(()) => {
                metrics::counter!(
                    "flights_kafka_messages_produced_total",
                    "topic" => self.topic.clone(),
                    "event_type" => FLIGHT_CREATED
                )
                .increment(1);
                tracing::debug!(
                    flight_id = %flight.id,
                    topic = %self.topic,
                    "FlightCreated event accepted by producer"
                );
            },
            Err(error) => {
                metrics::counter!(
                    "flights_kafka_errors_total",
                    "topic" => self.topic.clone(),
                    "event_type" => FLIGHT_CREATED,
                    "kind" => error.kind()
                )
                .increment(1);
                if error.is_permanent() {
                    tracing::error!(
                        flight_id = %flight.id,
                        topic = %self.topic,
                        error = %error,
                        "Failed to serialize FlightCreated event"
                    );
                } else {
                    tracing::warn!(
                        flight_id = %flight.id,
                        topic = %self.topic,
                        kind = error.kind(),
                        error = %error,
                        "FlightCreated event not accepted by producer"
                    );
                }
            },
        }

        result
    }

    async fn try_publish(
        &self,
        flight: &Flight,
        cancel: &CancellationToken,
    ) -> Result<(), PublishError> {
        // Taken before the closed check so shutdown cannot miss this attempt.
        let in_flight = self.in_flight.token();
        if self.closed.load(Ordering::SeqCst) {
            return Err(PublishError::Closed);
        }

        let event = FlightCreated::from_flight(flight);
        let started = Instant::now();
        let payload = self
            .codec
            .encode(&event)
            .map_err(|e| PublishError::Serialization(e.to_string()))?;
        metrics::histogram!("flights_kafka_serialization_duration_seconds")
            .record(started.elapsed().as_secs_f64());

        let message = OutboundMessage {
            topic: self.topic.clone(),
            key: flight.id.to_string(),
            payload,
            headers: self.headers(),
            timestamp: Utc::now(),
        };

        let broker = Arc::clone(&self.broker);
        let started = Instant::now();
        let produce = tokio::task::spawn_blocking(move || {
            let _in_flight = in_flight;
            broker.produce(message)
        });

        let outcome = self.await_acceptance(produce, cancel).await;

        metrics::histogram!("flights_kafka_enqueue_duration_seconds")
            .record(started.elapsed().as_secs_f64());
        outcome
    }

    /// Race a produce attempt against `cancel` and the enqueue bound.
    ///
    /// Polled in order: produce result, cancellation, timer.
    async fn await_acceptance<F>(
        &self,
        produce: F,
        cancel: &CancellationToken,
    ) -> Result<(), PublishError>
    where
        F: Future<Output = Result<Result<(), BrokerError>, JoinError>>,
    {
        tokio::select! {
            biased;
            joined = produce => match joined {
                Ok(Ok(())) => Ok(()),
                Ok(Err(error)) => Err(self.produce_error(error)),
                Err(join_error) => Err(PublishError::Produce(join_error.to_string())),
            },
            () = cancel.cancelled() => Err(PublishError::Cancelled),
            () = tokio::time::sleep(self.enqueue_timeout) => {
                Err(PublishError::EnqueueTimeout(self.enqueue_timeout))
            },
        }
    }

    fn produce_error(&self, error: BrokerError) -> PublishError {
        match error {
            BrokerError::QueueFull => PublishError::EnqueueTimeout(self.enqueue_timeout),
            BrokerError::Closed => PublishError::Closed,
            other => PublishError::Produce(other.to_string()),
        }
    }

    fn headers(&self) -> Vec<(String, String)> {
        let mut headers = vec![
            (EVENT_TYPE_HEADER.to_string(), FLIGHT_CREATED.to_string()),
            (SCHEMA_VERSION_HEADER.to_string(), SCHEMA_VERSION.to_string()),
            (
                CONTENT_TYPE_HEADER.to_string(),
                self.codec.content_type().to_string(),
            ),
        ];
        if let Some(span_id) = tracing::Span::current().id() {
            headers.push((
                PUBLISHER_SPAN_HEADER.to_string(),
                span_id.into_u64().to_string(),
            ));
        }
        headers
    }

    /// Wait for in-flight produce attempts, flush, close the broker client and
    /// wait for the drain task to finish.
    ///
    /// New publishes are refused with [`PublishError::Closed`] from the start.
    /// Produce attempts already running get up to the flush timeout to return.
    /// Flush failures are logged; shutdown always proceeds to close. Returns the
    /// drain task's summary, or `None` if the publisher was already shut down.
    pub async fn shutdown(&self) -> Option<DrainSummary> {
        if self.closed.swap(true, Ordering::SeqCst) {
            return None;
        }
        tracing::info!(topic = %self.topic, "Shutting down event publisher");

        self.in_flight.close();
        if tokio::time::timeout(self.flush_timeout, self.in_flight.wait())
            .await
            .is_err()
        {
            tracing::warn!(
                pending = self.in_flight.len(),
                "Produce attempts still running at shutdown, closing anyway"
            );
        }

        let broker = Arc::clone(&self.broker);
        let flush_timeout = self.flush_timeout;
        match tokio::task::spawn_blocking(move || broker.flush(flush_timeout)).await {
            Ok(Ok(())) => tracing::debug!("Producer flushed"),
            Ok(Err(error)) => {
                tracing::warn!(error = %error, "Producer flush incomplete, closing anyway");
            },
            Err(join_error) => {
                tracing::warn!(error = %join_error, "Producer flush task failed");
            },
        }

        let broker = Arc::clone(&self.broker);
        if let Err(join_error) = tokio::task::spawn_blocking(move || broker.close()).await {
            tracing::warn!(error = %join_error, "Producer close task failed");
        }

        let handle = self.drain.lock().ok().and_then(|mut drain| drain.take())?;
        match handle.await {
            Ok(summary) => {
                tracing::info!(
                    delivered = summary.delivered,
                    failed = summary.failed,
                    "Event publisher stopped"
                );
                Some(summary)
            },
            Err(join_error) => {
                tracing::error!(error = %join_error, "Delivery report drain task failed");
                None
            },
        }
    }
}

impl<B: BrokerClient> FlightEventPublisher for EventPublisher<B> {
    fn publish_flight_created<'a>(
        &'a self,
        flight: &'a Flight,
        cancel: &'a CancellationToken,
    ) -> Pin<Box<dyn Future<Output = Result<(), PublishError>> + Send + 'a>> {
        Box::pin(self.publish(flight, cancel))
    }
}

/// Builder for [`EventPublisher`].
pub struct EventPublisherBuilder<B: BrokerClient> {
    broker: B,
    codec: Option<Arc<dyn EventCodec>>,
    topic: Option<String>,
    enqueue_timeout: Option<Duration>,
    flush_timeout: Option<Duration>,
}

impl<B: BrokerClient> EventPublisherBuilder<B> {
    /// Event codec. Default: [`BincodeCodec`]
    #[must_use]
    pub fn codec(mut self, codec: impl EventCodec + 'static) -> Self {
        self.codec = Some(Arc::new(codec));
        self
    }

    /// Destination topic. Default: `flights`
    #[must_use]
    pub fn topic(mut self, topic: impl Into<String>) -> Self {
        self.topic = Some(topic.into());
        self
    }

    /// Bound on waiting for the client to accept a message. Default: 2 seconds
    #[must_use]
    pub const fn enqueue_timeout(mut self, timeout: Duration) -> Self {
        self.enqueue_timeout = Some(timeout);
        self
    }

    /// Bound on the shutdown flush. Default: 5 seconds
    #[must_use]
    pub const fn flush_timeout(mut self, timeout: Duration) -> Self {
        self.flush_timeout = Some(timeout);
        self
    }

    /// Take the client's delivery reports and spawn the drain task.
    ///
    /// # Errors
    ///
    /// Returns [`BrokerError::Configuration`] if another reader already took the
    /// delivery report stream.
    pub fn start(self) -> Result<EventPublisher<B>, BrokerError> {
        let reports = self.broker.take_delivery_reports().ok_or_else(|| {
            BrokerError::Configuration("delivery reports already taken".to_string())
        })?;
        let topic = self.topic.unwrap_or_else(|| "flights".to_string());

        let drain = tokio::spawn(drain_delivery_reports(reports));
        tracing::info!(topic = %topic, "Event publisher started");

        Ok(EventPublisher {
            broker: Arc::new(self.broker),
            codec: self.codec.unwrap_or_else(|| Arc::new(BincodeCodec::new())),
            topic,
            enqueue_timeout: self.enqueue_timeout.unwrap_or(DEFAULT_ENQUEUE_TIMEOUT),
            flush_timeout: self.flush_timeout.unwrap_or(DEFAULT_FLUSH_TIMEOUT),
            closed: AtomicBool::new(false),
            in_flight: TaskTracker::new(),
            drain: Mutex::new(Some(drain)),
        })
    }
}

/// Sole reader of the delivery report stream. Exits when the client closes it.
async fn drain_delivery_reports(mut reports: DeliveryReports) -> DrainSummary {
    let mut summary = DrainSummary::default();
    while let Some(report) = reports.recv().await {
        record_report(&report, &mut summary);
    }
    tracing::debug!("Delivery report channel closed");
    summary
}

fn record_report(report: &DeliveryReport, summary: &mut DrainSummary) {
    match report {
        DeliveryReport::Delivered {
            topic,
            partition,
            offset,
            key,
        } => {
            summary.delivered += 1;
            metrics::counter!(
                "flights_kafka_deliveries_total",
                "topic" => topic.clone(),
                "result" => "delivered"
            )
            .increment(1);
            tracing::debug!(
                topic = %topic,
                partition,
                offset,
                key = key.as_deref().unwrap_or_default(),
                "Message delivered"
            );
        },
        DeliveryReport::Failed {
            topic,
            partition,
            key,
            error,
        } => {
            summary.failed += 1;
            metrics::counter!(
                "flights_kafka_deliveries_total",
                "topic" => topic.clone(),
                "result" => "failed"
            )
            .increment(1);
            tracing::error!(
                topic = %topic,
                partition,
                key = key.as_deref().unwrap_or_default(),
                error = %error,
                "Message delivery failed"
            );
        },
        DeliveryReport::ProducerError { class, error } => {
            metrics::counter!("flights_kafka_producer_errors_total", "class" => class.as_str())
                .increment(1);
            match class {
                ProducerErrorClass::Fatal => {
                    summary.fatal += 1;
                    tracing::error!(error = %error, "Fatal producer error, client must be recreated");
                },
                ProducerErrorClass::Retriable => {
                    summary.retriable += 1;
                    tracing::warn!(error = %error, "Retriable producer error");
                },
                ProducerErrorClass::NonFatal => {
                    summary.non_fatal += 1;
                    tracing::warn!(error = %error, "Non-fatal producer error");
                },
            }
        },
    }
}
