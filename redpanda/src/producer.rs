//! rdkafka-backed [`BrokerClient`].
//!
//! Wraps a [`ThreadedProducer`], whose background thread polls librdkafka and
//! invokes [`ForwardingContext`] for every delivery report and client error. The
//! context forwards them as [`DeliveryReport`]s into an unbounded channel which
//! the event publisher drains.

use flights_core::broker::{
    BrokerClient, BrokerError, DeliveryReport, DeliveryReports, OutboundMessage,
    ProducerErrorClass,
};
use rdkafka::config::ClientConfig;
use rdkafka::error::{KafkaError, RDKafkaErrorCode};
use rdkafka::message::{Header, Message, OwnedHeaders};
use rdkafka::producer::{BaseRecord, DeliveryResult, Producer, ProducerContext, ThreadedProducer};
use rdkafka::util::Timeout;
use rdkafka::ClientContext;
use std::sync::{Mutex, RwLock};
use std::time::{Duration, Instant};
use tokio::sync::mpsc;

/// How long to sleep between attempts while librdkafka's queue is full.
const QUEUE_FULL_BACKOFF: Duration = Duration::from_millis(50);

/// Classify an error librdkafka raised outside of any single message.
#[must_use]
pub fn classify_error_code(code: Option<RDKafkaErrorCode>) -> ProducerErrorClass {
    match code {
        Some(RDKafkaErrorCode::Fatal) => ProducerErrorClass::Fatal,
        Some(
            RDKafkaErrorCode::BrokerTransportFailure
            | RDKafkaErrorCode::AllBrokersDown
            | RDKafkaErrorCode::OperationTimedOut
            | RDKafkaErrorCode::RequestTimedOut
            | RDKafkaErrorCode::NetworkException
            | RDKafkaErrorCode::LeaderNotAvailable
            | RDKafkaErrorCode::NotLeaderForPartition,
        ) => ProducerErrorClass::Retriable,
        _ => ProducerErrorClass::NonFatal,
    }
}

/// Producer context forwarding every callback into a channel.
pub struct ForwardingContext {
    reports: mpsc::UnboundedSender<DeliveryReport>,
}

impl ForwardingContext {
    fn forward(&self, report: DeliveryReport) {
        // The receiver only goes away once the publisher has shut down.
        let _ = self.reports.send(report);
    }
}

impl ClientContext for ForwardingContext {
    fn error(&self, error: KafkaError, reason: &str) {
        self.forward(DeliveryReport::ProducerError {
            class: classify_error_code(error.rdkafka_error_code()),
            error: format!("{error}: {reason}"),
        });
    }
}

impl ProducerContext for ForwardingContext {
    type DeliveryOpaque = ();

    fn delivery(&self, delivery_result: &DeliveryResult<'_>, _delivery_opaque: Self::DeliveryOpaque) {
        let report = match delivery_result {
            Ok(message) => DeliveryReport::Delivered {
                topic: message.topic().to_string(),
                partition: message.partition(),
                offset: message.offset(),
                key: message.key().map(|k| String::from_utf8_lossy(k).into_owned()),
            },
            Err((error, message)) => DeliveryReport::Failed {
                topic: message.topic().to_string(),
                partition: message.partition(),
                key: message.key().map(|k| String::from_utf8_lossy(k).into_owned()),
                error: error.to_string(),
            },
        };
        self.forward(report);
    }
}

/// Kafka-compatible broker client.
///
/// # Example
///
/// ```no_run
/// use flights_redpanda::RdKafkaBroker;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let broker = RdKafkaBroker::builder()
///     .brokers("localhost:9092")
///     .client_id("flights-service")
///     .acks("all")
///     .build()?;
/// # Ok(())
/// # }
/// ```
pub struct RdKafkaBroker {
    producer: RwLock<Option<ThreadedProducer<ForwardingContext>>>,
    reports: Mutex<Option<DeliveryReports>>,
    queue_full_timeout: Duration,
}

impl RdKafkaBroker {
    /// Create a builder.
    #[must_use]
    pub fn builder() -> RdKafkaBrokerBuilder {
        RdKafkaBrokerBuilder::default()
    }
}

impl BrokerClient for RdKafkaBroker {
    fn produce(&self, message: OutboundMessage) -> Result<(), BrokerError> {
        let guard = self.producer.read().map_err(|_| BrokerError::Closed)?;
        let producer = guard.as_ref().ok_or(BrokerError::Closed)?;

        let mut headers = OwnedHeaders::new_with_capacity(message.headers.len());
        for (key, value) in &message.headers {
            headers = headers.insert(Header {
                key: key.as_str(),
                value: Some(value.as_str()),
            });
        }

        let mut record = BaseRecord::to(&message.topic)
            .key(message.key.as_str())
            .payload(message.payload.as_slice())
            .headers(headers)
            .timestamp(message.timestamp.timestamp_millis());

        // librdkafka never blocks on a full queue; wait here instead.
        let deadline = Instant::now() + self.queue_full_timeout;
        loop {
            match producer.send(record) {
                Ok(()) => return Ok(()),
                Err((KafkaError::MessageProduction(RDKafkaErrorCode::QueueFull), returned)) => {
                    if Instant::now() >= deadline {
                        return Err(BrokerError::QueueFull);
                    }
                    record = returned;
                    std::thread::sleep(QUEUE_FULL_BACKOFF);
                }
                Err((error, _)) => return Err(BrokerError::Produce(error.to_string())),
            }
        }
    }

    fn take_delivery_reports(&self) -> Option<DeliveryReports> {
        self.reports.lock().ok().and_then(|mut reports| reports.take())
    }

    fn flush(&self, timeout: Duration) -> Result<(), BrokerError> {
        let guard = self.producer.read().map_err(|_| BrokerError::Closed)?;
        let producer = guard.as_ref().ok_or(BrokerError::Closed)?;
        producer
            .flush(Timeout::After(timeout))
            .map_err(|e| BrokerError::Flush(e.to_string()))
    }

    fn close(&self) {
        // Dropping the producer stops its polling thread and drops the context,
        // which closes the delivery report channel.
        let producer = match self.producer.write() {
            Ok(mut guard) => guard.take(),
            Err(poisoned) => poisoned.into_inner().take(),
        };
        drop(producer);
        tracing::info!("Kafka producer closed");
    }
}

/// Builder for [`RdKafkaBroker`].
#[derive(Default)]
pub struct RdKafkaBrokerBuilder {
    brokers: Option<String>,
    client_id: Option<String>,
    acks: Option<String>,
    compression: Option<String>,
    message_timeout: Option<Duration>,
    retries: Option<u32>,
    queue_full_timeout: Option<Duration>,
}

impl RdKafkaBrokerBuilder {
    /// Comma-separated bootstrap servers (required)
    #[must_use]
    pub fn brokers(mut self, brokers: impl Into<String>) -> Self {
        self.brokers = Some(brokers.into());
        self
    }

    /// Client id reported to the broker. Default: `flights-service`
    #[must_use]
    pub fn client_id(mut self, client_id: impl Into<String>) -> Self {
        self.client_id = Some(client_id.into());
        self
    }

    /// Acknowledgement mode: `"0"`, `"1"` or `"all"`. Default: `"all"`
    #[must_use]
    pub fn acks(mut self, acks: impl Into<String>) -> Self {
        self.acks = Some(acks.into());
        self
    }

    /// Compression codec. Default: `"none"`
    #[must_use]
    pub fn compression(mut self, compression: impl Into<String>) -> Self {
        self.compression = Some(compression.into());
        self
    }

    /// End-to-end delivery deadline per message. Default: 30 seconds
    #[must_use]
    pub const fn message_timeout(mut self, timeout: Duration) -> Self {
        self.message_timeout = Some(timeout);
        self
    }

    /// Internal send retries. Default: 3
    #[must_use]
    pub const fn retries(mut self, retries: u32) -> Self {
        self.retries = Some(retries);
        self
    }

    /// How long `produce` keeps retrying while the local queue is full.
    /// Default: 2 seconds
    #[must_use]
    pub const fn queue_full_timeout(mut self, timeout: Duration) -> Self {
        self.queue_full_timeout = Some(timeout);
        self
    }

    /// Build the client.
    ///
    /// # Errors
    ///
    /// Returns [`BrokerError::Configuration`] if brokers are missing or
    /// librdkafka rejects the configuration.
    pub fn build(self) -> Result<RdKafkaBroker, BrokerError> {
        let brokers = self
            .brokers
            .ok_or_else(|| BrokerError::Configuration("brokers not configured".to_string()))?;
        let client_id = self.client_id.as_deref().unwrap_or("flights-service");
        let acks = self.acks.as_deref().unwrap_or("all");
        let compression = self.compression.as_deref().unwrap_or("none");
        let message_timeout = self.message_timeout.unwrap_or(Duration::from_secs(30));
        let retries = self.retries.unwrap_or(3);

        let (tx, rx) = mpsc::unbounded_channel();

        let producer: ThreadedProducer<ForwardingContext> = ClientConfig::new()
            .set("bootstrap.servers", &brokers)
            .set("client.id", client_id)
            .set("acks", acks)
            .set("compression.type", compression)
            .set("message.timeout.ms", message_timeout.as_millis().to_string())
            .set("retries", retries.to_string())
            .create_with_context(ForwardingContext { reports: tx })
            .map_err(|e| {
                BrokerError::Configuration(format!("failed to create producer: {e}"))
            })?;

        tracing::info!(
            brokers = %brokers,
            client_id,
            acks,
            compression,
            "Kafka producer created"
        );

        Ok(RdKafkaBroker {
            producer: RwLock::new(Some(producer)),
            reports: Mutex::new(Some(rx)),
            queue_full_timeout: self.queue_full_timeout.unwrap_or(Duration::from_secs(2)),
        })
    }
}
