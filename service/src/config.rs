//! Configuration for the flights service.
//!
//! Built once at startup from environment variables and handed to each
//! component by value. Required variables:
//!
//! - `DATABASE_URL`
//! - `KAFKA_BROKERS`
//! - `AIRCRAFT_SERVICE_URL`
//!
//! Everything else has a default. `CACHE_URL` is optional; without it the
//! service runs with the no-op cache.

use std::env;
use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

/// Errors raised while reading configuration.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// A required variable is unset or blank
    #[error("missing required environment variable {0}")]
    Missing(&'static str),

    /// A variable is set but cannot be parsed
    #[error("invalid value for {key}: {value:?}")]
    Invalid {
        /// Variable name
        key: &'static str,
        /// Raw value
        value: String,
    },
}

/// Application configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP server
    pub server: ServerConfig,
    /// `PostgreSQL` flight store
    pub postgres: PostgresConfig,
    /// Redis flight cache
    pub redis: RedisConfig,
    /// Kafka/Redpanda event publisher
    pub kafka: KafkaConfig,
    /// Aircraft existence client
    pub aircraft: AircraftConfig,
    /// Prometheus exporter
    pub metrics: MetricsConfig,
}

/// HTTP server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Host to bind to
    pub host: String,
    /// Port to bind to
    pub port: u16,
    /// Default log filter (trace, debug, info, warn, error)
    pub log_level: String,
    /// How long in-flight requests get to finish after a shutdown signal
    pub shutdown_timeout: Duration,
}

/// `PostgreSQL` configuration
#[derive(Debug, Clone)]
pub struct PostgresConfig {
    /// Connection URL
    pub url: String,
    /// Maximum pool size
    pub max_connections: u32,
    /// Idle connections kept open
    pub min_connections: u32,
    /// Timeout for acquiring a connection
    pub connect_timeout: Duration,
}

/// Redis configuration
#[derive(Debug, Clone)]
pub struct RedisConfig {
    /// Connection URL; `None` disables caching
    pub url: Option<String>,
    /// Entry lifetime
    pub ttl: Duration,
}

/// Kafka/Redpanda configuration
#[derive(Debug, Clone)]
pub struct KafkaConfig {
    /// Bootstrap servers (comma-separated)
    pub brokers: String,
    /// Topic for flight events
    pub topic: String,
    /// Producer client id
    pub client_id: String,
    /// Required acknowledgements (`all`, `1`, `0`)
    pub acks: String,
    /// Compression codec
    pub compression: String,
    /// Bound on waiting for the client to accept a message
    pub enqueue_timeout: Duration,
    /// Bound on flushing buffered messages at shutdown
    pub flush_timeout: Duration,
    /// Client-side delivery timeout
    pub message_timeout: Duration,
    /// Client-side retries
    pub retries: u32,
}

/// Aircraft service configuration
#[derive(Debug, Clone)]
pub struct AircraftConfig {
    /// Base URL, e.g. `http://aircraft:8082`
    pub base_url: String,
    /// Per-request timeout
    pub request_timeout: Duration,
}

/// Metrics exporter configuration
#[derive(Debug, Clone)]
pub struct MetricsConfig {
    /// Host to bind to
    pub host: String,
    /// Port to bind to
    pub port: u16,
}

impl ServerConfig {
    /// Socket address to listen on.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] if host and port do not form an address.
    pub fn addr(&self) -> Result<SocketAddr, ConfigError> {
        socket_addr("HOST", &self.host, self.port)
    }
}

impl MetricsConfig {
    /// Socket address for the exporter.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] if host and port do not form an address.
    pub fn addr(&self) -> Result<SocketAddr, ConfigError> {
        socket_addr("METRICS_HOST", &self.host, self.port)
    }
}

impl Config {
    /// Load configuration from the process environment.
    ///
    /// Call `dotenvy::dotenv()` first to pick up a `.env` file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if a required variable is missing or a value
    /// does not parse.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through an arbitrary lookup function.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if a required variable is missing or a value
    /// does not parse.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let vars = Vars(lookup);

        Ok(Self {
            server: ServerConfig {
                host: vars.string_or("HOST", "0.0.0.0"),
                port: vars.parse_or("PORT", 8081)?,
                log_level: vars.string_or("LOG_LEVEL", "info"),
                shutdown_timeout: Duration::from_secs(vars.parse_or("SHUTDOWN_TIMEOUT_SECS", 10)?),
            },
            postgres: PostgresConfig {
                url: vars.required("DATABASE_URL")?,
                max_connections: vars.parse_or("DATABASE_MAX_CONNECTIONS", 10)?,
                min_connections: vars.parse_or("DATABASE_MIN_CONNECTIONS", 1)?,
                connect_timeout: Duration::from_secs(
                    vars.parse_or("DATABASE_CONNECT_TIMEOUT_SECS", 5)?,
                ),
            },
            redis: RedisConfig {
                url: vars.optional("CACHE_URL"),
                ttl: Duration::from_secs(vars.parse_or("CACHE_TTL_SECS", 900)?),
            },
            kafka: KafkaConfig {
                brokers: vars.required("KAFKA_BROKERS")?,
                topic: vars.string_or("KAFKA_FLIGHTS_TOPIC", "flights"),
                client_id: vars.string_or("KAFKA_CLIENT_ID", "flights-service"),
                acks: vars.string_or("KAFKA_ACKS", "all"),
                compression: vars.string_or("KAFKA_COMPRESSION", "none"),
                enqueue_timeout: Duration::from_millis(
                    vars.parse_or("KAFKA_ENQUEUE_TIMEOUT_MS", 2000)?,
                ),
                flush_timeout: Duration::from_millis(vars.parse_or("KAFKA_FLUSH_TIMEOUT_MS", 5000)?),
                message_timeout: Duration::from_millis(
                    vars.parse_or("KAFKA_MESSAGE_TIMEOUT_MS", 30_000)?,
                ),
                retries: vars.parse_or("KAFKA_RETRIES", 3)?,
            },
            aircraft: AircraftConfig {
                base_url: vars
                    .required("AIRCRAFT_SERVICE_URL")?
                    .trim_end_matches('/')
                    .to_string(),
                request_timeout: Duration::from_millis(
                    vars.parse_or("AIRCRAFT_REQUEST_TIMEOUT_MS", 5000)?,
                ),
            },
            metrics: MetricsConfig {
                host: vars.string_or("METRICS_HOST", "0.0.0.0"),
                port: vars.parse_or("METRICS_PORT", 9090)?,
            },
        })
    }
}

struct Vars<F>(F);

impl<F> Vars<F>
where
    F: Fn(&str) -> Option<String>,
{
    /// Blank values count as unset.
    fn optional(&self, key: &str) -> Option<String> {
        (self.0)(key)
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
    }

    fn required(&self, key: &'static str) -> Result<String, ConfigError> {
        self.optional(key).ok_or(ConfigError::Missing(key))
    }

    fn string_or(&self, key: &str, default: &str) -> String {
        self.optional(key).unwrap_or_else(|| default.to_string())
    }

    fn parse_or<T: FromStr>(&self, key: &'static str, default: T) -> Result<T, ConfigError> {
        match self.optional(key) {
            None => Ok(default),
            Some(value) => value
                .parse()
                .map_err(|_| ConfigError::Invalid { key, value }),
        }
    }
}

fn socket_addr(key: &'static str, host: &str, port: u16) -> Result<SocketAddr, ConfigError> {
    let value = format!("{host}:{port}");
    value
        .parse()
        .map_err(|_| ConfigError::Invalid { key, value })
}
