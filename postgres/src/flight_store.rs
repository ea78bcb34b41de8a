//! `PostgreSQL`-backed [`FlightStore`].

use chrono::{DateTime, Utc};
use flights_core::flight::{AircraftId, Flight, FlightId, FlightStatus};
use flights_core::store::{FlightStore, RecordTimestamps, StoreError};
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use std::future::Future;
use std::pin::Pin;
use uuid::Uuid;

/// Constraint guarding `(number, departure_time)`.
pub const UNIQUE_FLIGHT_CONSTRAINT: &str = "unique_flight_instance";

/// Durable flight storage over a sqlx connection pool.
///
/// The table's `unique_flight_instance` constraint is the only duplicate check:
/// a violating insert comes back as [`StoreError::Duplicate`].
///
/// # Example
///
/// ```no_run
/// use flights_postgres::PostgresFlightStore;
/// use sqlx::PgPool;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let pool = PgPool::connect("postgres://localhost/flights").await?;
/// let store = PostgresFlightStore::new(pool);
/// store.migrate().await?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone, Debug)]
pub struct PostgresFlightStore {
    pool: PgPool,
}

impl PostgresFlightStore {
    /// Create a store over an existing pool.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// The underlying pool, e.g. for health checks.
    #[must_use]
    pub const fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Apply the embedded migrations.
    ///
    /// # Errors
    ///
    /// Returns the migrator's error if any migration fails.
    pub async fn migrate(&self) -> Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        tracing::info!("Flight store migrations applied");
        Ok(())
    }

    /// Check the database answers.
    ///
    /// # Errors
    ///
    /// Returns the driver error if the round trip fails.
    pub async fn ping(&self) -> Result<(), sqlx::Error> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    async fn insert(&self, flight: &Flight) -> Result<RecordTimestamps, StoreError> {
        let row = sqlx::query(
            r"
            INSERT INTO flights (
                id, number, origin, destination,
                departure_time, arrival_time, status, aircraft_id,
                created_by, last_updated_by, organization_id
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            RETURNING created_at, updated_at
            ",
        )
        .bind(flight.id.as_uuid())
        .bind(&flight.number)
        .bind(&flight.origin)
        .bind(&flight.destination)
        .bind(flight.departure_time)
        .bind(flight.arrival_time)
        .bind(flight.status.as_str())
        .bind(flight.aircraft_id.as_uuid())
        .bind(flight.created_by)
        .bind(flight.last_updated_by)
        .bind(flight.organization_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| insert_error(flight, e))?;

        let created_at: DateTime<Utc> = row
            .try_get("created_at")
            .map_err(|e| database_error(flight.id, &e))?;
        let updated_at: DateTime<Utc> = row
            .try_get("updated_at")
            .map_err(|e| database_error(flight.id, &e))?;

        record("create", "success");
        Ok(RecordTimestamps {
            created_at,
            updated_at,
        })
    }

    async fn select(&self, id: FlightId) -> Result<Flight, StoreError> {
        let row = sqlx::query(
            r"
            SELECT
                id, number, origin, destination, departure_time, arrival_time,
                status, aircraft_id, created_by, last_updated_by, organization_id,
                created_at, updated_at
            FROM flights
            WHERE id = $1
            ",
        )
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            record("get", "error");
            tracing::error!(flight_id = %id, error = %e, "Failed to load flight");
            database_error(id, &e)
        })?;

        let Some(row) = row else {
            record("get", "not_found");
            return Err(StoreError::NotFound(id));
        };

        let flight = row_to_flight(&row).map_err(|e| database_error(id, &e))?;
        record("get", "success");
        Ok(flight)
    }
}

impl FlightStore for PostgresFlightStore {
    fn create_flight<'a>(
        &'a self,
        flight: &'a Flight,
    ) -> Pin<Box<dyn Future<Output = Result<RecordTimestamps, StoreError>> + Send + 'a>> {
        Box::pin(self.insert(flight))
    }

    fn get_flight_by_id(
        &self,
        id: FlightId,
    ) -> Pin<Box<dyn Future<Output = Result<Flight, StoreError>> + Send + '_>> {
        Box::pin(self.select(id))
    }
}

fn insert_error(flight: &Flight, error: sqlx::Error) -> StoreError {
    if let sqlx::Error::Database(db_err) = &error {
        if db_err.is_unique_violation() && db_err.constraint() == Some(UNIQUE_FLIGHT_CONSTRAINT) {
            record("create", "duplicate");
            return StoreError::Duplicate {
                number: flight.number.clone(),
                departure: flight.departure_time,
            };
        }
        tracing::error!(
            flight_id = %flight.id,
            code = db_err.code().as_deref().unwrap_or_default(),
            constraint = db_err.constraint().unwrap_or_default(),
            error = %error,
            "Postgres rejected flight insert"
        );
    } else {
        tracing::error!(flight_id = %flight.id, error = %error, "Failed to insert flight");
    }
    record("create", "error");
    database_error(flight.id, &error)
}

fn database_error(flight_id: FlightId, error: &sqlx::Error) -> StoreError {
    StoreError::Database {
        flight_id,
        reason: error.to_string(),
    }
}

fn record(operation: &'static str, result: &'static str) {
    metrics::counter!(
        "flights_store_operations_total",
        "operation" => operation,
        "result" => result
    )
    .increment(1);
}

fn row_to_flight(row: &PgRow) -> Result<Flight, sqlx::Error> {
    let status: String = row.try_get("status")?;
    Ok(Flight {
        id: FlightId::from_uuid(row.try_get::<Uuid, _>("id")?),
        number: row.try_get("number")?,
        origin: row.try_get("origin")?,
        destination: row.try_get("destination")?,
        departure_time: row.try_get("departure_time")?,
        arrival_time: row.try_get("arrival_time")?,
        status: FlightStatus::parse(&status),
        aircraft_id: AircraftId::from_uuid(row.try_get::<Uuid, _>("aircraft_id")?),
        created_by: row.try_get("created_by")?,
        last_updated_by: row.try_get("last_updated_by")?,
        organization_id: row.try_get("organization_id")?,
        created_at: Some(row.try_get("created_at")?),
        updated_at: Some(row.try_get("updated_at")?),
    })
}
