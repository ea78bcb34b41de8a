//! `PostgreSQL` flight store for the flights service.
//!
//! This crate provides [`PostgresFlightStore`], the production implementation of
//! the `FlightStore` trait from `flights-core`. It uses sqlx and supports:
//!
//! - Inserts returning store-assigned timestamps
//! - Uniqueness of `(number, departure_time)` enforced by the database
//! - Embedded migrations
//! - Connection pooling
//!
//! # Example
//!
//! ```ignore
//! use flights_postgres::PostgresFlightStore;
//! use sqlx::postgres::PgPoolOptions;
//!
//! async fn example() -> Result<(), Box<dyn std::error::Error>> {
//!     let pool = PgPoolOptions::new()
//!         .max_connections(10)
//!         .connect("postgres://localhost/flights")
//!         .await?;
//!     let store = PostgresFlightStore::new(pool);
//!     store.migrate().await?;
//!     Ok(())
//! }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod flight_store;

pub use flight_store::{PostgresFlightStore, UNIQUE_FLIGHT_CONSTRAINT};
