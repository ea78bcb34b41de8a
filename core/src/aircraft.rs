//! Existence check for aircraft referenced by new flights.

use crate::flight::AircraftId;
use std::future::Future;
use std::pin::Pin;
use thiserror::Error;

/// Why an existence check did not succeed.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExistenceError {
    /// The aircraft service answered: no such aircraft.
    #[error("aircraft with id {0} not found")]
    NotFound(AircraftId),

    /// The aircraft service could not give an answer.
    #[error("aircraft service unavailable: {0}")]
    Unavailable(String),
}

/// Confirms that an externally owned aircraft exists.
///
/// This is the one synchronous dependency allowed to abort flight creation.
pub trait ExistenceValidator: Send + Sync {
    /// Resolve to `Ok(())` if the aircraft exists.
    ///
    /// # Errors
    ///
    /// - [`ExistenceError::NotFound`] if the aircraft does not exist
    /// - [`ExistenceError::Unavailable`] if the answer could not be obtained
    fn exists(
        &self,
        aircraft_id: AircraftId,
    ) -> Pin<Box<dyn Future<Output = Result<(), ExistenceError>> + Send + '_>>;
}
