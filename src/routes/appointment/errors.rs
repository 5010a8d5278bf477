use super::schemas::AppointmentStatus;
use crate::errors::GenericError;
use crate::store::StoreError;
use crate::utils::error_chain_fmt;

#[allow(clippy::enum_variant_names)]
#[derive(thiserror::Error)]
pub enum BookingError {
    #[error("{0}")]
    ValidationError(String),
    #[error("{0}")]
    SlotConflict(String),
    #[error("Cannot move appointment from {from} to {to}")]
    InvalidTransition {
        from: AppointmentStatus,
        to: AppointmentStatus,
    },
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Forbidden(String),
    #[error("{0}")]
    DatabaseError(String, anyhow::Error),
}

impl std::fmt::Debug for BookingError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        error_chain_fmt(self, f)
    }
}

impl From<StoreError> for BookingError {
    fn from(err: StoreError) -> BookingError {
        match err {
            StoreError::Conflict(message) => BookingError::SlotConflict(message),
            StoreError::DatabaseError(message, error) => BookingError::DatabaseError(message, error),
        }
    }
}

impl From<BookingError> for GenericError {
    fn from(err: BookingError) -> GenericError {
        match err {
            BookingError::ValidationError(message) => GenericError::ValidationError(message),
            BookingError::SlotConflict(message) => GenericError::SlotConflict(message),
            e @ BookingError::InvalidTransition { .. } => {
                GenericError::InvalidTransition(e.to_string())
            }
            BookingError::NotFound(message) => GenericError::NotFound(message),
            BookingError::Forbidden(message) => GenericError::Forbidden(message),
            BookingError::DatabaseError(message, error) => {
                GenericError::DatabaseError(message, error)
            }
        }
    }
}
