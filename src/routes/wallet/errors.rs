use crate::errors::GenericError;
use crate::store::StoreError;
use crate::utils::error_chain_fmt;

#[derive(thiserror::Error)]
pub enum LedgerError {
    #[error("{0}")]
    ValidationError(String),
    #[error("{0}")]
    InsufficientBalance(String),
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    DatabaseError(String, anyhow::Error),
}

impl std::fmt::Debug for LedgerError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        error_chain_fmt(self, f)
    }
}

impl From<StoreError> for LedgerError {
    fn from(err: StoreError) -> LedgerError {
        match err {
            StoreError::Conflict(message) => LedgerError::DatabaseError(
                message.clone(),
                anyhow::anyhow!("unexpected constraint violation: {}", message),
            ),
            StoreError::DatabaseError(message, error) => LedgerError::DatabaseError(message, error),
        }
    }
}

impl From<LedgerError> for GenericError {
    fn from(err: LedgerError) -> GenericError {
        match err {
            LedgerError::ValidationError(message) => GenericError::ValidationError(message),
            LedgerError::InsufficientBalance(message) => GenericError::InsufficientBalance(message),
            LedgerError::NotFound(message) => GenericError::NotFound(message),
            LedgerError::DatabaseError(message, error) => GenericError::DatabaseError(message, error),
        }
    }
}
