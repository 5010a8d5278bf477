use crate::errors::GenericError;
use crate::payment_client::WebhookError;
use crate::routes::appointment::errors::BookingError;
use crate::routes::wallet::errors::LedgerError;
use crate::store::StoreError;
use crate::utils::error_chain_fmt;

#[allow(clippy::enum_variant_names)]
#[derive(thiserror::Error)]
pub enum PaymentError {
    #[error("{0}")]
    ValidationError(String),
    #[error("{0}")]
    InsufficientBalance(String),
    #[error("{0}")]
    ProviderUnavailable(String),
    #[error("{0}")]
    ProviderFailure(String),
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Forbidden(String),
    #[error("{0}")]
    InvalidSignature(String),
    #[error("{0}")]
    DatabaseError(String, anyhow::Error),
    #[error(transparent)]
    UnexpectedError(#[from] anyhow::Error),
}

impl std::fmt::Debug for PaymentError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        error_chain_fmt(self, f)
    }
}

impl From<StoreError> for PaymentError {
    fn from(err: StoreError) -> PaymentError {
        match err {
            StoreError::Conflict(message) => PaymentError::DatabaseError(
                message.clone(),
                anyhow::anyhow!("unexpected constraint violation: {}", message),
            ),
            StoreError::DatabaseError(message, error) => PaymentError::DatabaseError(message, error),
        }
    }
}

impl From<BookingError> for PaymentError {
    fn from(err: BookingError) -> PaymentError {
        match err {
            BookingError::ValidationError(message) => PaymentError::ValidationError(message),
            BookingError::NotFound(message) => PaymentError::NotFound(message),
            BookingError::Forbidden(message) => PaymentError::Forbidden(message),
            BookingError::DatabaseError(message, error) => PaymentError::DatabaseError(message, error),
            e @ (BookingError::SlotConflict(_) | BookingError::InvalidTransition { .. }) => {
                PaymentError::ValidationError(e.to_string())
            }
        }
    }
}

impl From<LedgerError> for PaymentError {
    fn from(err: LedgerError) -> PaymentError {
        match err {
            LedgerError::ValidationError(message) => PaymentError::ValidationError(message),
            LedgerError::InsufficientBalance(message) => PaymentError::InsufficientBalance(message),
            LedgerError::NotFound(message) => PaymentError::NotFound(message),
            LedgerError::DatabaseError(message, error) => PaymentError::DatabaseError(message, error),
        }
    }
}

impl From<WebhookError> for PaymentError {
    fn from(err: WebhookError) -> PaymentError {
        match err {
            WebhookError::InvalidSignature(message) => PaymentError::InvalidSignature(message),
            WebhookError::MalformedPayload(message) => PaymentError::ValidationError(message),
        }
    }
}

impl From<PaymentError> for GenericError {
    fn from(err: PaymentError) -> GenericError {
        match err {
            PaymentError::ValidationError(message) => GenericError::ValidationError(message),
            PaymentError::InsufficientBalance(message) => GenericError::InsufficientBalance(message),
            PaymentError::ProviderUnavailable(message) => GenericError::ProviderUnavailable(message),
            PaymentError::ProviderFailure(message) => GenericError::ProviderFailure(message),
            PaymentError::NotFound(message) => GenericError::NotFound(message),
            PaymentError::Forbidden(message) => GenericError::Forbidden(message),
            PaymentError::InvalidSignature(message) => GenericError::InvalidSignature(message),
            PaymentError::DatabaseError(message, error) => {
                GenericError::DatabaseError(message, error)
            }
            PaymentError::UnexpectedError(error) => GenericError::UnexpectedError(error),
        }
    }
}
