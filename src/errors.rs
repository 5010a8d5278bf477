use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};

use crate::schemas::GenericResponse;
use crate::utils::error_chain_fmt;

#[derive(thiserror::Error)]
pub enum GenericError {
    #[error("{0}")]
    ValidationError(String),
    #[error("{0}")]
    SlotConflict(String),
    #[error("{0}")]
    InvalidTransition(String),
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
    #[error("{0}")]
    UnexpectedCustomError(String),
    #[error(transparent)]
    UnexpectedError(#[from] anyhow::Error),
}

impl std::fmt::Debug for GenericError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        error_chain_fmt(self, f)
    }
}

impl GenericError {
    /// Stable error kind rendered as the envelope `code`.
    pub fn kind(&self) -> &'static str {
        match self {
            GenericError::ValidationError(_) => "VALIDATION_ERROR",
            GenericError::SlotConflict(_) => "SLOT_CONFLICT",
            GenericError::InvalidTransition(_) => "INVALID_TRANSITION",
            GenericError::InsufficientBalance(_) => "INSUFFICIENT_BALANCE",
            GenericError::ProviderUnavailable(_) => "PROVIDER_UNAVAILABLE",
            GenericError::ProviderFailure(_) => "PROVIDER_FAILURE",
            GenericError::NotFound(_) => "NOT_FOUND",
            GenericError::Forbidden(_) => "FORBIDDEN",
            GenericError::InvalidSignature(_) => "INVALID_SIGNATURE",
            GenericError::DatabaseError(_, _) => "DATABASE_ERROR",
            GenericError::UnexpectedCustomError(_) | GenericError::UnexpectedError(_) => {
                "UNEXPECTED_ERROR"
            }
        }
    }
}

impl ResponseError for GenericError {
    fn status_code(&self) -> StatusCode {
        match self {
            GenericError::ValidationError(_) => StatusCode::BAD_REQUEST,
            GenericError::SlotConflict(_) => StatusCode::CONFLICT,
            GenericError::InvalidTransition(_) => StatusCode::CONFLICT,
            GenericError::InsufficientBalance(_) => StatusCode::PAYMENT_REQUIRED,
            GenericError::ProviderUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            GenericError::ProviderFailure(_) => StatusCode::BAD_GATEWAY,
            GenericError::NotFound(_) => StatusCode::NOT_FOUND,
            GenericError::Forbidden(_) => StatusCode::FORBIDDEN,
            GenericError::InvalidSignature(_) => StatusCode::UNAUTHORIZED,
            GenericError::DatabaseError(_, _) => StatusCode::INTERNAL_SERVER_ERROR,
            GenericError::UnexpectedCustomError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            GenericError::UnexpectedError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status_code = self.status_code();
        let inner_error_msg = match self {
            GenericError::DatabaseError(message, _err) => message.to_string(),
            GenericError::UnexpectedError(_) => "Internal Server Error".to_string(),
            other => other.to_string(),
        };

        HttpResponse::build(status_code).json(GenericResponse::error(
            &inner_error_msg,
            self.kind(),
            Some(()),
        ))
    }
}
