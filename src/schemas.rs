use crate::errors::GenericError;
use actix_web::dev::Payload;
use actix_web::{FromRequest, HttpMessage, HttpRequest};
use serde::{Deserialize, Serialize};
use std::future::{ready, Ready};
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Serialize, Debug, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct GenericResponse<D> {
    pub status: bool,
    pub customer_message: String,
    pub code: String,
    pub data: Option<D>,
}

impl<D> GenericResponse<D> {
    pub fn success(message: &str, data: Option<D>) -> Self {
        Self {
            status: true,
            customer_message: String::from(message),
            code: String::from("200"),
            data,
        }
    }

    pub fn error(message: &str, code: &str, data: Option<D>) -> Self {
        Self {
            status: false,
            customer_message: String::from(message),
            code: String::from(code),
            data,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash, sqlx::Type, ToSchema)]
#[sqlx(type_name = "currency_type")]
pub enum CurrencyType {
    #[serde(rename = "ZAR")]
    #[sqlx(rename = "ZAR")]
    Zar,
}

impl CurrencyType {
    pub fn as_str(&self) -> &'static str {
        match self {
            CurrencyType::Zar => "ZAR",
        }
    }
}

impl std::fmt::Display for CurrencyType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Request metadata populated by `HeaderValidation`.
///
/// The acting user is resolved by the upstream authentication layer and
/// forwarded in `x-user-id`.
#[derive(Debug, Clone)]
pub struct RequestMetaData {
    pub request_id: String,
    pub device_id: String,
    pub user_id: Uuid,
}

impl FromRequest for RequestMetaData {
    type Error = GenericError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let value = req.extensions().get::<RequestMetaData>().cloned();
        let result = match value {
            Some(meta_data) => Ok(meta_data),
            None => Err(GenericError::UnexpectedCustomError(
                "Request metadata is not populated".to_string(),
            )),
        };
        ready(result)
    }
}
