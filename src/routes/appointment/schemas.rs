use crate::constants::TIME_SLOT_PATTERN;
use crate::errors::GenericError;
use crate::pricing::PriceBreakdown;
use actix_web::dev::Payload;
use actix_web::{web, FromRequest, HttpRequest};
use chrono::{DateTime, NaiveDate, Utc};
use futures_util::future::LocalBoxFuture;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::{Validate, ValidationError};

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash, sqlx::Type, ToSchema)]
#[sqlx(type_name = "appointment_status", rename_all = "snake_case")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AppointmentStatus {
    Pending,
    Confirmed,
    Cancelled,
    Completed,
    NoShow,
}

impl AppointmentStatus {
    /// Statuses that hold the slot.
    pub fn is_active(&self) -> bool {
        matches!(self, AppointmentStatus::Pending | AppointmentStatus::Confirmed)
    }

    pub fn is_terminal(&self) -> bool {
        !self.is_active()
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AppointmentStatus::Pending => "PENDING",
            AppointmentStatus::Confirmed => "CONFIRMED",
            AppointmentStatus::Cancelled => "CANCELLED",
            AppointmentStatus::Completed => "COMPLETED",
            AppointmentStatus::NoShow => "NO_SHOW",
        }
    }
}

impl std::fmt::Display for AppointmentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Which side of the booking is acting.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ActorRole {
    Requester,
    Provider,
}

impl std::fmt::Display for ActorRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ActorRole::Requester => write!(f, "requester"),
            ActorRole::Provider => write!(f, "provider"),
        }
    }
}

fn validate_time_slot(time: &str) -> Result<(), ValidationError> {
    if TIME_SLOT_PATTERN.is_match(time) {
        Ok(())
    } else {
        Err(ValidationError::new("time_slot")
            .with_message("time must be a HH:MM slot label".into()))
    }
}

#[derive(Deserialize, Debug, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateAppointmentRequest {
    #[schema(value_type = Option<String>)]
    pub service_id: Option<Uuid>,
    #[schema(value_type = String)]
    pub provider_id: Uuid,
    pub date: NaiveDate,
    #[validate(custom(function = "validate_time_slot"))]
    pub time: String,
    #[validate(length(max = 1000, message = "notes must not exceed 1000 characters"))]
    pub notes: Option<String>,
    #[validate(length(min = 1, max = 500, message = "address must be 1-500 characters"))]
    pub address: Option<String>,
}

impl FromRequest for CreateAppointmentRequest {
    type Error = GenericError;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, payload: &mut Payload) -> Self::Future {
        let fut = web::Json::<Self>::from_request(req, payload);

        Box::pin(async move {
            match fut.await {
                Ok(json) => {
                    let body = json.into_inner();
                    body.validate()
                        .map_err(|e| GenericError::ValidationError(e.to_string()))?;
                    Ok(body)
                }
                Err(e) => Err(GenericError::ValidationError(e.to_string())),
            }
        })
    }
}

#[derive(Deserialize, Debug, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AppointmentStatusUpdateRequest {
    pub status: AppointmentStatus,
    pub actor_role: ActorRole,
}

impl FromRequest for AppointmentStatusUpdateRequest {
    type Error = GenericError;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, payload: &mut Payload) -> Self::Future {
        let fut = web::Json::<Self>::from_request(req, payload);

        Box::pin(async move {
            match fut.await {
                Ok(json) => Ok(json.into_inner()),
                Err(e) => Err(GenericError::ValidationError(e.to_string())),
            }
        })
    }
}

#[derive(Deserialize, Debug, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AppointmentCancelRequest {
    pub actor_role: ActorRole,
}

impl FromRequest for AppointmentCancelRequest {
    type Error = GenericError;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, payload: &mut Payload) -> Self::Future {
        let fut = web::Json::<Self>::from_request(req, payload);

        Box::pin(async move {
            match fut.await {
                Ok(json) => Ok(json.into_inner()),
                Err(e) => Err(GenericError::ValidationError(e.to_string())),
            }
        })
    }
}

#[derive(Deserialize, Debug, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AppointmentListFilter {
    pub role: Option<ActorRole>,
    pub status: Option<AppointmentStatus>,
}

/// Validated booking request handed to the booking manager.
#[derive(Debug, Clone)]
pub struct NewAppointment {
    pub requester_id: Uuid,
    pub provider_id: Uuid,
    pub service_id: Option<Uuid>,
    pub date: NaiveDate,
    pub time: String,
    pub note: Option<String>,
    pub address: Option<String>,
}

impl NewAppointment {
    pub fn from_request(requester_id: Uuid, body: CreateAppointmentRequest) -> Self {
        Self {
            requester_id,
            provider_id: body.provider_id,
            service_id: body.service_id,
            date: body.date,
            time: body.time,
            note: body.notes,
            address: body.address,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Appointment {
    #[schema(value_type = String)]
    pub id: Uuid,
    #[schema(value_type = String)]
    pub requester_id: Uuid,
    #[schema(value_type = String)]
    pub provider_id: Uuid,
    #[schema(value_type = Option<String>)]
    pub service_id: Option<Uuid>,
    pub date: NaiveDate,
    pub time: String,
    pub status: AppointmentStatus,
    pub note: Option<String>,
    pub address: Option<String>,
    pub is_paid: bool,
    pub created_on: DateTime<Utc>,
    pub updated_on: Option<DateTime<Utc>>,
}

impl Appointment {
    pub fn is_participant(&self, user_id: Uuid) -> bool {
        self.requester_id == user_id || self.provider_id == user_id
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ServiceSummary {
    #[schema(value_type = String)]
    pub id: Uuid,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AppointmentData {
    #[schema(value_type = String)]
    pub id: Uuid,
    pub status: AppointmentStatus,
    pub date: NaiveDate,
    pub time: String,
    pub service: Option<ServiceSummary>,
    #[schema(value_type = String)]
    pub requester: Uuid,
    #[schema(value_type = String)]
    pub provider: Uuid,
    pub note: Option<String>,
    pub address: Option<String>,
    pub is_paid: bool,
    pub created_on: DateTime<Utc>,
}

impl AppointmentData {
    pub fn new(appointment: Appointment, service: Option<ServiceSummary>) -> Self {
        Self {
            id: appointment.id,
            status: appointment.status,
            date: appointment.date,
            time: appointment.time,
            service,
            requester: appointment.requester_id,
            provider: appointment.provider_id,
            note: appointment.note,
            address: appointment.address,
            is_paid: appointment.is_paid,
            created_on: appointment.created_on,
        }
    }
}

/// Service listing owned by a provider. Read-only here.
#[derive(Debug, Clone)]
pub struct ServiceListing {
    pub id: Uuid,
    pub provider_id: Uuid,
    pub name: String,
    pub price: bigdecimal::BigDecimal,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AppointmentQuoteData {
    #[schema(value_type = String)]
    pub appointment_id: Uuid,
    pub service: ServiceSummary,
    pub breakdown: PriceBreakdown,
}
