use crate::errors::GenericError;
use crate::schemas::CurrencyType;
use crate::utils::{deserialize_amount, round_currency};
use actix_web::dev::Payload;
use actix_web::{web, FromRequest, HttpRequest};
use bigdecimal::{BigDecimal, Zero};
use chrono::{DateTime, Utc};
use futures_util::future::LocalBoxFuture;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::{Validate, ValidationError};

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash, sqlx::Type, ToSchema)]
#[sqlx(type_name = "payment_status", rename_all = "snake_case")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentStatus {
    Pending,
    Processing,
    Completed,
    Failed,
    Cancelled,
}

impl PaymentStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            PaymentStatus::Completed | PaymentStatus::Failed | PaymentStatus::Cancelled
        )
    }

    /// Forward-only payment state machine.
    pub fn can_transition_to(&self, next: PaymentStatus) -> bool {
        matches!(
            (self, next),
            (PaymentStatus::Pending, PaymentStatus::Processing)
                | (PaymentStatus::Pending, PaymentStatus::Completed)
                | (PaymentStatus::Pending, PaymentStatus::Failed)
                | (PaymentStatus::Pending, PaymentStatus::Cancelled)
                | (PaymentStatus::Processing, PaymentStatus::Completed)
                | (PaymentStatus::Processing, PaymentStatus::Failed)
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Pending => "PENDING",
            PaymentStatus::Processing => "PROCESSING",
            PaymentStatus::Completed => "COMPLETED",
            PaymentStatus::Failed => "FAILED",
            PaymentStatus::Cancelled => "CANCELLED",
        }
    }
}

impl std::fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash, sqlx::Type, ToSchema)]
#[sqlx(type_name = "payment_provider", rename_all = "snake_case")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentProvider {
    Wallet,
    GatewayA,
    GatewayB,
}

impl PaymentProvider {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentProvider::Wallet => "WALLET",
            PaymentProvider::GatewayA => "GATEWAY_A",
            PaymentProvider::GatewayB => "GATEWAY_B",
        }
    }

    /// Parses the lowercase path segment used by webhook routes.
    pub fn from_path(segment: &str) -> Option<Self> {
        match segment.to_ascii_lowercase().as_str() {
            "wallet" => Some(PaymentProvider::Wallet),
            "gateway_a" | "gateway-a" => Some(PaymentProvider::GatewayA),
            "gateway_b" | "gateway-b" => Some(PaymentProvider::GatewayB),
            _ => None,
        }
    }
}

impl std::fmt::Display for PaymentProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Payment {
    #[schema(value_type = String)]
    pub id: Uuid,
    #[schema(value_type = String)]
    pub payer_id: Uuid,
    #[schema(value_type = String)]
    pub amount: BigDecimal,
    pub currency: CurrencyType,
    pub status: PaymentStatus,
    pub provider: PaymentProvider,
    #[schema(value_type = Option<String>)]
    pub appointment_id: Option<Uuid>,
    #[schema(value_type = Option<String>)]
    pub order_id: Option<Uuid>,
    pub description: Option<String>,
    pub provider_reference: Option<String>,
    pub failure_reason: Option<String>,
    pub created_on: DateTime<Utc>,
    pub updated_on: Option<DateTime<Utc>>,
}

impl Payment {
    pub fn new(
        payer_id: Uuid,
        amount: BigDecimal,
        provider: PaymentProvider,
        appointment_id: Option<Uuid>,
        order_id: Option<Uuid>,
        description: Option<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            payer_id,
            amount,
            currency: CurrencyType::Zar,
            status: PaymentStatus::Pending,
            provider,
            appointment_id,
            order_id,
            description,
            provider_reference: None,
            failure_reason: None,
            created_on: Utc::now(),
            updated_on: None,
        }
    }
}

fn validate_positive_amount(amount: &BigDecimal) -> Result<(), ValidationError> {
    if amount <= &BigDecimal::zero() {
        return Err(ValidationError::new("amount").with_message("amount must be positive".into()));
    }
    if &round_currency(amount) != amount {
        return Err(ValidationError::new("amount")
            .with_message("amount must have at most two decimal places".into()));
    }
    Ok(())
}

fn validate_url(url: &str) -> Result<(), ValidationError> {
    if url.starts_with("https://") || url.starts_with("http://") {
        Ok(())
    } else {
        Err(ValidationError::new("url").with_message("url must be absolute".into()))
    }
}

#[derive(Deserialize, Debug, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PaymentInitiationRequest {
    pub provider: PaymentProvider,
    #[schema(value_type = String)]
    #[serde(deserialize_with = "deserialize_amount")]
    #[validate(custom(function = "validate_positive_amount"))]
    pub amount: BigDecimal,
    #[validate(length(max = 255, message = "description must not exceed 255 characters"))]
    pub description: Option<String>,
    #[schema(value_type = Option<String>)]
    pub appointment_id: Option<Uuid>,
    #[schema(value_type = Option<String>)]
    pub order_id: Option<Uuid>,
    #[validate(custom(function = "validate_url"))]
    pub return_url: Option<String>,
    #[validate(custom(function = "validate_url"))]
    pub cancel_url: Option<String>,
}

impl FromRequest for PaymentInitiationRequest {
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
                    if body.appointment_id.is_some() && body.order_id.is_some() {
                        return Err(GenericError::ValidationError(
                            "A payment can be linked to an appointment or an order, not both"
                                .to_string(),
                        ));
                    }
                    Ok(body)
                }
                Err(e) => Err(GenericError::ValidationError(e.to_string())),
            }
        })
    }
}

/// Validated payment request handed to the orchestrator.
#[derive(Debug, Clone)]
pub struct PaymentInitiation {
    pub payer_id: Uuid,
    pub provider: PaymentProvider,
    pub amount: BigDecimal,
    pub description: Option<String>,
    pub appointment_id: Option<Uuid>,
    pub order_id: Option<Uuid>,
    pub return_url: Option<String>,
    pub cancel_url: Option<String>,
}

impl PaymentInitiation {
    pub fn from_request(payer_id: Uuid, body: PaymentInitiationRequest) -> Self {
        Self {
            payer_id,
            provider: body.provider,
            amount: body.amount,
            description: body.description,
            appointment_id: body.appointment_id,
            order_id: body.order_id,
            return_url: body.return_url,
            cancel_url: body.cancel_url,
        }
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PaymentInitiationData {
    #[schema(value_type = String)]
    pub payment_id: Uuid,
    pub status: PaymentStatus,
    pub redirect_url: Option<String>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PaymentData {
    #[schema(value_type = String)]
    pub id: Uuid,
    #[schema(value_type = String)]
    pub amount: String,
    pub currency: CurrencyType,
    pub status: PaymentStatus,
    pub provider: PaymentProvider,
    #[schema(value_type = Option<String>)]
    pub appointment_id: Option<Uuid>,
    #[schema(value_type = Option<String>)]
    pub order_id: Option<Uuid>,
    pub provider_reference: Option<String>,
    pub failure_reason: Option<String>,
    pub created_on: DateTime<Utc>,
}

impl From<Payment> for PaymentData {
    fn from(payment: Payment) -> Self {
        Self {
            id: payment.id,
            amount: round_currency(&payment.amount).to_string(),
            currency: payment.currency,
            status: payment.status,
            provider: payment.provider,
            appointment_id: payment.appointment_id,
            order_id: payment.order_id,
            provider_reference: payment.provider_reference,
            failure_reason: payment.failure_reason,
            created_on: payment.created_on,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallbackOutcome {
    Success,
    Failure { reason: String },
}

/// Gateway callback after signature verification and mapping.
#[derive(Debug, Clone)]
pub struct CallbackNotification {
    pub provider: PaymentProvider,
    pub provider_reference: String,
    /// Our payment id echoed back by the gateway.
    pub merchant_reference: Option<Uuid>,
    pub outcome: CallbackOutcome,
    pub amount: Option<BigDecimal>,
    /// Verified webhook body, logged when the callback is applied.
    pub raw_payload: serde_json::Value,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReconciliationData {
    #[schema(value_type = String)]
    pub payment_id: Uuid,
    pub status: PaymentStatus,
    pub replayed: bool,
}
