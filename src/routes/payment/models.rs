use super::schemas::{Payment, PaymentProvider, PaymentStatus};
use crate::schemas::CurrencyType;
use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, FromRow)]
pub struct PaymentModel {
    pub id: Uuid,
    pub payer_id: Uuid,
    pub amount: BigDecimal,
    pub currency: CurrencyType,
    pub status: PaymentStatus,
    pub provider: PaymentProvider,
    pub appointment_id: Option<Uuid>,
    pub order_id: Option<Uuid>,
    pub description: Option<String>,
    pub provider_reference: Option<String>,
    pub failure_reason: Option<String>,
    pub created_on: DateTime<Utc>,
    pub updated_on: Option<DateTime<Utc>>,
}

impl PaymentModel {
    pub fn into_schema(self) -> Payment {
        Payment {
            id: self.id,
            payer_id: self.payer_id,
            amount: self.amount,
            currency: self.currency,
            status: self.status,
            provider: self.provider,
            appointment_id: self.appointment_id,
            order_id: self.order_id,
            description: self.description,
            provider_reference: self.provider_reference,
            failure_reason: self.failure_reason,
            created_on: self.created_on,
            updated_on: self.updated_on,
        }
    }
}
