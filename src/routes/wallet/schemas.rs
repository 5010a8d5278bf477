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
#[sqlx(type_name = "transaction_direction", rename_all = "snake_case")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionDirection {
    Debit,
    Credit,
}

impl std::fmt::Display for TransactionDirection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TransactionDirection::Debit => write!(f, "DEBIT"),
            TransactionDirection::Credit => write!(f, "CREDIT"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Wallet {
    pub id: Uuid,
    pub user_id: Uuid,
    pub balance: BigDecimal,
    pub currency: CurrencyType,
    pub created_on: DateTime<Utc>,
    pub updated_on: Option<DateTime<Utc>>,
}

impl Wallet {
    pub fn new(user_id: Uuid) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            balance: BigDecimal::zero(),
            currency: CurrencyType::Zar,
            created_on: Utc::now(),
            updated_on: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LedgerEntry {
    pub id: Uuid,
    pub wallet_id: Uuid,
    pub direction: TransactionDirection,
    pub amount: BigDecimal,
    pub description: String,
    pub payment_id: Option<Uuid>,
    pub created_on: DateTime<Utc>,
}

impl LedgerEntry {
    pub fn signed_amount(&self) -> BigDecimal {
        match self.direction {
            TransactionDirection::Credit => self.amount.clone(),
            TransactionDirection::Debit => -self.amount.clone(),
        }
    }
}

/// One balance mutation as accepted by `adjust_balance`.
#[derive(Debug, Clone)]
pub struct BalanceAdjustment {
    pub direction: TransactionDirection,
    pub amount: BigDecimal,
    pub description: String,
    pub payment_id: Option<Uuid>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct WalletData {
    #[schema(value_type = String)]
    pub balance: String,
    pub currency: CurrencyType,
}

impl From<&Wallet> for WalletData {
    fn from(wallet: &Wallet) -> Self {
        Self {
            balance: round_currency(&wallet.balance).to_string(),
            currency: wallet.currency,
        }
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LedgerEntryData {
    #[schema(value_type = String)]
    pub id: Uuid,
    pub direction: TransactionDirection,
    #[schema(value_type = String)]
    pub amount: String,
    pub description: String,
    #[schema(value_type = Option<String>)]
    pub payment_id: Option<Uuid>,
    pub created_on: DateTime<Utc>,
}

impl From<LedgerEntry> for LedgerEntryData {
    fn from(entry: LedgerEntry) -> Self {
        Self {
            id: entry.id,
            direction: entry.direction,
            amount: round_currency(&entry.amount).to_string(),
            description: entry.description,
            payment_id: entry.payment_id,
            created_on: entry.created_on,
        }
    }
}

fn validate_positive_amount(amount: &BigDecimal) -> Result<(), ValidationError> {
    if amount <= &BigDecimal::zero() || &round_currency(amount) != amount {
        return Err(ValidationError::new("amount")
            .with_message("amount must be positive with at most two decimal places".into()));
    }
    Ok(())
}

#[derive(Deserialize, Debug, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct WithdrawalRequest {
    #[schema(value_type = String)]
    #[serde(deserialize_with = "deserialize_amount")]
    #[validate(custom(function = "validate_positive_amount"))]
    pub amount: BigDecimal,
    #[validate(length(max = 255, message = "description must not exceed 255 characters"))]
    pub description: Option<String>,
}

impl FromRequest for WithdrawalRequest {
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
