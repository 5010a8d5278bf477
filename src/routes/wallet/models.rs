use super::schemas::{LedgerEntry, TransactionDirection, Wallet};
use crate::schemas::CurrencyType;
use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, FromRow)]
pub struct WalletModel {
    pub id: Uuid,
    pub user_id: Uuid,
    pub balance: BigDecimal,
    pub currency: CurrencyType,
    pub created_on: DateTime<Utc>,
    pub updated_on: Option<DateTime<Utc>>,
}

impl WalletModel {
    pub fn into_schema(self) -> Wallet {
        Wallet {
            id: self.id,
            user_id: self.user_id,
            balance: self.balance,
            currency: self.currency,
            created_on: self.created_on,
            updated_on: self.updated_on,
        }
    }
}

#[derive(Debug, FromRow)]
pub struct LedgerEntryModel {
    pub id: Uuid,
    pub wallet_id: Uuid,
    pub direction: TransactionDirection,
    pub amount: BigDecimal,
    pub description: String,
    pub payment_id: Option<Uuid>,
    pub created_on: DateTime<Utc>,
}

impl LedgerEntryModel {
    pub fn into_schema(self) -> LedgerEntry {
        LedgerEntry {
            id: self.id,
            wallet_id: self.wallet_id,
            direction: self.direction,
            amount: self.amount,
            description: self.description,
            payment_id: self.payment_id,
            created_on: self.created_on,
        }
    }
}
