use super::errors::LedgerError;
use super::schemas::{BalanceAdjustment, LedgerEntry, TransactionDirection, Wallet};
use crate::store::{Repository, UnitOfWork};
use bigdecimal::{BigDecimal, Zero};
use chrono::Utc;
use std::sync::Arc;
use uuid::Uuid;

/// The only code path that changes a wallet balance.
///
/// Runs inside the caller's unit of work so that a payment bundle can debit
/// the wallet and update payment and appointment rows atomically. The wallet
/// row is locked for the rest of the unit, which serialises concurrent
/// adjustments on the same wallet.
#[tracing::instrument(name = "adjust wallet balance", skip(uow, adjustment), fields(direction = %adjustment.direction, amount = %adjustment.amount))]
pub async fn adjust_balance(
    uow: &mut dyn UnitOfWork,
    wallet_id: Uuid,
    adjustment: BalanceAdjustment,
) -> Result<LedgerEntry, LedgerError> {
    if adjustment.amount <= BigDecimal::zero() {
        return Err(LedgerError::ValidationError(
            "Amount must be greater than zero".to_string(),
        ));
    }
    let wallet = uow
        .get_wallet(wallet_id)
        .await?
        .ok_or_else(|| LedgerError::NotFound(format!("Wallet {} not found", wallet_id)))?;

    let balance = match adjustment.direction {
        TransactionDirection::Credit => &wallet.balance + &adjustment.amount,
        TransactionDirection::Debit => {
            if wallet.balance < adjustment.amount {
                tracing::warn!(
                    "Rejected debit of {} against balance {}",
                    adjustment.amount,
                    wallet.balance
                );
                return Err(LedgerError::InsufficientBalance(
                    "Insufficient wallet balance".to_string(),
                ));
            }
            &wallet.balance - &adjustment.amount
        }
    };

    let entry = LedgerEntry {
        id: Uuid::new_v4(),
        wallet_id,
        direction: adjustment.direction,
        amount: adjustment.amount,
        description: adjustment.description,
        payment_id: adjustment.payment_id,
        created_on: Utc::now(),
    };
    uow.update_wallet_balance(wallet_id, &balance).await?;
    uow.insert_ledger_entry(&entry).await?;
    Ok(entry)
}

/// Wallet reads and standalone balance movements (withdrawals, refunds,
/// referral rewards).
pub struct LedgerStore {
    repository: Arc<dyn Repository>,
}

impl LedgerStore {
    pub fn new(repository: Arc<dyn Repository>) -> Self {
        Self { repository }
    }

    #[tracing::instrument(name = "fetch wallet", skip(self))]
    pub async fn get_wallet(&self, user_id: Uuid) -> Result<Wallet, LedgerError> {
        let mut uow = self.repository.begin().await?;
        let wallet = uow.get_or_create_wallet(user_id).await?;
        uow.commit().await?;
        Ok(wallet)
    }

    #[tracing::instrument(name = "fetch wallet transactions", skip(self))]
    pub async fn list_transactions(&self, user_id: Uuid) -> Result<Vec<LedgerEntry>, LedgerError> {
        let mut uow = self.repository.begin().await?;
        let wallet = uow.get_or_create_wallet(user_id).await?;
        let entries = uow.list_ledger_entries(wallet.id).await?;
        uow.commit().await?;
        Ok(entries)
    }

    #[tracing::instrument(name = "withdraw from wallet", skip(self))]
    pub async fn withdraw(
        &self,
        user_id: Uuid,
        amount: BigDecimal,
        description: Option<String>,
    ) -> Result<Wallet, LedgerError> {
        self.apply(
            user_id,
            TransactionDirection::Debit,
            amount,
            description.unwrap_or_else(|| "Wallet withdrawal".to_string()),
        )
        .await
    }

    #[tracing::instrument(name = "credit wallet", skip(self))]
    pub async fn credit(
        &self,
        user_id: Uuid,
        amount: BigDecimal,
        description: &str,
    ) -> Result<Wallet, LedgerError> {
        self.apply(
            user_id,
            TransactionDirection::Credit,
            amount,
            description.to_string(),
        )
        .await
    }

    async fn apply(
        &self,
        user_id: Uuid,
        direction: TransactionDirection,
        amount: BigDecimal,
        description: String,
    ) -> Result<Wallet, LedgerError> {
        let mut uow = self.repository.begin().await?;
        let wallet = uow.get_or_create_wallet(user_id).await?;
        let adjustment = BalanceAdjustment {
            direction,
            amount,
            description,
            payment_id: None,
        };
        adjust_balance(uow.as_mut(), wallet.id, adjustment).await?;
        let wallet = uow
            .get_wallet(wallet.id)
            .await?
            .ok_or_else(|| LedgerError::NotFound(format!("Wallet {} not found", wallet.id)))?;
        uow.commit().await?;
        Ok(wallet)
    }
}
