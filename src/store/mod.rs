//! Transactional storage behind the booking, payment and wallet components.
//!
//! Every operation that touches more than one row runs inside a single
//! [`UnitOfWork`]. Dropping a unit without calling [`UnitOfWork::commit`]
//! discards everything it wrote.
mod memory;
mod postgres;
#[cfg(test)]
mod tests;

pub use memory::MemoryRepository;
pub use postgres::PostgresRepository;

use crate::routes::appointment::schemas::{
    ActorRole, Appointment, AppointmentStatus, ServiceListing,
};
use crate::routes::payment::schemas::{Payment, PaymentProvider};
use crate::routes::wallet::schemas::{LedgerEntry, Wallet};
use crate::utils::error_chain_fmt;
use async_trait::async_trait;
use bigdecimal::BigDecimal;
use chrono::NaiveDate;
use uuid::Uuid;

#[derive(thiserror::Error)]
pub enum StoreError {
    /// A uniqueness constraint rejected the write.
    #[error("{0}")]
    Conflict(String),
    #[error("{0}")]
    DatabaseError(String, anyhow::Error),
}

impl std::fmt::Debug for StoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        error_chain_fmt(self, f)
    }
}

#[async_trait]
pub trait Repository: Send + Sync {
    async fn begin(&self) -> Result<Box<dyn UnitOfWork>, StoreError>;
}

#[async_trait]
pub trait UnitOfWork: Send {
    async fn find_active_appointment(
        &mut self,
        provider_id: Uuid,
        date: NaiveDate,
        time: &str,
    ) -> Result<Option<Appointment>, StoreError>;

    /// Fails with [`StoreError::Conflict`] when the slot is already held.
    async fn insert_appointment(&mut self, appointment: &Appointment) -> Result<(), StoreError>;

    /// Reads and locks the appointment row for the rest of the unit.
    async fn get_appointment(&mut self, id: Uuid) -> Result<Option<Appointment>, StoreError>;

    async fn update_appointment(&mut self, appointment: &Appointment) -> Result<(), StoreError>;

    async fn list_appointments(
        &mut self,
        user_id: Uuid,
        role: Option<ActorRole>,
        status: Option<AppointmentStatus>,
    ) -> Result<Vec<Appointment>, StoreError>;

    async fn get_service(&mut self, id: Uuid) -> Result<Option<ServiceListing>, StoreError>;

    async fn get_shop_tax_rate(
        &mut self,
        provider_id: Uuid,
    ) -> Result<Option<BigDecimal>, StoreError>;

    async fn insert_payment(&mut self, payment: &Payment) -> Result<(), StoreError>;

    /// Reads and locks the payment row for the rest of the unit.
    async fn get_payment(&mut self, id: Uuid) -> Result<Option<Payment>, StoreError>;

    async fn get_payment_by_reference(
        &mut self,
        provider: PaymentProvider,
        provider_reference: &str,
    ) -> Result<Option<Payment>, StoreError>;

    async fn update_payment(&mut self, payment: &Payment) -> Result<(), StoreError>;

    /// A `PENDING` or `PROCESSING` payment linked to the appointment, if any.
    async fn find_open_payment(
        &mut self,
        appointment_id: Uuid,
    ) -> Result<Option<Payment>, StoreError>;

    /// Returns the user's wallet locked for update, creating an empty one
    /// on first use.
    async fn get_or_create_wallet(&mut self, user_id: Uuid) -> Result<Wallet, StoreError>;

    async fn get_wallet(&mut self, wallet_id: Uuid) -> Result<Option<Wallet>, StoreError>;

    async fn update_wallet_balance(
        &mut self,
        wallet_id: Uuid,
        balance: &BigDecimal,
    ) -> Result<(), StoreError>;

    async fn insert_ledger_entry(&mut self, entry: &LedgerEntry) -> Result<(), StoreError>;

    /// Newest first.
    async fn list_ledger_entries(&mut self, wallet_id: Uuid)
        -> Result<Vec<LedgerEntry>, StoreError>;

    async fn commit(self: Box<Self>) -> Result<(), StoreError>;
}
