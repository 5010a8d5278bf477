use super::{Repository, StoreError, UnitOfWork};
use crate::routes::appointment::schemas::{
    ActorRole, Appointment, AppointmentStatus, ServiceListing,
};
use crate::routes::payment::schemas::{Payment, PaymentProvider};
use crate::routes::wallet::schemas::{LedgerEntry, Wallet};
use async_trait::async_trait;
use bigdecimal::BigDecimal;
use chrono::{NaiveDate, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};
use uuid::Uuid;

#[derive(Debug, Clone, Default)]
struct MemoryState {
    appointments: Vec<Appointment>,
    services: HashMap<Uuid, ServiceListing>,
    shop_tax_rates: HashMap<Uuid, BigDecimal>,
    payments: HashMap<Uuid, Payment>,
    wallets: HashMap<Uuid, Wallet>,
    ledger: Vec<LedgerEntry>,
}

/// Process-local store. A unit of work holds the store lock from `begin`
/// until it is committed or dropped, so units never interleave.
#[derive(Debug, Clone, Default)]
pub struct MemoryRepository {
    state: Arc<Mutex<MemoryState>>,
}

impl MemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert_service(&self, service: ServiceListing) {
        let mut state = self.state.lock().await;
        state.services.insert(service.id, service);
    }

    pub async fn set_shop_tax_rate(&self, provider_id: Uuid, tax_rate_pct: BigDecimal) {
        let mut state = self.state.lock().await;
        state.shop_tax_rates.insert(provider_id, tax_rate_pct);
    }
}

#[async_trait]
impl Repository for MemoryRepository {
    async fn begin(&self) -> Result<Box<dyn UnitOfWork>, StoreError> {
        let guard = self.state.clone().lock_owned().await;
        let working = guard.clone();
        Ok(Box::new(MemoryUnitOfWork { guard, working }))
    }
}

struct MemoryUnitOfWork {
    guard: OwnedMutexGuard<MemoryState>,
    working: MemoryState,
}

fn missing(entity: &str, id: Uuid) -> StoreError {
    StoreError::DatabaseError(
        format!("{} {} does not exist", entity, id),
        anyhow::anyhow!("row not found during update"),
    )
}

#[async_trait]
impl UnitOfWork for MemoryUnitOfWork {
    async fn find_active_appointment(
        &mut self,
        provider_id: Uuid,
        date: NaiveDate,
        time: &str,
    ) -> Result<Option<Appointment>, StoreError> {
        Ok(self
            .working
            .appointments
            .iter()
            .find(|a| {
                a.provider_id == provider_id
                    && a.date == date
                    && a.time == time
                    && a.status.is_active()
            })
            .cloned())
    }

    async fn insert_appointment(&mut self, appointment: &Appointment) -> Result<(), StoreError> {
        let taken = self.working.appointments.iter().any(|a| {
            a.provider_id == appointment.provider_id
                && a.date == appointment.date
                && a.time == appointment.time
                && a.status.is_active()
        });
        if taken && appointment.status.is_active() {
            return Err(StoreError::Conflict(format!(
                "Slot {} {} is already booked",
                appointment.date, appointment.time
            )));
        }
        self.working.appointments.push(appointment.clone());
        Ok(())
    }

    async fn get_appointment(&mut self, id: Uuid) -> Result<Option<Appointment>, StoreError> {
        Ok(self
            .working
            .appointments
            .iter()
            .find(|a| a.id == id)
            .cloned())
    }

    async fn update_appointment(&mut self, appointment: &Appointment) -> Result<(), StoreError> {
        let existing = self
            .working
            .appointments
            .iter_mut()
            .find(|a| a.id == appointment.id)
            .ok_or_else(|| missing("Appointment", appointment.id))?;
        *existing = appointment.clone();
        existing.updated_on = Some(Utc::now());
        Ok(())
    }

    async fn list_appointments(
        &mut self,
        user_id: Uuid,
        role: Option<ActorRole>,
        status: Option<AppointmentStatus>,
    ) -> Result<Vec<Appointment>, StoreError> {
        Ok(self
            .working
            .appointments
            .iter()
            .rev()
            .filter(|a| match role {
                Some(ActorRole::Requester) => a.requester_id == user_id,
                Some(ActorRole::Provider) => a.provider_id == user_id,
                None => a.is_participant(user_id),
            })
            .filter(|a| status.map_or(true, |s| a.status == s))
            .cloned()
            .collect())
    }

    async fn get_service(&mut self, id: Uuid) -> Result<Option<ServiceListing>, StoreError> {
        Ok(self.working.services.get(&id).cloned())
    }

    async fn get_shop_tax_rate(
        &mut self,
        provider_id: Uuid,
    ) -> Result<Option<BigDecimal>, StoreError> {
        Ok(self.working.shop_tax_rates.get(&provider_id).cloned())
    }

    async fn insert_payment(&mut self, payment: &Payment) -> Result<(), StoreError> {
        if self.working.payments.contains_key(&payment.id) {
            return Err(StoreError::Conflict(format!(
                "Payment {} already exists",
                payment.id
            )));
        }
        self.working.payments.insert(payment.id, payment.clone());
        Ok(())
    }

    async fn get_payment(&mut self, id: Uuid) -> Result<Option<Payment>, StoreError> {
        Ok(self.working.payments.get(&id).cloned())
    }

    async fn get_payment_by_reference(
        &mut self,
        provider: PaymentProvider,
        provider_reference: &str,
    ) -> Result<Option<Payment>, StoreError> {
        Ok(self
            .working
            .payments
            .values()
            .find(|p| {
                p.provider == provider
                    && p.provider_reference.as_deref() == Some(provider_reference)
            })
            .cloned())
    }

    async fn update_payment(&mut self, payment: &Payment) -> Result<(), StoreError> {
        let existing = self
            .working
            .payments
            .get_mut(&payment.id)
            .ok_or_else(|| missing("Payment", payment.id))?;
        *existing = payment.clone();
        existing.updated_on = Some(Utc::now());
        Ok(())
    }

    async fn find_open_payment(
        &mut self,
        appointment_id: Uuid,
    ) -> Result<Option<Payment>, StoreError> {
        Ok(self
            .working
            .payments
            .values()
            .find(|p| p.appointment_id == Some(appointment_id) && !p.status.is_terminal())
            .cloned())
    }

    async fn get_or_create_wallet(&mut self, user_id: Uuid) -> Result<Wallet, StoreError> {
        if let Some(wallet) = self.working.wallets.values().find(|w| w.user_id == user_id) {
            return Ok(wallet.clone());
        }
        let wallet = Wallet::new(user_id);
        self.working.wallets.insert(wallet.id, wallet.clone());
        Ok(wallet)
    }

    async fn get_wallet(&mut self, wallet_id: Uuid) -> Result<Option<Wallet>, StoreError> {
        Ok(self.working.wallets.get(&wallet_id).cloned())
    }

    async fn update_wallet_balance(
        &mut self,
        wallet_id: Uuid,
        balance: &BigDecimal,
    ) -> Result<(), StoreError> {
        let wallet = self
            .working
            .wallets
            .get_mut(&wallet_id)
            .ok_or_else(|| missing("Wallet", wallet_id))?;
        wallet.balance = balance.clone();
        wallet.updated_on = Some(Utc::now());
        Ok(())
    }

    async fn insert_ledger_entry(&mut self, entry: &LedgerEntry) -> Result<(), StoreError> {
        self.working.ledger.push(entry.clone());
        Ok(())
    }

    async fn list_ledger_entries(
        &mut self,
        wallet_id: Uuid,
    ) -> Result<Vec<LedgerEntry>, StoreError> {
        Ok(self
            .working
            .ledger
            .iter()
            .rev()
            .filter(|e| e.wallet_id == wallet_id)
            .cloned()
            .collect())
    }

    async fn commit(self: Box<Self>) -> Result<(), StoreError> {
        let MemoryUnitOfWork { mut guard, working } = *self;
        *guard = working;
        Ok(())
    }
}
