use super::{Repository, StoreError, UnitOfWork};
use crate::routes::appointment::models::{AppointmentModel, ServiceListingModel};
use crate::routes::appointment::schemas::{
    ActorRole, Appointment, AppointmentStatus, ServiceListing,
};
use crate::routes::payment::models::PaymentModel;
use crate::routes::payment::schemas::{Payment, PaymentProvider};
use crate::routes::wallet::models::{LedgerEntryModel, WalletModel};
use crate::routes::wallet::schemas::{LedgerEntry, Wallet};
use crate::schemas::CurrencyType;
use async_trait::async_trait;
use bigdecimal::BigDecimal;
use chrono::{NaiveDate, Utc};
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

const APPOINTMENT_COLUMNS: &str = r#"
    id, requester_id, provider_id, service_id, date, time, status,
    note, address, is_paid, created_on, updated_on
"#;

const PAYMENT_COLUMNS: &str = r#"
    id, payer_id, amount, currency, status, provider, appointment_id, order_id,
    description, provider_reference, failure_reason, created_on, updated_on
"#;

fn database_error(action: &str, e: sqlx::Error) -> StoreError {
    tracing::error!("Failed to execute query while {}: {:?}", action, e);
    StoreError::DatabaseError(
        format!("A database failure occurred while {}", action),
        anyhow::Error::new(e),
    )
}

#[derive(Debug, Clone)]
pub struct PostgresRepository {
    pool: PgPool,
}

impl PostgresRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl Repository for PostgresRepository {
    async fn begin(&self) -> Result<Box<dyn UnitOfWork>, StoreError> {
        let transaction = self
            .pool
            .begin()
            .await
            .map_err(|e| database_error("acquiring a Postgres connection from the pool", e))?;
        Ok(Box::new(PostgresUnitOfWork { transaction }))
    }
}

struct PostgresUnitOfWork {
    transaction: Transaction<'static, Postgres>,
}

#[async_trait]
impl UnitOfWork for PostgresUnitOfWork {
    #[tracing::instrument(name = "fetch active appointment for slot", skip(self))]
    async fn find_active_appointment(
        &mut self,
        provider_id: Uuid,
        date: NaiveDate,
        time: &str,
    ) -> Result<Option<Appointment>, StoreError> {
        let query = format!(
            r#"SELECT {} FROM appointment
            WHERE provider_id = $1 AND date = $2 AND time = $3
            AND status IN ('pending', 'confirmed')"#,
            APPOINTMENT_COLUMNS
        );
        let row = sqlx::query_as::<_, AppointmentModel>(&query)
            .bind(provider_id)
            .bind(date)
            .bind(time)
            .fetch_optional(&mut *self.transaction)
            .await
            .map_err(|e| database_error("fetching appointment for slot", e))?;
        Ok(row.map(|r| r.into_schema()))
    }

    #[tracing::instrument(name = "save appointment", skip(self, appointment), fields(appointment_id = %appointment.id))]
    async fn insert_appointment(&mut self, appointment: &Appointment) -> Result<(), StoreError> {
        let query = format!(
            "INSERT INTO appointment ({}) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)",
            APPOINTMENT_COLUMNS
        );
        sqlx::query(&query)
            .bind(appointment.id)
            .bind(appointment.requester_id)
            .bind(appointment.provider_id)
            .bind(appointment.service_id)
            .bind(appointment.date)
            .bind(&appointment.time)
            .bind(appointment.status)
            .bind(&appointment.note)
            .bind(&appointment.address)
            .bind(appointment.is_paid)
            .bind(appointment.created_on)
            .bind(appointment.updated_on)
            .execute(&mut *self.transaction)
            .await
            .map_err(|e| match &e {
                sqlx::Error::Database(db_error) if db_error.is_unique_violation() => {
                    StoreError::Conflict(format!(
                        "Slot {} {} is already booked",
                        appointment.date, appointment.time
                    ))
                }
                _ => database_error("saving appointment", e),
            })?;
        Ok(())
    }

    #[tracing::instrument(name = "fetch locked appointment", skip(self))]
    async fn get_appointment(&mut self, id: Uuid) -> Result<Option<Appointment>, StoreError> {
        let query = format!(
            "SELECT {} FROM appointment WHERE id = $1 FOR UPDATE",
            APPOINTMENT_COLUMNS
        );
        let row = sqlx::query_as::<_, AppointmentModel>(&query)
            .bind(id)
            .fetch_optional(&mut *self.transaction)
            .await
            .map_err(|e| database_error("fetching appointment", e))?;
        Ok(row.map(|r| r.into_schema()))
    }

    #[tracing::instrument(name = "update appointment", skip(self, appointment), fields(appointment_id = %appointment.id))]
    async fn update_appointment(&mut self, appointment: &Appointment) -> Result<(), StoreError> {
        sqlx::query(
            r#"UPDATE appointment
            SET status = $2, is_paid = $3, updated_on = $4
            WHERE id = $1"#,
        )
        .bind(appointment.id)
        .bind(appointment.status)
        .bind(appointment.is_paid)
        .bind(Utc::now())
        .execute(&mut *self.transaction)
        .await
        .map_err(|e| database_error("updating appointment", e))?;
        Ok(())
    }

    #[tracing::instrument(name = "fetch appointment list", skip(self))]
    async fn list_appointments(
        &mut self,
        user_id: Uuid,
        role: Option<ActorRole>,
        status: Option<AppointmentStatus>,
    ) -> Result<Vec<Appointment>, StoreError> {
        let as_requester = role != Some(ActorRole::Provider);
        let as_provider = role != Some(ActorRole::Requester);
        let query = format!(
            r#"SELECT {} FROM appointment
            WHERE (($2 AND requester_id = $1) OR ($3 AND provider_id = $1))
            AND ($4::appointment_status IS NULL OR status = $4)
            ORDER BY created_on DESC"#,
            APPOINTMENT_COLUMNS
        );
        let rows = sqlx::query_as::<_, AppointmentModel>(&query)
            .bind(user_id)
            .bind(as_requester)
            .bind(as_provider)
            .bind(status)
            .fetch_all(&mut *self.transaction)
            .await
            .map_err(|e| database_error("fetching appointment list", e))?;
        Ok(rows.into_iter().map(|r| r.into_schema()).collect())
    }

    #[tracing::instrument(name = "fetch service listing", skip(self))]
    async fn get_service(&mut self, id: Uuid) -> Result<Option<ServiceListing>, StoreError> {
        let row = sqlx::query_as::<_, ServiceListingModel>(
            "SELECT id, provider_id, name, price FROM service_listing WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&mut *self.transaction)
        .await
        .map_err(|e| database_error("fetching service listing", e))?;
        Ok(row.map(|r| r.into_schema()))
    }

    #[tracing::instrument(name = "fetch shop tax rate", skip(self))]
    async fn get_shop_tax_rate(
        &mut self,
        provider_id: Uuid,
    ) -> Result<Option<BigDecimal>, StoreError> {
        sqlx::query_scalar::<_, BigDecimal>(
            "SELECT tax_rate FROM provider_shop WHERE provider_id = $1",
        )
        .bind(provider_id)
        .fetch_optional(&mut *self.transaction)
        .await
        .map_err(|e| database_error("fetching shop tax rate", e))
    }

    #[tracing::instrument(name = "save payment", skip(self, payment), fields(payment_id = %payment.id))]
    async fn insert_payment(&mut self, payment: &Payment) -> Result<(), StoreError> {
        let query = format!(
            "INSERT INTO payment ({}) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)",
            PAYMENT_COLUMNS
        );
        sqlx::query(&query)
            .bind(payment.id)
            .bind(payment.payer_id)
            .bind(&payment.amount)
            .bind(payment.currency)
            .bind(payment.status)
            .bind(payment.provider)
            .bind(payment.appointment_id)
            .bind(payment.order_id)
            .bind(&payment.description)
            .bind(&payment.provider_reference)
            .bind(&payment.failure_reason)
            .bind(payment.created_on)
            .bind(payment.updated_on)
            .execute(&mut *self.transaction)
            .await
            .map_err(|e| match &e {
                sqlx::Error::Database(db_error) if db_error.is_unique_violation() => {
                    StoreError::Conflict(format!("Payment {} already exists", payment.id))
                }
                _ => database_error("saving payment", e),
            })?;
        Ok(())
    }

    #[tracing::instrument(name = "fetch locked payment", skip(self))]
    async fn get_payment(&mut self, id: Uuid) -> Result<Option<Payment>, StoreError> {
        let query = format!(
            "SELECT {} FROM payment WHERE id = $1 FOR UPDATE",
            PAYMENT_COLUMNS
        );
        let row = sqlx::query_as::<_, PaymentModel>(&query)
            .bind(id)
            .fetch_optional(&mut *self.transaction)
            .await
            .map_err(|e| database_error("fetching payment", e))?;
        Ok(row.map(|r| r.into_schema()))
    }

    #[tracing::instrument(name = "fetch payment by provider reference", skip(self))]
    async fn get_payment_by_reference(
        &mut self,
        provider: PaymentProvider,
        provider_reference: &str,
    ) -> Result<Option<Payment>, StoreError> {
        let query = format!(
            "SELECT {} FROM payment WHERE provider = $1 AND provider_reference = $2 FOR UPDATE",
            PAYMENT_COLUMNS
        );
        let row = sqlx::query_as::<_, PaymentModel>(&query)
            .bind(provider)
            .bind(provider_reference)
            .fetch_optional(&mut *self.transaction)
            .await
            .map_err(|e| database_error("fetching payment by provider reference", e))?;
        Ok(row.map(|r| r.into_schema()))
    }

    #[tracing::instrument(name = "update payment", skip(self, payment), fields(payment_id = %payment.id))]
    async fn update_payment(&mut self, payment: &Payment) -> Result<(), StoreError> {
        sqlx::query(
            r#"UPDATE payment
            SET status = $2, provider_reference = $3, failure_reason = $4, updated_on = $5
            WHERE id = $1"#,
        )
        .bind(payment.id)
        .bind(payment.status)
        .bind(&payment.provider_reference)
        .bind(&payment.failure_reason)
        .bind(Utc::now())
        .execute(&mut *self.transaction)
        .await
        .map_err(|e| database_error("updating payment", e))?;
        Ok(())
    }

    #[tracing::instrument(name = "fetch open payment for appointment", skip(self))]
    async fn find_open_payment(
        &mut self,
        appointment_id: Uuid,
    ) -> Result<Option<Payment>, StoreError> {
        let query = format!(
            r#"SELECT {} FROM payment
            WHERE appointment_id = $1 AND status IN ('pending', 'processing')
            ORDER BY created_on DESC LIMIT 1"#,
            PAYMENT_COLUMNS
        );
        let row = sqlx::query_as::<_, PaymentModel>(&query)
            .bind(appointment_id)
            .fetch_optional(&mut *self.transaction)
            .await
            .map_err(|e| database_error("fetching open payment for appointment", e))?;
        Ok(row.map(|r| r.into_schema()))
    }

    #[tracing::instrument(name = "fetch locked wallet", skip(self))]
    async fn get_or_create_wallet(&mut self, user_id: Uuid) -> Result<Wallet, StoreError> {
        sqlx::query(
            r#"INSERT INTO wallet (id, user_id, balance, currency, created_on)
            VALUES ($1, $2, 0, $3, $4)
            ON CONFLICT (user_id) DO NOTHING"#,
        )
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(CurrencyType::Zar)
        .bind(Utc::now())
        .execute(&mut *self.transaction)
        .await
        .map_err(|e| database_error("creating wallet", e))?;

        let row = sqlx::query_as::<_, WalletModel>(
            r#"SELECT id, user_id, balance, currency, created_on, updated_on
            FROM wallet WHERE user_id = $1 FOR UPDATE"#,
        )
        .bind(user_id)
        .fetch_one(&mut *self.transaction)
        .await
        .map_err(|e| database_error("fetching wallet", e))?;
        Ok(row.into_schema())
    }

    #[tracing::instrument(name = "fetch locked wallet by id", skip(self))]
    async fn get_wallet(&mut self, wallet_id: Uuid) -> Result<Option<Wallet>, StoreError> {
        let row = sqlx::query_as::<_, WalletModel>(
            r#"SELECT id, user_id, balance, currency, created_on, updated_on
            FROM wallet WHERE id = $1 FOR UPDATE"#,
        )
        .bind(wallet_id)
        .fetch_optional(&mut *self.transaction)
        .await
        .map_err(|e| database_error("fetching wallet", e))?;
        Ok(row.map(|r| r.into_schema()))
    }

    #[tracing::instrument(name = "update wallet balance", skip(self))]
    async fn update_wallet_balance(
        &mut self,
        wallet_id: Uuid,
        balance: &BigDecimal,
    ) -> Result<(), StoreError> {
        sqlx::query("UPDATE wallet SET balance = $2, updated_on = $3 WHERE id = $1")
            .bind(wallet_id)
            .bind(balance)
            .bind(Utc::now())
            .execute(&mut *self.transaction)
            .await
            .map_err(|e| database_error("updating wallet balance", e))?;
        Ok(())
    }

    #[tracing::instrument(name = "save ledger entry", skip(self, entry), fields(wallet_id = %entry.wallet_id))]
    async fn insert_ledger_entry(&mut self, entry: &LedgerEntry) -> Result<(), StoreError> {
        sqlx::query(
            r#"INSERT INTO wallet_transaction
            (id, wallet_id, direction, amount, description, payment_id, created_on)
            VALUES ($1, $2, $3, $4, $5, $6, $7)"#,
        )
        .bind(entry.id)
        .bind(entry.wallet_id)
        .bind(entry.direction)
        .bind(&entry.amount)
        .bind(&entry.description)
        .bind(entry.payment_id)
        .bind(entry.created_on)
        .execute(&mut *self.transaction)
        .await
        .map_err(|e| database_error("saving ledger entry", e))?;
        Ok(())
    }

    #[tracing::instrument(name = "fetch ledger entries", skip(self))]
    async fn list_ledger_entries(
        &mut self,
        wallet_id: Uuid,
    ) -> Result<Vec<LedgerEntry>, StoreError> {
        let rows = sqlx::query_as::<_, LedgerEntryModel>(
            r#"SELECT id, wallet_id, direction, amount, description, payment_id, created_on
            FROM wallet_transaction WHERE wallet_id = $1
            ORDER BY created_on DESC"#,
        )
        .bind(wallet_id)
        .fetch_all(&mut *self.transaction)
        .await
        .map_err(|e| database_error("fetching ledger entries", e))?;
        Ok(rows.into_iter().map(|r| r.into_schema()).collect())
    }

    async fn commit(self: Box<Self>) -> Result<(), StoreError> {
        self.transaction
            .commit()
            .await
            .map_err(|e| database_error("committing the transaction", e))
    }
}
