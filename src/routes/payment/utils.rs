use super::errors::PaymentError;
use super::schemas::{
    CallbackNotification, CallbackOutcome, Payment, PaymentData, PaymentInitiation,
    PaymentInitiationData, PaymentProvider, PaymentStatus, ReconciliationData,
};
use crate::configuration::PaymentSettings;
use crate::notification_client::{notify, NotificationDispatcher, NotificationEvent};
use crate::payment_client::{
    GatewayInitiation, GatewayOutcome, GatewayRegistry, PaymentGateway,
};
use crate::routes::appointment::schemas::AppointmentStatus;
use crate::routes::appointment::utils::{confirm_paid_appointment, validate_payable_appointment};
use crate::routes::wallet::errors::LedgerError;
use crate::routes::wallet::schemas::{BalanceAdjustment, TransactionDirection};
use crate::routes::wallet::utils::adjust_balance;
use crate::store::{Repository, UnitOfWork};
use actix_web::http::header::HeaderMap;
use bigdecimal::{BigDecimal, Zero};
use chrono::Utc;
use std::sync::Arc;
use uuid::Uuid;

/// Moves a payment forward, refusing anything the state machine forbids.
pub fn advance_payment(
    payment: &mut Payment,
    next: PaymentStatus,
    failure_reason: Option<String>,
) -> Result<(), PaymentError> {
    if !payment.status.can_transition_to(next) {
        return Err(PaymentError::ValidationError(format!(
            "Payment cannot move from {} to {}",
            payment.status, next
        )));
    }
    payment.status = next;
    payment.failure_reason = failure_reason;
    payment.updated_on = Some(Utc::now());
    Ok(())
}

fn ensure_payer(actor_id: Uuid, payment: &Payment) -> Result<(), PaymentError> {
    if payment.payer_id == actor_id {
        Ok(())
    } else {
        Err(PaymentError::Forbidden(
            "You are not the payer of this payment".to_string(),
        ))
    }
}

async fn fetch_payment(uow: &mut dyn UnitOfWork, id: Uuid) -> Result<Payment, PaymentError> {
    uow.get_payment(id)
        .await?
        .ok_or_else(|| PaymentError::NotFound(format!("Payment {} not found", id)))
}

/// A success reporting a different amount than was charged is not trusted.
fn checked_outcome(payment: &Payment, notification: &CallbackNotification) -> CallbackOutcome {
    match (&notification.outcome, &notification.amount) {
        (CallbackOutcome::Success, Some(amount)) if amount != &payment.amount => {
            tracing::warn!(
                "Gateway reported {} for payment {} of {}",
                amount,
                payment.id,
                payment.amount
            );
            CallbackOutcome::Failure {
                reason: "amount mismatch".to_string(),
            }
        }
        (outcome, _) => outcome.clone(),
    }
}

pub struct PaymentOrchestrator {
    repository: Arc<dyn Repository>,
    registry: GatewayRegistry,
    notifier: Arc<dyn NotificationDispatcher>,
    wallet_enabled: bool,
    notify_base_url: String,
}

impl PaymentOrchestrator {
    pub fn new(
        repository: Arc<dyn Repository>,
        registry: GatewayRegistry,
        notifier: Arc<dyn NotificationDispatcher>,
        settings: &PaymentSettings,
    ) -> Self {
        Self {
            repository,
            registry,
            notifier,
            wallet_enabled: settings.wallet_enabled,
            notify_base_url: settings.notify_base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Webhooks land on `{notify_base_url}/payment/webhook/{provider}`.
    fn notify_url(&self, provider: PaymentProvider) -> String {
        format!(
            "{}/payment/webhook/{}",
            self.notify_base_url,
            provider.as_str().to_lowercase()
        )
    }

    fn gateway(&self, provider: PaymentProvider) -> Result<Arc<dyn PaymentGateway>, PaymentError> {
        self.registry.get(provider).ok_or_else(|| {
            PaymentError::ProviderUnavailable(format!("Payment provider {} is not available", provider))
        })
    }

    #[tracing::instrument(name = "initiate payment", skip(self, request), fields(payer_id = %request.payer_id, provider = %request.provider, amount = %request.amount))]
    pub async fn initiate(
        &self,
        request: PaymentInitiation,
    ) -> Result<PaymentInitiationData, PaymentError> {
        if request.amount <= BigDecimal::zero() {
            return Err(PaymentError::ValidationError(
                "Amount must be greater than zero".to_string(),
            ));
        }
        if request.appointment_id.is_some() && request.order_id.is_some() {
            return Err(PaymentError::ValidationError(
                "A payment can be linked to an appointment or an order, not both".to_string(),
            ));
        }
        match request.provider {
            PaymentProvider::Wallet => {
                if !self.wallet_enabled {
                    return Err(PaymentError::ProviderUnavailable(
                        "Wallet payments are not available".to_string(),
                    ));
                }
                self.pay_from_wallet(request).await
            }
            provider => {
                let gateway = self.gateway(provider)?;
                self.pay_with_gateway(gateway, request).await
            }
        }
    }

    /// Debit, payment completion and appointment confirmation commit together.
    async fn pay_from_wallet(
        &self,
        request: PaymentInitiation,
    ) -> Result<PaymentInitiationData, PaymentError> {
        let mut uow = self.repository.begin().await?;
        if let Some(appointment_id) = request.appointment_id {
            validate_payable_appointment(uow.as_mut(), appointment_id, request.payer_id).await?;
        }
        let mut payment = Payment::new(
            request.payer_id,
            request.amount.clone(),
            PaymentProvider::Wallet,
            request.appointment_id,
            request.order_id,
            request.description.clone(),
        );
        uow.insert_payment(&payment).await?;

        let wallet = uow.get_or_create_wallet(request.payer_id).await?;
        let adjustment = BalanceAdjustment {
            direction: TransactionDirection::Debit,
            amount: request.amount,
            description: request
                .description
                .unwrap_or_else(|| format!("Payment {}", payment.id)),
            payment_id: Some(payment.id),
        };
        match adjust_balance(uow.as_mut(), wallet.id, adjustment).await {
            Ok(_) => {}
            Err(LedgerError::InsufficientBalance(message)) => {
                advance_payment(&mut payment, PaymentStatus::Failed, Some(message.clone()))?;
                uow.update_payment(&payment).await?;
                uow.commit().await?;
                tracing::info!("Wallet payment {} failed: {}", payment.id, message);
                self.notify_resolved(&payment, None).await;
                return Err(PaymentError::InsufficientBalance(message));
            }
            Err(e) => return Err(e.into()),
        }

        advance_payment(&mut payment, PaymentStatus::Completed, None)?;
        uow.update_payment(&payment).await?;
        let change = match payment.appointment_id {
            Some(appointment_id) => confirm_paid_appointment(uow.as_mut(), appointment_id).await?,
            None => None,
        };
        uow.commit().await?;
        tracing::info!("Wallet payment {} completed", payment.id);

        self.notify_resolved(&payment, change).await;
        Ok(PaymentInitiationData {
            payment_id: payment.id,
            status: payment.status,
            redirect_url: None,
        })
    }

    /// The `PENDING` record is committed before the gateway is called so no
    /// row lock is held across the network round trip.
    async fn pay_with_gateway(
        &self,
        gateway: Arc<dyn PaymentGateway>,
        request: PaymentInitiation,
    ) -> Result<PaymentInitiationData, PaymentError> {
        let mut uow = self.repository.begin().await?;
        if let Some(appointment_id) = request.appointment_id {
            validate_payable_appointment(uow.as_mut(), appointment_id, request.payer_id).await?;
        }
        let payment = Payment::new(
            request.payer_id,
            request.amount.clone(),
            request.provider,
            request.appointment_id,
            request.order_id,
            request.description.clone(),
        );
        uow.insert_payment(&payment).await?;
        uow.commit().await?;

        let result = gateway
            .initiate(GatewayInitiation {
                payment_id: payment.id,
                amount: &payment.amount,
                description: request.description.as_deref(),
                return_url: request.return_url.as_deref(),
                cancel_url: request.cancel_url.as_deref(),
                notify_url: self.notify_url(request.provider),
            })
            .await;

        // A callback may have resolved the payment while the gateway call was in flight.
        let mut uow = self.repository.begin().await?;
        let mut payment = fetch_payment(uow.as_mut(), payment.id).await?;
        match result {
            Ok(session) => {
                if payment.provider_reference.is_none() {
                    payment.provider_reference = Some(session.provider_reference);
                }
                if payment.status == PaymentStatus::Pending {
                    advance_payment(&mut payment, PaymentStatus::Processing, None)?;
                }
                uow.update_payment(&payment).await?;
                uow.commit().await?;
                tracing::info!(
                    "Payment {} handed to {} as {}",
                    payment.id,
                    payment.provider,
                    payment.provider_reference.as_deref().unwrap_or_default()
                );
                Ok(PaymentInitiationData {
                    payment_id: payment.id,
                    status: payment.status,
                    redirect_url: session.redirect_url,
                })
            }
            Err(e) => {
                tracing::error!("Gateway {} rejected payment {}: {:?}", payment.provider, payment.id, e);
                let reason = e.to_string();
                if payment.status == PaymentStatus::Pending {
                    advance_payment(&mut payment, PaymentStatus::Failed, Some(reason.clone()))?;
                    uow.update_payment(&payment).await?;
                    uow.commit().await?;
                    self.notify_resolved(&payment, None).await;
                }
                Err(PaymentError::ProviderFailure(reason))
            }
        }
    }

    /// Applies a verified gateway outcome. Replays against a terminal payment
    /// succeed without side effects.
    #[tracing::instrument(name = "reconcile payment callback", skip(self, notification), fields(provider = %notification.provider, provider_reference = %notification.provider_reference))]
    pub async fn reconcile_callback(
        &self,
        notification: CallbackNotification,
    ) -> Result<ReconciliationData, PaymentError> {
        let mut uow = self.repository.begin().await?;
        let mut found = uow
            .get_payment_by_reference(notification.provider, &notification.provider_reference)
            .await?
            .map(|p| p.id);
        if found.is_none() {
            if let Some(merchant_reference) = notification.merchant_reference {
                found = uow
                    .get_payment(merchant_reference)
                    .await?
                    .filter(|p| p.provider == notification.provider)
                    .map(|p| p.id);
            }
        }
        let payment_id = found.ok_or_else(|| {
            PaymentError::NotFound(format!(
                "No payment matches reference {}",
                notification.provider_reference
            ))
        })?;
        let mut payment = fetch_payment(uow.as_mut(), payment_id).await?;

        if payment.status.is_terminal() {
            tracing::info!(
                "Ignoring callback for payment {} which is already {}",
                payment.id,
                payment.status
            );
            return Ok(ReconciliationData {
                payment_id: payment.id,
                status: payment.status,
                replayed: true,
            });
        }

        tracing::info!(
            raw_payload = %notification.raw_payload,
            "Applying {} callback to payment {}",
            notification.provider,
            payment.id
        );
        if payment.provider_reference.is_none() {
            payment.provider_reference = Some(notification.provider_reference.clone());
        }
        let mut change = None;
        match checked_outcome(&payment, &notification) {
            CallbackOutcome::Success => {
                advance_payment(&mut payment, PaymentStatus::Completed, None)?;
                uow.update_payment(&payment).await?;
                if let Some(appointment_id) = payment.appointment_id {
                    change = confirm_paid_appointment(uow.as_mut(), appointment_id).await?;
                }
            }
            CallbackOutcome::Failure { reason } => {
                advance_payment(&mut payment, PaymentStatus::Failed, Some(reason))?;
                uow.update_payment(&payment).await?;
            }
        }
        uow.commit().await?;
        tracing::info!("Payment {} reconciled as {}", payment.id, payment.status);

        self.notify_resolved(&payment, change).await;
        Ok(ReconciliationData {
            payment_id: payment.id,
            status: payment.status,
            replayed: false,
        })
    }

    /// Authenticates a raw webhook through the gateway's adapter, then
    /// reconciles it.
    #[tracing::instrument(name = "handle payment webhook", skip(self, headers, body))]
    pub async fn handle_webhook(
        &self,
        provider_path: &str,
        headers: &HeaderMap,
        body: &[u8],
    ) -> Result<ReconciliationData, PaymentError> {
        let provider = PaymentProvider::from_path(provider_path)
            .filter(|p| *p != PaymentProvider::Wallet)
            .ok_or_else(|| {
                PaymentError::NotFound(format!("Unknown payment provider {}", provider_path))
            })?;
        let gateway = self.gateway(provider)?;
        let notification = gateway.parse_webhook(headers, body).map_err(|e| {
            tracing::warn!("Rejected {} webhook: {}", provider, e);
            PaymentError::from(e)
        })?;
        self.reconcile_callback(notification).await
    }

    /// Asks the gateway for the outcome of a `PROCESSING` payment. Payments the
    /// gateway still reports as pending are left as they are.
    #[tracing::instrument(name = "verify payment", skip(self))]
    pub async fn verify_payment(
        &self,
        actor_id: Uuid,
        payment_id: Uuid,
    ) -> Result<PaymentData, PaymentError> {
        let payment = self.read_payment(actor_id, payment_id).await?;
        if payment.status != PaymentStatus::Processing {
            return Ok(payment.into());
        }
        let gateway = self.gateway(payment.provider)?;
        let provider_reference = payment.provider_reference.clone().unwrap_or_default();
        let outcome = gateway
            .verify(&provider_reference, payment.id)
            .await
            .map_err(|e| {
                tracing::error!("Failed to verify payment {}: {:?}", payment.id, e);
                PaymentError::ProviderFailure(e.to_string())
            })?;

        let (outcome, amount) = match outcome {
            GatewayOutcome::Pending => return Ok(payment.into()),
            GatewayOutcome::Success { amount } => (CallbackOutcome::Success, amount),
            GatewayOutcome::Failure { reason } => (CallbackOutcome::Failure { reason }, None),
        };
        self.reconcile_callback(CallbackNotification {
            provider: payment.provider,
            provider_reference,
            merchant_reference: Some(payment.id),
            outcome,
            amount,
            raw_payload: serde_json::Value::Null,
        })
        .await?;
        Ok(self.read_payment(actor_id, payment_id).await?.into())
    }

    #[tracing::instrument(name = "cancel payment", skip(self))]
    pub async fn cancel_payment(
        &self,
        actor_id: Uuid,
        payment_id: Uuid,
    ) -> Result<PaymentData, PaymentError> {
        let mut uow = self.repository.begin().await?;
        let mut payment = fetch_payment(uow.as_mut(), payment_id).await?;
        ensure_payer(actor_id, &payment)?;
        if payment.status != PaymentStatus::Pending {
            return Err(PaymentError::ValidationError(format!(
                "Payment is {} and cannot be cancelled",
                payment.status
            )));
        }
        advance_payment(&mut payment, PaymentStatus::Cancelled, None)?;
        uow.update_payment(&payment).await?;
        uow.commit().await?;
        self.notify_resolved(&payment, None).await;
        Ok(payment.into())
    }

    #[tracing::instrument(name = "fetch payment", skip(self))]
    pub async fn get_payment(
        &self,
        actor_id: Uuid,
        payment_id: Uuid,
    ) -> Result<PaymentData, PaymentError> {
        Ok(self.read_payment(actor_id, payment_id).await?.into())
    }

    async fn read_payment(&self, actor_id: Uuid, payment_id: Uuid) -> Result<Payment, PaymentError> {
        let mut uow = self.repository.begin().await?;
        let payment = fetch_payment(uow.as_mut(), payment_id).await?;
        ensure_payer(actor_id, &payment)?;
        Ok(payment)
    }

    async fn notify_resolved(
        &self,
        payment: &Payment,
        change: Option<(AppointmentStatus, AppointmentStatus)>,
    ) {
        notify(
            self.notifier.as_ref(),
            NotificationEvent::PaymentResolved {
                payment_id: payment.id,
                payer_id: payment.payer_id,
                status: payment.status,
                appointment_id: payment.appointment_id,
            },
        )
        .await;
        if let (Some((from, to)), Some(appointment_id)) = (change, payment.appointment_id) {
            notify(
                self.notifier.as_ref(),
                NotificationEvent::AppointmentStatusChanged {
                    appointment_id,
                    from,
                    to,
                },
            )
            .await;
        }
    }
}
