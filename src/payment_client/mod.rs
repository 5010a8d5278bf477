//! Payment gateway adapters.
//!
//! Each adapter translates the provider-neutral initiate / verify contract
//! into one gateway's wire protocol and authenticates that gateway's
//! webhooks before anything reaches the payment orchestrator.
mod card_gateway;
mod eft_gateway;

pub use card_gateway::CardGatewayClient;
pub use eft_gateway::EftGatewayClient;

use crate::configuration::PaymentSettings;
use crate::routes::payment::schemas::{CallbackNotification, PaymentProvider};
use crate::utils::error_chain_fmt;
use actix_web::http::header::HeaderMap;
use async_trait::async_trait;
use bigdecimal::BigDecimal;
use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct GatewayInitiation<'a> {
    /// Sent as the gateway's idempotency / merchant reference.
    pub payment_id: Uuid,
    pub amount: &'a BigDecimal,
    pub description: Option<&'a str>,
    pub return_url: Option<&'a str>,
    pub cancel_url: Option<&'a str>,
    pub notify_url: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GatewaySession {
    pub provider_reference: String,
    pub redirect_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum GatewayOutcome {
    Pending,
    Success { amount: Option<BigDecimal> },
    Failure { reason: String },
}

#[derive(thiserror::Error)]
pub enum WebhookError {
    #[error("{0}")]
    InvalidSignature(String),
    #[error("{0}")]
    MalformedPayload(String),
}

impl std::fmt::Debug for WebhookError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        error_chain_fmt(self, f)
    }
}

#[async_trait]
pub trait PaymentGateway: Send + Sync {
    fn provider(&self) -> PaymentProvider;

    async fn initiate(
        &self,
        request: GatewayInitiation<'_>,
    ) -> Result<GatewaySession, anyhow::Error>;

    async fn verify(
        &self,
        provider_reference: &str,
        payment_id: Uuid,
    ) -> Result<GatewayOutcome, anyhow::Error>;

    /// Authenticates and maps an inbound webhook.
    fn parse_webhook(
        &self,
        headers: &HeaderMap,
        body: &[u8],
    ) -> Result<CallbackNotification, WebhookError>;
}

#[derive(Default, Clone)]
pub struct GatewayRegistry {
    gateways: HashMap<PaymentProvider, Arc<dyn PaymentGateway>>,
}

impl GatewayRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, gateway: Arc<dyn PaymentGateway>) {
        self.gateways.insert(gateway.provider(), gateway);
    }

    pub fn get(&self, provider: PaymentProvider) -> Option<Arc<dyn PaymentGateway>> {
        self.gateways.get(&provider).cloned()
    }

    /// Registers every gateway that has a configuration section.
    #[tracing::instrument(name = "build gateway registry", skip(settings))]
    pub fn from_settings(settings: &PaymentSettings) -> Result<Self, anyhow::Error> {
        let mut registry = Self::new();
        if let Some(card) = &settings.gateway_a {
            registry.register(Arc::new(CardGatewayClient::new(card)?));
            tracing::info!("Card gateway registered");
        }
        if let Some(eft) = &settings.gateway_b {
            registry.register(Arc::new(EftGatewayClient::new(eft)?));
            tracing::info!("EFT gateway registered");
        }
        Ok(registry)
    }
}
