use super::{GatewayInitiation, GatewayOutcome, GatewaySession, PaymentGateway, WebhookError};
use crate::configuration::CardGatewaySettings;
use crate::constants::{DEFAULT_CURRENCY, WEBHOOK_SIGNATURE_TOLERANCE_SECS};
use crate::routes::payment::schemas::{CallbackNotification, CallbackOutcome, PaymentProvider};
use crate::utils::{from_minor_units, to_minor_units};
use actix_web::http::header::HeaderMap;
use anyhow::{anyhow, Context};
use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use blake2::{Blake2b512, Digest};
use chrono::Utc;
use ed25519_dalek::{Signature, Verifier, VerifyingKey};
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub const SIGNATURE_HEADER: &str = "x-signature";
pub const SIGNATURE_CREATED_HEADER: &str = "x-signature-created";

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CheckoutMetadata {
    payment_id: Uuid,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CheckoutCreateRequest<'a> {
    /// Minor units (cents).
    amount: i64,
    currency: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    success_url: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    cancel_url: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    failure_url: Option<&'a str>,
    notify_url: &'a str,
    metadata: CheckoutMetadata,
}

#[derive(Debug, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
enum CheckoutStatus {
    Created,
    Started,
    Processing,
    Completed,
    Failed,
    Expired,
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CheckoutData {
    id: String,
    redirect_url: Option<String>,
    status: CheckoutStatus,
    amount: Option<i64>,
    failure_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CheckoutErrorData {
    message: Option<String>,
}

#[derive(Debug, Deserialize, PartialEq)]
enum CardEventType {
    #[serde(rename = "payment.succeeded")]
    PaymentSucceeded,
    #[serde(rename = "payment.failed")]
    PaymentFailed,
    #[serde(other)]
    Other,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CardWebhookPayload {
    checkout_id: String,
    amount: i64,
    currency: String,
    metadata: Option<CheckoutMetadata>,
    failure_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CardWebhookEvent {
    #[serde(rename = "type")]
    event_type: CardEventType,
    payload: CardWebhookPayload,
}

pub fn hash_body(body: &[u8]) -> String {
    let mut hasher = Blake2b512::new();
    hasher.update(body);
    BASE64.encode(hasher.finalize().as_slice())
}

pub fn create_signing_string(created: i64, body: &[u8]) -> String {
    format!("(created): {}\ndigest: BLAKE-512={}", created, hash_body(body))
}

fn header_value<'a>(headers: &'a HeaderMap, name: &str) -> Result<&'a str, WebhookError> {
    headers
        .get(name)
        .and_then(|h| h.to_str().ok())
        .ok_or_else(|| WebhookError::InvalidSignature(format!("{} header is missing", name)))
}

/// Card gateway: integer cent amounts, bearer secret key, ed25519 signed
/// webhooks.
#[derive(Debug)]
pub struct CardGatewayClient {
    http_client: Client,
    base_url: String,
    secret_key: SecretString,
    webhook_key: VerifyingKey,
}

impl CardGatewayClient {
    #[tracing::instrument(skip(settings))]
    pub fn new(settings: &CardGatewaySettings) -> Result<Self, anyhow::Error> {
        let key_bytes = BASE64
            .decode(&settings.webhook_public_key)
            .context("Card gateway webhook key is not valid base64")?;
        let key_bytes: [u8; 32] = key_bytes
            .as_slice()
            .try_into()
            .context("Card gateway webhook key must be 32 bytes")?;
        let webhook_key = VerifyingKey::from_bytes(&key_bytes)
            .context("Card gateway webhook key is not a valid ed25519 key")?;
        let http_client = Client::builder()
            .timeout(std::time::Duration::from_millis(settings.timeout_milliseconds))
            .build()?;
        Ok(Self {
            http_client,
            base_url: settings.base_url.clone(),
            secret_key: SecretString::from(settings.secret_key.expose_secret().to_string()),
            webhook_key,
        })
    }

    fn verify_signature(&self, headers: &HeaderMap, body: &[u8]) -> Result<(), WebhookError> {
        let signature = header_value(headers, SIGNATURE_HEADER)?;
        let created: i64 = header_value(headers, SIGNATURE_CREATED_HEADER)?
            .parse()
            .map_err(|_| WebhookError::InvalidSignature("Invalid signature timestamp".into()))?;
        if (Utc::now().timestamp() - created).abs() > WEBHOOK_SIGNATURE_TOLERANCE_SECS {
            return Err(WebhookError::InvalidSignature(
                "Signature timestamp is outside the accepted window".to_string(),
            ));
        }
        let signature_bytes = BASE64
            .decode(signature)
            .map_err(|_| WebhookError::InvalidSignature("Signature is not base64".to_string()))?;
        let signature = Signature::from_slice(&signature_bytes)
            .map_err(|_| WebhookError::InvalidSignature("Malformed signature".to_string()))?;
        self.webhook_key
            .verify(create_signing_string(created, body).as_bytes(), &signature)
            .map_err(|_| WebhookError::InvalidSignature("Signature does not match".to_string()))
    }

    async fn read_checkout(response: reqwest::Response) -> Result<CheckoutData, anyhow::Error> {
        let status = response.status();
        if status.is_success() {
            response
                .json::<CheckoutData>()
                .await
                .map_err(|err| anyhow!("Failed to parse card gateway response: {}", err))
        } else {
            let message = response
                .json::<CheckoutErrorData>()
                .await
                .ok()
                .and_then(|e| e.message)
                .unwrap_or_else(|| format!("Card gateway responded with {}", status));
            Err(anyhow!(message))
        }
    }
}

#[async_trait]
impl PaymentGateway for CardGatewayClient {
    fn provider(&self) -> PaymentProvider {
        PaymentProvider::GatewayA
    }

    #[tracing::instrument(name = "card gateway initiate", skip(self, request), fields(payment_id = %request.payment_id))]
    async fn initiate(
        &self,
        request: GatewayInitiation<'_>,
    ) -> Result<GatewaySession, anyhow::Error> {
        let amount = to_minor_units(request.amount)
            .ok_or_else(|| anyhow!("Amount {} cannot be expressed in cents", request.amount))?;
        let body = CheckoutCreateRequest {
            amount,
            currency: DEFAULT_CURRENCY,
            description: request.description,
            success_url: request.return_url,
            cancel_url: request.cancel_url,
            failure_url: request.cancel_url,
            notify_url: &request.notify_url,
            metadata: CheckoutMetadata {
                payment_id: request.payment_id,
            },
        };
        let response = self
            .http_client
            .post(format!("{}/v1/checkouts", self.base_url))
            .bearer_auth(self.secret_key.expose_secret())
            .header("Idempotency-Key", request.payment_id.to_string())
            .json(&body)
            .send()
            .await
            .context("Card gateway is unreachable")?;
        let checkout = Self::read_checkout(response).await?;
        Ok(GatewaySession {
            provider_reference: checkout.id,
            redirect_url: checkout.redirect_url,
        })
    }

    #[tracing::instrument(name = "card gateway verify", skip(self))]
    async fn verify(
        &self,
        provider_reference: &str,
        _payment_id: Uuid,
    ) -> Result<GatewayOutcome, anyhow::Error> {
        let response = self
            .http_client
            .get(format!("{}/v1/checkouts/{}", self.base_url, provider_reference))
            .bearer_auth(self.secret_key.expose_secret())
            .send()
            .await
            .context("Card gateway is unreachable")?;
        let checkout = Self::read_checkout(response).await?;
        Ok(match checkout.status {
            CheckoutStatus::Completed => GatewayOutcome::Success {
                amount: checkout.amount.map(from_minor_units),
            },
            CheckoutStatus::Failed | CheckoutStatus::Expired => GatewayOutcome::Failure {
                reason: checkout
                    .failure_reason
                    .unwrap_or_else(|| "Card payment was not completed".to_string()),
            },
            CheckoutStatus::Created
            | CheckoutStatus::Started
            | CheckoutStatus::Processing
            | CheckoutStatus::Unknown => GatewayOutcome::Pending,
        })
    }

    fn parse_webhook(
        &self,
        headers: &HeaderMap,
        body: &[u8],
    ) -> Result<CallbackNotification, WebhookError> {
        self.verify_signature(headers, body)?;
        let raw_payload: serde_json::Value = serde_json::from_slice(body)
            .map_err(|e| WebhookError::MalformedPayload(e.to_string()))?;
        let event: CardWebhookEvent = serde_json::from_value(raw_payload.clone())
            .map_err(|e| WebhookError::MalformedPayload(e.to_string()))?;
        if event.payload.currency != DEFAULT_CURRENCY {
            return Err(WebhookError::MalformedPayload(format!(
                "Unsupported currency {}",
                event.payload.currency
            )));
        }
        let outcome = match event.event_type {
            CardEventType::PaymentSucceeded => CallbackOutcome::Success,
            CardEventType::PaymentFailed => CallbackOutcome::Failure {
                reason: event
                    .payload
                    .failure_reason
                    .unwrap_or_else(|| "Card payment failed".to_string()),
            },
            CardEventType::Other => {
                return Err(WebhookError::MalformedPayload(
                    "Unsupported card gateway event".to_string(),
                ))
            }
        };
        Ok(CallbackNotification {
            provider: PaymentProvider::GatewayA,
            provider_reference: event.payload.checkout_id,
            merchant_reference: event.payload.metadata.map(|m| m.payment_id),
            outcome,
            amount: Some(from_minor_units(event.payload.amount)),
            raw_payload,
        })
    }
}
