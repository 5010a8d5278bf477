use super::{GatewayInitiation, GatewayOutcome, GatewaySession, PaymentGateway, WebhookError};
use crate::configuration::EftGatewaySettings;
use crate::constants::DEFAULT_CURRENCY;
use crate::routes::payment::schemas::{CallbackNotification, CallbackOutcome, PaymentProvider};
use crate::utils::{deserialize_amount, round_currency};
use actix_web::http::header::HeaderMap;
use anyhow::{anyhow, Context};
use async_trait::async_trait;
use bigdecimal::BigDecimal;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha512};
use std::str::FromStr;
use uuid::Uuid;

const COUNTRY_CODE: &str = "ZA";

/// Lowercase hex SHA-512 of the lowercased field concatenation followed by
/// the merchant private key.
pub fn compute_hash_check(fields: &[&str], private_key: &str) -> String {
    let mut input: String = fields.concat();
    input.push_str(private_key);
    hex::encode(Sha512::digest(input.to_lowercase().as_bytes()))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct EftPaymentRequest<'a> {
    site_code: &'a str,
    country_code: &'a str,
    currency_code: &'a str,
    /// Two-decimal string, e.g. "150.00".
    amount: String,
    transaction_reference: String,
    bank_reference: String,
    cancel_url: &'a str,
    error_url: &'a str,
    success_url: &'a str,
    notify_url: &'a str,
    is_test: bool,
    hash_check: String,
}

impl<'a> EftPaymentRequest<'a> {
    fn hash_fields(&self) -> Vec<String> {
        vec![
            self.site_code.to_string(),
            self.country_code.to_string(),
            self.currency_code.to_string(),
            self.amount.clone(),
            self.transaction_reference.clone(),
            self.bank_reference.clone(),
            self.cancel_url.to_string(),
            self.error_url.to_string(),
            self.success_url.to_string(),
            self.notify_url.to_string(),
            self.is_test.to_string(),
        ]
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct EftPaymentResponse {
    payment_request_id: Option<String>,
    url: Option<String>,
    error_message: Option<String>,
}

#[derive(Debug, Deserialize, PartialEq)]
enum EftTransactionStatus {
    Complete,
    Cancelled,
    Error,
    Abandoned,
    PendingInvestigation,
    Pending,
    #[serde(other)]
    Unknown,
}

impl EftTransactionStatus {
    fn as_str(&self) -> &'static str {
        match self {
            EftTransactionStatus::Complete => "Complete",
            EftTransactionStatus::Cancelled => "Cancelled",
            EftTransactionStatus::Error => "Error",
            EftTransactionStatus::Abandoned => "Abandoned",
            EftTransactionStatus::PendingInvestigation => "PendingInvestigation",
            EftTransactionStatus::Pending => "Pending",
            EftTransactionStatus::Unknown => "Unknown",
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct EftTransaction {
    transaction_reference: String,
    #[serde(deserialize_with = "deserialize_amount")]
    amount: BigDecimal,
    status: EftTransactionStatus,
    status_message: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct EftNotification {
    site_code: String,
    transaction_id: String,
    transaction_reference: String,
    /// Kept verbatim for the hash; parsed separately.
    amount: String,
    status: EftTransactionStatus,
    currency_code: String,
    is_test: bool,
    status_message: Option<String>,
    hash: String,
}

impl EftNotification {
    fn hash_fields(&self) -> Vec<String> {
        vec![
            self.site_code.clone(),
            self.transaction_id.clone(),
            self.transaction_reference.clone(),
            self.amount.clone(),
            self.status.as_str().to_string(),
            self.currency_code.clone(),
            self.is_test.to_string(),
            self.status_message.clone().unwrap_or_default(),
        ]
    }
}

fn failure_reason(status: &EftTransactionStatus, message: Option<String>) -> String {
    message
        .filter(|m| !m.trim().is_empty())
        .unwrap_or_else(|| format!("EFT payment {}", status.as_str().to_lowercase()))
}

/// Instant-EFT gateway: two-decimal string amounts, SHA-512 hash check on
/// requests and notifications.
#[derive(Debug)]
pub struct EftGatewayClient {
    http_client: Client,
    base_url: String,
    site_code: String,
    api_key: SecretString,
    private_key: SecretString,
    is_test: bool,
}

impl EftGatewayClient {
    #[tracing::instrument(skip(settings))]
    pub fn new(settings: &EftGatewaySettings) -> Result<Self, anyhow::Error> {
        let http_client = Client::builder()
            .timeout(std::time::Duration::from_millis(settings.timeout_milliseconds))
            .build()?;
        Ok(Self {
            http_client,
            base_url: settings.base_url.clone(),
            site_code: settings.site_code.clone(),
            api_key: SecretString::from(settings.api_key.expose_secret().to_string()),
            private_key: SecretString::from(settings.private_key.expose_secret().to_string()),
            is_test: settings.is_test,
        })
    }

    fn hash(&self, fields: &[String]) -> String {
        let fields: Vec<&str> = fields.iter().map(String::as_str).collect();
        compute_hash_check(&fields, self.private_key.expose_secret())
    }
}

#[async_trait]
impl PaymentGateway for EftGatewayClient {
    fn provider(&self) -> PaymentProvider {
        PaymentProvider::GatewayB
    }

    #[tracing::instrument(name = "eft gateway initiate", skip(self, request), fields(payment_id = %request.payment_id))]
    async fn initiate(
        &self,
        request: GatewayInitiation<'_>,
    ) -> Result<GatewaySession, anyhow::Error> {
        let cancel_url = request.cancel_url.unwrap_or_default();
        let return_url = request.return_url.unwrap_or_default();
        let reference = request.payment_id.simple().to_string();
        let mut body = EftPaymentRequest {
            site_code: &self.site_code,
            country_code: COUNTRY_CODE,
            currency_code: DEFAULT_CURRENCY,
            amount: round_currency(request.amount).to_string(),
            transaction_reference: request.payment_id.to_string(),
            bank_reference: reference[..20].to_uppercase(),
            cancel_url,
            error_url: cancel_url,
            success_url: return_url,
            notify_url: &request.notify_url,
            is_test: self.is_test,
            hash_check: String::new(),
        };
        body.hash_check = self.hash(&body.hash_fields());

        let response = self
            .http_client
            .post(format!("{}/postpaymentrequest", self.base_url))
            .header("ApiKey", self.api_key.expose_secret())
            .header("Accept", "application/json")
            .json(&body)
            .send()
            .await
            .context("EFT gateway is unreachable")?;
        let status = response.status();
        let data: EftPaymentResponse = response
            .json()
            .await
            .map_err(|err| anyhow!("Failed to parse EFT gateway response: {}", err))?;
        if let Some(message) = data.error_message.filter(|m| !m.is_empty()) {
            return Err(anyhow!(message));
        }
        if !status.is_success() {
            return Err(anyhow!("EFT gateway responded with {}", status));
        }
        let provider_reference = data
            .payment_request_id
            .ok_or_else(|| anyhow!("EFT gateway did not return a payment request id"))?;
        Ok(GatewaySession {
            provider_reference,
            redirect_url: data.url,
        })
    }

    #[tracing::instrument(name = "eft gateway verify", skip(self))]
    async fn verify(
        &self,
        _provider_reference: &str,
        payment_id: Uuid,
    ) -> Result<GatewayOutcome, anyhow::Error> {
        let reference = payment_id.to_string();
        let response = self
            .http_client
            .get(format!("{}/GetTransactionByReference", self.base_url))
            .query(&[
                ("siteCode", self.site_code.as_str()),
                ("transactionReference", reference.as_str()),
            ])
            .header("ApiKey", self.api_key.expose_secret())
            .header("Accept", "application/json")
            .send()
            .await
            .context("EFT gateway is unreachable")?;
        if !response.status().is_success() {
            return Err(anyhow!("EFT gateway responded with {}", response.status()));
        }
        let transactions: Vec<EftTransaction> = response
            .json()
            .await
            .map_err(|err| anyhow!("Failed to parse EFT gateway response: {}", err))?;
        // A completed attempt settles the payment even if earlier attempts failed.
        let mut last_failure = None;
        let mut in_flight = false;
        for transaction in transactions
            .into_iter()
            .filter(|t| t.transaction_reference == reference)
        {
            match transaction.status {
                EftTransactionStatus::Complete => {
                    return Ok(GatewayOutcome::Success {
                        amount: Some(transaction.amount),
                    })
                }
                EftTransactionStatus::Cancelled
                | EftTransactionStatus::Error
                | EftTransactionStatus::Abandoned => {
                    last_failure = Some(failure_reason(
                        &transaction.status,
                        transaction.status_message,
                    ));
                }
                _ => in_flight = true,
            }
        }
        Ok(match last_failure {
            Some(reason) if !in_flight => GatewayOutcome::Failure { reason },
            _ => GatewayOutcome::Pending,
        })
    }

    fn parse_webhook(
        &self,
        _headers: &HeaderMap,
        body: &[u8],
    ) -> Result<CallbackNotification, WebhookError> {
        let raw_payload: serde_json::Value = serde_json::from_slice(body)
            .map_err(|e| WebhookError::MalformedPayload(e.to_string()))?;
        let notification: EftNotification = serde_json::from_value(raw_payload.clone())
            .map_err(|e| WebhookError::MalformedPayload(e.to_string()))?;

        let expected = self.hash(&notification.hash_fields());
        if !expected.eq_ignore_ascii_case(&notification.hash) {
            return Err(WebhookError::InvalidSignature(
                "Notification hash does not match".to_string(),
            ));
        }
        if notification.site_code != self.site_code {
            return Err(WebhookError::InvalidSignature(
                "Notification is for a different site".to_string(),
            ));
        }
        if notification.currency_code != DEFAULT_CURRENCY {
            return Err(WebhookError::MalformedPayload(format!(
                "Unsupported currency {}",
                notification.currency_code
            )));
        }

        let amount = BigDecimal::from_str(&notification.amount)
            .map_err(|e| WebhookError::MalformedPayload(format!("Invalid amount: {}", e)))?;
        let outcome = match notification.status {
            EftTransactionStatus::Complete => CallbackOutcome::Success,
            EftTransactionStatus::Cancelled
            | EftTransactionStatus::Error
            | EftTransactionStatus::Abandoned => CallbackOutcome::Failure {
                reason: failure_reason(&notification.status, notification.status_message),
            },
            EftTransactionStatus::Pending
            | EftTransactionStatus::PendingInvestigation
            | EftTransactionStatus::Unknown => {
                return Err(WebhookError::MalformedPayload(format!(
                    "Notification status {} is not final",
                    notification.status.as_str()
                )))
            }
        };
        Ok(CallbackNotification {
            provider: PaymentProvider::GatewayB,
            provider_reference: notification.transaction_id,
            merchant_reference: Uuid::parse_str(&notification.transaction_reference).ok(),
            outcome,
            amount: Some(amount),
            raw_payload,
        })
    }
}
