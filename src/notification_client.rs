use crate::configuration::NotificationSettings;
use crate::routes::appointment::schemas::AppointmentStatus;
use crate::routes::payment::schemas::PaymentStatus;
use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(tag = "event", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NotificationEvent {
    #[serde(rename_all = "camelCase")]
    NewBooking {
        appointment_id: Uuid,
        requester_id: Uuid,
        provider_id: Uuid,
    },
    #[serde(rename_all = "camelCase")]
    AppointmentStatusChanged {
        appointment_id: Uuid,
        from: AppointmentStatus,
        to: AppointmentStatus,
    },
    #[serde(rename_all = "camelCase")]
    PaymentResolved {
        payment_id: Uuid,
        payer_id: Uuid,
        status: PaymentStatus,
        appointment_id: Option<Uuid>,
    },
}

/// Receives state changes after they commit. Delivery failures never roll
/// back the change that produced the event.
#[async_trait]
pub trait NotificationDispatcher: Send + Sync {
    async fn dispatch(&self, event: NotificationEvent) -> Result<(), anyhow::Error>;
}

pub async fn notify(dispatcher: &dyn NotificationDispatcher, event: NotificationEvent) {
    if let Err(e) = dispatcher.dispatch(event).await {
        tracing::error!("Failed to dispatch notification: {:?}", e);
    }
}

/// Used when no notification sink is configured.
pub struct LogNotificationDispatcher;

#[async_trait]
impl NotificationDispatcher for LogNotificationDispatcher {
    async fn dispatch(&self, event: NotificationEvent) -> Result<(), anyhow::Error> {
        tracing::info!(?event, "Notification event");
        Ok(())
    }
}

#[derive(Debug)]
pub struct HttpNotificationClient {
    http_client: Client,
    base_url: String,
    authorization_token: SecretString,
}

impl HttpNotificationClient {
    #[tracing::instrument(skip(settings))]
    pub fn new(settings: &NotificationSettings) -> Result<Self, anyhow::Error> {
        let http_client = Client::builder()
            .timeout(std::time::Duration::from_millis(settings.timeout_milliseconds))
            .build()?;
        Ok(Self {
            http_client,
            base_url: settings.base_url.clone(),
            authorization_token: SecretString::from(
                settings.token.expose_secret().to_string(),
            ),
        })
    }
}

#[async_trait]
impl NotificationDispatcher for HttpNotificationClient {
    #[tracing::instrument(name = "dispatch notification", skip(self))]
    async fn dispatch(&self, event: NotificationEvent) -> Result<(), anyhow::Error> {
        let url = format!("{}/event", self.base_url);
        let response = self
            .http_client
            .post(&url)
            .bearer_auth(self.authorization_token.expose_secret())
            .header("x-request-id", "internal")
            .header("x-device-id", "internal")
            .json(&event)
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(anyhow::anyhow!(
                "Notification sink responded with {}",
                response.status()
            ));
        }
        Ok(())
    }
}
