use marketplace_booking_core::{
    configuration::get_configuration,
    routes::wallet::utils::LedgerStore,
    startup::Application,
    store::MemoryRepository,
    telemetry::{get_subscriber, init_subscriber},
};
use bigdecimal::BigDecimal;
use once_cell::sync::Lazy;
use std::str::FromStr;
use std::sync::Arc;
use uuid::Uuid;

#[allow(dead_code)]
pub struct TestApp {
    pub address: String,
    pub port: u16,
    pub repository: Arc<MemoryRepository>,
    pub api_client: reqwest::Client,
}

static TRACING: Lazy<()> = Lazy::new(|| {
    let default_filter_level = "info".to_string();
    let subscriber_name = "test".to_string();
    let test_log = std::env::var("TEST_LOG")
        .map(|value| value == "true")
        .unwrap_or(false);
    if test_log {
        let subscriber = get_subscriber(subscriber_name, default_filter_level, std::io::stdout);
        init_subscriber(subscriber).expect("Failed to set up tracing");
    } else {
        let subscriber = get_subscriber(subscriber_name, default_filter_level, std::io::sink);
        init_subscriber(subscriber).expect("Failed to set up tracing");
    }
});

pub async fn spawn_app() -> TestApp {
    Lazy::force(&TRACING);

    let configuration = {
        let mut c = get_configuration().expect("Failed to read configuration.");
        c.application.port = 0;
        c.application.workers = 1;
        c.database.in_memory = true;
        c.payment.wallet_enabled = true;
        c.payment.gateway_a = None;
        c.payment.gateway_b = None;
        c.notification = None;
        c
    };
    let repository = Arc::new(MemoryRepository::new());
    let application = Application::build_with_repository(configuration, repository.clone())
        .await
        .expect("Failed to build application.");
    let application_port = application.port();

    let address = format!("http://127.0.0.1:{}", application_port);
    let _ = tokio::spawn(application.run_until_stopped());

    TestApp {
        address,
        port: application_port,
        repository,
        api_client: reqwest::Client::new(),
    }
}

#[allow(dead_code)]
impl TestApp {
    pub async fn post_json(
        &self,
        path: &str,
        user_id: Uuid,
        body: &serde_json::Value,
    ) -> reqwest::Response {
        self.api_client
            .post(format!("{}{}", self.address, path))
            .header("x-user-id", user_id.to_string())
            .header("x-request-id", Uuid::new_v4().to_string())
            .header("x-device-id", "test-device")
            .json(body)
            .send()
            .await
            .expect("Failed to execute request.")
    }

    pub async fn get(&self, path: &str, user_id: Uuid) -> reqwest::Response {
        self.api_client
            .get(format!("{}{}", self.address, path))
            .header("x-user-id", user_id.to_string())
            .header("x-request-id", Uuid::new_v4().to_string())
            .header("x-device-id", "test-device")
            .send()
            .await
            .expect("Failed to execute request.")
    }

    pub async fn book(&self, requester_id: Uuid, provider_id: Uuid, time: &str) -> reqwest::Response {
        self.post_json(
            "/appointment/create",
            requester_id,
            &serde_json::json!({
                "providerId": provider_id,
                "date": "2024-06-01",
                "time": time,
            }),
        )
        .await
    }

    pub async fn fund_wallet(&self, user_id: Uuid, amount: &str) {
        LedgerStore::new(self.repository.clone())
            .credit(
                user_id,
                BigDecimal::from_str(amount).expect("Invalid amount"),
                "Test top up",
            )
            .await
            .expect("Failed to fund wallet");
    }
}

pub async fn body_json(response: reqwest::Response) -> serde_json::Value {
    response
        .json::<serde_json::Value>()
        .await
        .expect("Response is not JSON")
}
