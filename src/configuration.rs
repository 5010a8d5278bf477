use crate::constants::DEFAULT_COMMISSION_RATE;
use crate::utils::deserialize_amount;
use bigdecimal::BigDecimal;
use config::{self, ConfigError, Environment};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use sqlx::{postgres::PgConnectOptions, ConnectOptions};

#[derive(Debug, Deserialize)]
pub struct ApplicationSettings {
    pub host: String,
    pub port: u16,
    pub name: String,
    pub workers: usize,
}

#[derive(Debug, Deserialize)]
pub struct DatabaseConfig {
    pub username: String,
    pub password: SecretString,
    pub port: u16,
    pub host: String,
    pub name: String,
    pub max_connections: u32,
    pub min_connections: u32,
    pub acquire_timeout: u64,
    /// Serve from the in-memory repository instead of Postgres.
    #[serde(default)]
    pub in_memory: bool,
    #[serde(default)]
    pub run_migrations: bool,
}

impl DatabaseConfig {
    pub fn without_db(&self) -> PgConnectOptions {
        PgConnectOptions::new()
            .host(&self.host)
            .username(&self.username)
            .password(self.password.expose_secret())
            .port(self.port)
    }

    pub fn with_db(&self) -> PgConnectOptions {
        self.without_db()
            .database(&self.name)
            .log_statements(tracing::log::LevelFilter::Trace)
    }
}

#[derive(Debug, Deserialize)]
pub struct CardGatewaySettings {
    pub base_url: String,
    pub secret_key: SecretString,
    /// Base64 ed25519 public key used to verify webhook signatures.
    pub webhook_public_key: String,
    pub timeout_milliseconds: u64,
}

#[derive(Debug, Deserialize)]
pub struct EftGatewaySettings {
    pub base_url: String,
    pub site_code: String,
    pub api_key: SecretString,
    pub private_key: SecretString,
    #[serde(default)]
    pub is_test: bool,
    pub timeout_milliseconds: u64,
}

fn default_commission_rate() -> BigDecimal {
    BigDecimal::from(DEFAULT_COMMISSION_RATE)
}

#[derive(Debug, Deserialize)]
pub struct PaymentSettings {
    #[serde(default)]
    pub wallet_enabled: bool,
    /// Public base URL gateways call back on; webhooks land on
    /// `{notify_base_url}/payment/webhook/{provider}`.
    pub notify_base_url: String,
    #[serde(
        default = "default_commission_rate",
        deserialize_with = "deserialize_amount"
    )]
    pub commission_rate: BigDecimal,
    pub gateway_a: Option<CardGatewaySettings>,
    pub gateway_b: Option<EftGatewaySettings>,
}

#[derive(Debug, Deserialize)]
pub struct NotificationSettings {
    pub base_url: String,
    pub token: SecretString,
    pub timeout_milliseconds: u64,
}

#[derive(Debug, Deserialize)]
pub struct Settings {
    pub application: ApplicationSettings,
    pub database: DatabaseConfig,
    pub payment: PaymentSettings,
    pub notification: Option<NotificationSettings>,
}

pub fn get_configuration() -> Result<Settings, ConfigError> {
    let base_path = std::env::current_dir()
        .map_err(|e| ConfigError::Message(format!("Failed to determine the current directory: {}", e)))?;
    let configuration_directory = base_path.join("configuration");
    let builder = config::Config::builder()
        .add_source(config::File::from(
            configuration_directory.join("configuration.yaml"),
        ))
        .add_source(
            Environment::with_prefix("APP")
                .prefix_separator("__")
                .separator("__"),
        )
        .build()?;
    builder.try_deserialize::<Settings>()
}
