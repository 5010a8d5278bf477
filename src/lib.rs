pub mod commands;
pub mod configuration;
pub mod constants;
pub mod database;
pub mod errors;
pub mod middleware;
pub mod notification_client;
pub mod openapi;
pub mod payment_client;
pub mod pricing;
pub mod routes;
pub mod schemas;
pub mod startup;
pub mod store;
pub mod telemetry;
pub mod utils;
