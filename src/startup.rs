use crate::configuration::Settings;
use crate::database::{get_connection_pool, run_migrations};
use crate::errors::GenericError;
use crate::middleware::SaveRequestResponse;
use crate::notification_client::{
    HttpNotificationClient, LogNotificationDispatcher, NotificationDispatcher,
};
use crate::payment_client::GatewayRegistry;
use crate::routes::appointment::utils::BookingManager;
use crate::routes::main_route;
use crate::routes::payment::utils::PaymentOrchestrator;
use crate::routes::wallet::utils::LedgerStore;
use crate::store::{MemoryRepository, PostgresRepository, Repository};

use actix_web::dev::Server;
use actix_web::{web, App, HttpServer};
use std::net::TcpListener;
use std::sync::Arc;
use tracing_actix_web::TracingLogger;

pub struct Application {
    port: u16,
    server: Server,
}

impl Application {
    pub async fn build(configuration: Settings) -> Result<Self, anyhow::Error> {
        let repository: Arc<dyn Repository> = if configuration.database.in_memory {
            tracing::warn!("Using the in-memory repository; data is lost on restart");
            Arc::new(MemoryRepository::new())
        } else {
            let connection_pool = get_connection_pool(&configuration.database);
            if configuration.database.run_migrations {
                run_migrations(&connection_pool).await?;
            }
            Arc::new(PostgresRepository::new(connection_pool))
        };
        Self::build_with_repository(configuration, repository).await
    }

    pub async fn build_with_repository(
        configuration: Settings,
        repository: Arc<dyn Repository>,
    ) -> Result<Self, anyhow::Error> {
        let registry = GatewayRegistry::from_settings(&configuration.payment)?;
        let notifier: Arc<dyn NotificationDispatcher> = match &configuration.notification {
            Some(settings) => Arc::new(HttpNotificationClient::new(settings)?),
            None => Arc::new(LogNotificationDispatcher),
        };
        let address = format!(
            "{}:{}",
            configuration.application.host, configuration.application.port
        );
        let listener = TcpListener::bind(&address)?;
        let port = listener.local_addr()?.port();
        tracing::info!("Listening on {}:{}", configuration.application.host, port);
        let server = run(listener, repository, registry, notifier, configuration)?;
        Ok(Self { port, server })
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    // A more expressive name that makes it clear that
    // this function only returns when the application is stopped.
    pub async fn run_until_stopped(self) -> Result<(), std::io::Error> {
        self.server.await
    }
}

fn run(
    listener: TcpListener,
    repository: Arc<dyn Repository>,
    registry: GatewayRegistry,
    notifier: Arc<dyn NotificationDispatcher>,
    configuration: Settings,
) -> Result<Server, anyhow::Error> {
    let booking_manager = web::Data::new(BookingManager::new(
        repository.clone(),
        notifier.clone(),
        configuration.payment.commission_rate.clone(),
    ));
    let payment_orchestrator = web::Data::new(PaymentOrchestrator::new(
        repository.clone(),
        registry,
        notifier,
        &configuration.payment,
    ));
    let ledger_store = web::Data::new(LedgerStore::new(repository));
    let server = HttpServer::new(move || {
        App::new()
            .wrap(SaveRequestResponse)
            .wrap(TracingLogger::default())
            .app_data(web::PathConfig::default().error_handler(|err, _req| {
                GenericError::ValidationError(err.to_string()).into()
            }))
            .app_data(web::QueryConfig::default().error_handler(|err, _req| {
                GenericError::ValidationError(err.to_string()).into()
            }))
            .app_data(booking_manager.clone())
            .app_data(payment_orchestrator.clone())
            .app_data(ledger_store.clone())
            .configure(main_route)
    })
    .workers(configuration.application.workers)
    .listen(listener)?
    .run();

    Ok(server)
}
