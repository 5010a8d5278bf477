#[cfg(test)]
mod tests {
    use crate::configuration::get_configuration;
    use crate::database::{configure_database, get_connection_pool};
    use crate::notification_client::LogNotificationDispatcher;
    use crate::routes::appointment::errors::BookingError;
    use crate::routes::appointment::schemas::{
        ActorRole, AppointmentListFilter, AppointmentStatus, NewAppointment,
    };
    use crate::routes::appointment::utils::BookingManager;
    use crate::routes::wallet::errors::LedgerError;
    use crate::routes::wallet::utils::LedgerStore;
    use crate::store::PostgresRepository;
    use bigdecimal::{BigDecimal, Zero};
    use chrono::NaiveDate;
    use sqlx::PgPool;
    use std::sync::Arc;
    use tokio::sync::OnceCell;
    use uuid::Uuid;

    static MIGRATED: OnceCell<bool> = OnceCell::const_new();

    /// Pool on the configured database, or `None` when Postgres is unreachable.
    async fn get_test_pool() -> Option<PgPool> {
        let configuration = get_configuration().expect("Failed to read configuration.");
        let ready = MIGRATED
            .get_or_init(|| async {
                match configure_database(&configuration.database).await {
                    Ok(pool) => {
                        pool.close().await;
                        true
                    }
                    Err(e) => {
                        eprintln!("Skipping Postgres store tests: {:?}", e);
                        false
                    }
                }
            })
            .await;
        if !*ready {
            return None;
        }
        Some(get_connection_pool(&configuration.database))
    }

    fn manager(repository: Arc<PostgresRepository>) -> BookingManager {
        BookingManager::new(
            repository,
            Arc::new(LogNotificationDispatcher),
            BigDecimal::from(8),
        )
    }

    fn slot(requester_id: Uuid, provider_id: Uuid, time: &str) -> NewAppointment {
        NewAppointment {
            requester_id,
            provider_id,
            service_id: None,
            date: NaiveDate::from_ymd_opt(2024, 7, 15).unwrap(),
            time: time.to_string(),
            note: None,
            address: Some("4 Bree Street, Cape Town".to_string()),
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_inserts_of_one_slot_admit_exactly_one() {
        let Some(pool) = get_test_pool().await else {
            return;
        };
        let manager = Arc::new(manager(Arc::new(PostgresRepository::new(pool))));
        let provider_id = Uuid::new_v4();

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let manager = manager.clone();
                tokio::spawn(async move {
                    manager
                        .create_appointment(slot(Uuid::new_v4(), provider_id, "10:00"))
                        .await
                })
            })
            .collect();

        let mut created = 0;
        let mut conflicts = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(data) => {
                    assert_eq!(data.status, AppointmentStatus::Pending);
                    created += 1;
                }
                Err(BookingError::SlotConflict(_)) => conflicts += 1,
                Err(e) => panic!("unexpected error: {:?}", e),
            }
        }
        assert_eq!(created, 1);
        assert_eq!(conflicts, 7);
    }

    #[tokio::test]
    async fn test_cancelled_slot_can_be_booked_again() {
        let Some(pool) = get_test_pool().await else {
            return;
        };
        let manager = manager(Arc::new(PostgresRepository::new(pool)));
        let requester_id = Uuid::new_v4();
        let provider_id = Uuid::new_v4();

        let first = manager
            .create_appointment(slot(requester_id, provider_id, "11:30"))
            .await
            .unwrap();
        manager
            .cancel_appointment(requester_id, first.id, ActorRole::Requester)
            .await
            .unwrap();
        let second = manager
            .create_appointment(slot(Uuid::new_v4(), provider_id, "11:30"))
            .await
            .unwrap();
        assert_ne!(first.id, second.id);
    }

    #[tokio::test]
    async fn test_list_filters_by_role_and_status() {
        let Some(pool) = get_test_pool().await else {
            return;
        };
        let manager = manager(Arc::new(PostgresRepository::new(pool)));
        let requester_id = Uuid::new_v4();
        let first_provider = Uuid::new_v4();
        let second_provider = Uuid::new_v4();

        let confirmed = manager
            .create_appointment(slot(requester_id, first_provider, "09:00"))
            .await
            .unwrap();
        manager
            .create_appointment(slot(requester_id, second_provider, "09:00"))
            .await
            .unwrap();
        manager
            .update_status(
                first_provider,
                confirmed.id,
                AppointmentStatus::Confirmed,
                ActorRole::Provider,
            )
            .await
            .unwrap();

        let all = manager
            .list_appointments(requester_id, AppointmentListFilter { role: None, status: None })
            .await
            .unwrap();
        assert_eq!(all.len(), 2);

        let only_confirmed = manager
            .list_appointments(
                requester_id,
                AppointmentListFilter {
                    role: None,
                    status: Some(AppointmentStatus::Confirmed),
                },
            )
            .await
            .unwrap();
        assert_eq!(only_confirmed.len(), 1);
        assert_eq!(only_confirmed[0].id, confirmed.id);

        let as_provider = manager
            .list_appointments(
                requester_id,
                AppointmentListFilter {
                    role: Some(ActorRole::Provider),
                    status: None,
                },
            )
            .await
            .unwrap();
        assert!(as_provider.is_empty());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_wallet_creation_yields_one_wallet() {
        let Some(pool) = get_test_pool().await else {
            return;
        };
        let store = Arc::new(LedgerStore::new(Arc::new(PostgresRepository::new(pool))));
        let user_id = Uuid::new_v4();

        let handles: Vec<_> = (0..5)
            .map(|_| {
                let store = store.clone();
                tokio::spawn(async move { store.get_wallet(user_id).await })
            })
            .collect();

        let mut ids = Vec::new();
        for handle in handles {
            let wallet = handle.await.unwrap().unwrap();
            assert_eq!(wallet.balance, BigDecimal::zero());
            ids.push(wallet.id);
        }
        ids.dedup();
        assert_eq!(ids.len(), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_debits_never_overdraw() {
        let Some(pool) = get_test_pool().await else {
            return;
        };
        let store = Arc::new(LedgerStore::new(Arc::new(PostgresRepository::new(pool))));
        let user_id = Uuid::new_v4();
        store
            .credit(user_id, BigDecimal::from(100), "Top up")
            .await
            .unwrap();

        let handles: Vec<_> = (0..6)
            .map(|_| {
                let store = store.clone();
                tokio::spawn(async move {
                    store.withdraw(user_id, BigDecimal::from(20), None).await
                })
            })
            .collect();

        let mut succeeded = 0;
        let mut refused = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(wallet) => {
                    assert!(wallet.balance >= BigDecimal::zero());
                    succeeded += 1;
                }
                Err(LedgerError::InsufficientBalance(_)) => refused += 1,
                Err(e) => panic!("unexpected error: {:?}", e),
            }
        }
        assert_eq!(succeeded, 5);
        assert_eq!(refused, 1);

        let wallet = store.get_wallet(user_id).await.unwrap();
        assert_eq!(wallet.balance, BigDecimal::zero());
        let sum = store
            .list_transactions(user_id)
            .await
            .unwrap()
            .iter()
            .fold(BigDecimal::zero(), |acc, e| acc + e.signed_amount());
        assert_eq!(sum, wallet.balance);
    }
}
