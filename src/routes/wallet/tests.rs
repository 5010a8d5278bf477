#[cfg(test)]
mod tests {
    use crate::routes::wallet::errors::LedgerError;
    use crate::routes::wallet::schemas::{BalanceAdjustment, TransactionDirection, WalletData};
    use crate::routes::wallet::utils::{adjust_balance, LedgerStore};
    use crate::store::{MemoryRepository, Repository};
    use bigdecimal::{BigDecimal, Zero};
    use std::str::FromStr;
    use std::sync::Arc;
    use uuid::Uuid;

    fn amount(value: &str) -> BigDecimal {
        BigDecimal::from_str(value).unwrap()
    }

    async fn assert_balance_matches_log(store: &LedgerStore, user_id: Uuid) -> BigDecimal {
        let wallet = store.get_wallet(user_id).await.unwrap();
        let entries = store.list_transactions(user_id).await.unwrap();
        let sum = entries
            .iter()
            .fold(BigDecimal::zero(), |acc, e| acc + e.signed_amount());
        assert_eq!(wallet.balance, sum);
        assert!(wallet.balance >= BigDecimal::zero());
        wallet.balance
    }

    #[tokio::test]
    async fn test_wallet_is_created_lazily_with_zero_balance() {
        let store = LedgerStore::new(Arc::new(MemoryRepository::new()));
        let user_id = Uuid::new_v4();
        let wallet = store.get_wallet(user_id).await.unwrap();
        assert_eq!(wallet.balance, BigDecimal::zero());
        assert_eq!(wallet.user_id, user_id);
        let again = store.get_wallet(user_id).await.unwrap();
        assert_eq!(wallet.id, again.id);
    }

    #[tokio::test]
    async fn test_credit_and_withdraw() {
        let store = LedgerStore::new(Arc::new(MemoryRepository::new()));
        let user_id = Uuid::new_v4();
        store
            .credit(user_id, amount("500.00"), "Referral reward")
            .await
            .unwrap();
        let wallet = store
            .withdraw(user_id, amount("120.50"), None)
            .await
            .unwrap();
        assert_eq!(wallet.balance, amount("379.50"));

        let entries = store.list_transactions(user_id).await.unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].direction, TransactionDirection::Debit);
        assert_eq!(entries[0].description, "Wallet withdrawal");
        assert_eq!(entries[1].direction, TransactionDirection::Credit);
        assert_balance_matches_log(&store, user_id).await;
    }

    #[tokio::test]
    async fn test_overdraft_is_rejected_without_side_effects() {
        let store = LedgerStore::new(Arc::new(MemoryRepository::new()));
        let user_id = Uuid::new_v4();
        store.credit(user_id, amount("100.00"), "Top up").await.unwrap();

        let result = store.withdraw(user_id, amount("150.00"), None).await;
        assert!(matches!(result, Err(LedgerError::InsufficientBalance(_))));

        let balance = assert_balance_matches_log(&store, user_id).await;
        assert_eq!(balance, amount("100.00"));
        assert_eq!(store.list_transactions(user_id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_non_positive_amount_is_rejected() {
        let repository = Arc::new(MemoryRepository::new());
        let mut uow = repository.begin().await.unwrap();
        let wallet = uow.get_or_create_wallet(Uuid::new_v4()).await.unwrap();
        let adjustment = BalanceAdjustment {
            direction: TransactionDirection::Credit,
            amount: BigDecimal::zero(),
            description: "nothing".to_string(),
            payment_id: None,
        };
        let result = adjust_balance(uow.as_mut(), wallet.id, adjustment).await;
        assert!(matches!(result, Err(LedgerError::ValidationError(_))));
    }

    #[tokio::test]
    async fn test_uncommitted_adjustment_is_discarded() {
        let repository = Arc::new(MemoryRepository::new());
        let store = LedgerStore::new(repository.clone());
        let user_id = Uuid::new_v4();
        store.credit(user_id, amount("50.00"), "Top up").await.unwrap();
        {
            let mut uow = repository.begin().await.unwrap();
            let wallet = uow.get_or_create_wallet(user_id).await.unwrap();
            let adjustment = BalanceAdjustment {
                direction: TransactionDirection::Debit,
                amount: amount("20.00"),
                description: "abandoned".to_string(),
                payment_id: None,
            };
            adjust_balance(uow.as_mut(), wallet.id, adjustment)
                .await
                .unwrap();
        }
        let balance = assert_balance_matches_log(&store, user_id).await;
        assert_eq!(balance, amount("50.00"));
    }

    #[tokio::test]
    async fn test_emptied_wallet_presents_two_decimals() {
        let store = LedgerStore::new(Arc::new(MemoryRepository::new()));
        let user_id = Uuid::new_v4();
        let fresh = store.get_wallet(user_id).await.unwrap();
        assert_eq!(WalletData::from(&fresh).balance, "0.00");

        store.credit(user_id, amount("100.00"), "Top up").await.unwrap();
        let emptied = store
            .withdraw(user_id, amount("100.00"), None)
            .await
            .unwrap();
        assert_eq!(WalletData::from(&emptied).balance, "0.00");
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_debits_never_overdraw() {
        let store = Arc::new(LedgerStore::new(Arc::new(MemoryRepository::new())));
        let user_id = Uuid::new_v4();
        store.credit(user_id, amount("100.00"), "Top up").await.unwrap();

        let handles: Vec<_> = (0..10)
            .map(|_| {
                let store = store.clone();
                tokio::spawn(async move { store.withdraw(user_id, amount("20.00"), None).await })
            })
            .collect();
        let mut succeeded = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(_) => succeeded += 1,
                Err(LedgerError::InsufficientBalance(_)) => {}
                Err(e) => panic!("unexpected error: {:?}", e),
            }
        }
        assert_eq!(succeeded, 5);
        let balance = assert_balance_matches_log(&store, user_id).await;
        assert_eq!(balance, BigDecimal::zero());
    }

    #[quickcheck_macros::quickcheck]
    fn balance_always_equals_signed_log(operations: Vec<(bool, u16)>) -> bool {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        runtime.block_on(async {
            let store = LedgerStore::new(Arc::new(MemoryRepository::new()));
            let user_id = Uuid::new_v4();
            for (is_credit, cents) in operations {
                let value = BigDecimal::new((cents as i64 + 1).into(), 2);
                let _ = if is_credit {
                    store.credit(user_id, value, "credit").await
                } else {
                    store.withdraw(user_id, value, None).await
                };
            }
            let wallet = store.get_wallet(user_id).await.unwrap();
            let sum = store
                .list_transactions(user_id)
                .await
                .unwrap()
                .iter()
                .fold(BigDecimal::zero(), |acc, e| acc + e.signed_amount());
            wallet.balance >= BigDecimal::zero() && wallet.balance == sum
        })
    }
}
