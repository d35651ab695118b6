//! # Checkout Orchestrator
//!
//! ## Checkout Flow
//! ```text
//! create_transaction(user, sku, amount)
//!      │
//!      ├─► find_product_by_sku ─────────────── NotFound
//!      ├─► NewTransaction::from_product ────── InvalidQuantity (totals)
//!      ├─► validate_stock ──────────────────── InsufficientStock
//!      │
//!      ├─► begin() ────────────────────────────────────────┐
//!      │     insert_transaction                            │
//!      │     apply_decrement + update_product_stock        │ rollback() on
//!      │     commit                                        │ every exit
//!      └───────────────────────────────────────────────────┘
//! ```
//!
//! Every operation runs under a deadline. When it expires the in-flight
//! future is dropped together with its unit of work, so nothing is written.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tracing::{debug, info, warn};

use shopfront_core::stock::{apply_decrement, validate_stock};
use shopfront_core::validation::{validate_sku, validate_user_public_id};
use shopfront_core::{NewTransaction, Product, Transaction, TransactionHistory, TransactionStatus};

use crate::config::CheckoutConfig;
use crate::error::{ServiceError, ServiceResult};
use crate::port::{CheckoutStore, UnitOfWork};

/// Runs checkouts and transaction status changes.
pub struct CheckoutService<S> {
    store: Arc<S>,
    config: CheckoutConfig,
}

impl<S> Clone for CheckoutService<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            config: self.config.clone(),
        }
    }
}

impl<S: CheckoutStore> CheckoutService<S> {
    pub fn new(store: Arc<S>, config: CheckoutConfig) -> Self {
        Self { store, config }
    }

    pub fn config(&self) -> &CheckoutConfig {
        &self.config
    }

    // =========================================================================
    // Checkout
    // =========================================================================

    /// Buys `amount` units of `sku` for `user_public_id` under the configured
    /// deadline.
    pub async fn create_transaction(
        &self,
        user_public_id: &str,
        sku: &str,
        amount: i64,
    ) -> ServiceResult<Transaction> {
        self.create_transaction_within(user_public_id, sku, amount, self.config.operation_timeout)
            .await
    }

    /// Same as [`create_transaction`](Self::create_transaction) with a
    /// caller-supplied deadline.
    pub async fn create_transaction_within(
        &self,
        user_public_id: &str,
        sku: &str,
        amount: i64,
        timeout: Duration,
    ) -> ServiceResult<Transaction> {
        with_deadline("create_transaction", timeout, self.checkout(user_public_id, sku, amount)).await
    }

    async fn checkout(&self, user_public_id: &str, sku: &str, amount: i64) -> ServiceResult<Transaction> {
        validate_user_public_id(user_public_id)?;

        let product = self
            .store
            .find_product_by_sku(sku)
            .await?
            .filter(|p| !p.is_deleted())
            .ok_or_else(|| ServiceError::not_found("product", sku))?;

        let new_trx = NewTransaction::from_product(
            user_public_id,
            &product,
            amount,
            self.config.platform_fee(),
            Utc::now(),
        )?;

        validate_stock(&product.sku, amount, product.stock)?;

        let mut uow = self.store.begin().await?;
        let result = persist_checkout(&mut uow, &product, new_trx, amount).await;
        let trx = finish(&mut uow, result).await?;

        info!(
            transaction_id = trx.id,
            user = %trx.user_public_id,
            sku = %product.sku,
            amount = trx.amount,
            grand_total = %trx.grand_total(),
            "Checkout committed"
        );
        Ok(trx)
    }

    // =========================================================================
    // Status
    // =========================================================================

    /// Moves a transaction to `next` under the configured deadline.
    pub async fn update_status(&self, id: i64, next: TransactionStatus) -> ServiceResult<Transaction> {
        self.update_status_within(id, next, self.config.operation_timeout).await
    }

    /// Same as [`update_status`](Self::update_status) with a caller-supplied
    /// deadline.
    pub async fn update_status_within(
        &self,
        id: i64,
        next: TransactionStatus,
        timeout: Duration,
    ) -> ServiceResult<Transaction> {
        with_deadline("update_status", timeout, self.change_status(id, next)).await
    }

    async fn change_status(&self, id: i64, next: TransactionStatus) -> ServiceResult<Transaction> {
        let mut uow = self.store.begin().await?;
        let result = persist_status(&mut uow, id, next).await;
        let trx = finish(&mut uow, result).await?;

        info!(transaction_id = trx.id, status = %trx.status, "Transaction status updated");
        Ok(trx)
    }

    // =========================================================================
    // History
    // =========================================================================

    /// Transactions of a buyer, newest first. Unknown users get an empty list.
    pub async fn user_history(&self, user_public_id: &str) -> ServiceResult<Vec<TransactionHistory>> {
        validate_user_public_id(user_public_id)?;

        let fut = async {
            let rows = self.store.list_transactions_by_user(user_public_id).await?;
            debug!(user = %user_public_id, count = rows.len(), "Loaded user history");
            Ok(rows.iter().map(TransactionHistory::from).collect())
        };
        with_deadline("user_history", self.config.operation_timeout, fut).await
    }

    /// Transactions of a product, newest first. Unknown SKUs get an empty list.
    pub async fn product_history(&self, sku: &str) -> ServiceResult<Vec<TransactionHistory>> {
        validate_sku(sku)?;

        let fut = async {
            let rows = self.store.list_transactions_by_product_sku(sku).await?;
            debug!(sku = %sku, count = rows.len(), "Loaded product history");
            Ok(rows.iter().map(TransactionHistory::from).collect())
        };
        with_deadline("product_history", self.config.operation_timeout, fut).await
    }
}

// =============================================================================
// Unit of Work Steps
// =============================================================================

async fn persist_checkout<U: UnitOfWork>(
    uow: &mut U,
    product: &Product,
    new_trx: NewTransaction,
    amount: i64,
) -> ServiceResult<Transaction> {
    let id = uow.insert_transaction(&new_trx).await?;

    // Guards the non-negative invariant; the store re-checks it in the write.
    let updated = apply_decrement(product, amount)?;
    uow.update_product_stock(product, amount).await?;
    debug!(product_id = product.id, stock = updated.stock, "Stock decremented");

    uow.commit().await?;
    Ok(new_trx.into_transaction(id))
}

async fn persist_status<U: UnitOfWork>(
    uow: &mut U,
    id: i64,
    next: TransactionStatus,
) -> ServiceResult<Transaction> {
    let mut trx = uow
        .find_transaction_by_id(id)
        .await?
        .ok_or_else(|| ServiceError::not_found("transaction", id))?;

    let from = trx.status;
    trx.transition_to(next, Utc::now())?;
    uow.update_transaction_status(&trx).await?;
    uow.commit().await?;

    debug!(transaction_id = id, from = %from, to = %next, "Status transition persisted");
    Ok(trx)
}

/// Rolls back unconditionally (a no-op after commit) and returns the primary
/// outcome. A rollback failure never replaces the primary error.
async fn finish<U: UnitOfWork, T>(uow: &mut U, result: ServiceResult<T>) -> ServiceResult<T> {
    if let Err(rollback_err) = uow.rollback().await {
        match &result {
            Ok(_) => warn!(error = %rollback_err, "Rollback after commit failed"),
            Err(primary) => warn!(
                error = %rollback_err,
                primary = %primary,
                "Rollback failed while aborting unit of work"
            ),
        }
    }

    if let Err(err) = &result {
        if err.kind() == crate::ErrorKind::InsufficientStock {
            warn!(error = %err, "Checkout aborted on stock conflict");
        }
    }
    result
}

async fn with_deadline<T, F>(operation: &'static str, timeout: Duration, fut: F) -> ServiceResult<T>
where
    F: Future<Output = ServiceResult<T>>,
{
    match tokio::time::timeout(timeout, fut).await {
        Ok(result) => result,
        Err(_) => {
            warn!(operation, timeout_ms = timeout.as_millis() as u64, "Operation deadline exceeded");
            Err(ServiceError::Timeout(timeout))
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::{Fault, InMemoryStore};
    use crate::port::CatalogStore;
    use crate::ErrorKind;
    use shopfront_core::CreateProduct;

    async fn setup(stock: i64, price_cents: i64) -> (CheckoutService<InMemoryStore>, Arc<InMemoryStore>) {
        let store = Arc::new(InMemoryStore::new());
        store
            .insert_product(
                &CreateProduct {
                    sku: "X".to_string(),
                    name: "Sample".to_string(),
                    stock,
                    price_cents,
                },
                Utc::now(),
            )
            .await
            .unwrap();
        (CheckoutService::new(Arc::clone(&store), CheckoutConfig::default()), store)
    }

    async fn stock_of(store: &InMemoryStore, sku: &str) -> i64 {
        store.find_product_by_sku(sku).await.unwrap().unwrap().stock
    }

    #[tokio::test]
    async fn test_checkout_then_insufficient_stock() {
        let (service, store) = setup(5, 100).await;

        let trx = service.create_transaction("user-1", "X", 3).await.unwrap();
        assert_eq!(trx.sub_total_cents, 300);
        assert_eq!(trx.grand_total_cents, 1_300);
        assert_eq!(trx.status, TransactionStatus::Created);
        assert!(trx.totals_consistent());
        assert_eq!(stock_of(&store, "X").await, 2);
        assert_eq!(store.transaction_count().await, 1);

        let err = service.create_transaction("user-1", "X", 3).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InsufficientStock);
        assert_eq!(stock_of(&store, "X").await, 2);
        assert_eq!(store.transaction_count().await, 1);
    }

    #[tokio::test]
    async fn test_checkout_whole_stock() {
        let (service, store) = setup(4, 100).await;
        service.create_transaction("user-1", "X", 4).await.unwrap();
        assert_eq!(stock_of(&store, "X").await, 0);
    }

    #[tokio::test]
    async fn test_unknown_sku_is_not_found() {
        let (service, _) = setup(5, 100).await;
        let err = service.create_transaction("user-1", "NOPE", 1).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn test_invalid_quantity() {
        let (service, store) = setup(5, 100).await;
        for amount in [0, -1] {
            let err = service.create_transaction("user-1", "X", amount).await.unwrap_err();
            assert_eq!(err.kind(), ErrorKind::InvalidQuantity);
        }
        assert_eq!(store.transaction_count().await, 0);
    }

    #[tokio::test]
    async fn test_stock_failure_hides_insert() {
        let (service, store) = setup(5, 100).await;
        store.fail_next(Fault::UpdateStock).await;

        let err = service.create_transaction("user-1", "X", 1).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::StoreFailure);
        assert_eq!(store.transaction_count().await, 0);
        assert_eq!(stock_of(&store, "X").await, 5);
    }

    #[tokio::test]
    async fn test_insert_failure_propagates() {
        let (service, store) = setup(5, 100).await;
        store.fail_next(Fault::InsertTransaction).await;

        let err = service.create_transaction("user-1", "X", 1).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::StoreFailure);
        assert_eq!(stock_of(&store, "X").await, 5);
    }

    #[tokio::test]
    async fn test_commit_failure_hides_all_writes() {
        let (service, store) = setup(5, 100).await;
        store.fail_next(Fault::Commit).await;

        assert!(service.create_transaction("user-1", "X", 2).await.is_err());
        assert_eq!(store.transaction_count().await, 0);
        assert_eq!(stock_of(&store, "X").await, 5);
    }

    #[tokio::test]
    async fn test_rollback_failure_keeps_primary_error() {
        let (service, store) = setup(5, 100).await;
        store.fail_next(Fault::UpdateStock).await;
        store.fail_next(Fault::Rollback).await;

        let err = service.create_transaction("user-1", "X", 1).await.unwrap_err();
        assert_eq!(
            err,
            ServiceError::Store(crate::StoreError::Backend(
                "injected failure: UpdateStock".to_string()
            ))
        );
        assert_eq!(store.transaction_count().await, 0);
    }

    #[tokio::test]
    async fn test_deadline_exceeded_writes_nothing() {
        let (service, store) = setup(5, 100).await;
        store.set_write_delay(Some(Duration::from_millis(500))).await;

        let err = service
            .create_transaction_within("user-1", "X", 1, Duration::from_millis(20))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Timeout);
        assert!(err.is_retryable());

        store.set_write_delay(None).await;
        assert_eq!(store.transaction_count().await, 0);
        assert_eq!(stock_of(&store, "X").await, 5);
    }

    #[tokio::test]
    async fn test_status_lifecycle() {
        let (service, _) = setup(5, 100).await;
        let trx = service.create_transaction("user-1", "X", 1).await.unwrap();

        let trx = service.update_status(trx.id, TransactionStatus::Progress).await.unwrap();
        assert_eq!(trx.status, TransactionStatus::Progress);

        let trx = service.update_status(trx.id, TransactionStatus::Completed).await.unwrap();
        assert_eq!(trx.status, TransactionStatus::Completed);

        let err = service
            .update_status(trx.id, TransactionStatus::Progress)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidStatusTransition);
        assert_eq!(err.http_status(), 409);
    }

    #[tokio::test]
    async fn test_status_write_failure_keeps_status() {
        let (service, store) = setup(5, 100).await;
        let trx = service.create_transaction("user-1", "X", 1).await.unwrap();
        store.fail_next(Fault::UpdateStatus).await;

        let err = service
            .update_status(trx.id, TransactionStatus::Progress)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::StoreFailure);
        assert!(!err.is_retryable());

        let stored = store.find_transaction_by_id(trx.id).await.unwrap().unwrap();
        assert_eq!(stored.status, TransactionStatus::Created);
        assert_eq!(stored.updated_at, trx.updated_at);

        let trx = service.update_status(trx.id, TransactionStatus::Progress).await.unwrap();
        assert_eq!(trx.status, TransactionStatus::Progress);
    }

    #[tokio::test]
    async fn test_status_unknown_id() {
        let (service, _) = setup(5, 100).await;
        let err = service
            .update_status(999, TransactionStatus::Progress)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn test_history() {
        let (service, _) = setup(10, 100).await;
        service.create_transaction("user-1", "X", 1).await.unwrap();
        service.create_transaction("user-1", "X", 2).await.unwrap();
        service.create_transaction("user-2", "X", 3).await.unwrap();

        let history = service.user_history("user-1").await.unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].amount, 2);
        assert_eq!(history[0].product_sku, "X");

        assert_eq!(service.product_history("X").await.unwrap().len(), 3);
        assert!(service.user_history("nobody").await.unwrap().is_empty());
        assert!(service.product_history("UNKNOWN").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_concurrent_checkouts_never_oversell() {
        let (service, store) = setup(5, 100).await;

        let handles: Vec<_> = (0..10)
            .map(|i| {
                let service = service.clone();
                tokio::spawn(async move { service.create_transaction(&format!("user-{i}"), "X", 1).await })
            })
            .collect();

        let mut ok = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(_) => ok += 1,
                Err(err) => assert_eq!(err.kind(), ErrorKind::InsufficientStock),
            }
        }

        assert_eq!(ok, 5);
        assert_eq!(stock_of(&store, "X").await, 0);
        assert_eq!(store.transaction_count().await, 5);
    }
}
