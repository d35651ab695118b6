//! # SQLite Store
//!
//! Implements the service ports on top of the repositories.
//!
//! ## Unit of Work
//! ```text
//! SqliteStore::begin()
//!      │  BEGIN IMMEDIATE ── waits at most acquire_timeout for a connection,
//!      │                     then at most the busy timeout for the write lock
//!      ▼
//! SqliteUnitOfWork { tx: Some(sqlx::Transaction) }
//!      │
//!      ├── commit()   ── tx.commit(), tx = None
//!      ├── rollback() ── tx.rollback(), tx = None (no-op when None)
//!      └── drop       ── sqlx rolls the open transaction back
//! ```

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{Sqlite, SqliteConnection, SqlitePool};
use tracing::debug;

use shopfront_core::{CreateProduct, NewTransaction, Pagination, Product, ProductFilter, Transaction};
use shopfront_service::{CatalogStore, CheckoutStore, StoreError, StoreResult, UnitOfWork};

use crate::error::DbError;
use crate::repository::product::ProductRepository;
use crate::repository::transaction::{self, TransactionRepository};

/// Port implementation backed by a SQLite pool.
#[derive(Debug, Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
    products: ProductRepository,
    transactions: TransactionRepository,
}

impl SqliteStore {
    pub fn new(pool: SqlitePool) -> Self {
        SqliteStore {
            products: ProductRepository::new(pool.clone()),
            transactions: TransactionRepository::new(pool.clone()),
            pool,
        }
    }
}

// =============================================================================
// Checkout Port
// =============================================================================

#[async_trait]
impl CheckoutStore for SqliteStore {
    type Uow = SqliteUnitOfWork;

    async fn find_product_by_sku(&self, sku: &str) -> StoreResult<Option<Product>> {
        Ok(self.products.get_by_sku(sku).await?)
    }

    async fn begin(&self) -> StoreResult<SqliteUnitOfWork> {
        // A deferred transaction that reads first cannot upgrade to a write
        // once another connection has committed; take the write lock up front.
        let tx = self
            .pool
            .begin_with("BEGIN IMMEDIATE")
            .await
            .map_err(DbError::from)?;
        debug!("Unit of work started");
        Ok(SqliteUnitOfWork {
            tx: Some(tx),
            phase: Phase::Open,
        })
    }

    async fn find_transaction_by_id(&self, id: i64) -> StoreResult<Option<Transaction>> {
        Ok(self.transactions.get_by_id(id).await?)
    }

    async fn list_transactions_by_user(&self, user_public_id: &str) -> StoreResult<Vec<Transaction>> {
        Ok(self.transactions.list_by_user(user_public_id).await?)
    }

    async fn list_transactions_by_product_sku(&self, sku: &str) -> StoreResult<Vec<Transaction>> {
        Ok(self.transactions.list_by_product_sku(sku).await?)
    }
}

// =============================================================================
// Unit of Work
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Open,
    Committed,
    RolledBack,
}

/// A SQLite transaction. Dropping it while open rolls back.
pub struct SqliteUnitOfWork {
    tx: Option<sqlx::Transaction<'static, Sqlite>>,
    phase: Phase,
}

impl SqliteUnitOfWork {
    fn conn(&mut self) -> StoreResult<&mut SqliteConnection> {
        let phase = self.phase;
        match self.tx.as_mut() {
            Some(tx) => Ok(&mut **tx),
            None => Err(finished(phase)),
        }
    }
}

fn finished(phase: Phase) -> StoreError {
    match phase {
        Phase::Committed => StoreError::InvalidState("unit of work already committed".to_string()),
        _ => StoreError::InvalidState("unit of work already rolled back".to_string()),
    }
}

#[async_trait]
impl UnitOfWork for SqliteUnitOfWork {
    async fn insert_transaction(&mut self, trx: &NewTransaction) -> StoreResult<i64> {
        let conn = self.conn()?;
        Ok(transaction::insert(conn, trx).await?)
    }

    async fn update_product_stock(&mut self, product: &Product, amount: i64) -> StoreResult<()> {
        let conn = self.conn()?;
        Ok(transaction::decrement_stock(conn, product.id, amount, Utc::now()).await?)
    }

    async fn find_transaction_by_id(&mut self, id: i64) -> StoreResult<Option<Transaction>> {
        let conn = self.conn()?;
        Ok(transaction::fetch_by_id(conn, id).await?)
    }

    async fn update_transaction_status(&mut self, trx: &Transaction) -> StoreResult<()> {
        let conn = self.conn()?;
        Ok(transaction::update_status(conn, trx).await?)
    }

    async fn commit(&mut self) -> StoreResult<()> {
        let tx = self.tx.take().ok_or_else(|| finished(self.phase))?;

        match tx.commit().await {
            Ok(()) => {
                self.phase = Phase::Committed;
                debug!("Unit of work committed");
                Ok(())
            }
            Err(err) => {
                // The connection has already abandoned the transaction.
                self.phase = Phase::RolledBack;
                Err(DbError::from(err).into())
            }
        }
    }

    async fn rollback(&mut self) -> StoreResult<()> {
        let Some(tx) = self.tx.take() else {
            return Ok(());
        };

        self.phase = Phase::RolledBack;
        tx.rollback().await.map_err(DbError::from)?;
        debug!("Unit of work rolled back");
        Ok(())
    }
}

// =============================================================================
// Catalog Port
// =============================================================================

#[async_trait]
impl CatalogStore for SqliteStore {
    async fn insert_product(&self, req: &CreateProduct, now: DateTime<Utc>) -> StoreResult<Product> {
        Ok(self.products.insert(req, now).await?)
    }

    async fn get_product(&self, id: i64) -> StoreResult<Option<Product>> {
        Ok(self.products.get_by_id(id).await?)
    }

    async fn get_product_by_sku(&self, sku: &str) -> StoreResult<Option<Product>> {
        Ok(self.products.get_by_sku(sku).await?)
    }

    async fn get_product_by_name(&self, name: &str) -> StoreResult<Option<Product>> {
        Ok(self.products.get_by_name(name).await?)
    }

    async fn update_product(&self, product: &Product) -> StoreResult<bool> {
        Ok(self.products.update(product).await?)
    }

    async fn soft_delete_product(&self, id: i64, now: DateTime<Utc>) -> StoreResult<bool> {
        Ok(self.products.soft_delete(id, now).await?)
    }

    async fn list_products(&self, page: Pagination) -> StoreResult<Vec<Product>> {
        Ok(self.products.list(page).await?)
    }

    async fn search_products(&self, keyword: &str, page: Pagination) -> StoreResult<Vec<Product>> {
        Ok(self.products.search(keyword, page).await?)
    }

    async fn filter_products(&self, filter: ProductFilter, page: Pagination) -> StoreResult<Vec<Product>> {
        Ok(self.products.filter(filter, page).await?)
    }
}
