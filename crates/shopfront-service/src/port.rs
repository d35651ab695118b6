//! # Persistence Ports
//!
//! The services only reach storage through these traits.
//!
//! ```text
//! CheckoutService ──► CheckoutStore ──► begin() ──► UnitOfWork
//!                          │                          │ insert_transaction
//!                          │ reads outside            │ update_product_stock
//!                          │ a unit of work           │ find_transaction_by_id
//!                          │                          │ update_transaction_status
//!                          │                          └ commit / rollback
//! CatalogService  ──► CatalogStore
//! ```
//!
//! ## Unit of Work Contract
//! - Writes made through a unit of work are invisible to everyone else
//!   until `commit()` succeeds.
//! - Dropping a unit of work without committing discards its writes.
//! - `rollback()` may be called any number of times; after a successful
//!   commit it does nothing.
//! - `commit()` after `rollback()` fails with [`StoreError::InvalidState`].

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

use shopfront_core::{
    CreateProduct, NewTransaction, Pagination, Product, ProductFilter, Transaction,
};

// =============================================================================
// Store Error
// =============================================================================

/// Failures reported by a storage backend.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// Backend can't serve the request right now (pool exhausted or closed).
    /// Safe to retry.
    #[error("Store unavailable: {0}")]
    Unavailable(String),

    /// Conditional stock decrement matched no row: stock moved under us.
    #[error("Stock for product {product_id} changed concurrently")]
    StockConflict { product_id: i64 },

    /// A unique constraint rejected the write.
    #[error("Unique constraint violated on {field}")]
    UniqueViolation { field: String },

    /// Unit of work used after it was finished.
    #[error("Invalid unit of work state: {0}")]
    InvalidState(String),

    /// Anything else the backend reported.
    #[error("Store backend error: {0}")]
    Backend(String),
}

impl StoreError {
    /// Whether the same request may succeed if retried unchanged.
    pub fn is_retryable(&self) -> bool {
        matches!(self, StoreError::Unavailable(_))
    }
}

/// Result type for port operations.
pub type StoreResult<T> = Result<T, StoreError>;

// =============================================================================
// Checkout Ports
// =============================================================================

/// A scoped group of writes that becomes visible atomically on commit.
#[async_trait]
pub trait UnitOfWork: Send {
    /// Inserts a checkout row and returns the store-assigned id.
    async fn insert_transaction(&mut self, trx: &NewTransaction) -> StoreResult<i64>;

    /// Removes `amount` units from `product`'s stock.
    ///
    /// The decrement is conditional on enough stock being left at write
    /// time; otherwise [`StoreError::StockConflict`] is returned and nothing
    /// is written.
    async fn update_product_stock(&mut self, product: &Product, amount: i64) -> StoreResult<()>;

    /// Reads a transaction, seeing this unit of work's own writes.
    async fn find_transaction_by_id(&mut self, id: i64) -> StoreResult<Option<Transaction>>;

    /// Persists `status` and `updated_at` of an existing transaction.
    async fn update_transaction_status(&mut self, trx: &Transaction) -> StoreResult<()>;

    async fn commit(&mut self) -> StoreResult<()>;

    async fn rollback(&mut self) -> StoreResult<()>;
}

/// Storage used by the checkout orchestrator.
#[async_trait]
pub trait CheckoutStore: Send + Sync {
    type Uow: UnitOfWork + 'static;

    /// Active (not soft-deleted) product by SKU.
    async fn find_product_by_sku(&self, sku: &str) -> StoreResult<Option<Product>>;

    async fn begin(&self) -> StoreResult<Self::Uow>;

    async fn find_transaction_by_id(&self, id: i64) -> StoreResult<Option<Transaction>>;

    /// Every transaction of a buyer, newest first.
    async fn list_transactions_by_user(&self, user_public_id: &str) -> StoreResult<Vec<Transaction>>;

    /// Every transaction of a product (deleted products included), newest first.
    async fn list_transactions_by_product_sku(&self, sku: &str) -> StoreResult<Vec<Transaction>>;
}

// =============================================================================
// Catalog Port
// =============================================================================

/// Storage used by the catalog service.
///
/// Every lookup ignores soft-deleted products.
#[async_trait]
pub trait CatalogStore: Send + Sync {
    /// Inserts a product. Duplicate SKU or active name fails with
    /// [`StoreError::UniqueViolation`].
    async fn insert_product(&self, req: &CreateProduct, now: DateTime<Utc>) -> StoreResult<Product>;

    async fn get_product(&self, id: i64) -> StoreResult<Option<Product>>;

    async fn get_product_by_sku(&self, sku: &str) -> StoreResult<Option<Product>>;

    async fn get_product_by_name(&self, name: &str) -> StoreResult<Option<Product>>;

    /// Writes name, stock, price and `updated_at`. Returns `false` when no
    /// active product has that id.
    async fn update_product(&self, product: &Product) -> StoreResult<bool>;

    /// Sets `deleted_at`. Returns `false` when no active product has that id.
    async fn soft_delete_product(&self, id: i64, now: DateTime<Utc>) -> StoreResult<bool>;

    /// Products with `id > cursor`, ordered by id.
    async fn list_products(&self, page: Pagination) -> StoreResult<Vec<Product>>;

    /// Case-insensitive substring match on name or SKU.
    async fn search_products(&self, keyword: &str, page: Pagination) -> StoreResult<Vec<Product>>;

    /// Inclusive price and stock ranges.
    async fn filter_products(&self, filter: ProductFilter, page: Pagination) -> StoreResult<Vec<Product>>;
}
