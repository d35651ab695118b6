//! # In-Memory Store
//!
//! A complete implementation of both ports backed by maps behind a tokio
//! mutex. Used by the service tests and handy for demos.
//!
//! ## Unit of Work Model
//! ```text
//! begin() ── lock_owned() ──► guard held for the whole unit of work
//!                 │
//!                 ▼
//!          staged = tables.clone()   writes go to `staged` only
//!                 │
//!      ┌──────────┴──────────┐
//!      ▼                     ▼
//!   commit()             rollback() / drop
//!   tables = staged      staged discarded
//! ```
//!
//! Holding the lock for the lifetime of a unit of work serializes writers
//! the way SQLite's single writer lock does.
//!
//! ## Fault Injection
//! [`InMemoryStore::fail_next`] arms a one-shot failure on a unit of work
//! step; [`InMemoryStore::set_write_delay`] slows down transaction inserts
//! so deadlines can be exercised.

use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::debug;

use shopfront_core::{
    CreateProduct, NewTransaction, Pagination, Product, ProductFilter, Transaction,
};

use crate::port::{CatalogStore, CheckoutStore, StoreError, StoreResult, UnitOfWork};

/// Unit of work step that can be made to fail once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Fault {
    InsertTransaction,
    UpdateStock,
    UpdateStatus,
    Commit,
    Rollback,
}

#[derive(Debug, Clone, Default)]
struct Tables {
    products: BTreeMap<i64, Product>,
    transactions: BTreeMap<i64, Transaction>,
    last_product_id: i64,
    last_transaction_id: i64,
}

#[derive(Debug, Default)]
struct MemoryState {
    tables: Tables,
    faults: HashSet<Fault>,
    write_delay: Option<Duration>,
}

/// Store that keeps everything in process memory.
#[derive(Debug, Clone, Default)]
pub struct InMemoryStore {
    state: Arc<Mutex<MemoryState>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Arms a one-shot failure for the next time `fault` is reached.
    pub async fn fail_next(&self, fault: Fault) {
        self.state.lock().await.faults.insert(fault);
    }

    /// Delays every transaction insert by `delay`.
    pub async fn set_write_delay(&self, delay: Option<Duration>) {
        self.state.lock().await.write_delay = delay;
    }

    /// Number of committed transactions.
    pub async fn transaction_count(&self) -> usize {
        self.state.lock().await.tables.transactions.len()
    }
}

fn page<'a>(
    products: impl Iterator<Item = &'a Product>,
    page: Pagination,
    keep: impl Fn(&Product) -> bool,
) -> Vec<Product> {
    products
        .filter(|p| !p.is_deleted() && p.id > page.cursor && keep(p))
        .take(page.size as usize)
        .cloned()
        .collect()
}

// =============================================================================
// Checkout Port
// =============================================================================

#[async_trait]
impl CheckoutStore for InMemoryStore {
    type Uow = InMemoryUnitOfWork;

    async fn find_product_by_sku(&self, sku: &str) -> StoreResult<Option<Product>> {
        let state = self.state.lock().await;
        Ok(state
            .tables
            .products
            .values()
            .find(|p| p.sku == sku && !p.is_deleted())
            .cloned())
    }

    async fn begin(&self) -> StoreResult<InMemoryUnitOfWork> {
        let guard = Arc::clone(&self.state).lock_owned().await;
        let staged = guard.tables.clone();
        Ok(InMemoryUnitOfWork {
            guard,
            staged,
            phase: Phase::Open,
        })
    }

    async fn find_transaction_by_id(&self, id: i64) -> StoreResult<Option<Transaction>> {
        let state = self.state.lock().await;
        Ok(state.tables.transactions.get(&id).cloned())
    }

    async fn list_transactions_by_user(&self, user_public_id: &str) -> StoreResult<Vec<Transaction>> {
        let state = self.state.lock().await;
        Ok(state
            .tables
            .transactions
            .values()
            .rev()
            .filter(|t| t.user_public_id == user_public_id)
            .cloned()
            .collect())
    }

    async fn list_transactions_by_product_sku(&self, sku: &str) -> StoreResult<Vec<Transaction>> {
        let state = self.state.lock().await;
        let product_ids: HashSet<i64> = state
            .tables
            .products
            .values()
            .filter(|p| p.sku == sku)
            .map(|p| p.id)
            .collect();

        Ok(state
            .tables
            .transactions
            .values()
            .rev()
            .filter(|t| product_ids.contains(&t.product_id))
            .cloned()
            .collect())
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

/// Unit of work over [`InMemoryStore`]. Holds the store lock until dropped.
pub struct InMemoryUnitOfWork {
    guard: OwnedMutexGuard<MemoryState>,
    staged: Tables,
    phase: Phase,
}

impl InMemoryUnitOfWork {
    fn ensure_open(&self) -> StoreResult<()> {
        match self.phase {
            Phase::Open => Ok(()),
            Phase::Committed => Err(StoreError::InvalidState("unit of work already committed".to_string())),
            Phase::RolledBack => Err(StoreError::InvalidState("unit of work already rolled back".to_string())),
        }
    }

    fn injected(&mut self, fault: Fault) -> StoreResult<()> {
        if self.guard.faults.remove(&fault) {
            return Err(StoreError::Backend(format!("injected failure: {fault:?}")));
        }
        Ok(())
    }
}

#[async_trait]
impl UnitOfWork for InMemoryUnitOfWork {
    async fn insert_transaction(&mut self, trx: &NewTransaction) -> StoreResult<i64> {
        self.ensure_open()?;

        if let Some(delay) = self.guard.write_delay {
            tokio::time::sleep(delay).await;
        }
        self.injected(Fault::InsertTransaction)?;

        if !self.staged.products.contains_key(&trx.product_id) {
            return Err(StoreError::Backend("FOREIGN KEY constraint failed".to_string()));
        }

        self.staged.last_transaction_id += 1;
        let id = self.staged.last_transaction_id;
        self.staged
            .transactions
            .insert(id, trx.clone().into_transaction(id));

        debug!(id, product_id = trx.product_id, "Staged transaction insert");
        Ok(id)
    }

    async fn update_product_stock(&mut self, product: &Product, amount: i64) -> StoreResult<()> {
        self.ensure_open()?;
        self.injected(Fault::UpdateStock)?;

        let conflict = StoreError::StockConflict {
            product_id: product.id,
        };
        let row = self
            .staged
            .products
            .get_mut(&product.id)
            .filter(|p| !p.is_deleted())
            .ok_or_else(|| conflict.clone())?;

        if row.stock < amount {
            return Err(conflict);
        }

        row.stock -= amount;
        row.updated_at = Utc::now();
        Ok(())
    }

    async fn find_transaction_by_id(&mut self, id: i64) -> StoreResult<Option<Transaction>> {
        self.ensure_open()?;
        Ok(self.staged.transactions.get(&id).cloned())
    }

    async fn update_transaction_status(&mut self, trx: &Transaction) -> StoreResult<()> {
        self.ensure_open()?;
        self.injected(Fault::UpdateStatus)?;

        let row = self
            .staged
            .transactions
            .get_mut(&trx.id)
            .ok_or_else(|| StoreError::Backend(format!("transaction {} does not exist", trx.id)))?;
        row.status = trx.status;
        row.updated_at = trx.updated_at;
        Ok(())
    }

    async fn commit(&mut self) -> StoreResult<()> {
        self.ensure_open()?;
        self.injected(Fault::Commit)?;

        self.guard.tables = std::mem::take(&mut self.staged);
        self.phase = Phase::Committed;
        Ok(())
    }

    async fn rollback(&mut self) -> StoreResult<()> {
        if self.phase != Phase::Open {
            return Ok(());
        }

        self.phase = Phase::RolledBack;
        self.staged = Tables::default();
        self.injected(Fault::Rollback)
    }
}

// =============================================================================
// Catalog Port
// =============================================================================

#[async_trait]
impl CatalogStore for InMemoryStore {
    async fn insert_product(&self, req: &CreateProduct, now: DateTime<Utc>) -> StoreResult<Product> {
        let mut state = self.state.lock().await;
        let tables = &mut state.tables;

        if tables.products.values().any(|p| p.sku == req.sku) {
            return Err(StoreError::UniqueViolation {
                field: "sku".to_string(),
            });
        }
        if tables
            .products
            .values()
            .any(|p| p.name == req.name && !p.is_deleted())
        {
            return Err(StoreError::UniqueViolation {
                field: "name".to_string(),
            });
        }

        tables.last_product_id += 1;
        let product = Product {
            id: tables.last_product_id,
            sku: req.sku.clone(),
            name: req.name.clone(),
            stock: req.stock,
            price_cents: req.price_cents,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        };
        tables.products.insert(product.id, product.clone());
        Ok(product)
    }

    async fn get_product(&self, id: i64) -> StoreResult<Option<Product>> {
        let state = self.state.lock().await;
        Ok(state
            .tables
            .products
            .get(&id)
            .filter(|p| !p.is_deleted())
            .cloned())
    }

    async fn get_product_by_sku(&self, sku: &str) -> StoreResult<Option<Product>> {
        self.find_product_by_sku(sku).await
    }

    async fn get_product_by_name(&self, name: &str) -> StoreResult<Option<Product>> {
        let state = self.state.lock().await;
        Ok(state
            .tables
            .products
            .values()
            .find(|p| p.name == name && !p.is_deleted())
            .cloned())
    }

    async fn update_product(&self, product: &Product) -> StoreResult<bool> {
        let mut state = self.state.lock().await;
        let tables = &mut state.tables;

        if tables
            .products
            .values()
            .any(|p| p.id != product.id && p.name == product.name && !p.is_deleted())
        {
            return Err(StoreError::UniqueViolation {
                field: "name".to_string(),
            });
        }

        match tables.products.get_mut(&product.id).filter(|p| !p.is_deleted()) {
            Some(row) => {
                row.name = product.name.clone();
                row.stock = product.stock;
                row.price_cents = product.price_cents;
                row.updated_at = product.updated_at;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn soft_delete_product(&self, id: i64, now: DateTime<Utc>) -> StoreResult<bool> {
        let mut state = self.state.lock().await;
        match state.tables.products.get_mut(&id).filter(|p| !p.is_deleted()) {
            Some(row) => {
                row.deleted_at = Some(now);
                row.updated_at = now;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn list_products(&self, pagination: Pagination) -> StoreResult<Vec<Product>> {
        let state = self.state.lock().await;
        Ok(page(state.tables.products.values(), pagination, |_| true))
    }

    async fn search_products(&self, keyword: &str, pagination: Pagination) -> StoreResult<Vec<Product>> {
        let keyword = keyword.to_lowercase();
        let state = self.state.lock().await;
        Ok(page(state.tables.products.values(), pagination, |p| {
            p.name.to_lowercase().contains(&keyword) || p.sku.to_lowercase().contains(&keyword)
        }))
    }

    async fn filter_products(&self, filter: ProductFilter, pagination: Pagination) -> StoreResult<Vec<Product>> {
        let state = self.state.lock().await;
        Ok(page(state.tables.products.values(), pagination, |p| {
            (filter.min_price_cents..=filter.max_price_cents).contains(&p.price_cents)
                && (filter.min_stock..=filter.max_stock).contains(&p.stock)
        }))
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
