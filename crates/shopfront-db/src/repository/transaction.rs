//! # Transaction Repository
//!
//! Database operations for checkout transactions.
//!
//! ## Two Access Paths
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  Reads outside a unit of work        Writes inside a unit of work       │
//! │  ───────────────────────────         ──────────────────────────────     │
//! │  TransactionRepository (pool)        free functions over any executor   │
//! │  ├── get_by_id                       ├── insert                         │
//! │  ├── list_by_user                    ├── decrement_stock                │
//! │  └── list_by_product_sku             ├── fetch_by_id                    │
//! │                                      └── update_status                  │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The product snapshot is stored as JSON text next to the totals.

use chrono::{DateTime, Utc};
use sqlx::{Executor, Sqlite, SqlitePool};
use tracing::{debug, warn};

use crate::error::{DbError, DbResult};
use shopfront_core::{NewTransaction, ProductSnapshot, Transaction, TransactionStatus};

/// Raw `transactions` row.
#[derive(Debug, sqlx::FromRow)]
struct TransactionRow {
    id: i64,
    user_public_id: String,
    product_id: i64,
    product_price_cents: i64,
    amount: i64,
    sub_total_cents: i64,
    platform_fee_cents: i64,
    grand_total_cents: i64,
    status: TransactionStatus,
    product_snapshot: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TransactionRow {
    fn into_domain(self) -> DbResult<Transaction> {
        let amount = u32::try_from(self.amount)
            .map_err(|_| DbError::Internal(format!("transaction {} has amount {}", self.id, self.amount)))?;
        let product_snapshot: ProductSnapshot = serde_json::from_str(&self.product_snapshot)?;

        Ok(Transaction {
            id: self.id,
            user_public_id: self.user_public_id,
            product_id: self.product_id,
            product_price_cents: self.product_price_cents,
            amount,
            sub_total_cents: self.sub_total_cents,
            platform_fee_cents: self.platform_fee_cents,
            grand_total_cents: self.grand_total_cents,
            status: self.status,
            product_snapshot,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

fn into_domain_all(rows: Vec<TransactionRow>) -> DbResult<Vec<Transaction>> {
    rows.into_iter().map(TransactionRow::into_domain).collect()
}

// =============================================================================
// Pool Reads
// =============================================================================

/// Repository for transaction reads outside a unit of work.
#[derive(Debug, Clone)]
pub struct TransactionRepository {
    pool: SqlitePool,
}

impl TransactionRepository {
    /// Creates a new TransactionRepository.
    pub fn new(pool: SqlitePool) -> Self {
        TransactionRepository { pool }
    }

    /// Gets a transaction by id.
    pub async fn get_by_id(&self, id: i64) -> DbResult<Option<Transaction>> {
        fetch_by_id(&self.pool, id).await
    }

    /// Every transaction of a buyer, newest first.
    pub async fn list_by_user(&self, user_public_id: &str) -> DbResult<Vec<Transaction>> {
        let rows = sqlx::query_as::<_, TransactionRow>(
            r#"
            SELECT id, user_public_id, product_id, product_price_cents, amount,
                   sub_total_cents, platform_fee_cents, grand_total_cents,
                   status, product_snapshot, created_at, updated_at
            FROM transactions
            WHERE user_public_id = ?1
            ORDER BY id DESC
            "#,
        )
        .bind(user_public_id)
        .fetch_all(&self.pool)
        .await?;

        debug!(user = %user_public_id, count = rows.len(), "Listed transactions by user");
        into_domain_all(rows)
    }

    /// Every transaction of the product with this SKU, newest first.
    ///
    /// Soft-deleted products keep their history.
    pub async fn list_by_product_sku(&self, sku: &str) -> DbResult<Vec<Transaction>> {
        let rows = sqlx::query_as::<_, TransactionRow>(
            r#"
            SELECT t.id, t.user_public_id, t.product_id, t.product_price_cents, t.amount,
                   t.sub_total_cents, t.platform_fee_cents, t.grand_total_cents,
                   t.status, t.product_snapshot, t.created_at, t.updated_at
            FROM transactions t
            INNER JOIN products p ON p.id = t.product_id
            WHERE p.sku = ?1
            ORDER BY t.id DESC
            "#,
        )
        .bind(sku)
        .fetch_all(&self.pool)
        .await?;

        debug!(sku = %sku, count = rows.len(), "Listed transactions by product");
        into_domain_all(rows)
    }
}

// =============================================================================
// Executor-Generic Statements
// =============================================================================

/// Reads one transaction through any executor (pool or open transaction).
pub async fn fetch_by_id<'e, E>(executor: E, id: i64) -> DbResult<Option<Transaction>>
where
    E: Executor<'e, Database = Sqlite>,
{
    let row = sqlx::query_as::<_, TransactionRow>(
        r#"
        SELECT id, user_public_id, product_id, product_price_cents, amount,
               sub_total_cents, platform_fee_cents, grand_total_cents,
               status, product_snapshot, created_at, updated_at
        FROM transactions
        WHERE id = ?1
        "#,
    )
    .bind(id)
    .fetch_optional(executor)
    .await?;

    row.map(TransactionRow::into_domain).transpose()
}

/// Inserts a checkout row and returns its id.
pub async fn insert<'e, E>(executor: E, trx: &NewTransaction) -> DbResult<i64>
where
    E: Executor<'e, Database = Sqlite>,
{
    let snapshot = serde_json::to_string(&trx.product_snapshot)?;

    let result = sqlx::query(
        r#"
        INSERT INTO transactions (
            user_public_id, product_id, product_price_cents, amount,
            sub_total_cents, platform_fee_cents, grand_total_cents,
            status, product_snapshot, created_at, updated_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
        "#,
    )
    .bind(&trx.user_public_id)
    .bind(trx.product_id)
    .bind(trx.product_price_cents)
    .bind(i64::from(trx.amount))
    .bind(trx.sub_total_cents)
    .bind(trx.platform_fee_cents)
    .bind(trx.grand_total_cents)
    .bind(trx.status)
    .bind(snapshot)
    .bind(trx.created_at)
    .bind(trx.updated_at)
    .execute(executor)
    .await?;

    let id = result.last_insert_rowid();
    debug!(id, product_id = trx.product_id, amount = trx.amount, "Inserted transaction");
    Ok(id)
}

/// Removes `amount` units from a product's stock if at least that many are
/// left.
///
/// ## Errors
/// `StockConflict` when the product is gone or has too little stock.
pub async fn decrement_stock<'e, E>(executor: E, product_id: i64, amount: i64, now: DateTime<Utc>) -> DbResult<()>
where
    E: Executor<'e, Database = Sqlite>,
{
    let result = sqlx::query(
        r#"
        UPDATE products
        SET stock = stock - ?1, updated_at = ?2
        WHERE id = ?3 AND deleted_at IS NULL AND stock >= ?1
        "#,
    )
    .bind(amount)
    .bind(now)
    .bind(product_id)
    .execute(executor)
    .await?;

    if result.rows_affected() == 0 {
        warn!(product_id, amount, "Conditional stock decrement matched no row");
        return Err(DbError::StockConflict { product_id });
    }

    debug!(product_id, amount, "Decremented stock");
    Ok(())
}

/// Persists `status` and `updated_at`.
pub async fn update_status<'e, E>(executor: E, trx: &Transaction) -> DbResult<()>
where
    E: Executor<'e, Database = Sqlite>,
{
    let result = sqlx::query("UPDATE transactions SET status = ?1, updated_at = ?2 WHERE id = ?3")
        .bind(trx.status)
        .bind(trx.updated_at)
        .bind(trx.id)
        .execute(executor)
        .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::not_found("Transaction", trx.id));
    }

    debug!(id = trx.id, status = %trx.status, "Updated transaction status");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Database, DbConfig};
    use shopfront_core::{CreateProduct, Money};

    async fn setup() -> (Database, shopfront_core::Product) {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let product = db
            .products()
            .insert(
                &CreateProduct {
                    sku: "X".to_string(),
                    name: "Sample".to_string(),
                    stock: 5,
                    price_cents: 100,
                },
                Utc::now(),
            )
            .await
            .unwrap();
        (db, product)
    }

    #[tokio::test]
    async fn test_insert_and_fetch_round_trips_snapshot() {
        let (db, product) = setup().await;
        let new_trx =
            NewTransaction::from_product("user-1", &product, 3, Money::from_cents(1_000), Utc::now()).unwrap();

        let id = insert(db.pool(), &new_trx).await.unwrap();
        let stored = db.transactions().get_by_id(id).await.unwrap().unwrap();

        assert_eq!(stored, new_trx.into_transaction(id));
        assert_eq!(stored.product_snapshot.name, "Sample");
        assert!(stored.totals_consistent());
    }

    #[tokio::test]
    async fn test_decrement_is_conditional() {
        let (db, product) = setup().await;

        decrement_stock(db.pool(), product.id, 3, Utc::now()).await.unwrap();
        let err = decrement_stock(db.pool(), product.id, 3, Utc::now()).await.unwrap_err();
        assert!(matches!(err, DbError::StockConflict { product_id } if product_id == product.id));

        let stored = db.products().get_by_id(product.id).await.unwrap().unwrap();
        assert_eq!(stored.stock, 2);
    }

    #[tokio::test]
    async fn test_foreign_key_enforced() {
        let (db, product) = setup().await;
        let mut new_trx =
            NewTransaction::from_product("user-1", &product, 1, Money::from_cents(1_000), Utc::now()).unwrap();
        new_trx.product_id = 9_999;

        let err = insert(db.pool(), &new_trx).await.unwrap_err();
        assert!(matches!(err, DbError::ForeignKeyViolation { .. }));
    }

    #[tokio::test]
    async fn test_update_status_unknown_id() {
        let (db, product) = setup().await;
        let trx = NewTransaction::from_product("user-1", &product, 1, Money::from_cents(1_000), Utc::now())
            .unwrap()
            .into_transaction(42);

        assert!(matches!(
            update_status(db.pool(), &trx).await,
            Err(DbError::NotFound { .. })
        ));
    }
}
