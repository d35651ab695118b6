//! # Product Repository
//!
//! Database operations for the catalog.
//!
//! ## Key Operations
//! - CRUD with soft delete
//! - Keyset pagination (`id > cursor`)
//! - Keyword search and price/stock filtering
//!
//! ## Visibility
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  products                                                               │
//! │                                                                         │
//! │  id │ sku      │ name       │ deleted_at                                │
//! │  ───┼──────────┼────────────┼──────────────                             │
//! │   1 │ KOPI-1   │ Kopi Susu  │ NULL        ← visible                     │
//! │   2 │ TEH-1    │ Teh Manis  │ 2024-05-01  ← hidden from every lookup    │
//! │   3 │ TEH-2    │ Teh Manis  │ NULL        ← name reusable after delete  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Transactions keep pointing at deleted rows; history is unaffected.

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::DbResult;
use shopfront_core::{CreateProduct, Pagination, Product, ProductFilter};

/// Repository for product database operations.
#[derive(Debug, Clone)]
pub struct ProductRepository {
    pool: SqlitePool,
}

/// Escapes LIKE wildcards so user input matches literally.
fn like_pattern(keyword: &str) -> String {
    let mut escaped = String::with_capacity(keyword.len() + 2);
    escaped.push('%');
    for c in keyword.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped.push('%');
    escaped
}

impl ProductRepository {
    /// Creates a new ProductRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ProductRepository { pool }
    }

    /// Inserts a product and returns the stored row.
    ///
    /// ## Errors
    /// - `UniqueViolation { field: "sku" }` for a duplicate SKU
    /// - `UniqueViolation { field: "name" }` for a name an active product uses
    pub async fn insert(&self, req: &CreateProduct, now: DateTime<Utc>) -> DbResult<Product> {
        debug!(sku = %req.sku, name = %req.name, "Inserting product");

        let product = sqlx::query_as::<_, Product>(
            r#"
            INSERT INTO products (sku, name, stock, price_cents, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?5)
            RETURNING id, sku, name, stock, price_cents, created_at, updated_at, deleted_at
            "#,
        )
        .bind(&req.sku)
        .bind(&req.name)
        .bind(req.stock)
        .bind(req.price_cents)
        .bind(now)
        .fetch_one(&self.pool)
        .await?;

        Ok(product)
    }

    /// Gets an active product by id.
    pub async fn get_by_id(&self, id: i64) -> DbResult<Option<Product>> {
        let product = sqlx::query_as::<_, Product>(
            r#"
            SELECT id, sku, name, stock, price_cents, created_at, updated_at, deleted_at
            FROM products
            WHERE id = ?1 AND deleted_at IS NULL
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(product)
    }

    /// Gets an active product by SKU.
    pub async fn get_by_sku(&self, sku: &str) -> DbResult<Option<Product>> {
        debug!(sku = %sku, "Looking up product by SKU");

        let product = sqlx::query_as::<_, Product>(
            r#"
            SELECT id, sku, name, stock, price_cents, created_at, updated_at, deleted_at
            FROM products
            WHERE sku = ?1 AND deleted_at IS NULL
            "#,
        )
        .bind(sku)
        .fetch_optional(&self.pool)
        .await?;

        Ok(product)
    }

    /// Gets an active product by exact name.
    pub async fn get_by_name(&self, name: &str) -> DbResult<Option<Product>> {
        let product = sqlx::query_as::<_, Product>(
            r#"
            SELECT id, sku, name, stock, price_cents, created_at, updated_at, deleted_at
            FROM products
            WHERE name = ?1 AND deleted_at IS NULL
            "#,
        )
        .bind(name)
        .fetch_optional(&self.pool)
        .await?;

        Ok(product)
    }

    /// Writes name, stock, price and `updated_at`.
    ///
    /// ## Returns
    /// `false` when no active product has this id.
    pub async fn update(&self, product: &Product) -> DbResult<bool> {
        debug!(id = product.id, "Updating product");

        let result = sqlx::query(
            r#"
            UPDATE products
            SET name = ?1, stock = ?2, price_cents = ?3, updated_at = ?4
            WHERE id = ?5 AND deleted_at IS NULL
            "#,
        )
        .bind(&product.name)
        .bind(product.stock)
        .bind(product.price_cents)
        .bind(product.updated_at)
        .bind(product.id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    /// Soft-deletes a product.
    ///
    /// ## Returns
    /// `false` when no active product has this id.
    pub async fn soft_delete(&self, id: i64, now: DateTime<Utc>) -> DbResult<bool> {
        debug!(id, "Soft-deleting product");

        let result = sqlx::query(
            r#"
            UPDATE products
            SET deleted_at = ?1, updated_at = ?1
            WHERE id = ?2 AND deleted_at IS NULL
            "#,
        )
        .bind(now)
        .bind(id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    /// Lists active products after the cursor, ordered by id.
    pub async fn list(&self, page: Pagination) -> DbResult<Vec<Product>> {
        let products = sqlx::query_as::<_, Product>(
            r#"
            SELECT id, sku, name, stock, price_cents, created_at, updated_at, deleted_at
            FROM products
            WHERE deleted_at IS NULL AND id > ?1
            ORDER BY id
            LIMIT ?2
            "#,
        )
        .bind(page.cursor)
        .bind(i64::from(page.size))
        .fetch_all(&self.pool)
        .await?;

        debug!(count = products.len(), "Listed products");
        Ok(products)
    }

    /// Case-insensitive substring search on name or SKU.
    ///
    /// SQLite's LIKE folds ASCII case only.
    pub async fn search(&self, keyword: &str, page: Pagination) -> DbResult<Vec<Product>> {
        let pattern = like_pattern(keyword);

        debug!(keyword = %keyword, cursor = page.cursor, "Searching products");

        let products = sqlx::query_as::<_, Product>(
            r#"
            SELECT id, sku, name, stock, price_cents, created_at, updated_at, deleted_at
            FROM products
            WHERE deleted_at IS NULL
              AND id > ?1
              AND (name LIKE ?2 ESCAPE '\' OR sku LIKE ?2 ESCAPE '\')
            ORDER BY id
            LIMIT ?3
            "#,
        )
        .bind(page.cursor)
        .bind(&pattern)
        .bind(i64::from(page.size))
        .fetch_all(&self.pool)
        .await?;

        debug!(count = products.len(), "Search returned products");
        Ok(products)
    }

    /// Products within inclusive price and stock ranges.
    pub async fn filter(&self, filter: ProductFilter, page: Pagination) -> DbResult<Vec<Product>> {
        let products = sqlx::query_as::<_, Product>(
            r#"
            SELECT id, sku, name, stock, price_cents, created_at, updated_at, deleted_at
            FROM products
            WHERE deleted_at IS NULL
              AND id > ?1
              AND price_cents BETWEEN ?2 AND ?3
              AND stock BETWEEN ?4 AND ?5
            ORDER BY id
            LIMIT ?6
            "#,
        )
        .bind(page.cursor)
        .bind(filter.min_price_cents)
        .bind(filter.max_price_cents)
        .bind(filter.min_stock)
        .bind(filter.max_stock)
        .bind(i64::from(page.size))
        .fetch_all(&self.pool)
        .await?;

        debug!(count = products.len(), "Filtered products");
        Ok(products)
    }

    /// Counts active products.
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products WHERE deleted_at IS NULL")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}
