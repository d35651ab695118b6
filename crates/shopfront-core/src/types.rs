//! # Domain Types
//!
//! Core domain types used throughout Shopfront.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────────┐   ┌─────────────────┐   │
//! │  │    Product      │   │    Transaction      │   │ TransactionStatus│  │
//! │  │  ─────────────  │   │  ─────────────────  │   │  ─────────────  │   │
//! │  │  id (i64)       │   │  id (i64)           │   │  Created        │   │
//! │  │  sku (business) │──►│  product_snapshot   │   │  Progress       │   │
//! │  │  stock          │   │  amount, totals     │   │  Completed      │   │
//! │  │  price_cents    │   │  status             │   │  Cancelled      │   │
//! │  │  deleted_at     │   │  user_public_id     │   └─────────────────┘   │
//! │  └─────────────────┘   └─────────────────────┘                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Dual-Key Identity Pattern
//! - `id`: store-assigned integer, used for relations
//! - Business key: `sku` for products, `user_public_id` for buyers

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use ts_rs::TS;

use crate::error::CoreResult;
use crate::money::Money;
use crate::pricing::{compute_totals, Totals};

// =============================================================================
// Product
// =============================================================================

/// A product in the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Product {
    /// Store-assigned identifier.
    pub id: i64,

    /// Stock Keeping Unit - unique, immutable business key.
    pub sku: String,

    /// Display name.
    pub name: String,

    /// Units available for checkout. Never negative.
    pub stock: i64,

    /// Unit price in minor units. Never negative.
    pub price_cents: i64,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,

    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,

    /// Set when the product is soft-deleted; such products are invisible to
    /// checkout and catalog lookups.
    #[ts(as = "Option<String>")]
    pub deleted_at: Option<DateTime<Utc>>,
}

impl Product {
    /// Returns the price as a Money type.
    #[inline]
    pub fn price(&self) -> Money {
        Money::from_cents(self.price_cents)
    }

    /// Whether the product has been soft-deleted.
    #[inline]
    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }

    /// Freezes the fields a transaction keeps for historical display.
    pub fn snapshot(&self) -> ProductSnapshot {
        ProductSnapshot {
            id: self.id,
            sku: self.sku.clone(),
            name: self.name.clone(),
            price_cents: self.price_cents,
        }
    }
}

/// Product data captured at checkout time.
///
/// Stored alongside the transaction so history keeps showing what was bought
/// even after the product is renamed, repriced or deleted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ProductSnapshot {
    pub id: i64,
    pub sku: String,
    pub name: String,
    pub price_cents: i64,
}

// =============================================================================
// Transaction Status
// =============================================================================

/// The lifecycle status of a transaction.
///
/// Transition rules live in [`crate::status`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum TransactionStatus {
    /// Checkout committed, nothing else happened yet.
    Created,
    /// Order is being fulfilled.
    Progress,
    /// Order delivered. Terminal.
    Completed,
    /// Order cancelled. Terminal.
    Cancelled,
}

impl TransactionStatus {
    /// Lowercase name, identical to the persisted value.
    pub const fn as_str(&self) -> &'static str {
        match self {
            TransactionStatus::Created => "created",
            TransactionStatus::Progress => "progress",
            TransactionStatus::Completed => "completed",
            TransactionStatus::Cancelled => "cancelled",
        }
    }
}

impl Default for TransactionStatus {
    fn default() -> Self {
        TransactionStatus::Created
    }
}

impl fmt::Display for TransactionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Transaction
// =============================================================================

/// A checkout that has not been persisted yet.
///
/// The store assigns the id on insert; there is no placeholder id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewTransaction {
    pub user_public_id: String,
    pub product_id: i64,
    pub product_price_cents: i64,
    pub amount: u32,
    pub sub_total_cents: i64,
    pub platform_fee_cents: i64,
    pub grand_total_cents: i64,
    pub status: TransactionStatus,
    pub product_snapshot: ProductSnapshot,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl NewTransaction {
    /// Builds a checkout from the current product state.
    ///
    /// Captures price and display data at this instant and computes totals.
    ///
    /// ## Errors
    /// - `InvalidQuantity` if `amount <= 0`
    /// - `AmountOverflow` if the totals don't fit in i64
    pub fn from_product(
        user_public_id: &str,
        product: &Product,
        amount: i64,
        platform_fee: Money,
        now: DateTime<Utc>,
    ) -> CoreResult<Self> {
        let Totals {
            sub_total,
            platform_fee,
            grand_total,
        } = compute_totals(product.price(), amount, platform_fee)?;

        let amount = u32::try_from(amount).map_err(|_| crate::CoreError::AmountOverflow {
            field: "amount".to_string(),
        })?;

        Ok(NewTransaction {
            user_public_id: user_public_id.to_string(),
            product_id: product.id,
            product_price_cents: product.price_cents,
            amount,
            sub_total_cents: sub_total.cents(),
            platform_fee_cents: platform_fee.cents(),
            grand_total_cents: grand_total.cents(),
            status: TransactionStatus::Created,
            product_snapshot: product.snapshot(),
            created_at: now,
            updated_at: now,
        })
    }

    /// Attaches the store-assigned id.
    pub fn into_transaction(self, id: i64) -> Transaction {
        Transaction {
            id,
            user_public_id: self.user_public_id,
            product_id: self.product_id,
            product_price_cents: self.product_price_cents,
            amount: self.amount,
            sub_total_cents: self.sub_total_cents,
            platform_fee_cents: self.platform_fee_cents,
            grand_total_cents: self.grand_total_cents,
            status: self.status,
            product_snapshot: self.product_snapshot,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

/// A persisted checkout. Immutable except `status` and `updated_at`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Transaction {
    pub id: i64,
    /// Opaque public identifier of the buyer.
    pub user_public_id: String,
    pub product_id: i64,
    /// Unit price at time of purchase.
    pub product_price_cents: i64,
    /// Quantity bought.
    pub amount: u32,
    /// product_price × amount.
    pub sub_total_cents: i64,
    pub platform_fee_cents: i64,
    /// sub_total + platform_fee.
    pub grand_total_cents: i64,
    pub status: TransactionStatus,
    pub product_snapshot: ProductSnapshot,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Transaction {
    /// Returns the grand total as Money.
    #[inline]
    pub fn grand_total(&self) -> Money {
        Money::from_cents(self.grand_total_cents)
    }

    /// Whether the stored totals agree with their inputs.
    pub fn totals_consistent(&self) -> bool {
        let expected = Money::from_cents(self.product_price_cents)
            .checked_mul_quantity(i64::from(self.amount))
            .and_then(|sub| {
                sub.checked_add(Money::from_cents(self.platform_fee_cents))
                    .map(|grand| (sub, grand))
            });

        matches!(expected, Some((sub, grand))
            if sub.cents() == self.sub_total_cents && grand.cents() == self.grand_total_cents)
    }
}

/// History row shown to buyers and back-office users.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct TransactionHistory {
    pub id: i64,
    pub product_sku: String,
    pub product_name: String,
    pub product_price_cents: i64,
    pub amount: u32,
    pub sub_total_cents: i64,
    pub platform_fee_cents: i64,
    pub grand_total_cents: i64,
    pub status: TransactionStatus,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl From<&Transaction> for TransactionHistory {
    fn from(trx: &Transaction) -> Self {
        TransactionHistory {
            id: trx.id,
            product_sku: trx.product_snapshot.sku.clone(),
            product_name: trx.product_snapshot.name.clone(),
            product_price_cents: trx.product_price_cents,
            amount: trx.amount,
            sub_total_cents: trx.sub_total_cents,
            platform_fee_cents: trx.platform_fee_cents,
            grand_total_cents: trx.grand_total_cents,
            status: trx.status,
            created_at: trx.created_at,
            updated_at: trx.updated_at,
        }
    }
}

// =============================================================================
// Catalog Requests
// =============================================================================

/// Input for creating a product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CreateProduct {
    pub sku: String,
    pub name: String,
    pub stock: i64,
    pub price_cents: i64,
}

/// Input for updating a product. SKU is immutable and not part of it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct UpdateProduct {
    pub name: String,
    pub stock: i64,
    pub price_cents: i64,
}

/// Keyset pagination: rows with `id > cursor`, at most `size` of them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Pagination {
    pub cursor: i64,
    pub size: u32,
}

impl Default for Pagination {
    fn default() -> Self {
        Pagination {
            cursor: 0,
            size: crate::DEFAULT_PAGE_SIZE,
        }
    }
}

/// Inclusive price and stock ranges for catalog filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ProductFilter {
    pub min_price_cents: i64,
    pub max_price_cents: i64,
    pub min_stock: i64,
    pub max_stock: i64,
}

impl Default for ProductFilter {
    fn default() -> Self {
        ProductFilter {
            min_price_cents: 0,
            max_price_cents: i64::MAX,
            min_stock: 0,
            max_stock: i64::MAX,
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
