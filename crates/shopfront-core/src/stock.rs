//! # Stock Guard
//!
//! Two checks guard every checkout:
//!
//! ```text
//! read product ──► validate_stock() ──► begin unit of work
//!                  (fail fast)               │
//!                                            ▼
//!                                  insert transaction row
//!                                            │
//!                                            ▼
//!                                  apply_decrement() ──► write stock
//!                                  (re-checked right before the write)
//! ```
//!
//! Stock never goes negative. The storage layer repeats the check one last
//! time as a conditional update, which is what serializes concurrent
//! checkouts of the same SKU.

use crate::error::{CoreError, CoreResult};
use crate::types::Product;

/// Fails with `InsufficientStock` when `requested > current`.
pub fn validate_stock(sku: &str, requested: i64, current: i64) -> CoreResult<()> {
    if requested > current {
        return Err(CoreError::InsufficientStock {
            sku: sku.to_string(),
            available: current,
            requested,
        });
    }

    Ok(())
}

/// Returns the product with `amount` units removed from stock.
///
/// ## Errors
/// - `InvalidQuantity` when `amount <= 0`
/// - `InsufficientStock` when the result would be negative
pub fn apply_decrement(product: &Product, amount: i64) -> CoreResult<Product> {
    if amount <= 0 {
        return Err(CoreError::InvalidQuantity { amount });
    }

    validate_stock(&product.sku, amount, product.stock)?;

    let mut updated = product.clone();
    updated.stock = product.stock - amount;
    Ok(updated)
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn product(stock: i64) -> Product {
        let now = Utc::now();
        Product {
            id: 1,
            sku: "X".to_string(),
            name: "Sample".to_string(),
            stock,
            price_cents: 100,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        }
    }

    #[test]
    fn test_validate_stock() {
        assert!(validate_stock("X", 3, 5).is_ok());
        assert!(validate_stock("X", 5, 5).is_ok());
        assert_eq!(
            validate_stock("X", 3, 2),
            Err(CoreError::InsufficientStock {
                sku: "X".to_string(),
                available: 2,
                requested: 3,
            })
        );
    }

    #[test]
    fn test_apply_decrement() {
        let original = product(5);
        let updated = apply_decrement(&original, 3).unwrap();

        assert_eq!(updated.stock, 2);
        assert_eq!(original.stock, 5);
        assert_eq!(updated.sku, original.sku);
    }

    #[test]
    fn test_apply_decrement_to_zero() {
        assert_eq!(apply_decrement(&product(4), 4).unwrap().stock, 0);
    }

    #[test]
    fn test_apply_decrement_never_goes_negative() {
        assert!(matches!(
            apply_decrement(&product(2), 3),
            Err(CoreError::InsufficientStock { available: 2, requested: 3, .. })
        ));
        assert!(matches!(
            apply_decrement(&product(2), 0),
            Err(CoreError::InvalidQuantity { amount: 0 })
        ));
    }
}
