//! # Pricing / Totals Calculator
//!
//! ```text
//! unit price P ──┐
//!                ├──► sub_total = P × A ──┐
//! quantity A  ───┘                        ├──► grand_total = sub_total + fee
//! platform fee (once per transaction) ────┘
//! ```
//!
//! The fee does not scale with quantity. Totals are always recomputed from
//! their inputs; nothing downstream is allowed to patch a total directly.

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::money::Money;

/// Result of pricing one checkout line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Totals {
    pub sub_total: Money,
    pub platform_fee: Money,
    pub grand_total: Money,
}

/// Computes sub total and grand total for `amount` units at `unit_price`.
///
/// ## Errors
/// - `InvalidQuantity` when `amount <= 0`
/// - `Validation` when the price or the fee is negative
/// - `AmountOverflow` when a total doesn't fit in i64 minor units
///
/// ## Example
/// ```rust
/// use shopfront_core::money::Money;
/// use shopfront_core::pricing::compute_totals;
///
/// let totals = compute_totals(Money::from_cents(100), 3, Money::from_cents(1_000)).unwrap();
/// assert_eq!(totals.sub_total.cents(), 300);
/// assert_eq!(totals.grand_total.cents(), 1_300);
/// ```
pub fn compute_totals(unit_price: Money, amount: i64, platform_fee: Money) -> CoreResult<Totals> {
    if amount <= 0 {
        return Err(CoreError::InvalidQuantity { amount });
    }

    if unit_price.is_negative() {
        return Err(ValidationError::Negative {
            field: "price".to_string(),
        }
        .into());
    }

    if platform_fee.is_negative() {
        return Err(ValidationError::Negative {
            field: "platform_fee".to_string(),
        }
        .into());
    }

    let sub_total = unit_price
        .checked_mul_quantity(amount)
        .ok_or_else(|| CoreError::AmountOverflow {
            field: "sub_total".to_string(),
        })?;

    let grand_total = sub_total
        .checked_add(platform_fee)
        .ok_or_else(|| CoreError::AmountOverflow {
            field: "grand_total".to_string(),
        })?;

    Ok(Totals {
        sub_total,
        platform_fee,
        grand_total,
    })
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const FEE: Money = Money::from_cents(1_000);

    #[test]
    fn test_fee_applied_once() {
        let one = compute_totals(Money::from_cents(100), 1, FEE).unwrap();
        let ten = compute_totals(Money::from_cents(100), 10, FEE).unwrap();

        assert_eq!(one.grand_total.cents(), 1_100);
        assert_eq!(ten.grand_total.cents(), 2_000);
        assert_eq!(one.platform_fee, ten.platform_fee);
    }

    #[test]
    fn test_free_product_still_pays_fee() {
        let totals = compute_totals(Money::zero(), 4, FEE).unwrap();
        assert_eq!(totals.sub_total, Money::zero());
        assert_eq!(totals.grand_total, FEE);
    }

    #[test]
    fn test_invalid_quantity() {
        assert_eq!(
            compute_totals(Money::from_cents(100), 0, FEE),
            Err(CoreError::InvalidQuantity { amount: 0 })
        );
        assert_eq!(
            compute_totals(Money::from_cents(100), -2, FEE),
            Err(CoreError::InvalidQuantity { amount: -2 })
        );
    }

    #[test]
    fn test_negative_inputs_rejected() {
        assert!(matches!(
            compute_totals(Money::from_cents(-1), 1, FEE),
            Err(CoreError::Validation(ValidationError::Negative { .. }))
        ));
        assert!(matches!(
            compute_totals(Money::from_cents(1), 1, Money::from_cents(-1)),
            Err(CoreError::Validation(ValidationError::Negative { .. }))
        ));
    }

    #[test]
    fn test_overflow_is_reported() {
        assert!(matches!(
            compute_totals(Money::from_cents(i64::MAX), 2, FEE),
            Err(CoreError::AmountOverflow { .. })
        ));
        assert!(matches!(
            compute_totals(Money::from_cents(i64::MAX), 1, FEE),
            Err(CoreError::AmountOverflow { .. })
        ));
    }

    proptest! {
        #[test]
        fn prop_totals_match_inputs(price in 0i64..=1_000_000_000, amount in 1i64..=100_000, fee in 0i64..=1_000_000) {
            let totals = compute_totals(Money::from_cents(price), amount, Money::from_cents(fee)).unwrap();
            prop_assert_eq!(totals.sub_total.cents(), price * amount);
            prop_assert_eq!(totals.platform_fee.cents(), fee);
            prop_assert_eq!(totals.grand_total.cents(), price * amount + fee);
        }

        #[test]
        fn prop_non_positive_amount_rejected(price in 0i64..=1_000_000, amount in i64::MIN..=0) {
            prop_assert_eq!(
                compute_totals(Money::from_cents(price), amount, FEE),
                Err(CoreError::InvalidQuantity { amount })
            );
        }
    }
}
