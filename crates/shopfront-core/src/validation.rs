//! # Validation Module
//!
//! Input validation for catalog and checkout requests.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Transport (out of scope)                                     │
//! │  └── Deserialization, authentication                                   │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: Services (Rust)                                              │
//! │  └── THIS MODULE: field rules before any storage access                │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Database (SQLite)                                            │
//! │  ├── CHECK (stock >= 0), CHECK (price_cents >= 0)                      │
//! │  ├── UNIQUE sku, partial UNIQUE name for active products               │
//! │  └── Foreign key transactions.product_id → products.id                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use crate::error::ValidationError;
use crate::types::{CreateProduct, Pagination, ProductFilter, UpdateProduct};
use crate::MAX_PAGE_SIZE;

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// String Validators
// =============================================================================

/// Validates a SKU.
///
/// ## Rules
/// - Must not be empty
/// - At most 64 characters (fits a hyphenated UUID)
/// - Only alphanumeric characters, hyphens, underscores
///
/// ## Example
/// ```rust
/// use shopfront_core::validation::validate_sku;
///
/// assert!(validate_sku("a98dcf06-7b4b-4f33-a6d2-20738bb8081b").is_ok());
/// assert!(validate_sku("COKE-330").is_ok());
/// assert!(validate_sku("").is_err());
/// assert!(validate_sku("has space").is_err());
/// ```
pub fn validate_sku(sku: &str) -> ValidationResult<()> {
    let sku = sku.trim();

    if sku.is_empty() {
        return Err(ValidationError::Required {
            field: "sku".to_string(),
        });
    }

    if sku.len() > 64 {
        return Err(ValidationError::TooLong {
            field: "sku".to_string(),
            max: 64,
        });
    }

    if !sku
        .chars()
        .all(|c| c.is_alphanumeric() || c == '-' || c == '_')
    {
        return Err(ValidationError::InvalidFormat {
            field: "sku".to_string(),
            reason: "must contain only letters, numbers, hyphens, and underscores".to_string(),
        });
    }

    Ok(())
}

/// Validates a product name: non-empty, at most 200 characters.
pub fn validate_product_name(name: &str) -> ValidationResult<()> {
    let name = name.trim();

    if name.is_empty() {
        return Err(ValidationError::Required {
            field: "name".to_string(),
        });
    }

    if name.chars().count() > 200 {
        return Err(ValidationError::TooLong {
            field: "name".to_string(),
            max: 200,
        });
    }

    Ok(())
}

/// Validates the buyer's public identifier. Opaque, so only presence and
/// length are checked.
pub fn validate_user_public_id(id: &str) -> ValidationResult<()> {
    let id = id.trim();

    if id.is_empty() {
        return Err(ValidationError::Required {
            field: "user_public_id".to_string(),
        });
    }

    if id.len() > 128 {
        return Err(ValidationError::TooLong {
            field: "user_public_id".to_string(),
            max: 128,
        });
    }

    Ok(())
}

/// Validates a search keyword. Empty is allowed; returns the trimmed value.
pub fn validate_search_keyword(keyword: &str) -> ValidationResult<String> {
    let keyword = keyword.trim();

    if keyword.len() > 100 {
        return Err(ValidationError::TooLong {
            field: "keyword".to_string(),
            max: 100,
        });
    }

    Ok(keyword.to_string())
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a price in minor units. Zero is allowed (free items).
///
/// ## Example
/// ```rust
/// use shopfront_core::validation::validate_price_cents;
///
/// assert!(validate_price_cents(1099).is_ok());
/// assert!(validate_price_cents(0).is_ok());
/// assert!(validate_price_cents(-100).is_err());
/// ```
pub fn validate_price_cents(cents: i64) -> ValidationResult<()> {
    if cents < 0 {
        return Err(ValidationError::Negative {
            field: "price".to_string(),
        });
    }

    Ok(())
}

/// Validates a stock level. Zero is allowed (sold out).
pub fn validate_stock_level(stock: i64) -> ValidationResult<()> {
    if stock < 0 {
        return Err(ValidationError::Negative {
            field: "stock".to_string(),
        });
    }

    Ok(())
}

/// Validates a pagination window.
///
/// ## Rules
/// - `cursor` must not be negative
/// - `size` must be between 1 and MAX_PAGE_SIZE (100)
pub fn validate_pagination(pagination: &Pagination) -> ValidationResult<()> {
    if pagination.cursor < 0 {
        return Err(ValidationError::Negative {
            field: "cursor".to_string(),
        });
    }

    if pagination.size == 0 || pagination.size > MAX_PAGE_SIZE {
        return Err(ValidationError::OutOfRange {
            field: "size".to_string(),
            min: 1,
            max: i64::from(MAX_PAGE_SIZE),
        });
    }

    Ok(())
}

/// Validates filter ranges: non-negative bounds, `min <= max`.
pub fn validate_product_filter(filter: &ProductFilter) -> ValidationResult<()> {
    validate_price_cents(filter.min_price_cents)?;
    validate_stock_level(filter.min_stock)?;

    if filter.min_price_cents > filter.max_price_cents {
        return Err(ValidationError::InvertedRange {
            field: "price".to_string(),
            min: filter.min_price_cents,
            max: filter.max_price_cents,
        });
    }

    if filter.min_stock > filter.max_stock {
        return Err(ValidationError::InvertedRange {
            field: "stock".to_string(),
            min: filter.min_stock,
            max: filter.max_stock,
        });
    }

    Ok(())
}

// =============================================================================
// Request Validators
// =============================================================================

/// Validates every field of a create request.
pub fn validate_create_product(req: &CreateProduct) -> ValidationResult<()> {
    validate_sku(&req.sku)?;
    validate_product_name(&req.name)?;
    validate_stock_level(req.stock)?;
    validate_price_cents(req.price_cents)?;
    Ok(())
}

/// Validates every field of an update request.
pub fn validate_update_product(req: &UpdateProduct) -> ValidationResult<()> {
    validate_product_name(&req.name)?;
    validate_stock_level(req.stock)?;
    validate_price_cents(req.price_cents)?;
    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_sku() {
        assert!(validate_sku("COKE-330").is_ok());
        assert!(validate_sku("product_1").is_ok());
        assert!(validate_sku("a98dcf06-7b4b-4f33-a6d2-20738bb8081b").is_ok());

        assert!(validate_sku("").is_err());
        assert!(validate_sku("   ").is_err());
        assert!(validate_sku("has space").is_err());
        assert!(validate_sku(&"A".repeat(65)).is_err());
    }

    #[test]
    fn test_validate_product_name() {
        assert!(validate_product_name("Kopi Susu 250ml").is_ok());
        assert!(validate_product_name("").is_err());
        assert!(validate_product_name(&"A".repeat(201)).is_err());
    }

    #[test]
    fn test_validate_user_public_id() {
        assert!(validate_user_public_id("5c534133-f81f-4df4-977e-38669242eb48").is_ok());
        assert!(validate_user_public_id(" ").is_err());
    }

    #[test]
    fn test_validate_numbers() {
        assert!(validate_price_cents(0).is_ok());
        assert!(validate_price_cents(-1).is_err());
        assert!(validate_stock_level(0).is_ok());
        assert!(validate_stock_level(-1).is_err());
    }

    #[test]
    fn test_validate_pagination() {
        assert!(validate_pagination(&Pagination::default()).is_ok());
        assert!(validate_pagination(&Pagination { cursor: 10, size: 100 }).is_ok());
        assert!(validate_pagination(&Pagination { cursor: -1, size: 10 }).is_err());
        assert!(validate_pagination(&Pagination { cursor: 0, size: 0 }).is_err());
        assert!(validate_pagination(&Pagination { cursor: 0, size: 101 }).is_err());
    }

    #[test]
    fn test_validate_product_filter() {
        assert!(validate_product_filter(&ProductFilter::default()).is_ok());

        let inverted = ProductFilter {
            min_price_cents: 500,
            max_price_cents: 100,
            ..ProductFilter::default()
        };
        assert!(matches!(
            validate_product_filter(&inverted),
            Err(ValidationError::InvertedRange { .. })
        ));
    }

    #[test]
    fn test_validate_create_product() {
        let req = CreateProduct {
            sku: "SKU-1".to_string(),
            name: "Teh Botol".to_string(),
            stock: 10,
            price_cents: 500,
        };
        assert!(validate_create_product(&req).is_ok());

        let bad = CreateProduct { stock: -1, ..req };
        assert!(matches!(
            validate_create_product(&bad),
            Err(ValidationError::Negative { .. })
        ));
    }
}
