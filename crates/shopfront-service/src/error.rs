//! # Service Errors
//!
//! Every service operation returns [`ServiceError`]. Callers branch on
//! [`ServiceError::kind`] and translate with [`ErrorKind::http_status`];
//! message text is never inspected.
//!
//! ```text
//! ValidationError ─► CoreError ─┐
//!                               ├─► ServiceError ─► ErrorKind ─► status code
//! DbError ─► StoreError ────────┘
//! ```

use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use shopfront_core::{CoreError, ValidationError};

use crate::port::StoreError;

/// Error returned by the checkout and catalog services.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ServiceError {
    /// Entity missing or soft-deleted.
    #[error("{entity} not found: {key}")]
    NotFound { entity: &'static str, key: String },

    /// Entity with the same unique key already exists.
    #[error("{entity} already exists: {key}")]
    AlreadyExists { entity: &'static str, key: String },

    /// Business rule violation.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// Operation didn't finish before its deadline. Nothing was written.
    #[error("Operation timed out after {0:?}")]
    Timeout(Duration),

    /// Storage failure.
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl From<ValidationError> for ServiceError {
    fn from(err: ValidationError) -> Self {
        ServiceError::Core(CoreError::Validation(err))
    }
}

impl ServiceError {
    pub(crate) fn not_found(entity: &'static str, key: impl ToString) -> Self {
        ServiceError::NotFound {
            entity,
            key: key.to_string(),
        }
    }

    pub(crate) fn already_exists(entity: &'static str, key: impl ToString) -> Self {
        ServiceError::AlreadyExists {
            entity,
            key: key.to_string(),
        }
    }

    /// Classifies the error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            ServiceError::NotFound { .. } => ErrorKind::NotFound,
            ServiceError::AlreadyExists { .. } => ErrorKind::AlreadyExists,
            ServiceError::Core(err) => match err {
                CoreError::InvalidQuantity { .. } | CoreError::AmountOverflow { .. } => {
                    ErrorKind::InvalidQuantity
                }
                CoreError::InsufficientStock { .. } => ErrorKind::InsufficientStock,
                CoreError::InvalidStatusTransition { .. } => ErrorKind::InvalidStatusTransition,
                CoreError::Validation(_) => ErrorKind::InvalidInput,
            },
            ServiceError::Timeout(_) => ErrorKind::Timeout,
            ServiceError::Store(err) => match err {
                StoreError::StockConflict { .. } => ErrorKind::InsufficientStock,
                StoreError::UniqueViolation { .. } => ErrorKind::AlreadyExists,
                _ => ErrorKind::StoreFailure,
            },
        }
    }

    /// Whether the caller may retry the same request unchanged.
    pub fn is_retryable(&self) -> bool {
        match self {
            ServiceError::Timeout(_) => true,
            ServiceError::Store(err) => err.is_retryable(),
            _ => false,
        }
    }

    /// Transport status for this error. Retryable store failures map to 503.
    pub fn http_status(&self) -> u16 {
        match self.kind() {
            ErrorKind::StoreFailure if self.is_retryable() => 503,
            kind => kind.http_status(),
        }
    }
}

/// Result type for service operations.
pub type ServiceResult<T> = Result<T, ServiceError>;

// =============================================================================
// Error Kind
// =============================================================================

/// Stable classification of [`ServiceError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    NotFound,
    InvalidQuantity,
    InsufficientStock,
    InvalidStatusTransition,
    AlreadyExists,
    InvalidInput,
    Timeout,
    StoreFailure,
}

impl ErrorKind {
    /// Status code an HTTP layer should answer with.
    pub const fn http_status(&self) -> u16 {
        match self {
            ErrorKind::NotFound => 404,
            ErrorKind::InvalidQuantity => 422,
            ErrorKind::InsufficientStock => 409,
            ErrorKind::InvalidStatusTransition => 409,
            ErrorKind::AlreadyExists => 409,
            ErrorKind::InvalidInput => 400,
            ErrorKind::Timeout => 504,
            ErrorKind::StoreFailure => 500,
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use shopfront_core::TransactionStatus;

    #[test]
    fn test_kind_mapping() {
        let err = ServiceError::from(CoreError::InsufficientStock {
            sku: "X".to_string(),
            available: 2,
            requested: 3,
        });
        assert_eq!(err.kind(), ErrorKind::InsufficientStock);
        assert_eq!(err.http_status(), 409);

        let err = ServiceError::from(CoreError::InvalidStatusTransition {
            from: TransactionStatus::Completed,
            to: TransactionStatus::Progress,
        });
        assert_eq!(err.kind(), ErrorKind::InvalidStatusTransition);

        let err = ServiceError::from(CoreError::InvalidQuantity { amount: 0 });
        assert_eq!(err.http_status(), 422);

        let err = ServiceError::not_found("product", "X");
        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert_eq!(err.http_status(), 404);
        assert_eq!(err.to_string(), "product not found: X");
    }

    #[test]
    fn test_store_errors_are_classified() {
        let err = ServiceError::from(StoreError::StockConflict { product_id: 1 });
        assert_eq!(err.kind(), ErrorKind::InsufficientStock);

        let err = ServiceError::from(StoreError::UniqueViolation {
            field: "name".to_string(),
        });
        assert_eq!(err.kind(), ErrorKind::AlreadyExists);

        let err = ServiceError::from(StoreError::Backend("disk I/O error".to_string()));
        assert_eq!(err.kind(), ErrorKind::StoreFailure);
        assert!(!err.is_retryable());
        assert_eq!(err.http_status(), 500);
    }

    #[test]
    fn test_retryable_errors() {
        let err = ServiceError::from(StoreError::Unavailable("pool timed out".to_string()));
        assert_eq!(err.kind(), ErrorKind::StoreFailure);
        assert!(err.is_retryable());
        assert_eq!(err.http_status(), 503);

        let err = ServiceError::Timeout(Duration::from_secs(1));
        assert!(err.is_retryable());
        assert_eq!(err.http_status(), 504);
    }

    #[test]
    fn test_validation_is_invalid_input() {
        let err = ServiceError::from(ValidationError::Required {
            field: "sku".to_string(),
        });
        assert_eq!(err.kind(), ErrorKind::InvalidInput);
        assert_eq!(err.http_status(), 400);
    }
}
