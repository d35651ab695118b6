//! # Database Error Types
//!
//! Error types for database operations.
//!
//! ## Error Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Propagation                                    │
//! │                                                                         │
//! │  SQLite Error (sqlx::Error)                                            │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  DbError (this module) ← Constraint classification                     │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  StoreError (shopfront-service port) ← Retryable or not                │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ServiceError → ErrorKind → status code                                │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use thiserror::Error;

use shopfront_service::StoreError;

/// Database operation errors.
#[derive(Debug, Error)]
pub enum DbError {
    /// Entity not found in database.
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    /// Unique constraint violation.
    ///
    /// ## When This Occurs
    /// - Inserting a duplicate SKU
    /// - Creating or renaming to a name an active product already uses
    #[error("Duplicate {field}: '{value}' already exists")]
    UniqueViolation { field: String, value: String },

    /// Foreign key constraint violation.
    ///
    /// ## When This Occurs
    /// - Inserting a transaction for a non-existent product_id
    #[error("Foreign key violation: {message}")]
    ForeignKeyViolation { message: String },

    /// Conditional stock decrement matched no row.
    #[error("Stock conflict on product {product_id}")]
    StockConflict { product_id: i64 },

    /// Database connection failed.
    ///
    /// ## When This Occurs
    /// - Database file doesn't exist and can't be created
    /// - File permissions issue
    /// - Pool closed
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// Migration failed.
    #[error("Migration failed: {0}")]
    MigrationFailed(String),

    /// Query execution failed.
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// Stored JSON (product snapshot) couldn't be read or written.
    #[error("Serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Pool exhausted (all connections in use past the acquire timeout).
    #[error("Connection pool exhausted")]
    PoolExhausted,

    /// Another connection held the lock past the busy timeout.
    #[error("Database busy: {0}")]
    Busy(String),

    /// Environment configuration is unusable.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Internal database error.
    #[error("Internal database error: {0}")]
    Internal(String),
}

impl DbError {
    /// Creates a NotFound error for a given entity type and ID.
    pub fn not_found(entity: impl Into<String>, id: impl ToString) -> Self {
        DbError::NotFound {
            entity: entity.into(),
            id: id.to_string(),
        }
    }
}

/// Convert sqlx errors to DbError.
///
/// ## Error Mapping
/// ```text
/// sqlx::Error::RowNotFound    → DbError::NotFound
/// sqlx::Error::Database       → BUSY/LOCKED codes, then message for constraint type
/// sqlx::Error::PoolTimedOut   → DbError::PoolExhausted
/// sqlx::Error::PoolClosed     → DbError::ConnectionFailed
/// Other                       → DbError::Internal
/// ```
impl From<sqlx::Error> for DbError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => DbError::not_found("Record", "unknown"),

            sqlx::Error::Database(db_err) => {
                let msg = db_err.message();

                if db_err.code().is_some_and(|code| is_lock_contention(&code)) {
                    return DbError::Busy(msg.to_string());
                }

                // "UNIQUE constraint failed: products.name"
                // "FOREIGN KEY constraint failed"
                if let Some(columns) = msg.strip_prefix("UNIQUE constraint failed: ") {
                    let field = columns
                        .split('.')
                        .last()
                        .unwrap_or(columns)
                        .to_string();
                    DbError::UniqueViolation {
                        field,
                        value: "unknown".to_string(),
                    }
                } else if msg.contains("FOREIGN KEY constraint failed") {
                    DbError::ForeignKeyViolation {
                        message: msg.to_string(),
                    }
                } else {
                    DbError::QueryFailed(msg.to_string())
                }
            }

            sqlx::Error::PoolTimedOut => DbError::PoolExhausted,

            sqlx::Error::PoolClosed => DbError::ConnectionFailed("Pool is closed".to_string()),

            _ => DbError::Internal(err.to_string()),
        }
    }
}

/// SQLITE_BUSY (5) and SQLITE_LOCKED (6) with their extended codes.
fn is_lock_contention(code: &str) -> bool {
    matches!(code, "5" | "6" | "261" | "262" | "517")
}

impl From<sqlx::migrate::MigrateError> for DbError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        DbError::MigrationFailed(err.to_string())
    }
}

/// Port-level view of a database failure.
impl From<DbError> for StoreError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::PoolExhausted | DbError::Busy(_) | DbError::ConnectionFailed(_) => {
                StoreError::Unavailable(err.to_string())
            }
            DbError::UniqueViolation { field, .. } => StoreError::UniqueViolation { field },
            DbError::StockConflict { product_id } => StoreError::StockConflict { product_id },
            other => StoreError::Backend(other.to_string()),
        }
    }
}

/// Result type for database operations.
pub type DbResult<T> = Result<T, DbError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_error_mapping() {
        assert!(matches!(
            StoreError::from(DbError::PoolExhausted),
            StoreError::Unavailable(_)
        ));
        assert!(StoreError::from(DbError::PoolExhausted).is_retryable());

        assert_eq!(
            StoreError::from(DbError::UniqueViolation {
                field: "name".to_string(),
                value: "unknown".to_string(),
            }),
            StoreError::UniqueViolation {
                field: "name".to_string()
            }
        );

        assert_eq!(
            StoreError::from(DbError::StockConflict { product_id: 3 }),
            StoreError::StockConflict { product_id: 3 }
        );

        assert!(matches!(
            StoreError::from(DbError::QueryFailed("boom".to_string())),
            StoreError::Backend(_)
        ));
    }

    #[test]
    fn test_lock_contention_is_retryable() {
        for code in ["5", "6", "261", "262", "517"] {
            assert!(is_lock_contention(code), "code {code}");
        }
        for code in ["1", "19", "2067", "787"] {
            assert!(!is_lock_contention(code), "code {code}");
        }

        let err = StoreError::from(DbError::Busy("database is locked".to_string()));
        assert!(matches!(err, StoreError::Unavailable(_)));
        assert!(err.is_retryable());
    }

    #[test]
    fn test_pool_timeout_is_exhaustion() {
        assert!(matches!(DbError::from(sqlx::Error::PoolTimedOut), DbError::PoolExhausted));
        assert!(matches!(
            DbError::from(sqlx::Error::PoolClosed),
            DbError::ConnectionFailed(_)
        ));
    }
}
