//! # shopfront-db: Database Layer for Shopfront
//!
//! SQLite storage for the checkout engine, built on sqlx. Implements the
//! persistence ports of `shopfront-service`.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Shopfront Data Flow                              │
//! │                                                                         │
//! │  CheckoutService / CatalogService                                      │
//! │       │  (CheckoutStore, CatalogStore, UnitOfWork)                     │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                  shopfront-db (THIS CRATE)                      │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌───────────────┐    ┌──────────────┐  │   │
//! │  │   │   Database    │    │  SqliteStore  │    │  Migrations  │  │   │
//! │  │   │   (pool.rs)   │    │  (store.rs)   │    │  (embedded)  │  │   │
//! │  │   │               │    │               │    │              │  │   │
//! │  │   │ SqlitePool    │◄───│ ProductRepo   │    │ 001_initial_ │  │   │
//! │  │   │ DbConfig      │    │ TransactionRepo│   │ schema.sql   │  │   │
//! │  │   └───────────────┘    └───────────────┘    └──────────────┘  │   │
//! │  │                                                                 │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SQLite database file (or :memory: in tests)                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database error types
//! - [`repository`] - Product and transaction repositories
//! - [`store`] - Port implementations used by the services
//!
//! ## Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use shopfront_db::{Database, DbConfig};
//! use shopfront_service::{CheckoutConfig, CheckoutService};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let db = Database::new(DbConfig::from_env()?).await?;
//! let checkout = CheckoutService::new(Arc::new(db.store()), CheckoutConfig::from_env()?);
//!
//! let _history = checkout.user_history("5c534133-f81f-4df4-977e-38669242eb48").await?;
//! # Ok(())
//! # }
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;
pub mod store;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};
pub use store::{SqliteStore, SqliteUnitOfWork};

// Repository re-exports for convenience
pub use repository::product::ProductRepository;
pub use repository::transaction::TransactionRepository;
