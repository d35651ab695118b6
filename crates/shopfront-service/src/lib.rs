//! # shopfront-service: Checkout Orchestration for Shopfront
//!
//! Runs the checkout flow, transaction status changes and catalog
//! management on top of storage ports.
//!
//! ## Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         shopfront-service                               │
//! │                                                                         │
//! │   ┌──────────────────┐              ┌──────────────────┐                │
//! │   │ CheckoutService  │              │  CatalogService  │                │
//! │   │ create / status  │              │  CRUD / search   │                │
//! │   │ history          │              │  filter / list   │                │
//! │   └────────┬─────────┘              └────────┬─────────┘                │
//! │            │ CheckoutStore + UnitOfWork      │ CatalogStore             │
//! │            ▼                                 ▼                          │
//! │   ┌─────────────────────────────────────────────────────────────┐       │
//! │   │  port traits ── InMemoryStore (here) / SqliteStore (db)     │       │
//! │   └─────────────────────────────────────────────────────────────┘       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Example Usage
//!
//! ```rust
//! use std::sync::Arc;
//! use shopfront_core::CreateProduct;
//! use shopfront_service::{CatalogService, CheckoutConfig, CheckoutService, InMemoryStore};
//!
//! # tokio_test_main();
//! # fn tokio_test_main() {
//! # let rt = tokio::runtime::Runtime::new().unwrap();
//! # rt.block_on(async {
//! let store = Arc::new(InMemoryStore::new());
//! let catalog = CatalogService::new(Arc::clone(&store));
//! let checkout = CheckoutService::new(Arc::clone(&store), CheckoutConfig::default());
//!
//! catalog
//!     .create_product(CreateProduct {
//!         sku: "X".to_string(),
//!         name: "Sample".to_string(),
//!         stock: 5,
//!         price_cents: 100,
//!     })
//!     .await
//!     .unwrap();
//!
//! let trx = checkout.create_transaction("user-1", "X", 3).await.unwrap();
//! assert_eq!(trx.grand_total_cents, 1_300);
//! # });
//! # }
//! ```

pub mod catalog;
pub mod checkout;
pub mod config;
pub mod error;
pub mod memory;
pub mod port;

pub use catalog::CatalogService;
pub use checkout::CheckoutService;
pub use config::{CheckoutConfig, ConfigError};
pub use error::{ErrorKind, ServiceError, ServiceResult};
pub use memory::{Fault, InMemoryStore};
pub use port::{CatalogStore, CheckoutStore, StoreError, StoreResult, UnitOfWork};
