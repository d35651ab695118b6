//! # Repository Module
//!
//! Database repository implementations for Shopfront.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  SqliteStore (port implementation)                                     │
//! │       │                                                                 │
//! │       │  catalog calls             checkout calls                      │
//! │       ▼                            ▼                                    │
//! │  ProductRepository            TransactionRepository                     │
//! │  ├── insert / update          ├── get_by_id                             │
//! │  ├── get_by_id / sku / name   ├── list_by_user                          │
//! │  ├── soft_delete              ├── list_by_product_sku                   │
//! │  └── list / search / filter   └── insert / decrement_stock /            │
//! │                                   fetch_by_id / update_status (any     │
//! │                                   executor, used inside a unit of work) │
//! │       │                                                                 │
//! │       │  SQL Query                                                      │
//! │       ▼                                                                 │
//! │  SQLite Database                                                       │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`product::ProductRepository`] - Product CRUD, listing and search
//! - [`transaction::TransactionRepository`] - Transaction reads and writes

pub mod product;
pub mod transaction;
