//! # shopfront-core: Pure Checkout Logic for Shopfront
//!
//! This crate holds every rule of the checkout engine as pure functions:
//! nothing here touches a database, a clock, or the network.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Shopfront Architecture                           │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │              Callers (HTTP layer, jobs, CLI tools)              │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │        shopfront-service (CheckoutService, CatalogService)      │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │              ★ shopfront-core (THIS CRATE) ★                    │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │  pricing  │  │   stock   │  │  status   │  │ validation│  │   │
//! │  │   │  Totals   │  │  guard    │  │  machine  │  │   rules   │  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                 shopfront-db (SQLite storage)                   │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (Product, Transaction, TransactionStatus, ...)
//! - [`money`] - Money type with integer arithmetic
//! - [`pricing`] - Sub total / platform fee / grand total calculator
//! - [`stock`] - Stock guard (pre-check and decrement)
//! - [`status`] - Transaction status state machine
//! - [`validation`] - Input validation for catalog and checkout requests
//! - [`error`] - Domain error types
//!
//! ## Example Usage
//!
//! ```rust
//! use shopfront_core::money::Money;
//! use shopfront_core::pricing::compute_totals;
//!
//! let totals = compute_totals(Money::from_cents(100), 3, Money::from_cents(1_000)).unwrap();
//! assert_eq!(totals.sub_total.cents(), 300);
//! assert_eq!(totals.grand_total.cents(), 1_300);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod money;
pub mod pricing;
pub mod status;
pub mod stock;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use error::{CoreError, CoreResult, ValidationError};
pub use money::Money;
pub use pricing::Totals;
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Platform fee charged once per transaction, in minor units.
///
/// Applied regardless of quantity. Deployments override it through
/// configuration; this is the value used when nothing is configured.
pub const DEFAULT_PLATFORM_FEE_CENTS: i64 = 1_000;

/// Default page size for catalog listings.
pub const DEFAULT_PAGE_SIZE: u32 = 10;

/// Largest page a catalog listing may request.
pub const MAX_PAGE_SIZE: u32 = 100;
