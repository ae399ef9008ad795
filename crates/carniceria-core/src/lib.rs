//! # carniceria-core: Pure Business Logic for the Shop Backend
//!
//! Domain types, fixed-point money math, order totals and input validation.
//! Nothing in this crate touches the database or the network.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Carnicería Architecture                          │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                 Browser frontend (static JS)                    │   │
//! │  │    Catalog ──► Cart ──► Checkout        Admin panel             │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │ JSON over HTTP                         │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                    apps/api (axum)                              │   │
//! │  │    auth, routing, error mapping                                 │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │             ★ carniceria-core (THIS CRATE) ★                    │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │   types   │  │   money   │  │  report   │  │ validation│  │   │
//! │  │   │  Product  │  │   Money   │  │ DateRange │  │   rules   │  │   │
//! │  │   │   Order   │  │ Quantity  │  │  Totals   │  │  checks   │  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                 carniceria-db (Database Layer)                  │   │
//! │  │              SQLite queries, migrations, repositories           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Products, customers, orders, cash closings and request drafts
//! - [`money`] - `Money` (cents) and `Quantity` (thousandths)
//! - [`report`] - Report shapes and date ranges
//! - [`error`] - Domain error types
//! - [`validation`] - Field-level checks
//!
//! ## Example Usage
//!
//! ```rust
//! use carniceria_core::{OrderDraft, Money};
//!
//! let draft: OrderDraft = serde_json::from_str(r#"{
//!     "cliente_id": 1,
//!     "items": [
//!         {"producto_id": 1, "cantidad": 2, "precio": 10.00},
//!         {"producto_id": 2, "cantidad": 1, "precio": 5.50}
//!     ]
//! }"#).unwrap();
//!
//! let order = draft.validate().unwrap();
//! assert_eq!(order.total, Money::from_cents(2550));
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod money;
pub mod report;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use error::{CoreError, CoreResult, ValidationError};
pub use money::{Money, Quantity};
pub use report::*;
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Row cap for `GET /pedidos/historial`.
pub const DEFAULT_HISTORY_LIMIT: i64 = 1000;

/// Row cap for `GET /admin/cierres`.
pub const DEFAULT_CLOSINGS_LIMIT: i64 = 100;

/// Products listed in a daily report.
pub const DAILY_TOP_PRODUCTS: i64 = 10;

/// Products listed in a date-range report.
pub const RANGE_TOP_PRODUCTS: i64 = 15;

/// Maximum length of names, cuts and units.
pub const MAX_NAME_LEN: usize = 100;

pub const MAX_EMAIL_LEN: usize = 255;

/// Maximum length of cash closing notes.
pub const MAX_NOTES_LEN: usize = 500;
