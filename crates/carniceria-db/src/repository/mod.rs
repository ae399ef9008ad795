//! # Repository Module
//!
//! One repository per component, each a thin handle over the shared pool.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  HTTP handler                                                           │
//! │       │  db.orders().create(&new_order)                                 │
//! │       ▼                                                                 │
//! │  OrderRepository                                                        │
//! │  ├── create(&self, order)          (transaction)                        │
//! │  ├── list_for_customer(&self, id)                                       │
//! │  ├── update(&self, id, update)     (transaction)                        │
//! │  └── cancel(&self, id)                                                  │
//! │       │  SQL                                                            │
//! │       ▼                                                                 │
//! │  SQLite Database                                                        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`ProductRepository`](product::ProductRepository) - Catalog Store
//! - [`CustomerRepository`](customer::CustomerRepository) - Customer Directory
//! - [`OrderRepository`](order::OrderRepository) - Order Ledger
//! - [`CashClosingRepository`](cash_closing::CashClosingRepository) - Cash Closing Ledger
//! - [`ReportRepository`](report::ReportRepository) - Reporting Engine

use chrono::{Local, NaiveDateTime};

pub mod cash_closing;
pub mod customer;
pub mod order;
pub mod product;
pub mod report;

/// Server-assigned timestamp. Stored as local time so `date(...)` in SQL is
/// the business date the shop sees.
pub(crate) fn local_now() -> NaiveDateTime {
    Local::now().naive_local()
}
