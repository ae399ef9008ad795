//! # Sales Reports
//!
//! Read-only aggregates over the order ledger. Cancelled orders never count.
//!
//! ```text
//!   dailyReport(fecha)          monthlyReport(anio, mes)     rangeReport(desde, hasta)
//!   ├── totales                 ├── totales                  ├── totales
//!   ├── por_metodo_pago         ├── por_metodo_pago          ├── por_metodo_pago
//!   └── productos_mas_vendidos  └── por_dia                  └── productos_mas_vendidos
//!        (top 10)                                                  (top 15)
//! ```

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};
use crate::money::{Money, Quantity};
use crate::types::PaymentMethod;
use crate::validation::month_bounds;

// =============================================================================
// Date Range
// =============================================================================

/// An inclusive range of calendar dates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub from: NaiveDate,
    pub to: NaiveDate,
}

impl DateRange {
    /// Fails with `InvalidDateRange` when `from > to`.
    pub fn new(from: NaiveDate, to: NaiveDate) -> CoreResult<Self> {
        if from > to {
            return Err(CoreError::InvalidDateRange {
                from: from.to_string(),
                to: to.to_string(),
            });
        }
        Ok(DateRange { from, to })
    }

    pub fn day(date: NaiveDate) -> Self {
        DateRange { from: date, to: date }
    }

    pub fn month(year: i32, month: u32) -> CoreResult<Self> {
        let (from, to) = month_bounds(year, month)?;
        Ok(DateRange { from, to })
    }
}

// =============================================================================
// Report Rows
// =============================================================================

/// Headline figures for a period.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SalesTotals {
    #[serde(rename = "total_pedidos")]
    pub order_count: i64,
    #[serde(rename = "total_ventas")]
    pub revenue: Money,
    /// Null when there were no orders.
    #[serde(rename = "ticket_promedio")]
    pub average_ticket: Option<Money>,
}

impl SalesTotals {
    pub fn new(order_count: i64, revenue: Money) -> Self {
        SalesTotals {
            order_count,
            revenue,
            average_ticket: revenue.average_over(order_count),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct PaymentMethodTotal {
    #[serde(rename = "metodo_pago")]
    pub payment_method: PaymentMethod,
    #[serde(rename = "cantidad")]
    pub order_count: i64,
    #[cfg_attr(feature = "sqlx", sqlx(rename = "total_cents"))]
    pub total: Money,
}

/// A product ranked by revenue. Name and cut are null for deleted products.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct TopProduct {
    #[serde(rename = "producto_id")]
    pub product_id: i64,
    #[serde(rename = "nombre")]
    pub name: Option<String>,
    #[serde(rename = "corte")]
    pub cut: Option<String>,
    #[serde(rename = "cantidad_vendida")]
    #[cfg_attr(feature = "sqlx", sqlx(rename = "quantity_milli"))]
    pub quantity_sold: Quantity,
    #[serde(rename = "total_vendido")]
    #[cfg_attr(feature = "sqlx", sqlx(rename = "revenue_cents"))]
    pub revenue: Money,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct DailySales {
    #[serde(rename = "dia")]
    pub day: NaiveDate,
    #[serde(rename = "cantidad_pedidos")]
    pub order_count: i64,
    #[cfg_attr(feature = "sqlx", sqlx(rename = "total_cents"))]
    pub total: Money,
}

// =============================================================================
// Reports
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyReport {
    #[serde(rename = "fecha")]
    pub date: NaiveDate,
    #[serde(rename = "totales")]
    pub totals: SalesTotals,
    #[serde(rename = "por_metodo_pago")]
    pub by_payment_method: Vec<PaymentMethodTotal>,
    #[serde(rename = "productos_mas_vendidos")]
    pub top_products: Vec<TopProduct>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlyReport {
    #[serde(rename = "anio")]
    pub year: i32,
    #[serde(rename = "mes")]
    pub month: u32,
    #[serde(rename = "totales")]
    pub totals: SalesTotals,
    #[serde(rename = "por_metodo_pago")]
    pub by_payment_method: Vec<PaymentMethodTotal>,
    #[serde(rename = "por_dia")]
    pub by_day: Vec<DailySales>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RangeReport {
    #[serde(rename = "fecha_desde")]
    pub from: NaiveDate,
    #[serde(rename = "fecha_hasta")]
    pub to: NaiveDate,
    #[serde(rename = "totales")]
    pub totals: SalesTotals,
    #[serde(rename = "por_metodo_pago")]
    pub by_payment_method: Vec<PaymentMethodTotal>,
    #[serde(rename = "productos_mas_vendidos")]
    pub top_products: Vec<TopProduct>,
}

// =============================================================================
// Unit Tests
// =============================================================================
