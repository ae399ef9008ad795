//! # Domain Types
//!
//! Core domain types used throughout the shop backend.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    Product      │   │     Order       │   │   OrderLine     │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id             │◄┐ │  id             │◄──│  order_id       │       │
//! │  │  name, cut      │ │ │  customer_id ──┐│   │  product_id ─┐  │       │
//! │  │  price (Money)  │ │ │  status        ││   │  quantity    │  │       │
//! │  │  unit           │ │ │  total (Money) ││   │  unit_price  │  │       │
//! │  └─────────────────┘ │ └────────────────┼┘   └──────────────┼──┘       │
//! │                      └──────────────────┼───────────────────┘ (weak)   │
//! │  ┌─────────────────┐                    │  ┌─────────────────┐         │
//! │  │    Customer     │◄───────────────────┘  │  CashClosing    │         │
//! │  │  email (unique) │        (weak)         │  date (unique)  │         │
//! │  │  role           │                       │  per-method sums│         │
//! │  └─────────────────┘                       └─────────────────┘         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Naming
//! Rust fields are English; the JSON wire names are the Spanish names the
//! shop frontend uses (`nombre`, `precio`, `metodo_pago`). Column names in
//! SQLite follow the Rust fields.
//!
//! ## Drafts vs. Records
//! Request bodies deserialize into `*Draft` / `*Patch` types whose fields are
//! all optional, so a missing field becomes a [`ValidationError`] (HTTP 400)
//! rather than a deserializer rejection. `validate()` turns a draft into the
//! checked `New*` value the repositories accept.

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::money::{Money, Quantity};
use crate::validation::{
    optional_text, parse_date, require_text, validate_email, validate_price, validate_quantity,
    ValidationResult,
};
use crate::{MAX_EMAIL_LEN, MAX_NAME_LEN, MAX_NOTES_LEN};

// =============================================================================
// Role
// =============================================================================

/// Account role. Registration always yields `Customer`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
pub enum Role {
    #[default]
    #[serde(rename = "cliente")]
    #[cfg_attr(feature = "sqlx", sqlx(rename = "cliente"))]
    Customer,
    #[serde(rename = "empleado")]
    #[cfg_attr(feature = "sqlx", sqlx(rename = "empleado"))]
    Employee,
    #[serde(rename = "admin")]
    #[cfg_attr(feature = "sqlx", sqlx(rename = "admin"))]
    Admin,
}

impl Role {
    /// Employees and admins.
    #[inline]
    pub fn is_staff(&self) -> bool {
        matches!(self, Role::Employee | Role::Admin)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Customer => "cliente",
            Role::Employee => "empleado",
            Role::Admin => "admin",
        }
    }
}

// =============================================================================
// Order Status
// =============================================================================

/// Lifecycle state of an order. Orders are never deleted, only cancelled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
pub enum OrderStatus {
    #[default]
    #[serde(rename = "pendiente")]
    #[cfg_attr(feature = "sqlx", sqlx(rename = "pendiente"))]
    Pending,
    #[serde(rename = "completado")]
    #[cfg_attr(feature = "sqlx", sqlx(rename = "completado"))]
    Completed,
    #[serde(rename = "cancelado")]
    #[cfg_attr(feature = "sqlx", sqlx(rename = "cancelado"))]
    Cancelled,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pendiente",
            OrderStatus::Completed => "completado",
            OrderStatus::Cancelled => "cancelado",
        }
    }
}

// =============================================================================
// Payment Method
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
pub enum PaymentMethod {
    /// Cash at the counter. Default when an order omits the method.
    #[default]
    #[serde(rename = "efectivo")]
    #[cfg_attr(feature = "sqlx", sqlx(rename = "efectivo"))]
    Cash,
    #[serde(rename = "tarjeta")]
    #[cfg_attr(feature = "sqlx", sqlx(rename = "tarjeta"))]
    Card,
    #[serde(rename = "transferencia")]
    #[cfg_attr(feature = "sqlx", sqlx(rename = "transferencia"))]
    Transfer,
}

impl PaymentMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::Cash => "efectivo",
            PaymentMethod::Card => "tarjeta",
            PaymentMethod::Transfer => "transferencia",
        }
    }
}

// =============================================================================
// Product
// =============================================================================

/// A catalog entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Product {
    pub id: i64,
    #[serde(rename = "nombre")]
    pub name: String,
    #[serde(rename = "corte")]
    pub cut: String,
    /// Price per `unit`.
    #[serde(rename = "precio")]
    #[cfg_attr(feature = "sqlx", sqlx(rename = "price_cents"))]
    pub price: Money,
    /// Unit of measure ("kg", "unidad").
    #[serde(rename = "unidad")]
    pub unit: String,
}

/// Body of a product creation request.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProductDraft {
    #[serde(rename = "nombre")]
    pub name: Option<String>,
    #[serde(rename = "corte")]
    pub cut: Option<String>,
    #[serde(rename = "precio")]
    pub price: Option<Money>,
    #[serde(rename = "unidad")]
    pub unit: Option<String>,
}

/// A validated product ready for insertion.
#[derive(Debug, Clone, PartialEq)]
pub struct NewProduct {
    pub name: String,
    pub cut: String,
    pub price: Money,
    pub unit: String,
}

impl ProductDraft {
    pub fn validate(self) -> ValidationResult<NewProduct> {
        let price = self.price.ok_or_else(|| ValidationError::required("precio"))?;
        validate_price("precio", price)?;
        Ok(NewProduct {
            name: require_text("nombre", self.name, MAX_NAME_LEN)?,
            cut: require_text("corte", self.cut, MAX_NAME_LEN)?,
            price,
            unit: require_text("unidad", self.unit, MAX_NAME_LEN)?,
        })
    }
}

/// Partial product update. Only the fields present are written.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ProductPatch {
    #[serde(rename = "nombre")]
    pub name: Option<String>,
    #[serde(rename = "corte")]
    pub cut: Option<String>,
    #[serde(rename = "precio")]
    pub price: Option<Money>,
    #[serde(rename = "unidad")]
    pub unit: Option<String>,
}

impl ProductPatch {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.cut.is_none() && self.price.is_none() && self.unit.is_none()
    }

    /// Rejects an empty patch, blank text fields and negative prices.
    pub fn validate(self) -> CoreResult<ProductPatch> {
        if self.is_empty() {
            return Err(CoreError::NothingToUpdate);
        }
        if let Some(price) = self.price {
            validate_price("precio", price)?;
        }
        let text = |field: &str, value: Option<String>| -> ValidationResult<Option<String>> {
            match value {
                Some(v) => require_text(field, Some(v), MAX_NAME_LEN).map(Some),
                None => Ok(None),
            }
        };
        Ok(ProductPatch {
            name: text("nombre", self.name)?,
            cut: text("corte", self.cut)?,
            price: self.price,
            unit: text("unidad", self.unit)?,
        })
    }
}

// =============================================================================
// Customer
// =============================================================================

/// A registered account. The password hash never leaves the database layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Customer {
    pub id: i64,
    #[serde(rename = "nombre")]
    pub first_name: String,
    #[serde(rename = "apellido")]
    pub last_name: Option<String>,
    pub email: String,
    #[serde(rename = "telefono")]
    pub phone: Option<String>,
    #[serde(rename = "direccion")]
    pub address: Option<String>,
    #[serde(rename = "rol")]
    pub role: Role,
    #[serde(rename = "creado_en")]
    pub created_at: NaiveDateTime,
}

/// Body of `POST /clientes/registro`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CustomerDraft {
    #[serde(rename = "nombre")]
    pub first_name: Option<String>,
    #[serde(rename = "apellido")]
    pub last_name: Option<String>,
    pub email: Option<String>,
    #[serde(rename = "telefono")]
    pub phone: Option<String>,
    #[serde(rename = "direccion")]
    pub address: Option<String>,
    pub password: Option<String>,
}

/// A validated registration. `password` is still plain text here; the HTTP
/// layer hashes it before calling the repository.
#[derive(Debug, Clone, PartialEq)]
pub struct NewCustomer {
    pub first_name: String,
    pub last_name: Option<String>,
    pub email: String,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub password: Option<String>,
}

impl CustomerDraft {
    pub fn validate(self) -> ValidationResult<NewCustomer> {
        let first_name = require_text("nombre", self.first_name, MAX_NAME_LEN)?;
        let email = require_text("email", self.email, MAX_EMAIL_LEN)?;
        validate_email(&email)?;
        Ok(NewCustomer {
            first_name,
            last_name: optional_text(self.last_name),
            email,
            phone: optional_text(self.phone),
            address: optional_text(self.address),
            // Passwords are not trimmed: whitespace is part of the secret
            password: self.password.filter(|p| !p.is_empty()),
        })
    }
}

/// Body of `POST /clientes/login`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoginRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

impl LoginRequest {
    /// Returns the trimmed email, or `Required` when absent.
    pub fn email(&self) -> ValidationResult<String> {
        require_text("email", self.email.clone(), MAX_EMAIL_LEN)
    }
}

/// Owner details attached to orders in staff listings.
///
/// Every field is optional: the customer row may have vanished.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct CustomerSummary {
    #[serde(rename = "nombre")]
    #[cfg_attr(feature = "sqlx", sqlx(rename = "customer_first_name"))]
    pub first_name: Option<String>,
    #[serde(rename = "apellido")]
    #[cfg_attr(feature = "sqlx", sqlx(rename = "customer_last_name"))]
    pub last_name: Option<String>,
    #[cfg_attr(feature = "sqlx", sqlx(rename = "customer_email"))]
    pub email: Option<String>,
    #[serde(rename = "telefono")]
    #[cfg_attr(feature = "sqlx", sqlx(rename = "customer_phone"))]
    pub phone: Option<String>,
}

// =============================================================================
// Order
// =============================================================================

/// A customer order with its current line set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Order {
    pub id: i64,
    #[serde(rename = "cliente_id")]
    pub customer_id: i64,
    /// Local time the order was placed. Immutable.
    #[serde(rename = "fecha")]
    pub placed_at: NaiveDateTime,
    /// Always the sum of `items[].subtotal`.
    #[cfg_attr(feature = "sqlx", sqlx(rename = "total_cents"))]
    pub total: Money,
    #[serde(rename = "estado")]
    pub status: OrderStatus,
    #[serde(rename = "metodo_pago")]
    pub payment_method: PaymentMethod,
    #[serde(rename = "editado")]
    pub edited: bool,
    #[serde(rename = "fecha_edicion")]
    pub edited_at: Option<NaiveDateTime>,
    #[serde(rename = "editado_por")]
    pub edited_by: Option<i64>,
    #[cfg_attr(feature = "sqlx", sqlx(skip))]
    pub items: Vec<OrderLine>,
    /// Present only in staff listings.
    #[serde(flatten, skip_serializing_if = "Option::is_none", default)]
    #[cfg_attr(feature = "sqlx", sqlx(skip))]
    pub customer: Option<CustomerSummary>,
}

/// One product/quantity/price entry of an order, joined with the product's
/// current name and unit for display.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct OrderLine {
    pub id: i64,
    #[serde(rename = "pedido_id")]
    pub order_id: i64,
    #[serde(rename = "producto_id")]
    pub product_id: i64,
    /// Null when the product was deleted after the sale.
    #[serde(rename = "nombre")]
    pub product_name: Option<String>,
    #[serde(rename = "unidad")]
    pub product_unit: Option<String>,
    #[serde(rename = "cantidad")]
    #[cfg_attr(feature = "sqlx", sqlx(rename = "quantity_milli"))]
    pub quantity: Quantity,
    /// Price snapshot taken when the line was written.
    #[serde(rename = "precio_unitario")]
    #[cfg_attr(feature = "sqlx", sqlx(rename = "unit_price_cents"))]
    pub unit_price: Money,
    #[cfg_attr(feature = "sqlx", sqlx(rename = "subtotal_cents"))]
    pub subtotal: Money,
}

/// One requested line. The shop frontend sends the product id as `id`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct OrderItem {
    #[serde(rename = "producto_id", alias = "id")]
    pub product_id: Option<i64>,
    #[serde(rename = "cantidad")]
    pub quantity: Option<Quantity>,
    #[serde(rename = "precio")]
    pub price: Option<Money>,
}

/// A validated line with its subtotal already computed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NewOrderLine {
    pub product_id: i64,
    pub quantity: Quantity,
    pub unit_price: Money,
    pub subtotal: Money,
}

impl NewOrderLine {
    /// Fails when `unit_price × quantity` does not fit in cents.
    pub fn new(product_id: i64, quantity: Quantity, unit_price: Money) -> ValidationResult<Self> {
        let subtotal = unit_price
            .checked_times(quantity)
            .ok_or_else(|| amount_too_large("subtotal"))?;
        Ok(NewOrderLine {
            product_id,
            quantity,
            unit_price,
            subtotal,
        })
    }
}

fn amount_too_large(field: &str) -> ValidationError {
    ValidationError::TooLarge {
        field: field.to_string(),
        max: Money::from_cents(i64::MAX).to_string(),
    }
}

/// Validates a non-empty list of requested items.
pub fn validate_items(items: Vec<OrderItem>) -> CoreResult<Vec<NewOrderLine>> {
    if items.is_empty() {
        return Err(CoreError::EmptyOrder);
    }

    items
        .into_iter()
        .map(|item| -> CoreResult<NewOrderLine> {
            let product_id = item
                .product_id
                .ok_or_else(|| ValidationError::required("producto_id"))?;
            let quantity = item
                .quantity
                .ok_or_else(|| ValidationError::required("cantidad"))?;
            let price = item.price.ok_or_else(|| ValidationError::required("precio"))?;
            validate_quantity("cantidad", quantity)?;
            validate_price("precio", price)?;
            Ok(NewOrderLine::new(product_id, quantity, price)?)
        })
        .collect()
}

/// Sum of the line subtotals. Fails instead of wrapping on overflow.
pub fn order_total(lines: &[NewOrderLine]) -> ValidationResult<Money> {
    lines
        .iter()
        .try_fold(Money::zero(), |total, line| total.checked_add(line.subtotal))
        .ok_or_else(|| amount_too_large("total"))
}

/// Body of `POST /pedidos`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct OrderDraft {
    #[serde(rename = "cliente_id")]
    pub customer_id: Option<i64>,
    pub items: Option<Vec<OrderItem>>,
    #[serde(rename = "metodo_pago")]
    pub payment_method: Option<PaymentMethod>,
}

/// A validated order. `total` is computed from the lines.
#[derive(Debug, Clone, PartialEq)]
pub struct NewOrder {
    pub customer_id: i64,
    pub lines: Vec<NewOrderLine>,
    pub payment_method: PaymentMethod,
    pub total: Money,
}

impl OrderDraft {
    pub fn validate(self) -> CoreResult<NewOrder> {
        let customer_id = self
            .customer_id
            .ok_or_else(|| ValidationError::required("cliente_id"))?;
        let lines = validate_items(self.items.unwrap_or_default())?;
        Ok(NewOrder {
            customer_id,
            total: order_total(&lines)?,
            lines,
            payment_method: self.payment_method.unwrap_or_default(),
        })
    }
}

/// Body of `PUT /admin/pedidos/{id}`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct OrderPatch {
    #[serde(rename = "estado")]
    pub status: Option<OrderStatus>,
    #[serde(rename = "metodo_pago")]
    pub payment_method: Option<PaymentMethod>,
    pub items: Option<Vec<OrderItem>>,
    #[serde(rename = "editado_por")]
    pub edited_by: Option<i64>,
}

/// A validated order edit. At least one of status, payment method or lines
/// is present.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderUpdate {
    pub status: Option<OrderStatus>,
    pub payment_method: Option<PaymentMethod>,
    pub lines: Option<Vec<NewOrderLine>>,
    pub edited_by: Option<i64>,
}

impl OrderPatch {
    pub fn validate(self) -> CoreResult<OrderUpdate> {
        if self.status.is_none() && self.payment_method.is_none() && self.items.is_none() {
            return Err(CoreError::NothingToUpdate);
        }
        let lines = self.items.map(validate_items).transpose()?;
        if let Some(lines) = &lines {
            order_total(lines)?;
        }
        Ok(OrderUpdate {
            status: self.status,
            payment_method: self.payment_method,
            lines,
            edited_by: self.edited_by,
        })
    }
}

/// Response of a successful order creation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OrderReceipt {
    #[serde(rename = "pedido_id")]
    pub order_id: i64,
    pub total: Money,
}

// =============================================================================
// Cash Closing
// =============================================================================

/// Immutable end-of-day summary for one calendar date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct CashClosing {
    pub id: i64,
    #[serde(rename = "fecha")]
    pub closing_date: NaiveDate,
    #[serde(rename = "usuario_id")]
    pub user_id: i64,
    /// Operator's name, null if the account is gone.
    #[serde(rename = "usuario_nombre")]
    pub user_name: Option<String>,
    #[serde(rename = "total_efectivo")]
    #[cfg_attr(feature = "sqlx", sqlx(rename = "cash_cents"))]
    pub cash: Money,
    #[serde(rename = "total_tarjeta")]
    #[cfg_attr(feature = "sqlx", sqlx(rename = "card_cents"))]
    pub card: Money,
    #[serde(rename = "total_transferencia")]
    #[cfg_attr(feature = "sqlx", sqlx(rename = "transfer_cents"))]
    pub transfer: Money,
    #[serde(rename = "total_general")]
    #[cfg_attr(feature = "sqlx", sqlx(rename = "total_cents"))]
    pub total: Money,
    #[serde(rename = "cantidad_pedidos")]
    pub order_count: i64,
    #[serde(rename = "observaciones")]
    pub notes: Option<String>,
    #[serde(rename = "creado_en")]
    pub created_at: NaiveDateTime,
}

impl CashClosing {
    /// The aggregate figures stored on this closing.
    pub fn totals(&self) -> ClosingTotals {
        ClosingTotals {
            cash: self.cash,
            card: self.card,
            transfer: self.transfer,
            total: self.total,
            order_count: self.order_count,
        }
    }
}

/// Totals computed for a closing date.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClosingTotals {
    #[serde(rename = "total_efectivo")]
    pub cash: Money,
    #[serde(rename = "total_tarjeta")]
    pub card: Money,
    #[serde(rename = "total_transferencia")]
    pub transfer: Money,
    #[serde(rename = "total_general")]
    pub total: Money,
    #[serde(rename = "cantidad_pedidos")]
    pub order_count: i64,
}

/// Body of `POST /admin/cierre-caja`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ClosingDraft {
    #[serde(rename = "fecha")]
    pub date: Option<String>,
    #[serde(rename = "usuario_id")]
    pub user_id: Option<i64>,
    #[serde(rename = "observaciones")]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewCashClosing {
    pub date: NaiveDate,
    pub user_id: i64,
    pub notes: Option<String>,
}

impl ClosingDraft {
    pub fn validate(self) -> ValidationResult<NewCashClosing> {
        let raw_date = require_text("fecha", self.date, 10)?;
        let date = parse_date("fecha", &raw_date)?;
        let user_id = self
            .user_id
            .ok_or_else(|| ValidationError::required("usuario_id"))?;
        let notes = optional_text(self.notes);
        if notes.as_ref().is_some_and(|n| n.chars().count() > MAX_NOTES_LEN) {
            return Err(ValidationError::TooLong {
                field: "observaciones".to_string(),
                max: MAX_NOTES_LEN,
            });
        }
        Ok(NewCashClosing {
            date,
            user_id,
            notes,
        })
    }
}

/// Response of a successful closing: the stored record plus its totals.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClosingReceipt {
    #[serde(rename = "cierre")]
    pub closing: CashClosing,
    #[serde(rename = "totales")]
    pub totals: ClosingTotals,
}

// =============================================================================
// Unit Tests
// =============================================================================
