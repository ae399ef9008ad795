//! Route table.
//!
//! | Group    | Gate                          | Routes                            |
//! |----------|-------------------------------|-----------------------------------|
//! | public   | none                          | productos, clientes, health       |
//! | customer | `require_auth`                | POST /pedidos, GET /pedidos/{id}  |
//! | staff    | `require_auth`, `require_staff` | historial, admin pedidos/cierres/reportes |
//! | admin    | `require_auth`, `require_admin` | admin productos                 |
//!
//! `route_layer` runs the last added layer first, so `require_auth` is
//! always added after the role gate.

use std::sync::Arc;

use axum::middleware::{from_fn, from_fn_with_state};
use axum::routing::{get, post, put};
use axum::Router;

use crate::auth::{require_admin, require_auth, require_staff};
use crate::AppState;

pub mod cash_closing;
pub mod customer;
pub mod health;
pub mod order;
pub mod product;
pub mod report;

/// All routes with their auth layers, state not yet attached.
pub fn build_router(state: Arc<AppState>) -> Router<Arc<AppState>> {
    let public = Router::new()
        .route("/productos", get(product::list))
        .route("/productos/{id}", get(product::get))
        .route("/clientes/registro", post(customer::register))
        .route("/clientes/login", post(customer::login))
        .route("/health", get(health::check));

    let customer = Router::new()
        .route("/pedidos", post(order::create))
        .route("/pedidos/{customer_id}", get(order::list_for_customer))
        .route_layer(from_fn_with_state(state.clone(), require_auth));

    let staff = Router::new()
        .route("/pedidos/historial", get(order::history))
        .route("/admin/pedidos", get(order::list_all))
        .route(
            "/admin/pedidos/{id}",
            put(order::update).delete(order::cancel),
        )
        .route("/admin/cierre-caja", post(cash_closing::create))
        .route("/admin/cierres", get(cash_closing::list))
        .route("/admin/cierres/{fecha}", get(cash_closing::get_by_date))
        .route("/admin/reportes/diario", get(report::daily))
        .route("/admin/reportes/mensual", get(report::monthly))
        .route("/admin/reportes/rango", get(report::range))
        .route_layer(from_fn(require_staff))
        .route_layer(from_fn_with_state(state.clone(), require_auth));

    let admin = Router::new()
        .route("/admin/productos", post(product::create))
        .route(
            "/admin/productos/{id}",
            put(product::update).delete(product::delete),
        )
        .route_layer(from_fn(require_admin))
        .route_layer(from_fn_with_state(state, require_auth));

    Router::new()
        .merge(public)
        .merge(customer)
        .merge(staff)
        .merge(admin)
}

/// Body of plain acknowledgement responses.
#[derive(Debug, serde::Serialize)]
pub struct Message {
    pub mensaje: String,
}

impl Message {
    pub fn new(text: impl Into<String>) -> Self {
        Message {
            mensaje: text.into(),
        }
    }
}
