//! # Carnicería API
//!
//! JSON HTTP server for the butcher-shop backend.
//!
//! ## Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                           API Routes                                    │
//! │                                                                         │
//! │  ┌────────────────┐  ┌────────────────┐  ┌────────────────────────────┐│
//! │  │  Public        │  │  Logged in     │  │  Staff (empleado, admin)   ││
//! │  │                │  │                │  │                            ││
//! │  │ • /productos   │  │ • POST /pedidos│  │ • /pedidos/historial       ││
//! │  │ • /clientes/*  │  │ • /pedidos/{id}│  │ • /admin/pedidos           ││
//! │  │ • /health      │  │                │  │ • /admin/cierre(s)         ││
//! │  └────────────────┘  └────────────────┘  │ • /admin/reportes/*        ││
//! │                                          └────────────────────────────┘│
//! │  ┌────────────────┐                                                    │
//! │  │  Admin         │                                                    │
//! │  │ • /admin/      │                                                    │
//! │  │   productos    │                                                    │
//! │  └────────────────┘                                                    │
//! │                                                                         │
//! │  ┌──────────────────────────────────────────────────────────────────┐  │
//! │  │  Infrastructure: SQLite pool · JWT auth · tracing · CORS          │  │
//! │  └──────────────────────────────────────────────────────────────────┘  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration
//! Environment variables:
//! - `HTTP_HOST` / `HTTP_PORT` - Listen address (default: 127.0.0.1:5000)
//! - `DB_PATH` - SQLite file (default: carniceria_db.sqlite)
//! - `DB_MAX_CONNECTIONS` - Pool size (default: 5)
//! - `JWT_SECRET` - Secret for JWT signing
//! - `JWT_LIFETIME_SECS` - Token lifetime (default: 43200)
//! - `HISTORY_LIMIT` / `CLOSINGS_LIMIT` - Listing caps (default: 1000 / 100)

pub mod auth;
pub mod config;
pub mod error;
pub mod routes;

use std::sync::Arc;

use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

// Re-exports
pub use auth::{CurrentUser, JwtManager};
pub use config::ApiConfig;
pub use error::{ApiError, ApiResult};

use carniceria_db::Database;

/// Shared application state.
#[derive(Debug)]
pub struct AppState {
    pub db: Database,
    pub jwt: JwtManager,
    pub config: ApiConfig,
}

impl AppState {
    pub fn new(db: Database, config: ApiConfig) -> Arc<Self> {
        let jwt = JwtManager::new(config.jwt_secret.clone(), config.jwt_lifetime_secs);
        Arc::new(AppState { db, jwt, config })
    }
}

/// Builds the full application: every route, auth layers, CORS and request
/// tracing.
///
/// Used by the server binary and by in-process tests.
pub fn build_app(state: Arc<AppState>) -> Router {
    routes::build_router(state.clone())
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
