//! Liveness endpoint.

use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use serde::Serialize;

use crate::AppState;

#[derive(Debug, Serialize)]
pub struct Health {
    pub status: &'static str,
    pub database: &'static str,
}

/// `GET /health`: always 200; `database` reports whether a query succeeds.
pub async fn check(State(state): State<Arc<AppState>>) -> Json<Health> {
    let database = if state.db.health_check().await {
        "ok"
    } else {
        "unavailable"
    };

    Json(Health {
        status: "ok",
        database,
    })
}
