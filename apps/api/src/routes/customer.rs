//! Customer Directory endpoints: registration and login.

use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::Serialize;
use serde_json::{json, Value};
use tracing::{info, warn};

use crate::auth::{hash_password, verify_password};
use crate::error::{ApiError, ApiResult};
use crate::AppState;
use carniceria_core::{Customer, CustomerDraft, LoginRequest};
use carniceria_db::DbError;

/// Successful login.
#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub cliente: Customer,
    pub token: String,
}

/// `POST /clientes/registro`
///
/// Always creates a `cliente`. A duplicate email surfaces from the UNIQUE
/// constraint as 409.
pub async fn register(
    State(state): State<Arc<AppState>>,
    body: Result<Json<CustomerDraft>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Value>)> {
    let Json(draft) = body?;
    let customer = draft.validate()?;

    let password_hash = customer.password.as_deref().map(hash_password).transpose()?;

    let id = state
        .db
        .customers()
        .register(&customer, password_hash.as_deref())
        .await?;
    info!(customer_id = id, email = %customer.email, "Customer registered");

    Ok((StatusCode::CREATED, Json(json!({ "cliente_id": id }))))
}

/// `POST /clientes/login`
///
/// Accounts without a stored hash log in by email alone.
pub async fn login(
    State(state): State<Arc<AppState>>,
    body: Result<Json<LoginRequest>, JsonRejection>,
) -> ApiResult<Json<LoginResponse>> {
    let Json(request) = body?;
    let email = request.email()?;

    let credentials = match state.db.customers().find_for_login(&email).await {
        Ok(credentials) => credentials,
        Err(DbError::NotFound { .. }) => {
            return Err(ApiError::NotFound("Customer not found".to_string()));
        }
        Err(e) => return Err(e.into()),
    };

    if let Some(hash) = credentials.password_hash.as_deref() {
        let supplied = request.password.as_deref().unwrap_or_default();
        if !verify_password(supplied, hash) {
            warn!(customer_id = credentials.customer.id, "Login with wrong password");
            return Err(ApiError::invalid_credentials());
        }
    }

    let customer = credentials.customer;
    let token = state.jwt.generate_token(&customer)?;
    info!(customer_id = customer.id, role = customer.role.as_str(), "Login");

    Ok(Json(LoginResponse {
        cliente: customer,
        token,
    }))
}
