//! Catalog endpoints.

use std::sync::Arc;

use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde_json::{json, Value};
use tracing::info;

use super::Message;
use crate::error::ApiResult;
use crate::AppState;
use carniceria_core::{Product, ProductDraft, ProductPatch};

/// `GET /productos`
pub async fn list(State(state): State<Arc<AppState>>) -> ApiResult<Json<Vec<Product>>> {
    Ok(Json(state.db.products().list().await?))
}

/// `GET /productos/{id}`
pub async fn get(
    State(state): State<Arc<AppState>>,
    id: Result<Path<i64>, PathRejection>,
) -> ApiResult<Json<Product>> {
    let Path(id) = id?;
    Ok(Json(state.db.products().get(id).await?))
}

/// `POST /admin/productos`
pub async fn create(
    State(state): State<Arc<AppState>>,
    body: Result<Json<ProductDraft>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Value>)> {
    let Json(draft) = body?;
    let product = draft.validate()?;

    let id = state.db.products().create(&product).await?;
    info!(product_id = id, name = %product.name, "Product created");

    Ok((StatusCode::CREATED, Json(json!({ "producto_id": id }))))
}

/// `PUT /admin/productos/{id}`: only the supplied fields change.
pub async fn update(
    State(state): State<Arc<AppState>>,
    id: Result<Path<i64>, PathRejection>,
    body: Result<Json<ProductPatch>, JsonRejection>,
) -> ApiResult<Json<Product>> {
    let Path(id) = id?;
    let Json(patch) = body?;
    let patch = patch.validate()?;

    let product = state.db.products().update(id, &patch).await?;
    info!(product_id = id, "Product updated");

    Ok(Json(product))
}

/// `DELETE /admin/productos/{id}`
pub async fn delete(
    State(state): State<Arc<AppState>>,
    id: Result<Path<i64>, PathRejection>,
) -> ApiResult<Json<Message>> {
    let Path(id) = id?;
    state.db.products().delete(id).await?;
    info!(product_id = id, "Product deleted");

    Ok(Json(Message::new("Product deleted")))
}
