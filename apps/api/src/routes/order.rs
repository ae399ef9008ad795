//! Order Ledger endpoints.

use std::sync::Arc;

use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::{Extension, Json};
use tracing::info;

use super::Message;
use crate::auth::CurrentUser;
use crate::error::ApiResult;
use crate::AppState;
use carniceria_core::{Order, OrderDraft, OrderPatch, OrderReceipt};

/// `POST /pedidos`
///
/// A `cliente` may only order for itself; staff may order for anyone.
pub async fn create(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
    body: Result<Json<OrderDraft>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<OrderReceipt>)> {
    let Json(draft) = body?;
    let order = draft.validate()?;
    user.ensure_can_act_for(order.customer_id)?;

    let receipt = state.db.orders().create(&order).await?;
    info!(
        order_id = receipt.order_id,
        customer_id = order.customer_id,
        placed_by = user.id,
        "Order placed"
    );

    Ok((StatusCode::CREATED, Json(receipt)))
}

/// `GET /pedidos/{customer_id}`: owner or staff.
pub async fn list_for_customer(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
    customer_id: Result<Path<i64>, PathRejection>,
) -> ApiResult<Json<Vec<Order>>> {
    let Path(customer_id) = customer_id?;
    user.ensure_can_act_for(customer_id)?;

    Ok(Json(state.db.orders().list_for_customer(customer_id).await?))
}

/// `GET /admin/pedidos`
pub async fn list_all(State(state): State<Arc<AppState>>) -> ApiResult<Json<Vec<Order>>> {
    Ok(Json(state.db.orders().list_all().await?))
}

/// `GET /pedidos/historial`
pub async fn history(State(state): State<Arc<AppState>>) -> ApiResult<Json<Vec<Order>>> {
    let limit = state.config.history_limit;
    Ok(Json(state.db.orders().list_history(limit).await?))
}

/// `PUT /admin/pedidos/{id}`
///
/// `editado_por` defaults to the acting staff member.
pub async fn update(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
    id: Result<Path<i64>, PathRejection>,
    body: Result<Json<OrderPatch>, JsonRejection>,
) -> ApiResult<Json<Order>> {
    let Path(id) = id?;
    let Json(patch) = body?;
    let mut update = patch.validate()?;
    update.edited_by = update.edited_by.or(Some(user.id));

    let order = state.db.orders().update(id, &update).await?;
    info!(
        order_id = id,
        edited_by = ?update.edited_by,
        status = order.status.as_str(),
        total = %order.total,
        "Order edited"
    );

    Ok(Json(order))
}

/// `DELETE /admin/pedidos/{id}`: cancels, never deletes.
pub async fn cancel(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
    id: Result<Path<i64>, PathRejection>,
) -> ApiResult<Json<Message>> {
    let Path(id) = id?;
    state.db.orders().cancel(id).await?;
    info!(order_id = id, cancelled_by = user.id, "Order cancelled");

    Ok(Json(Message::new("Order cancelled")))
}
