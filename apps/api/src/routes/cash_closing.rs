//! Cash Closing Ledger endpoints.

use std::sync::Arc;

use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use tracing::info;

use crate::error::ApiResult;
use crate::AppState;
use carniceria_core::validation::parse_date;
use carniceria_core::{CashClosing, ClosingDraft, ClosingReceipt};

/// `POST /admin/cierre-caja`
///
/// 409 when the date is already closed.
pub async fn create(
    State(state): State<Arc<AppState>>,
    body: Result<Json<ClosingDraft>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<ClosingReceipt>)> {
    let Json(draft) = body?;
    let closing = draft.validate()?;

    let receipt = state.db.cash_closings().create(&closing).await?;
    info!(
        date = %closing.date,
        user_id = closing.user_id,
        "Day closed"
    );

    Ok((StatusCode::CREATED, Json(receipt)))
}

/// `GET /admin/cierres`
pub async fn list(State(state): State<Arc<AppState>>) -> ApiResult<Json<Vec<CashClosing>>> {
    let limit = state.config.closings_limit;
    Ok(Json(state.db.cash_closings().list(limit).await?))
}

/// `GET /admin/cierres/{fecha}`
pub async fn get_by_date(
    State(state): State<Arc<AppState>>,
    fecha: Result<Path<String>, PathRejection>,
) -> ApiResult<Json<CashClosing>> {
    let Path(fecha) = fecha?;
    let date = parse_date("fecha", &fecha)?;
    Ok(Json(state.db.cash_closings().get_by_date(date).await?))
}
