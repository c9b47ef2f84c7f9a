use axum::{
    Json,
    extract::{Path, State},
};
use kanau::processor::Processor;
use lipa_core::entities::orders::UpdateOrderStatus;
use lipa_sdk::objects::admin::{AdminOrderResponse, UpdateOrderStatusRequest};
use uuid::Uuid;

use crate::api::extractors::AdminAuth;
use crate::state::AppState;

use super::AdminApiError;

/// `POST /orders/{order_id}/status` — set any status on an order.
///
/// This is a staff override; no wallet or ledger rows change.
pub async fn update_order_status(
    State(state): State<AppState>,
    _auth: AdminAuth,
    Path(order_id): Path<Uuid>,
    Json(request): Json<UpdateOrderStatusRequest>,
) -> Result<Json<AdminOrderResponse>, AdminApiError> {
    let order = state
        .db
        .process(UpdateOrderStatus {
            order_id,
            status: request.status.into(),
        })
        .await
        .map_err(AdminApiError::Database)?
        .ok_or(AdminApiError::NotFound("order not found"))?;

    tracing::info!(order_id = %order.id, status = %request.status, "Order status set by staff");
    Ok(Json(order.into()))
}
