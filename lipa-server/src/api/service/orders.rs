use axum::{Json, extract::State};
use kanau::processor::Processor;
use lipa_core::entities::orders::GetOrderById;
use lipa_sdk::objects::checkout::{GetOrderRequest, OrderResponse};

use crate::api::extractors::SignedBody;
use crate::state::AppState;

use super::ServiceApiError;

/// `POST /orders/status` — get the status of an existing order.
pub async fn get_order_status(
    State(state): State<AppState>,
    SignedBody(payload): SignedBody<GetOrderRequest>,
) -> Result<Json<OrderResponse>, ServiceApiError> {
    let order = state
        .db
        .process(GetOrderById {
            order_id: payload.order_id,
        })
        .await
        .map_err(ServiceApiError::Database)?
        .ok_or(ServiceApiError::NotFound("order not found"))?;

    Ok(Json(order.into()))
}
