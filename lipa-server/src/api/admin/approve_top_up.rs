use axum::{
    Json,
    extract::{Path, State},
};
use kanau::processor::Processor;
use lipa_core::processors::ApproveTopUp;
use lipa_sdk::objects::admin::{AdminOrderResponse, ApproveTopUpRequest};
use uuid::Uuid;

use crate::api::extractors::AdminAuth;
use crate::state::AppState;

use super::AdminApiError;

/// `POST /orders/{order_id}/approve-top-up` — credit a pending manual
/// top-up with the amount seen on the till statement.
pub async fn approve_top_up(
    State(state): State<AppState>,
    _auth: AdminAuth,
    Path(order_id): Path<Uuid>,
    Json(request): Json<ApproveTopUpRequest>,
) -> Result<Json<AdminOrderResponse>, AdminApiError> {
    let approved = state
        .db
        .process(ApproveTopUp {
            order_id,
            amount: request.amount,
        })
        .await?;

    Ok(Json(approved.order.into()))
}
