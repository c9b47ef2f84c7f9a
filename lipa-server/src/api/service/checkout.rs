use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use kanau::processor::Processor;
use lipa_sdk::objects::checkout::CheckoutRequest;

use crate::api::extractors::SignedBody;
use crate::state::AppState;

use super::ServiceApiError;

/// `POST /checkout` — validate the cart, take payment and store the orders.
///
/// An empty cart is rejected before any payment method is touched.
pub async fn checkout(
    State(state): State<AppState>,
    SignedBody(payload): SignedBody<CheckoutRequest>,
) -> Result<impl IntoResponse, ServiceApiError> {
    let response = state.payments.process(payload).await?;
    Ok((StatusCode::CREATED, Json(response)))
}
