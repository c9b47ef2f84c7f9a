use axum::{
    Json,
    extract::{Path, State},
};
use kanau::processor::Processor;
use lipa_core::processors::ConfirmBankPayment;
use lipa_sdk::objects::admin::BankPaymentResponse;
use uuid::Uuid;

use crate::api::extractors::AdminAuth;
use crate::state::AppState;

use super::AdminApiError;

/// `POST /bank-payments/{bank_payment_id}/confirm` — mark the transfer
/// received and release what it paid for.
pub async fn confirm_bank_payment(
    State(state): State<AppState>,
    _auth: AdminAuth,
    Path(bank_payment_id): Path<Uuid>,
) -> Result<Json<BankPaymentResponse>, AdminApiError> {
    let payment = state
        .db
        .process(ConfirmBankPayment { bank_payment_id })
        .await?;

    Ok(Json(payment.into()))
}
