use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use kanau::processor::Processor;
use lipa_core::entities::orders::OrderRecord;
use lipa_core::entities::wallets::{GetWallet, SetWalletPin, WalletRecord};
use lipa_core::wallet::{WalletError, hash_pin, validate_new_pin};
use lipa_sdk::objects::checkout::OrderResponse;
use lipa_sdk::objects::wallet::{
    ManualTopUpRequest, SetPinRequest, StkTopUpRequest, StkTopUpResponse, WalletQuery,
    WalletResponse,
};

use crate::api::extractors::SignedBody;
use crate::state::AppState;

use super::ServiceApiError;

async fn to_response(state: &AppState, wallet: WalletRecord) -> WalletResponse {
    WalletResponse {
        user_id: wallet.user_id,
        balance: wallet.balance,
        has_pin: wallet.has_pin(),
        till_number: state.config.mpesa.read().await.till_number.clone(),
    }
}

/// `POST /wallet` — balance and whether a PIN is set.
pub async fn get_wallet(
    State(state): State<AppState>,
    SignedBody(payload): SignedBody<WalletQuery>,
) -> Result<Json<WalletResponse>, ServiceApiError> {
    let wallet = state
        .db
        .process(GetWallet {
            user_id: payload.user_id,
        })
        .await
        .map_err(ServiceApiError::Database)?
        .ok_or(WalletError::NotFound)?;

    Ok(Json(to_response(&state, wallet).await))
}

/// `POST /wallet/pin` — set or replace the wallet PIN, creating the wallet
/// if needed.
pub async fn set_pin(
    State(state): State<AppState>,
    SignedBody(payload): SignedBody<SetPinRequest>,
) -> Result<Json<WalletResponse>, ServiceApiError> {
    validate_new_pin(&payload.pin, &payload.confirm_pin)?;
    let pin_hash = hash_pin(&payload.pin)?;

    let wallet = state
        .db
        .process(SetWalletPin {
            user_id: payload.user_id,
            pin_hash,
        })
        .await
        .map_err(ServiceApiError::Database)?;
    tracing::info!(user_id = %wallet.user_id, "Wallet PIN set");

    Ok(Json(to_response(&state, wallet).await))
}

/// `POST /wallet/top-up/stk` — top up by push prompt. The wallet is
/// credited when the gateway confirms the payment.
pub async fn stk_top_up(
    State(state): State<AppState>,
    SignedBody(payload): SignedBody<StkTopUpRequest>,
) -> Result<Json<StkTopUpResponse>, ServiceApiError> {
    Ok(Json(state.payments.process(payload).await?))
}

/// `POST /wallet/top-up/manual` — record a till payment for staff review.
pub async fn manual_top_up(
    State(state): State<AppState>,
    SignedBody(payload): SignedBody<ManualTopUpRequest>,
) -> Result<impl IntoResponse, ServiceApiError> {
    let order: OrderRecord = state.db.process(payload).await?;
    Ok((StatusCode::CREATED, Json(OrderResponse::from(order))))
}
