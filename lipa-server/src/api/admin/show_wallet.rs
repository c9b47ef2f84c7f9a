use axum::{
    Json,
    extract::{Path, State},
};
use kanau::processor::Processor;
use lipa_core::entities::transactions::ListRecentTransactions;
use lipa_core::entities::wallets::GetWallet;
use lipa_sdk::objects::admin::AdminWalletResponse;
use uuid::Uuid;

use crate::api::extractors::AdminAuth;
use crate::state::AppState;

use super::AdminApiError;

const RECENT_TRANSACTIONS: i64 = 20;

/// `GET /wallets/{user_id}` — wallet balance and the latest ledger rows.
pub async fn show_wallet(
    State(state): State<AppState>,
    _auth: AdminAuth,
    Path(user_id): Path<Uuid>,
) -> Result<Json<AdminWalletResponse>, AdminApiError> {
    let wallet = state
        .db
        .process(GetWallet { user_id })
        .await
        .map_err(AdminApiError::Database)?
        .ok_or(AdminApiError::NotFound("wallet not found"))?;

    let transactions = state
        .db
        .process(ListRecentTransactions {
            user_id,
            limit: RECENT_TRANSACTIONS,
        })
        .await
        .map_err(AdminApiError::Database)?;

    Ok(Json(AdminWalletResponse {
        user_id: wallet.user_id,
        balance: wallet.balance,
        has_pin: wallet.has_pin(),
        recent_transactions: transactions.into_iter().map(Into::into).collect(),
    }))
}
