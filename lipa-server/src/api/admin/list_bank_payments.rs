use axum::{
    Json,
    extract::{Query, State},
};
use kanau::processor::Processor;
use lipa_core::entities::bank_payments::ListBankPayments;
use lipa_sdk::objects::admin::{BankPaymentResponse, ListBankPaymentsQuery, Paginated};

use crate::api::extractors::AdminAuth;
use crate::state::AppState;

use super::{AdminApiError, page};

/// `GET /bank-payments` — list bank transfers, newest first.
pub async fn list_bank_payments(
    State(state): State<AppState>,
    _auth: AdminAuth,
    Query(query): Query<ListBankPaymentsQuery>,
) -> Result<Json<Paginated<BankPaymentResponse>>, AdminApiError> {
    let page = page(query.page, query.page_size);

    let (records, total) = state
        .db
        .process(ListBankPayments {
            status: query.status.map(Into::into),
            limit: page.limit,
            offset: page.offset,
        })
        .await
        .map_err(AdminApiError::Database)?;

    Ok(Json(Paginated {
        items: records.into_iter().map(Into::into).collect(),
        page: page.page,
        page_size: page.page_size,
        total,
    }))
}
