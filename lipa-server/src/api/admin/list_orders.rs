use axum::{
    Json,
    extract::{Query, State},
};
use kanau::processor::Processor;
use lipa_core::entities::orders::ListOrders;
use lipa_sdk::objects::admin::{AdminOrderResponse, ListOrdersQuery, Paginated};

use crate::api::extractors::AdminAuth;
use crate::state::AppState;

use super::{AdminApiError, page};

/// `GET /orders` — list orders with pagination and an optional status filter.
pub async fn list_orders(
    State(state): State<AppState>,
    _auth: AdminAuth,
    Query(query): Query<ListOrdersQuery>,
) -> Result<Json<Paginated<AdminOrderResponse>>, AdminApiError> {
    let page = page(query.page, query.page_size);

    let (records, total) = state
        .db
        .process(ListOrders {
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
