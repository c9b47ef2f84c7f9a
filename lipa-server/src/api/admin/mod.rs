//! Admin API handlers.
//!
//! These endpoints are called by the staff dashboard and require the
//! `Lipa-Admin-Authorization` header with the plaintext admin secret.
//!
//! # Endpoints
//!
//! - `GET  /orders`                            – list orders (paginated, filterable)
//! - `POST /orders/{order_id}/status`          – set an order's status
//! - `POST /orders/{order_id}/approve-top-up`  – credit a manual top-up
//! - `GET  /bank-payments`                     – list bank transfers (paginated, filterable)
//! - `POST /bank-payments/{id}/confirm`        – confirm a bank transfer
//! - `GET  /wallets/{user_id}`                 – wallet balance and recent ledger rows

use axum::{
    Router,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use lipa_core::processors::StaffActionError;

use crate::state::AppState;

mod approve_top_up;
mod confirm_bank_payment;
mod list_bank_payments;
mod list_orders;
mod show_wallet;
mod update_order_status;

/// Build the Admin API router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/orders", get(list_orders::list_orders))
        .route(
            "/orders/{order_id}/status",
            post(update_order_status::update_order_status),
        )
        .route(
            "/orders/{order_id}/approve-top-up",
            post(approve_top_up::approve_top_up),
        )
        .route(
            "/bank-payments",
            get(list_bank_payments::list_bank_payments),
        )
        .route(
            "/bank-payments/{bank_payment_id}/confirm",
            post(confirm_bank_payment::confirm_bank_payment),
        )
        .route("/wallets/{user_id}", get(show_wallet::show_wallet))
}

// ---------------------------------------------------------------------------
// Shared error type
// ---------------------------------------------------------------------------

/// Errors that can occur in Admin API handlers.
#[derive(Debug)]
pub(crate) enum AdminApiError {
    Database(sqlx::Error),
    NotFound(&'static str),
    StaffAction(StaffActionError),
}

impl From<StaffActionError> for AdminApiError {
    fn from(err: StaffActionError) -> Self {
        match err {
            StaffActionError::Database(e) => AdminApiError::Database(e),
            other => AdminApiError::StaffAction(other),
        }
    }
}

impl IntoResponse for AdminApiError {
    fn into_response(self) -> axum::response::Response {
        match self {
            AdminApiError::Database(e) => {
                tracing::error!(error = %e, "Admin API database error");
                (StatusCode::INTERNAL_SERVER_ERROR, "internal server error").into_response()
            }
            AdminApiError::NotFound(what) => (StatusCode::NOT_FOUND, what).into_response(),
            AdminApiError::StaffAction(e) => {
                let status = match e {
                    StaffActionError::OrderNotFound | StaffActionError::BankPaymentNotFound => {
                        StatusCode::NOT_FOUND
                    }
                    StaffActionError::NotPending | StaffActionError::AlreadyApproved => {
                        StatusCode::CONFLICT
                    }
                    _ => StatusCode::BAD_REQUEST,
                };
                (status, e.to_string()).into_response()
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Pagination
// ---------------------------------------------------------------------------

const DEFAULT_PAGE_SIZE: u32 = 20;
const MAX_PAGE_SIZE: u32 = 100;

/// A 1-based page and its SQL bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Page {
    pub page: u32,
    pub page_size: u32,
    pub limit: i64,
    pub offset: i64,
}

pub(crate) fn page(page: Option<u32>, page_size: Option<u32>) -> Page {
    let page = page.unwrap_or(1).max(1);
    let page_size = page_size
        .unwrap_or(DEFAULT_PAGE_SIZE)
        .clamp(1, MAX_PAGE_SIZE);
    Page {
        page,
        page_size,
        limit: i64::from(page_size),
        offset: i64::from(page - 1) * i64::from(page_size),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::test_support::body_text;
    use crate::server::build_router;
    use crate::state::test_support::{ADMIN_SECRET, state};
    use axum::{body::Body, http::Request};
    use lipa_sdk::signature::ADMIN_AUTH_HEADER;
    use tower::ServiceExt;

    #[test]
    fn test_page_bounds() {
        assert_eq!(
            page(None, None),
            Page {
                page: 1,
                page_size: 20,
                limit: 20,
                offset: 0
            }
        );
        assert_eq!(page(Some(0), Some(0)).page, 1);
        assert_eq!(page(Some(0), Some(0)).page_size, 1);
        assert_eq!(page(Some(3), Some(500)).limit, 100);
        assert_eq!(page(Some(3), Some(25)).offset, 50);
    }

    #[tokio::test]
    async fn test_missing_admin_header_is_unauthorized() {
        let response = build_router(state())
            .oneshot(Request::get("/api/v1/admin/orders").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            body_text(response).await,
            "missing Lipa-Admin-Authorization header"
        );
    }

    #[tokio::test]
    async fn test_wrong_admin_secret_is_unauthorized() {
        let response = build_router(state())
            .oneshot(
                Request::get("/api/v1/admin/orders")
                    .header(ADMIN_AUTH_HEADER, "guess")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(body_text(response).await, "invalid admin secret");
    }

    #[tokio::test]
    async fn test_correct_admin_secret_reaches_the_handler() {
        // The handler runs and fails on the unreachable database.
        let response = build_router(state())
            .oneshot(
                Request::get("/api/v1/admin/orders?status=pending&page=2")
                    .header(ADMIN_AUTH_HEADER, ADMIN_SECRET)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_staff_action_statuses() {
        let cases = [
            (StaffActionError::OrderNotFound, StatusCode::NOT_FOUND),
            (StaffActionError::AlreadyApproved, StatusCode::CONFLICT),
            (StaffActionError::NotPending, StatusCode::CONFLICT),
            (StaffActionError::NotATopUp, StatusCode::BAD_REQUEST),
            (StaffActionError::InvalidAmount, StatusCode::BAD_REQUEST),
        ];
        for (error, status) in cases {
            assert_eq!(AdminApiError::from(error).into_response().status(), status);
        }
    }
}
