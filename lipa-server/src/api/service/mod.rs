//! Service API handlers.
//!
//! These endpoints are called by the storefront backend and require
//! a signed body verified via the `Lipa-Signature` header.
//!
//! # Endpoints
//!
//! - `POST /checkout`                – pay for a cart
//! - `POST /rides`                   – book and pay for a ride
//! - `POST /rides/status`            – get a ride
//! - `POST /orders/status`           – get an order
//! - `POST /wallet`                  – wallet balance and PIN state
//! - `POST /wallet/pin`              – set the wallet PIN
//! - `POST /wallet/top-up/stk`       – top up by push prompt
//! - `POST /wallet/top-up/manual`    – submit a till confirmation code

use axum::{Router, http::StatusCode, response::IntoResponse, routing::post};
use lipa_core::checkout::CheckoutError;
use lipa_core::wallet::WalletError;

use crate::state::AppState;

mod checkout;
mod orders;
mod rides;
mod wallet;

/// Build the Service API router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/checkout", post(checkout::checkout))
        .route("/rides", post(rides::book_ride))
        .route("/rides/status", post(rides::get_ride_status))
        .route("/orders/status", post(orders::get_order_status))
        .route("/wallet", post(wallet::get_wallet))
        .route("/wallet/pin", post(wallet::set_pin))
        .route("/wallet/top-up/stk", post(wallet::stk_top_up))
        .route("/wallet/top-up/manual", post(wallet::manual_top_up))
}

/// Errors that can occur in Service API handlers.
#[derive(Debug)]
pub(crate) enum ServiceApiError {
    Checkout(CheckoutError),
    Wallet(WalletError),
    Database(sqlx::Error),
    NotFound(&'static str),
}

impl From<CheckoutError> for ServiceApiError {
    fn from(err: CheckoutError) -> Self {
        match err {
            CheckoutError::Wallet(e) => ServiceApiError::Wallet(e),
            CheckoutError::Database(e) => ServiceApiError::Database(e),
            other => ServiceApiError::Checkout(other),
        }
    }
}

impl From<WalletError> for ServiceApiError {
    fn from(err: WalletError) -> Self {
        match err {
            WalletError::Database(e) => ServiceApiError::Database(e),
            other => ServiceApiError::Wallet(other),
        }
    }
}

impl IntoResponse for ServiceApiError {
    fn into_response(self) -> axum::response::Response {
        match self {
            ServiceApiError::Database(e) => {
                tracing::error!(error = %e, "Service API database error");
                (StatusCode::INTERNAL_SERVER_ERROR, "internal server error").into_response()
            }
            ServiceApiError::NotFound(what) => (StatusCode::NOT_FOUND, what).into_response(),
            ServiceApiError::Wallet(e) => {
                let status = match e {
                    WalletError::NotFound => StatusCode::NOT_FOUND,
                    WalletError::Hash(_) | WalletError::Database(_) => {
                        tracing::error!(error = %e, "Service API wallet error");
                        return (StatusCode::INTERNAL_SERVER_ERROR, "internal server error")
                            .into_response();
                    }
                    _ => StatusCode::BAD_REQUEST,
                };
                (status, e.to_string()).into_response()
            }
            ServiceApiError::Checkout(e) => {
                let status = match e {
                    CheckoutError::Gateway(_) | CheckoutError::PushNotAccepted(_) => {
                        tracing::error!(error = %e, "Payment gateway call failed");
                        return (StatusCode::BAD_GATEWAY, "payment gateway error").into_response();
                    }
                    CheckoutError::DuplicateConfirmationCode => StatusCode::CONFLICT,
                    _ => StatusCode::BAD_REQUEST,
                };
                (status, e.to_string()).into_response()
            }
        }
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use crate::state::test_support::MERCHANT_SECRET;
    use axum::{body::Body, http::Request};
    use lipa_sdk::signature::{SIGNATURE_HEADER, Signature, SignedObject};

    /// A request signed the way the SDK client signs it.
    pub fn signed<T: Signature>(uri: &str, body: T) -> Request<Body> {
        let signed = SignedObject::new(body, MERCHANT_SECRET).unwrap();
        Request::post(uri)
            .header(SIGNATURE_HEADER, signed.to_header())
            .header("content-type", "application/json")
            .body(Body::from(signed.json))
            .unwrap()
    }
}
