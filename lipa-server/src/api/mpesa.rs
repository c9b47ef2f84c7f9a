//! M-Pesa API handlers.
//!
//! These endpoints are unauthenticated: the storefront calls `stk-push`
//! directly and the gateway posts payment outcomes to `callback`.
//!
//! # Endpoints
//!
//! - `POST /stk-push` – push a payment prompt, relay the gateway JSON
//! - `POST /callback` – reconcile a payment outcome

use axum::{
    Json, Router,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
    response::IntoResponse,
    routing::post,
};
use kanau::processor::Processor;
use lipa_core::entities::StkPurpose;
use lipa_core::entities::stk_requests::{InsertStkRequest, NewStkRequest};
use lipa_core::mpesa::{CallbackError, CallbackOutcome, GatewayError, Msisdn, whole_shillings};
use lipa_core::processors::{ReconcileError, Reconciliation};
use lipa_sdk::objects::mpesa::{CallbackEnvelope, StkPushRequest};
use lipa_sdk::objects::{ErrorResponse, MessageResponse};
use rust_decimal::Decimal;
use serde_json::Value;

use crate::state::AppState;

/// Build the M-Pesa router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/stk-push", post(stk_push))
        .route("/callback", post(callback))
}

/// `POST /stk-push` — push a prompt to `phone` for `amount` shillings.
///
/// The gateway JSON is returned verbatim. An accepted prompt is recorded as
/// an anonymous top-up so its callback can be reconciled; failing to record
/// it does not fail the request.
pub async fn stk_push(
    State(state): State<AppState>,
    payload: Result<Json<StkPushRequest>, JsonRejection>,
) -> Result<impl IntoResponse, StkPushError> {
    let Json(request) = payload.map_err(|e| StkPushError::BadRequest(e.body_text()))?;
    let phone = Msisdn::parse(&request.phone).map_err(|e| StkPushError::BadRequest(e.to_string()))?;
    let amount = whole_shillings(request.amount).map_err(|e| StkPushError::BadRequest(e.to_string()))?;

    let push = state.payments.gateway.stk_push(&phone, amount).await?;

    if let Some(checkout_request_id) = push.ack.checkout_request_id.clone() {
        let record = NewStkRequest {
            checkout_request_id,
            merchant_request_id: push.ack.merchant_request_id.clone(),
            user_id: None,
            phone: phone.to_string(),
            amount: Decimal::from(amount),
            purpose: StkPurpose::WalletTopUp,
        };
        if let Err(e) = state.db.process(InsertStkRequest(record)).await {
            tracing::warn!(error = %e, "Failed to record STK request");
        }
    }

    Ok(Json(push.raw))
}

/// Errors of `POST /stk-push`, answered as `{ error }`.
#[derive(Debug)]
pub enum StkPushError {
    BadRequest(String),
    Gateway(GatewayError),
}

impl From<GatewayError> for StkPushError {
    fn from(err: GatewayError) -> Self {
        StkPushError::Gateway(err)
    }
}

impl IntoResponse for StkPushError {
    fn into_response(self) -> axum::response::Response {
        match self {
            StkPushError::BadRequest(message) => (
                StatusCode::BAD_REQUEST,
                Json(ErrorResponse {
                    error: Value::String(message),
                }),
            )
                .into_response(),
            StkPushError::Gateway(e) => {
                tracing::error!(error = %e, "STK push failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(ErrorResponse {
                        error: e.relay_body(),
                    }),
                )
                    .into_response()
            }
        }
    }
}

/// `POST /callback` — apply the gateway's verdict on a push prompt.
///
/// Any 5xx answer lets the gateway redeliver; redelivery of an applied
/// payment is answered 200 without further effect.
pub async fn callback(
    State(state): State<AppState>,
    payload: Result<Json<CallbackEnvelope>, JsonRejection>,
) -> Result<Json<MessageResponse>, CallbackApiError> {
    let Json(envelope) = payload.map_err(|e| {
        tracing::warn!(error = %e, "Rejected malformed callback");
        CallbackApiError::InvalidPayload
    })?;
    let outcome = CallbackOutcome::from_callback(envelope.body.stk_callback)?;

    let message = match state.db.process(outcome).await? {
        Reconciliation::Failed { .. } => "Payment was not successful",
        Reconciliation::Duplicate => "Transaction already processed, skipping.",
        Reconciliation::OrdersPaid { .. } => "Order payment processed successfully",
        Reconciliation::RidePaid { .. } => "Ride payment processed successfully",
        Reconciliation::WalletCredited { .. } => "Wallet updated successfully",
        Reconciliation::Underpaid { .. } => "Partial payment credited to wallet",
    };
    Ok(Json(MessageResponse::new(message)))
}

/// Errors of `POST /callback`, answered as `{ message }`.
#[derive(Debug)]
pub enum CallbackApiError {
    InvalidPayload,
    Metadata(CallbackError),
    Reconcile(ReconcileError),
}

impl From<CallbackError> for CallbackApiError {
    fn from(err: CallbackError) -> Self {
        CallbackApiError::Metadata(err)
    }
}

impl From<ReconcileError> for CallbackApiError {
    fn from(err: ReconcileError) -> Self {
        CallbackApiError::Reconcile(err)
    }
}

impl IntoResponse for CallbackApiError {
    fn into_response(self) -> axum::response::Response {
        let (status, message) = match self {
            CallbackApiError::InvalidPayload => {
                (StatusCode::BAD_REQUEST, "Invalid callback payload".to_string())
            }
            CallbackApiError::Metadata(e) => {
                tracing::warn!(error = %e, "Rejected callback");
                (StatusCode::BAD_REQUEST, e.to_string())
            }
            CallbackApiError::Reconcile(e @ ReconcileError::UserNotFound { .. }) => {
                tracing::warn!(error = %e, "Callback for an unknown payer");
                (StatusCode::NOT_FOUND, e.to_string())
            }
            CallbackApiError::Reconcile(
                e @ ReconcileError::UnknownCheckoutRequest { .. },
            ) => {
                tracing::warn!(error = ?e, "Callback for an unrecorded checkout request");
                (StatusCode::NOT_FOUND, e.to_string())
            }
            CallbackApiError::Reconcile(ReconcileError::Database(e)) => {
                tracing::error!(error = %e, "Callback reconciliation failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Server error processing callback".to_string(),
                )
            }
        };
        (status, Json(MessageResponse::new(message))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use crate::api::test_support::body_json;
    use crate::server::build_router;
    use crate::state::test_support::{state, state_with_gateway};
    use axum::{
        Json, Router,
        body::Body,
        http::{Request, StatusCode},
        routing::{get, post},
    };
    use serde_json::{Value, json};
    use tower::ServiceExt;
    use url::Url;

    fn post_json(uri: &str, body: Value) -> Request<Body> {
        Request::post(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn spawn_gateway(push_status: StatusCode, push_body: Value) -> Url {
        let router = Router::new()
            .route(
                "/oauth/v1/generate",
                get(|| async { Json(json!({ "access_token": "tok", "expires_in": "3599" })) }),
            )
            .route(
                "/mpesa/stkpush/v1/processrequest",
                post(move || async move { (push_status, Json(push_body)) }),
            );
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        Url::parse(&format!("http://{addr}/")).unwrap()
    }

    #[tokio::test]
    async fn test_stk_push_rejects_invalid_phone() {
        let response = build_router(state())
            .oneshot(post_json(
                "/api/mpesa/stk-push",
                json!({ "phone": "12345", "amount": 10 }),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert!(body["error"].as_str().unwrap().contains("invalid phone number"));
    }

    #[tokio::test]
    async fn test_stk_push_rejects_fractional_amount() {
        let response = build_router(state())
            .oneshot(post_json(
                "/api/mpesa/stk-push",
                json!({ "phone": "0712345678", "amount": "10.5" }),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_stk_push_relays_gateway_json_verbatim() {
        let ack = json!({
            "MerchantRequestID": "29115-34620561-1",
            "CheckoutRequestID": "ws_CO_191220191020363925",
            "ResponseCode": "0",
            "ResponseDescription": "Success. Request accepted for processing",
            "CustomerMessage": "Success. Request accepted for processing",
            "Extra": { "kept": true }
        });
        let gateway = spawn_gateway(StatusCode::OK, ack.clone()).await;

        // Recording the request fails against the unreachable database; the
        // push still succeeds.
        let response = build_router(state_with_gateway(gateway))
            .oneshot(post_json(
                "/api/mpesa/stk-push",
                json!({ "phone": "+254 712 345 678", "amount": 100 }),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await, ack);
    }

    #[tokio::test]
    async fn test_stk_push_relays_gateway_error_body() {
        let rejection = json!({
            "requestId": "1234-5678",
            "errorCode": "400.002.02",
            "errorMessage": "Bad Request - Invalid PhoneNumber"
        });
        let gateway = spawn_gateway(StatusCode::BAD_REQUEST, rejection.clone()).await;

        let response = build_router(state_with_gateway(gateway))
            .oneshot(post_json(
                "/api/mpesa/stk-push",
                json!({ "phone": "0712345678", "amount": 1 }),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body_json(response).await, json!({ "error": rejection }));
    }

    #[tokio::test]
    async fn test_stk_push_unreachable_gateway_is_500() {
        let response = build_router(state())
            .oneshot(post_json(
                "/api/mpesa/stk-push",
                json!({ "phone": "0712345678", "amount": 1 }),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(body_json(response).await["error"].is_string());
    }

    #[tokio::test]
    async fn test_callback_without_metadata_is_400() {
        let callback = json!({
            "Body": { "stkCallback": {
                "MerchantRequestID": "29115-34620561-1",
                "CheckoutRequestID": "ws_CO_191220191020363925",
                "ResultCode": 0,
                "ResultDesc": "The service request is processed successfully."
            }}
        });
        let response = build_router(state())
            .oneshot(post_json("/api/mpesa/callback", callback))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert!(body["message"].as_str().unwrap().contains("Amount"));
    }

    #[tokio::test]
    async fn test_callback_with_malformed_envelope_is_400() {
        let response = build_router(state())
            .oneshot(post_json("/api/mpesa/callback", json!({ "Body": {} })))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            body_json(response).await,
            json!({ "message": "Invalid callback payload" })
        );
    }

    #[tokio::test]
    async fn test_unrecorded_checkout_request_is_404() {
        use super::CallbackApiError;
        use axum::response::IntoResponse;
        use lipa_core::processors::ReconcileError;

        let response = CallbackApiError::from(ReconcileError::UnknownCheckoutRequest {
            checkout_request_id: "ws_CO_forged".to_string(),
        })
        .into_response();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(
            body_json(response).await,
            json!({ "message": "Unknown checkout request" })
        );
    }

    #[tokio::test]
    async fn test_callback_database_failure_is_500_so_gateway_retries() {
        let callback = json!({
            "Body": { "stkCallback": {
                "MerchantRequestID": "29115-34620561-1",
                "CheckoutRequestID": "ws_CO_191220191020363925",
                "ResultCode": 1032,
                "ResultDesc": "Request cancelled by user"
            }}
        });
        let response = build_router(state())
            .oneshot(post_json("/api/mpesa/callback", callback))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            body_json(response).await,
            json!({ "message": "Server error processing callback" })
        );
    }
}
