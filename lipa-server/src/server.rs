//! Axum server setup and router configuration.

use crate::api;
use crate::shutdown::shutdown_signal;
use crate::state::AppState;
use axum::{
    Json, Router,
    response::IntoResponse,
    routing::{get, post},
};
use serde::Serialize;
use std::net::SocketAddr;
use tokio::net::TcpListener;

/// Build the main application router.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .nest("/api/mpesa", api::mpesa::router())
        // Paths the storefront used before the `/api/mpesa` prefix.
        .route("/api/pay-with-mpesa", post(api::mpesa::stk_push))
        .route("/api/mpesa-callback", post(api::mpesa::callback))
        .route(
            "/api/print-receipt",
            get(api::receipt::receipt_status).post(api::receipt::print_receipt),
        )
        .nest("/api/v1/service", api::service::router())
        .nest("/api/v1/admin", api::admin::router())
        .with_state(state)
}

/// Health check response.
#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

/// Simple health check - returns OK if the server is running.
async fn health_check() -> impl IntoResponse {
    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// Run the server with graceful shutdown support.
pub async fn run_server(router: Router, addr: SocketAddr) -> Result<(), std::io::Error> {
    let listener = TcpListener::bind(addr).await?;
    tracing::info!("Server listening on {}", addr);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::test_support::body_json;
    use crate::state::test_support::{MERCHANT_SECRET, state};
    use axum::{body::Body, http::Request, http::StatusCode};
    use lipa_sdk::client::{ClientError, ServiceClient};
    use lipa_sdk::objects::PaymentSelection;
    use lipa_sdk::objects::checkout::CheckoutRequest;
    use tower::ServiceExt;
    use url::Url;
    use uuid::Uuid;

    #[tokio::test]
    async fn test_health() {
        let response = build_router(state())
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["status"], "healthy");
    }

    #[tokio::test]
    async fn test_legacy_callback_path_is_routed() {
        let response = build_router(state())
            .oneshot(
                Request::post("/api/mpesa-callback")
                    .header("content-type", "application/json")
                    .body(Body::from("{}"))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    async fn serve() -> Url {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let router = build_router(state());
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        Url::parse(&format!("http://{addr}")).unwrap()
    }

    #[tokio::test]
    async fn test_sdk_client_signature_is_accepted() {
        let base = serve().await;
        let client = ServiceClient::new(base, MERCHANT_SECRET.to_vec());

        let result = client
            .checkout(CheckoutRequest {
                user_id: Uuid::new_v4(),
                items: vec![],
                payment: PaymentSelection::Bank {
                    bank: "KCB".into(),
                    account_number: "1100223344".into(),
                },
            })
            .await;

        match result {
            Err(ClientError::Api { status, body }) => {
                assert_eq!(status.as_u16(), 400);
                assert_eq!(body, "cart is empty");
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_sdk_client_with_wrong_secret_is_rejected() {
        let base = serve().await;
        let client = ServiceClient::new(base, b"not-the-secret".to_vec());

        match client.get_order_status(Uuid::new_v4()).await {
            Err(ClientError::Api { status, .. }) => assert_eq!(status.as_u16(), 401),
            other => panic!("unexpected result: {other:?}"),
        }
    }
}
