//! Service API client (storefront backend → Lipa server).
//!
//! All requests use body-signed HMAC-SHA256 authentication via
//! [`SignedObject`].

use reqwest::Client;
use url::Url;
use uuid::Uuid;

use super::{ClientError, parse_response};
use crate::objects::checkout::{CheckoutRequest, CheckoutResponse, GetOrderRequest, OrderResponse};
use crate::objects::ride::{BookRideRequest, BookRideResponse, GetRideRequest, RideResponse};
use crate::objects::wallet::{
    ManualTopUpRequest, SetPinRequest, StkTopUpRequest, StkTopUpResponse, WalletQuery,
    WalletResponse,
};
use crate::signature::{SIGNATURE_HEADER, Signature, SignedObject};

/// Typed HTTP client for the Lipa **Service API**.
///
/// Every request body is signed with
/// `HMAC-SHA256("{timestamp}.{json}", merchant_secret)`.
#[derive(Debug, Clone)]
pub struct ServiceClient {
    http: Client,
    base_url: Url,
    secret: Vec<u8>,
}

impl ServiceClient {
    /// Create a new `ServiceClient`.
    ///
    /// * `base_url` – root URL of the Lipa server (e.g. `https://pay.example.com`).
    /// * `merchant_secret` – the shared HMAC secret for body signing.
    pub fn new(base_url: Url, merchant_secret: impl Into<Vec<u8>>) -> Self {
        Self {
            http: Client::new(),
            base_url,
            secret: merchant_secret.into(),
        }
    }

    /// Replace the default `reqwest::Client` with a custom one (e.g. to
    /// configure timeouts or a proxy).
    pub fn with_http_client(mut self, client: Client) -> Self {
        self.http = client;
        self
    }

    /// `POST /api/v1/service/checkout` – pay for a cart.
    pub async fn checkout(&self, request: CheckoutRequest) -> Result<CheckoutResponse, ClientError> {
        self.post_signed("/api/v1/service/checkout", request).await
    }

    /// `POST /api/v1/service/rides` – book and pay for a ride.
    pub async fn book_ride(&self, request: BookRideRequest) -> Result<BookRideResponse, ClientError> {
        self.post_signed("/api/v1/service/rides", request).await
    }

    /// `POST /api/v1/service/rides/status` – get a ride.
    pub async fn get_ride_status(&self, ride_id: Uuid) -> Result<RideResponse, ClientError> {
        self.post_signed("/api/v1/service/rides/status", GetRideRequest { ride_id })
            .await
    }

    /// `POST /api/v1/service/orders/status` – get an order.
    pub async fn get_order_status(&self, order_id: Uuid) -> Result<OrderResponse, ClientError> {
        self.post_signed("/api/v1/service/orders/status", GetOrderRequest { order_id })
            .await
    }

    /// `POST /api/v1/service/wallet` – show a user's wallet.
    pub async fn get_wallet(&self, user_id: Uuid) -> Result<WalletResponse, ClientError> {
        self.post_signed("/api/v1/service/wallet", WalletQuery { user_id })
            .await
    }

    /// `POST /api/v1/service/wallet/pin` – set or replace the wallet PIN.
    pub async fn set_pin(&self, request: SetPinRequest) -> Result<WalletResponse, ClientError> {
        self.post_signed("/api/v1/service/wallet/pin", request).await
    }

    /// `POST /api/v1/service/wallet/top-up/stk` – top up via a push prompt.
    pub async fn stk_top_up(
        &self,
        request: StkTopUpRequest,
    ) -> Result<StkTopUpResponse, ClientError> {
        self.post_signed("/api/v1/service/wallet/top-up/stk", request)
            .await
    }

    /// `POST /api/v1/service/wallet/top-up/manual` – submit a till
    /// confirmation code for staff approval.
    pub async fn manual_top_up(
        &self,
        request: ManualTopUpRequest,
    ) -> Result<OrderResponse, ClientError> {
        self.post_signed("/api/v1/service/wallet/top-up/manual", request)
            .await
    }

    async fn post_signed<B: Signature, R: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        body: B,
    ) -> Result<R, ClientError> {
        let signed = SignedObject::new(body, &self.secret).map_err(ClientError::Json)?;

        let url = self.base_url.join(path)?;

        let resp = self
            .http
            .post(url)
            .header(SIGNATURE_HEADER, signed.to_header())
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .body(signed.json)
            .send()
            .await?;

        parse_response(resp).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::objects::wallet::WalletResponse;
    use axum::{Json, Router, http::HeaderMap, routing::post};
    use rust_decimal::Decimal;

    async fn echo_wallet(headers: HeaderMap, body: String) -> Json<WalletResponse> {
        let header = headers
            .get(SIGNATURE_HEADER)
            .and_then(|v| v.to_str().ok())
            .unwrap()
            .to_owned();
        let query = SignedObject::<WalletQuery>::from_header_and_body(&header, body)
            .unwrap()
            .verify(b"merchant-secret")
            .unwrap();
        Json(WalletResponse {
            user_id: query.user_id,
            balance: Decimal::new(150_00, 2),
            has_pin: true,
            till_number: None,
        })
    }

    async fn spawn(router: Router) -> Url {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        Url::parse(&format!("http://{addr}")).unwrap()
    }

    #[tokio::test]
    async fn test_requests_carry_a_verifiable_signature() {
        let base = spawn(Router::new().route("/api/v1/service/wallet", post(echo_wallet))).await;
        let client = ServiceClient::new(base, b"merchant-secret".to_vec());

        let user_id = Uuid::new_v4();
        let wallet = client.get_wallet(user_id).await.unwrap();
        assert_eq!(wallet.user_id, user_id);
        assert_eq!(wallet.balance, Decimal::new(150_00, 2));
    }

    #[tokio::test]
    async fn test_non_success_status_is_surfaced() {
        let base = spawn(Router::new().route(
            "/api/v1/service/wallet",
            post(|| async { (axum::http::StatusCode::NOT_FOUND, "wallet not found") }),
        ))
        .await;
        let client = ServiceClient::new(base, b"merchant-secret".to_vec());

        match client.get_wallet(Uuid::new_v4()).await {
            Err(ClientError::Api { status, body }) => {
                assert_eq!(status, reqwest::StatusCode::NOT_FOUND);
                assert_eq!(body, "wallet not found");
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }
}
