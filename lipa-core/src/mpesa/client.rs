//! Daraja HTTP client.
//!
//! Pushes are never retried: a second push is a second prompt on the
//! customer's phone.

use crate::config::MpesaConfig;
use crate::mpesa::password::{stk_password, stk_timestamp};
use crate::mpesa::phone::Msisdn;
use lipa_sdk::objects::mpesa::{AccessToken, StkPushAck, StkPushPayload};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::{Mutex, RwLock};
use tokio::time::Instant;
use tracing::{debug, info, warn};

/// Tokens are refreshed this long before the gateway says they expire.
const TOKEN_REFRESH_MARGIN: Duration = Duration::from_secs(60);

/// Used when the gateway's `expires_in` is unparseable.
const DEFAULT_TOKEN_LIFETIME: Duration = Duration::from_secs(3599);

const TRANSACTION_TYPE: &str = "CustomerPayBillOnline";

#[derive(Debug, Error)]
pub enum GatewayError {
    /// Transport failure or timeout.
    #[error("gateway request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The gateway answered with a non-success status.
    #[error("gateway rejected the request with status {status}")]
    Rejected { status: u16, body: Value },

    #[error("invalid gateway response: {0}")]
    InvalidResponse(String),

    #[error("invalid gateway url: {0}")]
    Url(#[from] url::ParseError),
}

impl GatewayError {
    /// What to relay to the caller: the gateway's own error body when it
    /// sent one, else the error message.
    pub fn relay_body(&self) -> Value {
        match self {
            GatewayError::Rejected { body, .. } if !body.is_null() => body.clone(),
            other => Value::String(other.to_string()),
        }
    }
}

/// An accepted push: the verbatim gateway JSON plus the typed fields.
#[derive(Debug, Clone)]
pub struct StkPushResult {
    pub raw: Value,
    pub ack: StkPushAck,
}

#[derive(Debug)]
struct CachedToken {
    consumer_key: String,
    value: String,
    refresh_at: Instant,
}

/// Talks to the Daraja API with the credentials of the current config.
///
/// Config reloads are picked up on the next call. A cached token is only
/// reused while the consumer key it was issued for is unchanged.
#[derive(Clone)]
pub struct DarajaClient {
    http_client: reqwest::Client,
    config: Arc<RwLock<MpesaConfig>>,
    token: Arc<Mutex<Option<CachedToken>>>,
}

impl DarajaClient {
    pub fn new(config: Arc<RwLock<MpesaConfig>>) -> Self {
        Self {
            http_client: reqwest::Client::new(),
            config,
            token: Arc::new(Mutex::new(None)),
        }
    }

    /// Get a bearer token, from cache when still fresh.
    #[tracing::instrument(skip_all, err)]
    pub async fn access_token(&self) -> Result<String, GatewayError> {
        let config = self.config.read().await.clone();
        let mut cached = self.token.lock().await;

        if let Some(token) = cached.as_ref()
            && token.consumer_key == config.consumer_key
            && Instant::now() < token.refresh_at
        {
            return Ok(token.value.clone());
        }

        let url = config.base_url.join("oauth/v1/generate")?;
        let response = self
            .http_client
            .get(url)
            .query(&[("grant_type", "client_credentials")])
            .basic_auth(&config.consumer_key, Some(&config.consumer_secret))
            .timeout(config.request_timeout)
            .send()
            .await?;
        let response = check_status(response).await?;
        let token: AccessToken = response
            .json()
            .await
            .map_err(|e| GatewayError::InvalidResponse(e.to_string()))?;

        let refresh_at = token_refresh_at(Instant::now(), &token.expires_in);
        debug!(expires_in = %token.expires_in, "Obtained gateway access token");

        let value = token.access_token;
        *cached = Some(CachedToken {
            consumer_key: config.consumer_key.clone(),
            value: value.clone(),
            refresh_at,
        });
        Ok(value)
    }

    /// Push a payment prompt for `amount` whole shillings to `phone`.
    #[tracing::instrument(skip_all, err, fields(phone = %phone, amount = amount))]
    pub async fn stk_push(&self, phone: &Msisdn, amount: u64) -> Result<StkPushResult, GatewayError> {
        let token = self.access_token().await?;
        let config = self.config.read().await.clone();

        let timestamp = stk_timestamp(time::OffsetDateTime::now_utc());
        let payload = StkPushPayload {
            business_short_code: config.shortcode.clone(),
            password: stk_password(&config.shortcode, &config.passkey, &timestamp),
            timestamp,
            transaction_type: TRANSACTION_TYPE.to_string(),
            amount,
            party_a: phone.to_string(),
            party_b: config.shortcode.clone(),
            phone_number: phone.to_string(),
            call_back_url: config.callback_url.to_string(),
            account_reference: config.account_reference.clone(),
            transaction_desc: config.transaction_desc.clone(),
        };

        let url = config.base_url.join("mpesa/stkpush/v1/processrequest")?;
        let response = self
            .http_client
            .post(url)
            .bearer_auth(token)
            .json(&payload)
            .timeout(config.request_timeout)
            .send()
            .await?;
        let response = check_status(response).await?;

        let raw: Value = response
            .json()
            .await
            .map_err(|e| GatewayError::InvalidResponse(e.to_string()))?;
        let ack: StkPushAck = serde_json::from_value(raw.clone())
            .map_err(|e| GatewayError::InvalidResponse(e.to_string()))?;

        info!(
            checkout_request_id = ack.checkout_request_id.as_deref().unwrap_or_default(),
            response_code = ack.response_code.as_deref().unwrap_or_default(),
            "STK push accepted"
        );
        Ok(StkPushResult { raw, ack })
    }
}

/// When a token issued at `now` with the advertised `expires_in` seconds
/// should be replaced. Unparsable or out-of-range lifetimes fall back to
/// the gateway's usual one hour.
fn token_refresh_at(now: Instant, expires_in: &str) -> Instant {
    let fallback = now + DEFAULT_TOKEN_LIFETIME.saturating_sub(TOKEN_REFRESH_MARGIN);
    expires_in
        .trim()
        .parse::<u64>()
        .ok()
        .and_then(|secs| {
            now.checked_add(Duration::from_secs(secs).saturating_sub(TOKEN_REFRESH_MARGIN))
        })
        .unwrap_or(fallback)
}

async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, GatewayError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let text = response.text().await.unwrap_or_default();
    let body = match serde_json::from_str::<Value>(&text) {
        Ok(body) => body,
        Err(_) if text.is_empty() => Value::Null,
        Err(_) => Value::String(text),
    };
    warn!(status = status.as_u16(), body = %body, "Gateway returned an error");
    Err(GatewayError::Rejected {
        status: status.as_u16(),
        body,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::extract::State;
    use axum::http::{HeaderMap, StatusCode};
    use axum::routing::{get, post};
    use axum::{Json, Router};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use url::Url;

    #[derive(Clone, Default)]
    struct Gateway {
        token_calls: Arc<AtomicUsize>,
        pushes: Arc<std::sync::Mutex<Vec<StkPushPayload>>>,
    }

    async fn token(State(gateway): State<Gateway>, headers: HeaderMap) -> (StatusCode, Json<Value>) {
        gateway.token_calls.fetch_add(1, Ordering::SeqCst);
        // base64("key:secret")
        let authorization = headers.get("authorization").and_then(|v| v.to_str().ok());
        if authorization != Some("Basic a2V5OnNlY3JldA==") {
            return (
                StatusCode::UNAUTHORIZED,
                Json(serde_json::json!({"errorMessage": "bad credentials"})),
            );
        }
        (
            StatusCode::OK,
            Json(serde_json::json!({"access_token": "tok", "expires_in": "3599"})),
        )
    }

    async fn push(
        State(gateway): State<Gateway>,
        headers: HeaderMap,
        Json(payload): Json<StkPushPayload>,
    ) -> (StatusCode, Json<Value>) {
        assert_eq!(
            headers.get("authorization").and_then(|v| v.to_str().ok()),
            Some("Bearer tok")
        );
        let amount = payload.amount;
        gateway.pushes.lock().unwrap().push(payload);
        if amount > 70_000 {
            return (
                StatusCode::BAD_REQUEST,
                Json(serde_json::json!({
                    "requestId": "1-2",
                    "errorCode": "400.002.02",
                    "errorMessage": "Bad Request - Invalid Amount"
                })),
            );
        }
        (
            StatusCode::OK,
            Json(serde_json::json!({
                "MerchantRequestID": "29115-34620561-1",
                "CheckoutRequestID": "ws_CO_191220191020363925",
                "ResponseCode": "0",
                "ResponseDescription": "Success. Request accepted for processing",
                "CustomerMessage": "Success. Request accepted for processing"
            })),
        )
    }

    async fn spawn(gateway: Gateway) -> Url {
        let router = Router::new()
            .route("/oauth/v1/generate", get(token))
            .route("/mpesa/stkpush/v1/processrequest", post(push))
            .with_state(gateway);
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        Url::parse(&format!("http://{addr}/")).unwrap()
    }

    fn config(base_url: Url, consumer_key: &str) -> MpesaConfig {
        MpesaConfig {
            base_url,
            consumer_key: consumer_key.to_string(),
            consumer_secret: "secret".to_string(),
            shortcode: "174379".to_string(),
            passkey: "pass".to_string(),
            callback_url: Url::parse("https://pay.example.com/api/mpesa/callback").unwrap(),
            account_reference: "Lipa".to_string(),
            transaction_desc: "Payment".to_string(),
            till_number: None,
            request_timeout: Duration::from_secs(5),
        }
    }

    #[test]
    fn test_token_refresh_deadline() {
        let now = Instant::now();
        assert_eq!(token_refresh_at(now, " 3599 "), now + Duration::from_secs(3539));
        assert_eq!(token_refresh_at(now, "30"), now);
        assert_eq!(token_refresh_at(now, "soon"), now + Duration::from_secs(3539));
        assert_eq!(
            token_refresh_at(now, &u64::MAX.to_string()),
            now + Duration::from_secs(3539)
        );
    }

    #[tokio::test]
    async fn test_push_sends_signed_payload_and_relays_json() {
        let gateway = Gateway::default();
        let base = spawn(gateway.clone()).await;
        let client = DarajaClient::new(Arc::new(RwLock::new(config(base, "key"))));

        let phone = Msisdn::parse("0712345678").unwrap();
        let result = client.stk_push(&phone, 100).await.unwrap();

        assert_eq!(result.raw["ResponseCode"], "0");
        assert_eq!(
            result.ack.checkout_request_id.as_deref(),
            Some("ws_CO_191220191020363925")
        );

        let pushes = gateway.pushes.lock().unwrap();
        let payload = &pushes[0];
        assert_eq!(payload.transaction_type, "CustomerPayBillOnline");
        assert_eq!(payload.party_a, "254712345678");
        assert_eq!(payload.phone_number, "254712345678");
        assert_eq!(payload.party_b, "174379");
        assert_eq!(payload.amount, 100);
        assert_eq!(payload.timestamp.len(), 14);
        assert_eq!(
            payload.password,
            stk_password("174379", "pass", &payload.timestamp)
        );
        assert_eq!(payload.call_back_url, "https://pay.example.com/api/mpesa/callback");
    }

    #[tokio::test]
    async fn test_token_is_cached_between_pushes() {
        let gateway = Gateway::default();
        let base = spawn(gateway.clone()).await;
        let client = DarajaClient::new(Arc::new(RwLock::new(config(base, "key"))));
        let phone = Msisdn::parse("0712345678").unwrap();

        client.stk_push(&phone, 1).await.unwrap();
        client.stk_push(&phone, 2).await.unwrap();

        assert_eq!(gateway.token_calls.load(Ordering::SeqCst), 1);
        assert_eq!(gateway.pushes.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_gateway_error_body_is_relayed() {
        let gateway = Gateway::default();
        let base = spawn(gateway.clone()).await;
        let client = DarajaClient::new(Arc::new(RwLock::new(config(base, "key"))));
        let phone = Msisdn::parse("0712345678").unwrap();

        let err = client.stk_push(&phone, 100_000).await.unwrap_err();
        match &err {
            GatewayError::Rejected { status, .. } => assert_eq!(*status, 400),
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(err.relay_body()["errorMessage"], "Bad Request - Invalid Amount");
    }

    #[tokio::test]
    async fn test_bad_credentials_stop_before_push() {
        let gateway = Gateway::default();
        let base = spawn(gateway.clone()).await;
        let client = DarajaClient::new(Arc::new(RwLock::new(config(base, "wrong"))));
        let phone = Msisdn::parse("0712345678").unwrap();

        let err = client.stk_push(&phone, 100).await.unwrap_err();
        assert!(matches!(err, GatewayError::Rejected { status: 401, .. }));
        assert!(gateway.pushes.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_unreachable_gateway_is_a_request_error() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);
        let base = Url::parse(&format!("http://{addr}/")).unwrap();
        let client = DarajaClient::new(Arc::new(RwLock::new(config(base, "key"))));

        let err = client.access_token().await.unwrap_err();
        assert!(matches!(err, GatewayError::Request(_)));
        assert!(err.relay_body().is_string());
    }
}
