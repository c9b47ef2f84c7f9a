//! Typed HTTP clients for the signed service API and the admin API.
//!
//! Only compiled with the `client` feature; the wire types in
//! [`crate::objects`] are usable without `reqwest`.

mod admin;
mod service;

pub use admin::AdminClient;
pub use service::ServiceClient;

use reqwest::StatusCode;

use crate::signature::SignatureError;

/// Failure of a client call.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// The request never got a response.
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// The body could not be signed.
    #[error("signature error: {0}")]
    Signature(#[from] SignatureError),

    /// The server answered with an error status. `body` is the server's
    /// message, e.g. "cart is empty" or "Insufficient wallet balance".
    #[error("api error: status {status}, body: {body}")]
    Api { status: StatusCode, body: String },

    /// A success response did not match the expected type.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// An endpoint path could not be joined onto the base URL.
    #[error("invalid url: {0}")]
    Url(#[from] url::ParseError),
}

async fn parse_response<T: serde::de::DeserializeOwned>(
    response: reqwest::Response,
) -> Result<T, ClientError> {
    let status = response.status();
    if status.is_success() {
        let bytes = response.bytes().await?;
        return serde_json::from_slice(&bytes).map_err(ClientError::Json);
    }
    let body = response.text().await.unwrap_or_default();
    Err(ClientError::Api { status, body })
}
