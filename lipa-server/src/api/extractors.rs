//! Custom Axum extractors for request authentication.
//!
//! Provides:
//! - `SignedBody<T>`: verifies the `Lipa-Signature` header against a signed
//!   JSON body (used by the Service API).
//! - `AdminAuth`: checks the `Lipa-Admin-Authorization` header against the
//!   hashed admin secret (used by the Admin API).
//!
//! All body-signing operations are delegated to [`lipa_sdk::signature`].

use axum::{
    extract::{FromRequest, FromRequestParts, Request},
    http::{StatusCode, request::Parts},
    response::{IntoResponse, Response},
};
use lipa_sdk::signature::{
    ADMIN_AUTH_HEADER, SIGNATURE_HEADER, Signature, SignatureError, SignedObject,
};

use crate::state::AppState;

/// Largest accepted signed body.
const MAX_BODY_BYTES: usize = 1024 * 1024;

// ---------------------------------------------------------------------------
// SignedBody — Service API authentication via signed JSON body
// ---------------------------------------------------------------------------

/// An Axum extractor that verifies the `Lipa-Signature` header and
/// deserializes + authenticates the JSON request body.
///
/// # Header format
///
/// ```text
/// Lipa-Signature: {unix_timestamp}.{base64_signature}
/// ```
///
/// The signature is computed as `HMAC-SHA256("{timestamp}.{json_body}", merchant_secret)`.
pub struct SignedBody<T: Signature>(pub T);

/// Errors that can occur during signed-body verification.
#[derive(Debug, thiserror::Error)]
pub enum SignedBodyError {
    #[error("missing Lipa-Signature header")]
    MissingHeader,
    #[error("invalid Lipa-Signature header format")]
    InvalidHeader,
    #[error("invalid signature encoding")]
    InvalidBase64,
    #[error("failed to read request body")]
    BodyReadError,
    #[error("invalid JSON body: {0}")]
    JsonError(serde_json::Error),
    #[error("signature verification failed")]
    VerificationFailed,
    #[error("signature expired")]
    Expired,
}

impl From<SignatureError> for SignedBodyError {
    fn from(err: SignatureError) -> Self {
        match err {
            SignatureError::InvalidFormat => Self::InvalidHeader,
            SignatureError::InvalidBase64 => Self::InvalidBase64,
            SignatureError::Json(e) => Self::JsonError(e),
            SignatureError::SignatureMismatch => Self::VerificationFailed,
            SignatureError::Expired => Self::Expired,
        }
    }
}

impl IntoResponse for SignedBodyError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            SignedBodyError::MissingHeader => {
                (StatusCode::UNAUTHORIZED, "missing Lipa-Signature header")
            }
            SignedBodyError::InvalidHeader => (
                StatusCode::BAD_REQUEST,
                "invalid Lipa-Signature header format",
            ),
            SignedBodyError::InvalidBase64 => {
                (StatusCode::BAD_REQUEST, "invalid signature encoding")
            }
            SignedBodyError::BodyReadError => {
                (StatusCode::BAD_REQUEST, "failed to read request body")
            }
            SignedBodyError::JsonError(_) => (StatusCode::BAD_REQUEST, "invalid JSON body"),
            SignedBodyError::VerificationFailed => {
                (StatusCode::UNAUTHORIZED, "signature verification failed")
            }
            SignedBodyError::Expired => (StatusCode::UNAUTHORIZED, "signature expired"),
        };
        (status, message).into_response()
    }
}

impl<T: Signature + Send> FromRequest<AppState> for SignedBody<T> {
    type Rejection = SignedBodyError;

    async fn from_request(req: Request, state: &AppState) -> Result<Self, Self::Rejection> {
        let header_value = req
            .headers()
            .get(SIGNATURE_HEADER)
            .ok_or(SignedBodyError::MissingHeader)?
            .to_str()
            .map_err(|_| SignedBodyError::InvalidHeader)?
            .to_owned();

        let body_bytes = axum::body::to_bytes(req.into_body(), MAX_BODY_BYTES)
            .await
            .map_err(|_| SignedBodyError::BodyReadError)?;

        let json =
            String::from_utf8(body_bytes.to_vec()).map_err(|_| SignedBodyError::BodyReadError)?;

        let signed = SignedObject::<T>::from_header_and_body(&header_value, json)?;

        let merchant = state.config.merchant.read().await;
        let verified_body = signed.verify(merchant.secret_bytes())?;
        drop(merchant);

        Ok(SignedBody(verified_body))
    }
}

// ---------------------------------------------------------------------------
// AdminAuth — Admin API authentication via the plaintext admin secret
// ---------------------------------------------------------------------------

/// Proof that the request carried the admin secret.
///
/// ```text
/// Lipa-Admin-Authorization: {admin_secret}
/// ```
pub struct AdminAuth;

#[derive(Debug, thiserror::Error)]
pub enum AdminAuthError {
    #[error("missing Lipa-Admin-Authorization header")]
    MissingHeader,
    #[error("invalid admin secret")]
    InvalidSecret,
}

impl IntoResponse for AdminAuthError {
    fn into_response(self) -> Response {
        (StatusCode::UNAUTHORIZED, self.to_string()).into_response()
    }
}

impl FromRequestParts<AppState> for AdminAuth {
    type Rejection = AdminAuthError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let secret = parts
            .headers
            .get(ADMIN_AUTH_HEADER)
            .ok_or(AdminAuthError::MissingHeader)?
            .to_str()
            .map_err(|_| AdminAuthError::InvalidSecret)?;

        let admin = state.config.admin.read().await.clone();
        if !admin.verify_secret(secret) {
            tracing::warn!("Rejected admin request with an invalid secret");
            return Err(AdminAuthError::InvalidSecret);
        }
        Ok(AdminAuth)
    }
}
