//! HTTP API surfaces.
//!
//! - `mpesa`: push-payment initiation and the gateway callback
//! - `receipt`: receipt formatting for thermal printers
//! - `service`: signed storefront API under `/api/v1/service`
//! - `admin`: staff API under `/api/v1/admin`

pub mod admin;
pub mod extractors;
pub mod mpesa;
pub mod receipt;
pub mod service;

#[cfg(test)]
pub(crate) mod test_support {
    use axum::{body::Body, http::Response};

    pub async fn body_json(response: Response<Body>) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    pub async fn body_text(response: Response<Body>) -> String {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }
}
