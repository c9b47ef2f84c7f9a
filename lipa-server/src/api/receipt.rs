//! Receipt print API.
//!
//! Nothing is stored: `POST` validates the receipt and hands it back, as
//! JSON for a client-side printer service or pre-rendered for the printer.
//!
//! # Endpoints
//!
//! - `GET  /api/print-receipt`                        – API status
//! - `POST /api/print-receipt?format=json|text|escpos` – validate and render

use axum::{
    Json,
    extract::{Query, State, rejection::JsonRejection},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use lipa_core::receipt::{render_escpos, render_text, validate};
use lipa_sdk::objects::receipt::{
    PrintReceiptResponse, ReceiptApiStatus, ReceiptData, ReceiptEndpoints,
};
use serde::Deserialize;

use crate::state::AppState;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReceiptFormat {
    #[default]
    Json,
    Text,
    Escpos,
}

#[derive(Debug, Default, Deserialize)]
pub struct PrintQuery {
    #[serde(default)]
    format: ReceiptFormat,
}

/// `GET /api/print-receipt`
pub async fn receipt_status() -> Json<ReceiptApiStatus> {
    Json(ReceiptApiStatus {
        success: true,
        message: "Receipt printing API is available".to_string(),
        endpoints: ReceiptEndpoints {
            post: "/api/print-receipt - Print a receipt".to_string(),
            get: "/api/print-receipt - Get API status".to_string(),
        },
    })
}

/// `POST /api/print-receipt`
pub async fn print_receipt(
    State(state): State<AppState>,
    Query(query): Query<PrintQuery>,
    payload: Result<Json<ReceiptData>, JsonRejection>,
) -> Response {
    let receipt = match payload {
        Ok(Json(receipt)) if validate(&receipt).is_ok() => receipt,
        Ok(Json(_)) => return failure(StatusCode::BAD_REQUEST, "Invalid receipt data"),
        Err(e) => {
            tracing::warn!(error = %e, "Rejected receipt print request");
            return failure(StatusCode::BAD_REQUEST, "Invalid receipt data");
        }
    };
    tracing::info!(receipt_number = %receipt.receipt_number, "Receipt print request");

    match query.format {
        ReceiptFormat::Json => Json(PrintReceiptResponse {
            success: true,
            message: Some("Receipt ready for printing".to_string()),
            error: None,
            receipt_data: Some(receipt),
        })
        .into_response(),
        ReceiptFormat::Text => {
            let config = state.config.receipt.read().await;
            let text = render_text(&receipt, &config);
            (
                [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
                text,
            )
                .into_response()
        }
        ReceiptFormat::Escpos => {
            let config = state.config.receipt.read().await;
            let bytes = render_escpos(&receipt, &config);
            ([(header::CONTENT_TYPE, "application/octet-stream")], bytes).into_response()
        }
    }
}

fn failure(status: StatusCode, error: &str) -> Response {
    (
        status,
        Json(PrintReceiptResponse {
            success: false,
            message: None,
            error: Some(error.to_string()),
            receipt_data: None,
        }),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use crate::api::test_support::{body_json, body_text};
    use crate::server::build_router;
    use crate::state::test_support::state;
    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };
    use serde_json::{Value, json};
    use tower::ServiceExt;

    fn receipt() -> Value {
        json!({
            "receiptNumber": "RCP-0042",
            "date": "2024-03-05 10:15",
            "items": [
                { "name": "Sugar 1kg", "quantity": 2, "price": 150.0, "total": 300.0 }
            ],
            "subtotal": 300.0,
            "tax": 0.0,
            "total": 300.0,
            "paymentMethod": "mpesa"
        })
    }

    fn post(uri: &str, body: Value) -> Request<Body> {
        Request::post(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn test_status() {
        let response = build_router(state())
            .oneshot(Request::get("/api/print-receipt").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["success"], true);
        assert_eq!(body["endpoints"]["GET"], "/api/print-receipt - Get API status");
    }

    #[tokio::test]
    async fn test_valid_receipt_is_echoed() {
        let response = build_router(state())
            .oneshot(post("/api/print-receipt", receipt()))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["success"], true);
        assert_eq!(body["message"], "Receipt ready for printing");
        assert_eq!(body["receiptData"]["receiptNumber"], "RCP-0042");
        assert!(body.get("error").is_none());
    }

    #[tokio::test]
    async fn test_receipt_without_items_is_rejected() {
        let mut empty = receipt();
        empty["items"] = json!([]);
        let response = build_router(state())
            .oneshot(post("/api/print-receipt", empty))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            body_json(response).await,
            json!({ "success": false, "error": "Invalid receipt data" })
        );
    }

    #[tokio::test]
    async fn test_text_rendering_uses_configured_branding() {
        let response = build_router(state())
            .oneshot(post("/api/print-receipt?format=text", receipt()))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let text = body_text(response).await;
        assert!(text.lines().next().unwrap().trim() == "LIPA");
        assert!(text.contains("  2 x 150.00 = 300.00"));
    }

    #[tokio::test]
    async fn test_escpos_rendering_ends_with_cut() {
        let response = build_router(state())
            .oneshot(post("/api/print-receipt?format=escpos", receipt()))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()["content-type"],
            "application/octet-stream"
        );
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        assert!(bytes.starts_with(&[0x1B, b'@']));
        assert!(bytes.ends_with(&[0x1D, b'V', 0]));
    }
}
