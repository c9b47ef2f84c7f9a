use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use kanau::processor::Processor;
use lipa_core::entities::rides::GetRideById;
use lipa_sdk::objects::ride::{BookRideRequest, GetRideRequest, RideResponse};

use crate::api::extractors::SignedBody;
use crate::state::AppState;

use super::ServiceApiError;

/// `POST /rides` — book a ride and take payment for it.
pub async fn book_ride(
    State(state): State<AppState>,
    SignedBody(payload): SignedBody<BookRideRequest>,
) -> Result<impl IntoResponse, ServiceApiError> {
    let response = state.payments.process(payload).await?;
    Ok((StatusCode::CREATED, Json(response)))
}

/// `POST /rides/status` — get a ride and its payment state.
pub async fn get_ride_status(
    State(state): State<AppState>,
    SignedBody(payload): SignedBody<GetRideRequest>,
) -> Result<Json<RideResponse>, ServiceApiError> {
    let ride = state
        .db
        .process(GetRideById {
            ride_id: payload.ride_id,
        })
        .await
        .map_err(ServiceApiError::Database)?
        .ok_or(ServiceApiError::NotFound("ride not found"))?;

    Ok(Json(ride.into()))
}

#[cfg(test)]
mod tests {
    use crate::api::service::test_support::signed;
    use crate::api::test_support::body_text;
    use crate::server::build_router;
    use crate::state::test_support::state;
    use axum::http::StatusCode;
    use lipa_sdk::objects::PaymentSelection;
    use lipa_sdk::objects::ride::BookRideRequest;
    use rust_decimal::Decimal;
    use tower::ServiceExt;
    use uuid::Uuid;

    fn booking(price: Decimal, payment: PaymentSelection) -> BookRideRequest {
        BookRideRequest {
            user_id: Uuid::new_v4(),
            pickup: "Westlands".into(),
            dropoff: "CBD".into(),
            vehicle_class: "economy".into(),
            vehicle_id: Uuid::new_v4(),
            price,
            payment,
        }
    }

    #[tokio::test]
    async fn test_free_ride_is_rejected() {
        let response = build_router(state())
            .oneshot(signed(
                "/api/v1/service/rides",
                booking(Decimal::ZERO, PaymentSelection::Ewallet { pin: "1234".into() }),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_text(response).await, "price must be positive");
    }

    #[tokio::test]
    async fn test_invalid_phone_is_rejected_before_push() {
        let response = build_router(state())
            .oneshot(signed(
                "/api/v1/service/rides",
                booking(
                    Decimal::new(450, 0),
                    PaymentSelection::Mpesa {
                        phone: "0812345678".into(),
                    },
                ),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(body_text(response).await.contains("invalid phone number"));
    }
}
