use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::checkout::CheckoutOutcome;
use super::{PaymentMethod, PaymentSelection, PaymentStatus, RideStatus};
use crate::signature::Signature;

/// `POST /api/v1/service/rides` body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookRideRequest {
    pub user_id: Uuid,
    pub pickup: String,
    pub dropoff: String,
    pub vehicle_class: String,
    pub vehicle_id: Uuid,
    pub price: Decimal,
    pub payment: PaymentSelection,
}

impl Signature for BookRideRequest {}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RideResponse {
    pub ride_id: Uuid,
    pub user_id: Uuid,
    pub pickup: String,
    pub dropoff: String,
    pub vehicle_class: String,
    pub vehicle_id: Uuid,
    pub price: Decimal,
    pub status: RideStatus,
    pub payment_method: PaymentMethod,
    pub payment_status: PaymentStatus,
    pub checkout_request_id: Option<String>,
    pub created_at: i64,
}

/// `POST /api/v1/service/rides` response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookRideResponse {
    pub ride: RideResponse,
    #[serde(flatten)]
    pub outcome: CheckoutOutcome,
}

/// `POST /api/v1/service/rides/status` body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GetRideRequest {
    pub ride_id: Uuid,
}

impl Signature for GetRideRequest {}
