//! Checkout request and response types for the Service API.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{OrderStatus, PaymentMethod, PaymentSelection};
use crate::signature::Signature;

/// One line of the cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartItem {
    pub product_id: Uuid,
    pub name: String,
    pub unit_price: Decimal,
    pub quantity: u32,
}

/// `POST /api/v1/service/checkout` body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckoutRequest {
    pub user_id: Uuid,
    #[serde(default)]
    pub items: Vec<CartItem>,
    pub payment: PaymentSelection,
}

impl Signature for CheckoutRequest {}

/// What happened to the payment after checkout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum CheckoutOutcome {
    /// A payment prompt was pushed to the customer's phone; orders wait for
    /// the gateway callback.
    PromptSent {
        checkout_request_id: String,
        customer_message: Option<String>,
    },
    /// The wallet was debited.
    Paid { new_balance: Decimal },
    /// A bank transfer request was stored for staff follow-up.
    AwaitingBankConfirmation { bank_payment_id: Uuid },
}

/// `POST /api/v1/service/checkout` response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckoutResponse {
    pub total: Decimal,
    pub orders: Vec<OrderResponse>,
    #[serde(flatten)]
    pub outcome: CheckoutOutcome,
}

/// Public view of an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderResponse {
    pub order_id: Uuid,
    pub user_id: Uuid,
    pub product_id: Option<Uuid>,
    pub quantity: i32,
    pub total_amount: Decimal,
    pub status: OrderStatus,
    pub payment_method: PaymentMethod,
    pub confirmation_code: Option<String>,
    /// Unix timestamp.
    pub created_at: i64,
}

/// `POST /api/v1/service/orders/status` body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GetOrderRequest {
    pub order_id: Uuid,
}

impl Signature for GetOrderRequest {}
