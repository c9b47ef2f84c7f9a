//! Admin API types.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{BankPaymentStatus, OrderStatus, PaymentMethod, TransactionKind};

/// Query parameters for `GET /orders`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ListOrdersQuery {
    pub status: Option<OrderStatus>,
    pub page: Option<u32>,
    pub page_size: Option<u32>,
}

/// Query parameters for `GET /bank-payments`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ListBankPaymentsQuery {
    pub status: Option<BankPaymentStatus>,
    pub page: Option<u32>,
    pub page_size: Option<u32>,
}

/// A page of results.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Paginated<T> {
    pub items: Vec<T>,
    pub page: u32,
    pub page_size: u32,
    pub total: i64,
}

/// Full order view for staff, including the reconciliation links.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdminOrderResponse {
    pub order_id: Uuid,
    pub user_id: Uuid,
    pub product_id: Option<Uuid>,
    pub quantity: i32,
    pub total_amount: Decimal,
    pub status: OrderStatus,
    pub payment_method: PaymentMethod,
    pub confirmation_code: Option<String>,
    pub checkout_request_id: Option<String>,
    pub bank_payment_id: Option<Uuid>,
    pub created_at: i64,
    pub updated_at: i64,
}

/// `POST /orders/{order_id}/status` body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateOrderStatusRequest {
    pub status: OrderStatus,
}

/// `POST /orders/{order_id}/approve-top-up` body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApproveTopUpRequest {
    pub amount: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BankPaymentResponse {
    pub id: Uuid,
    pub user_id: Uuid,
    pub amount: Decimal,
    pub bank: String,
    pub account_number: String,
    pub status: BankPaymentStatus,
    pub ride_id: Option<Uuid>,
    pub created_at: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionResponse {
    pub id: Uuid,
    pub kind: TransactionKind,
    pub amount: Decimal,
    pub reference: String,
    pub created_at: i64,
}

/// `GET /wallets/{user_id}` response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdminWalletResponse {
    pub user_id: Uuid,
    pub balance: Decimal,
    pub has_pin: bool,
    pub recent_transactions: Vec<TransactionResponse>,
}
