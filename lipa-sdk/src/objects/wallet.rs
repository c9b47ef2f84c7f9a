use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::signature::Signature;

/// `POST /api/v1/service/wallet` body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WalletQuery {
    pub user_id: Uuid,
}

impl Signature for WalletQuery {}

/// Wallet view. The PIN itself is never returned.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WalletResponse {
    pub user_id: Uuid,
    pub balance: Decimal,
    pub has_pin: bool,
    /// Till number customers pay by hand before a manual top-up.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub till_number: Option<String>,
}

/// `POST /api/v1/service/wallet/pin` body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SetPinRequest {
    pub user_id: Uuid,
    pub pin: String,
    pub confirm_pin: String,
}

impl Signature for SetPinRequest {}

/// `POST /api/v1/service/wallet/top-up/stk` body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StkTopUpRequest {
    pub user_id: Uuid,
    pub phone: String,
    pub amount: Decimal,
}

impl Signature for StkTopUpRequest {}

/// `POST /api/v1/service/wallet/top-up/manual` body.
///
/// The customer paid the till number by hand and copied the confirmation
/// code from the SMS receipt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManualTopUpRequest {
    pub user_id: Uuid,
    pub confirmation_code: String,
}

impl Signature for ManualTopUpRequest {}

/// Answer to an STK top-up.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StkTopUpResponse {
    pub checkout_request_id: String,
    pub customer_message: Option<String>,
}
