//! Cart validation and the errors of the paying flows.

use crate::mpesa::{GatewayError, InvalidAmount, InvalidPhone};
use crate::wallet::WalletError;
use lipa_sdk::objects::checkout::CartItem;
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use thiserror::Error;
use uuid::Uuid;

/// Errors from checkout, ride booking and top-ups.
#[derive(Debug, Error)]
pub enum CheckoutError {
    #[error("cart is empty")]
    EmptyCart,

    #[error("quantity of {0} must be at least 1")]
    InvalidQuantity(Uuid),

    #[error("price of {0} must not be negative")]
    NegativePrice(Uuid),

    #[error("price must be positive")]
    NonPositivePrice,

    #[error("amount is too large")]
    AmountTooLarge,

    #[error("bank and account number are required")]
    MissingBankDetails,

    #[error("confirmation code must be 10 letters or digits")]
    InvalidConfirmationCode,

    #[error("confirmation code has already been submitted")]
    DuplicateConfirmationCode,

    #[error(transparent)]
    InvalidPhone(#[from] InvalidPhone),

    #[error(transparent)]
    InvalidAmount(#[from] InvalidAmount),

    #[error(transparent)]
    Wallet(#[from] WalletError),

    /// The push call itself failed; nothing was stored.
    #[error("payment gateway error: {0}")]
    Gateway(#[from] GatewayError),

    /// The gateway answered without a `CheckoutRequestID`.
    #[error("payment gateway did not accept the request: {0}")]
    PushNotAccepted(String),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Largest amount a `NUMERIC(14,2)` column holds.
pub const MAX_AMOUNT: Decimal = Decimal::from_parts(276_447_231, 23_283, 0, false, 2);

/// Reject amounts the ledger cannot store.
pub fn check_amount(amount: Decimal) -> Result<Decimal, CheckoutError> {
    if amount > MAX_AMOUNT {
        return Err(CheckoutError::AmountTooLarge);
    }
    Ok(amount)
}

/// Validate the cart and return its total.
pub fn cart_total(items: &[CartItem]) -> Result<Decimal, CheckoutError> {
    if items.is_empty() {
        return Err(CheckoutError::EmptyCart);
    }
    items.iter().try_fold(Decimal::ZERO, |total, item| {
        if item.quantity == 0 || i32::try_from(item.quantity).is_err() {
            return Err(CheckoutError::InvalidQuantity(item.product_id));
        }
        if item.unit_price < Decimal::ZERO {
            return Err(CheckoutError::NegativePrice(item.product_id));
        }
        let total = total
            .checked_add(line_total(item)?)
            .ok_or(CheckoutError::AmountTooLarge)?;
        check_amount(total)
    })
}

pub fn line_total(item: &CartItem) -> Result<Decimal, CheckoutError> {
    let total = item
        .unit_price
        .checked_mul(Decimal::from(item.quantity))
        .ok_or(CheckoutError::AmountTooLarge)?;
    check_amount(total)
}

/// The whole-shilling amount pushed for `total`: rounded up, never zero.
pub fn push_amount(total: Decimal) -> Result<u64, CheckoutError> {
    let amount = total.ceil();
    if amount <= Decimal::ZERO {
        return Err(InvalidAmount(total).into());
    }
    amount
        .to_u64()
        .ok_or_else(|| InvalidAmount(total).into())
}

/// Normalize a till confirmation code: trimmed, uppercased, exactly ten
/// ASCII letters or digits.
pub fn normalize_confirmation_code(code: &str) -> Result<String, CheckoutError> {
    let code = code.trim().to_ascii_uppercase();
    if code.len() != 10 || !code.bytes().all(|b| b.is_ascii_alphanumeric()) {
        return Err(CheckoutError::InvalidConfirmationCode);
    }
    Ok(code)
}
