//! Request and response objects shared by the Lipa server and its clients.
//!
//! Status enums here are the API/DTO versions without `sqlx::Type`. For
//! database operations, use the versions in `lipa-core::entities`.

pub mod admin;
pub mod checkout;
pub mod mpesa;
pub mod receipt;
pub mod ride;
pub mod wallet;

use serde::{Deserialize, Serialize};

/// Order lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    PendingPayment,
    Pending,
    Completed,
    Cancelled,
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OrderStatus::PendingPayment => write!(f, "pending_payment"),
            OrderStatus::Pending => write!(f, "pending"),
            OrderStatus::Completed => write!(f, "completed"),
            OrderStatus::Cancelled => write!(f, "cancelled"),
        }
    }
}

/// How a checkout or ride is paid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentMethod {
    Mpesa,
    Ewallet,
    Bank,
}

impl std::fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PaymentMethod::Mpesa => write!(f, "mpesa"),
            PaymentMethod::Ewallet => write!(f, "ewallet"),
            PaymentMethod::Bank => write!(f, "bank"),
        }
    }
}

/// Ride lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RideStatus {
    PendingPayment,
    Pending,
    Confirmed,
    Cancelled,
}

/// Settlement state of a ride's payment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    Pending,
    Completed,
    Failed,
}

/// Kind of a ledger row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionKind {
    Deposit,
    RidePayment,
    OrderPayment,
    WalletPayment,
}

/// Review state of a manual bank transfer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BankPaymentStatus {
    Pending,
    Confirmed,
    Rejected,
}

/// The follow-up data each payment method needs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "method", rename_all = "lowercase")]
pub enum PaymentSelection {
    /// Push a payment prompt to this phone.
    Mpesa { phone: String },
    /// Pay from the stored-balance wallet, authorised by the wallet PIN.
    Ewallet {
        #[serde(default)]
        pin: String,
    },
    /// Manual bank transfer, confirmed later by staff.
    Bank { bank: String, account_number: String },
}

impl PaymentSelection {
    pub fn method(&self) -> PaymentMethod {
        match self {
            PaymentSelection::Mpesa { .. } => PaymentMethod::Mpesa,
            PaymentSelection::Ewallet { .. } => PaymentMethod::Ewallet,
            PaymentSelection::Bank { .. } => PaymentMethod::Bank,
        }
    }
}

/// Generic `{ message }` reply.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Generic `{ error }` reply.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: serde_json::Value,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payment_selection_is_tagged_by_method() {
        let selection: PaymentSelection =
            serde_json::from_str(r#"{"method":"mpesa","phone":"0712345678"}"#).unwrap();
        assert_eq!(
            selection,
            PaymentSelection::Mpesa {
                phone: "0712345678".into()
            }
        );
        assert_eq!(selection.method(), PaymentMethod::Mpesa);

        let selection: PaymentSelection = serde_json::from_str(r#"{"method":"ewallet"}"#).unwrap();
        assert_eq!(selection, PaymentSelection::Ewallet { pin: String::new() });
    }

    #[test]
    fn test_status_wire_names() {
        assert_eq!(
            serde_json::to_string(&OrderStatus::PendingPayment).unwrap(),
            r#""pending_payment""#
        );
        assert_eq!(OrderStatus::PendingPayment.to_string(), "pending_payment");
        assert_eq!(PaymentMethod::Ewallet.to_string(), "ewallet");
    }
}
