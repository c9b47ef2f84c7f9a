pub mod bank_payments;
pub mod orders;
pub mod profiles;
pub mod rides;
pub mod stk_requests;
pub mod transactions;
pub mod wallets;

use lipa_sdk::objects::{
    BankPaymentStatus as SdkBankPaymentStatus, OrderStatus as SdkOrderStatus,
    PaymentMethod as SdkPaymentMethod, PaymentStatus as SdkPaymentStatus,
    RideStatus as SdkRideStatus, TransactionKind as SdkTransactionKind,
};

/// Convert a database timestamp into the unix seconds used on the wire.
pub fn unix(ts: time::OffsetDateTime) -> i64 {
    ts.unix_timestamp()
}

/// Order status for database operations.
///
/// This is the sqlx::Type version. For API/DTO use, see `lipa_sdk::objects::OrderStatus`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, sqlx::Type)]
#[sqlx(rename_all = "snake_case", type_name = "order_status")]
pub enum OrderStatus {
    PendingPayment,
    Pending,
    Completed,
    Cancelled,
}

impl From<OrderStatus> for SdkOrderStatus {
    fn from(value: OrderStatus) -> Self {
        match value {
            OrderStatus::PendingPayment => SdkOrderStatus::PendingPayment,
            OrderStatus::Pending => SdkOrderStatus::Pending,
            OrderStatus::Completed => SdkOrderStatus::Completed,
            OrderStatus::Cancelled => SdkOrderStatus::Cancelled,
        }
    }
}

impl From<SdkOrderStatus> for OrderStatus {
    fn from(value: SdkOrderStatus) -> Self {
        match value {
            SdkOrderStatus::PendingPayment => OrderStatus::PendingPayment,
            SdkOrderStatus::Pending => OrderStatus::Pending,
            SdkOrderStatus::Completed => OrderStatus::Completed,
            SdkOrderStatus::Cancelled => OrderStatus::Cancelled,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, sqlx::Type)]
#[sqlx(rename_all = "lowercase", type_name = "payment_method")]
pub enum PaymentMethod {
    Mpesa,
    Ewallet,
    Bank,
}

impl From<PaymentMethod> for SdkPaymentMethod {
    fn from(value: PaymentMethod) -> Self {
        match value {
            PaymentMethod::Mpesa => SdkPaymentMethod::Mpesa,
            PaymentMethod::Ewallet => SdkPaymentMethod::Ewallet,
            PaymentMethod::Bank => SdkPaymentMethod::Bank,
        }
    }
}

impl From<SdkPaymentMethod> for PaymentMethod {
    fn from(value: SdkPaymentMethod) -> Self {
        match value {
            SdkPaymentMethod::Mpesa => PaymentMethod::Mpesa,
            SdkPaymentMethod::Ewallet => PaymentMethod::Ewallet,
            SdkPaymentMethod::Bank => PaymentMethod::Bank,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, sqlx::Type)]
#[sqlx(rename_all = "snake_case", type_name = "ride_status")]
pub enum RideStatus {
    PendingPayment,
    Pending,
    Confirmed,
    Cancelled,
}

impl From<RideStatus> for SdkRideStatus {
    fn from(value: RideStatus) -> Self {
        match value {
            RideStatus::PendingPayment => SdkRideStatus::PendingPayment,
            RideStatus::Pending => SdkRideStatus::Pending,
            RideStatus::Confirmed => SdkRideStatus::Confirmed,
            RideStatus::Cancelled => SdkRideStatus::Cancelled,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, sqlx::Type)]
#[sqlx(rename_all = "lowercase", type_name = "payment_status")]
pub enum PaymentStatus {
    Pending,
    Completed,
    Failed,
}

impl From<PaymentStatus> for SdkPaymentStatus {
    fn from(value: PaymentStatus) -> Self {
        match value {
            PaymentStatus::Pending => SdkPaymentStatus::Pending,
            PaymentStatus::Completed => SdkPaymentStatus::Completed,
            PaymentStatus::Failed => SdkPaymentStatus::Failed,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, sqlx::Type)]
#[sqlx(rename_all = "snake_case", type_name = "transaction_kind")]
pub enum TransactionKind {
    Deposit,
    RidePayment,
    OrderPayment,
    WalletPayment,
}

impl From<TransactionKind> for SdkTransactionKind {
    fn from(value: TransactionKind) -> Self {
        match value {
            TransactionKind::Deposit => SdkTransactionKind::Deposit,
            TransactionKind::RidePayment => SdkTransactionKind::RidePayment,
            TransactionKind::OrderPayment => SdkTransactionKind::OrderPayment,
            TransactionKind::WalletPayment => SdkTransactionKind::WalletPayment,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, sqlx::Type)]
#[sqlx(rename_all = "lowercase", type_name = "bank_payment_status")]
pub enum BankPaymentStatus {
    Pending,
    Confirmed,
    Rejected,
}

impl From<BankPaymentStatus> for SdkBankPaymentStatus {
    fn from(value: BankPaymentStatus) -> Self {
        match value {
            BankPaymentStatus::Pending => SdkBankPaymentStatus::Pending,
            BankPaymentStatus::Confirmed => SdkBankPaymentStatus::Confirmed,
            BankPaymentStatus::Rejected => SdkBankPaymentStatus::Rejected,
        }
    }
}

impl From<SdkBankPaymentStatus> for BankPaymentStatus {
    fn from(value: SdkBankPaymentStatus) -> Self {
        match value {
            SdkBankPaymentStatus::Pending => BankPaymentStatus::Pending,
            SdkBankPaymentStatus::Confirmed => BankPaymentStatus::Confirmed,
            SdkBankPaymentStatus::Rejected => BankPaymentStatus::Rejected,
        }
    }
}

/// What an STK push is paying for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, sqlx::Type)]
#[sqlx(rename_all = "snake_case", type_name = "stk_purpose")]
pub enum StkPurpose {
    WalletTopUp,
    Order,
    Ride,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, sqlx::Type)]
#[sqlx(rename_all = "lowercase", type_name = "stk_status")]
pub enum StkStatus {
    Pending,
    Completed,
    Failed,
    Expired,
}

impl StkStatus {
    /// Whether the gateway's verdict is still outstanding. Expired requests
    /// stay open so a late confirmation is still credited.
    pub fn is_open(self) -> bool {
        matches!(self, StkStatus::Pending | StkStatus::Expired)
    }
}

/// Booking type of a bank payment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, sqlx::Type)]
#[sqlx(rename_all = "lowercase", type_name = "booking_type")]
pub enum BookingType {
    Order,
    Ride,
}
