//! Payment flows and background tasks.
//!
//! - `PaymentProcessor`: checkout, ride booking, top-ups and staff actions
//! - `reconcile`: applies gateway callbacks to orders, rides and wallets
//! - `PaymentExpirySweeper`: expires push prompts the gateway never answered

pub mod bank_payments;
pub mod checkout;
pub mod payment_expiry;
pub mod reconcile;
pub mod rides;
pub mod top_up;

pub use bank_payments::{ConfirmBankPayment, StaffActionError};
pub use payment_expiry::PaymentExpirySweeper;
pub use reconcile::{ReconcileError, Reconciliation};
pub use top_up::{ApproveTopUp, ApprovedTopUp};

use crate::checkout::CheckoutError;
use crate::entities::StkPurpose;
use crate::entities::stk_requests::NewStkRequest;
use crate::framework::DatabaseProcessor;
use crate::mpesa::{DarajaClient, Msisdn, StkPushResult};
use rust_decimal::Decimal;
use uuid::Uuid;

/// Runs the paying flows against the database and the gateway.
#[derive(Clone)]
pub struct PaymentProcessor {
    pub db: DatabaseProcessor,
    pub gateway: DarajaClient,
}

/// A push prompt the gateway accepted.
#[derive(Debug, Clone)]
pub struct AcceptedPush {
    pub phone: Msisdn,
    pub amount: u64,
    pub checkout_request_id: String,
    pub result: StkPushResult,
}

impl AcceptedPush {
    pub fn customer_message(&self) -> Option<String> {
        self.result.ack.customer_message.clone()
    }

    pub fn to_stk_request(&self, user_id: Option<Uuid>, purpose: StkPurpose) -> NewStkRequest {
        NewStkRequest {
            checkout_request_id: self.checkout_request_id.clone(),
            merchant_request_id: self.result.ack.merchant_request_id.clone(),
            user_id,
            phone: self.phone.to_string(),
            amount: Decimal::from(self.amount),
            purpose,
        }
    }
}

impl PaymentProcessor {
    pub fn new(db: DatabaseProcessor, gateway: DarajaClient) -> Self {
        Self { db, gateway }
    }

    /// Push a prompt and insist on a `CheckoutRequestID` to reconcile by.
    pub async fn push(&self, phone: Msisdn, amount: u64) -> Result<AcceptedPush, CheckoutError> {
        let result = self.gateway.stk_push(&phone, amount).await?;
        let Some(checkout_request_id) = result.ack.checkout_request_id.clone() else {
            return Err(CheckoutError::PushNotAccepted(result.raw.to_string()));
        };
        Ok(AcceptedPush {
            phone,
            amount,
            checkout_request_id,
            result,
        })
    }
}
