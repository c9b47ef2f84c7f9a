//! M-Pesa Daraja gateway: OAuth, STK push and callback parsing.

mod callback;
mod client;
mod password;
mod phone;

pub use callback::{CallbackError, CallbackOutcome, PaymentConfirmation};
pub use client::{DarajaClient, GatewayError, StkPushResult};
pub use password::{stk_password, stk_timestamp};
pub use phone::{InvalidAmount, InvalidPhone, Msisdn, whole_shillings};
