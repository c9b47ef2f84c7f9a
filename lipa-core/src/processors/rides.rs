//! Ride booking.

use crate::checkout::{CheckoutError, check_amount, push_amount};
use crate::entities::bank_payments::{BankPaymentRecord, NewBankPayment};
use crate::entities::rides::{NewRide, RideRecord};
use crate::entities::stk_requests::StkRequestRecord;
use crate::entities::transactions::{NewTransaction, TransactionRecord};
use crate::entities::{
    BookingType, PaymentMethod, PaymentStatus, RideStatus, StkPurpose, TransactionKind,
};
use crate::mpesa::Msisdn;
use crate::processors::PaymentProcessor;
use crate::processors::checkout::bank_details;
use crate::wallet::debit_with_pin;
use kanau::processor::Processor;
use lipa_sdk::objects::PaymentSelection;
use lipa_sdk::objects::checkout::CheckoutOutcome;
use lipa_sdk::objects::ride::{BookRideRequest, BookRideResponse};
use rust_decimal::Decimal;
use tracing::info;

impl Processor<BookRideRequest> for PaymentProcessor {
    type Output = BookRideResponse;
    type Error = CheckoutError;
    #[tracing::instrument(skip_all, err, fields(user_id = %request.user_id))]
    async fn process(&self, request: BookRideRequest) -> Result<BookRideResponse, CheckoutError> {
        if request.price <= Decimal::ZERO {
            return Err(CheckoutError::NonPositivePrice);
        }
        check_amount(request.price)?;
        let user_id = request.user_id;
        let new_ride = |status: RideStatus,
                        payment_method: PaymentMethod,
                        payment_status: PaymentStatus,
                        checkout_request_id: Option<String>| NewRide {
            user_id,
            pickup_location: request.pickup.clone(),
            dropoff_location: request.dropoff.clone(),
            vehicle_class: request.vehicle_class.clone(),
            vehicle_id: request.vehicle_id,
            price: request.price,
            status,
            payment_method,
            payment_status,
            checkout_request_id,
        };

        let (ride, outcome) = match &request.payment {
            PaymentSelection::Mpesa { phone } => {
                let phone = Msisdn::parse(phone)?;
                let push = self.push(phone, push_amount(request.price)?).await?;

                let mut tx = self.db.begin().await?;
                StkRequestRecord::insert(&mut *tx, push.to_stk_request(Some(user_id), StkPurpose::Ride))
                    .await?;
                let ride = RideRecord::insert(
                    &mut *tx,
                    new_ride(
                        RideStatus::PendingPayment,
                        PaymentMethod::Mpesa,
                        PaymentStatus::Pending,
                        Some(push.checkout_request_id.clone()),
                    ),
                )
                .await?;
                tx.commit().await?;

                let outcome = CheckoutOutcome::PromptSent {
                    customer_message: push.customer_message(),
                    checkout_request_id: push.checkout_request_id,
                };
                (ride, outcome)
            }
            PaymentSelection::Ewallet { pin } => {
                let mut tx = self.db.begin().await?;
                let new_balance = debit_with_pin(&mut tx, user_id, pin, request.price).await?;
                let ride = RideRecord::insert(
                    &mut *tx,
                    new_ride(
                        RideStatus::Confirmed,
                        PaymentMethod::Ewallet,
                        PaymentStatus::Completed,
                        None,
                    ),
                )
                .await?;
                TransactionRecord::insert_unique(
                    &mut *tx,
                    NewTransaction {
                        user_id,
                        kind: TransactionKind::WalletPayment,
                        amount: request.price,
                        reference: ride.id.to_string(),
                    },
                )
                .await?;
                tx.commit().await?;

                (ride, CheckoutOutcome::Paid { new_balance })
            }
            PaymentSelection::Bank {
                bank,
                account_number,
            } => {
                let (bank, account_number) = bank_details(bank.clone(), account_number.clone())?;

                let mut tx = self.db.begin().await?;
                let bank_payment = BankPaymentRecord::insert(
                    &mut *tx,
                    NewBankPayment {
                        user_id,
                        amount: request.price,
                        bank,
                        account_number,
                        booking_type: BookingType::Ride,
                    },
                )
                .await?;
                let ride = RideRecord::insert(
                    &mut *tx,
                    new_ride(
                        RideStatus::Pending,
                        PaymentMethod::Bank,
                        PaymentStatus::Pending,
                        None,
                    ),
                )
                .await?;
                BankPaymentRecord::attach_ride(&mut *tx, bank_payment.id, ride.id).await?;
                tx.commit().await?;

                let outcome = CheckoutOutcome::AwaitingBankConfirmation {
                    bank_payment_id: bank_payment.id,
                };
                (ride, outcome)
            }
        };

        info!(
            ride_id = %ride.id,
            status = ?ride.status,
            payment_method = ?ride.payment_method,
            "Ride booked"
        );

        Ok(BookRideResponse {
            ride: ride.into(),
            outcome,
        })
    }
}
