//! Cart checkout.
//!
//! One order row is written per cart line. Nothing is stored unless the
//! chosen payment step succeeds.

use crate::checkout::{CheckoutError, cart_total, line_total, push_amount};
use crate::entities::bank_payments::{BankPaymentRecord, NewBankPayment};
use crate::entities::orders::{NewOrder, OrderRecord};
use crate::entities::stk_requests::StkRequestRecord;
use crate::entities::transactions::{NewTransaction, TransactionRecord};
use crate::entities::{BookingType, OrderStatus, PaymentMethod, StkPurpose, TransactionKind};
use crate::framework::PgTx;
use crate::mpesa::Msisdn;
use crate::processors::PaymentProcessor;
use crate::wallet::debit_with_pin;
use kanau::processor::Processor;
use lipa_sdk::objects::PaymentSelection;
use lipa_sdk::objects::checkout::{CartItem, CheckoutOutcome, CheckoutRequest, CheckoutResponse};
use tracing::info;
use uuid::Uuid;

impl Processor<CheckoutRequest> for PaymentProcessor {
    type Output = CheckoutResponse;
    type Error = CheckoutError;
    #[tracing::instrument(skip_all, err, fields(user_id = %request.user_id))]
    async fn process(&self, request: CheckoutRequest) -> Result<CheckoutResponse, CheckoutError> {
        let total = cart_total(&request.items)?;
        let user_id = request.user_id;

        let (orders, outcome) = match request.payment {
            PaymentSelection::Mpesa { phone } => {
                let phone = Msisdn::parse(&phone)?;
                let push = self.push(phone, push_amount(total)?).await?;

                let mut tx = self.db.begin().await?;
                StkRequestRecord::insert(&mut *tx, push.to_stk_request(Some(user_id), StkPurpose::Order))
                    .await?;
                let orders = insert_orders(
                    &mut tx,
                    user_id,
                    &request.items,
                    OrderLink {
                        status: OrderStatus::PendingPayment,
                        payment_method: PaymentMethod::Mpesa,
                        checkout_request_id: Some(push.checkout_request_id.clone()),
                        bank_payment_id: None,
                    },
                )
                .await?;
                tx.commit().await?;

                let outcome = CheckoutOutcome::PromptSent {
                    customer_message: push.customer_message(),
                    checkout_request_id: push.checkout_request_id,
                };
                (orders, outcome)
            }
            PaymentSelection::Ewallet { pin } => {
                let mut tx = self.db.begin().await?;
                let new_balance = debit_with_pin(&mut tx, user_id, &pin, total).await?;
                let orders = insert_orders(
                    &mut tx,
                    user_id,
                    &request.items,
                    OrderLink {
                        status: OrderStatus::Completed,
                        payment_method: PaymentMethod::Ewallet,
                        checkout_request_id: None,
                        bank_payment_id: None,
                    },
                )
                .await?;
                if let Some(first) = orders.first() {
                    TransactionRecord::insert_unique(
                        &mut *tx,
                        NewTransaction {
                            user_id,
                            kind: TransactionKind::WalletPayment,
                            amount: total,
                            reference: first.id.to_string(),
                        },
                    )
                    .await?;
                }
                tx.commit().await?;

                (orders, CheckoutOutcome::Paid { new_balance })
            }
            PaymentSelection::Bank {
                bank,
                account_number,
            } => {
                let (bank, account_number) = bank_details(bank, account_number)?;

                let mut tx = self.db.begin().await?;
                let bank_payment = BankPaymentRecord::insert(
                    &mut *tx,
                    NewBankPayment {
                        user_id,
                        amount: total,
                        bank,
                        account_number,
                        booking_type: BookingType::Order,
                    },
                )
                .await?;
                let orders = insert_orders(
                    &mut tx,
                    user_id,
                    &request.items,
                    OrderLink {
                        status: OrderStatus::Pending,
                        payment_method: PaymentMethod::Bank,
                        checkout_request_id: None,
                        bank_payment_id: Some(bank_payment.id),
                    },
                )
                .await?;
                tx.commit().await?;

                let outcome = CheckoutOutcome::AwaitingBankConfirmation {
                    bank_payment_id: bank_payment.id,
                };
                (orders, outcome)
            }
        };

        info!(
            user_id = %user_id,
            orders = orders.len(),
            total = %total,
            "Checkout placed"
        );

        Ok(CheckoutResponse {
            total,
            orders: orders.into_iter().map(Into::into).collect(),
            outcome,
        })
    }
}

/// Status and payment links shared by every order of one checkout.
struct OrderLink {
    status: OrderStatus,
    payment_method: PaymentMethod,
    checkout_request_id: Option<String>,
    bank_payment_id: Option<Uuid>,
}

async fn insert_orders(
    tx: &mut PgTx,
    user_id: Uuid,
    items: &[CartItem],
    link: OrderLink,
) -> Result<Vec<OrderRecord>, CheckoutError> {
    let mut orders = Vec::with_capacity(items.len());
    for item in items {
        let quantity =
            i32::try_from(item.quantity).map_err(|_| CheckoutError::InvalidQuantity(item.product_id))?;
        let order = OrderRecord::insert(
            &mut **tx,
            NewOrder {
                user_id,
                product_id: Some(item.product_id),
                quantity,
                total_amount: line_total(item)?,
                status: link.status,
                payment_method: link.payment_method,
                confirmation_code: None,
                checkout_request_id: link.checkout_request_id.clone(),
                bank_payment_id: link.bank_payment_id,
            },
        )
        .await?;
        orders.push(order);
    }
    Ok(orders)
}

/// Trimmed bank name and account number, both required.
pub(crate) fn bank_details(
    bank: String,
    account_number: String,
) -> Result<(String, String), CheckoutError> {
    let bank = bank.trim();
    let account_number = account_number.trim();
    if bank.is_empty() || account_number.is_empty() {
        return Err(CheckoutError::MissingBankDetails);
    }
    Ok((bank.to_owned(), account_number.to_owned()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bank_details_are_required() {
        assert!(matches!(
            bank_details("  ".into(), "123".into()),
            Err(CheckoutError::MissingBankDetails)
        ));
        assert!(matches!(
            bank_details("KCB".into(), "".into()),
            Err(CheckoutError::MissingBankDetails)
        ));
        assert_eq!(
            bank_details(" KCB ".into(), " 1100223344 ".into()).unwrap(),
            ("KCB".to_string(), "1100223344".to_string())
        );
    }
}
