//! Gateway callback reconciliation.
//!
//! Every step of one callback runs in a single transaction. Only callbacks
//! for a recorded, still open STK request are applied, and never for more
//! than the amount that request asked for. The `deposit` ledger row keyed
//! by the `CheckoutRequestID` is inserted first; when it already exists the
//! callback is a redelivery and nothing else happens.

use crate::entities::orders::OrderRecord;
use crate::entities::profiles::find_user_by_phone;
use crate::entities::rides::RideRecord;
use crate::entities::stk_requests::StkRequestRecord;
use crate::entities::transactions::{NewTransaction, TransactionRecord};
use crate::entities::wallets::WalletRecord;
use crate::entities::{OrderStatus, PaymentStatus, RideStatus, StkPurpose, StkStatus, TransactionKind};
use crate::framework::{DatabaseProcessor, PgTx};
use crate::mpesa::{CallbackOutcome, PaymentConfirmation};
use kanau::processor::Processor;
use rust_decimal::Decimal;
use thiserror::Error;
use tracing::{info, warn};
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum ReconcileError {
    #[error("User with this phone not found.")]
    UserNotFound { phone: String },

    #[error("Unknown checkout request")]
    UnknownCheckoutRequest { checkout_request_id: String },

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// What a callback changed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reconciliation {
    /// The payment failed; anything waiting on it was cancelled.
    Failed {
        orders_cancelled: usize,
        rides_cancelled: u64,
    },
    /// The callback was already applied, or the request was already settled.
    Duplicate,
    OrdersPaid { user_id: Uuid, order_ids: Vec<Uuid> },
    RidePaid { user_id: Uuid, ride_id: Uuid },
    WalletCredited { user_id: Uuid, new_balance: Decimal },
    /// Less than the requested amount arrived. What was paid went to the
    /// wallet and the orders and rides waiting on the request were cancelled.
    Underpaid {
        user_id: Uuid,
        paid: Decimal,
        new_balance: Decimal,
    },
}

impl Processor<CallbackOutcome> for DatabaseProcessor {
    type Output = Reconciliation;
    type Error = ReconcileError;
    #[tracing::instrument(
        skip_all,
        err,
        name = "Reconcile",
        fields(checkout_request_id = %outcome.checkout_request_id())
    )]
    async fn process(&self, outcome: CallbackOutcome) -> Result<Reconciliation, ReconcileError> {
        match outcome {
            CallbackOutcome::Failed {
                checkout_request_id,
                result_code,
                result_desc,
            } => {
                self.reconcile_failure(&checkout_request_id, result_code, result_desc.as_deref())
                    .await
            }
            CallbackOutcome::Paid(confirmation) => self.reconcile_payment(confirmation).await,
        }
    }
}

/// Cancel the orders and rides still waiting on a request.
async fn cancel_waiting(
    tx: &mut PgTx,
    checkout_request_id: &str,
) -> Result<(usize, u64), sqlx::Error> {
    let orders =
        OrderRecord::settle_for_checkout(&mut **tx, checkout_request_id, OrderStatus::Cancelled)
            .await?;
    let rides = RideRecord::cancel_pending_for_checkout(&mut **tx, checkout_request_id).await?;
    Ok((orders.len(), rides))
}

impl DatabaseProcessor {
    async fn reconcile_failure(
        &self,
        checkout_request_id: &str,
        result_code: i64,
        result_desc: Option<&str>,
    ) -> Result<Reconciliation, ReconcileError> {
        let mut tx = self.begin().await?;
        let open = StkRequestRecord::finish(
            &mut *tx,
            checkout_request_id,
            StkStatus::Failed,
            result_code,
            result_desc,
            None,
        )
        .await?;
        if !open {
            tx.rollback().await?;
            info!(result_code, "Failure reported for a settled or unknown request, skipping");
            return Ok(Reconciliation::Duplicate);
        }
        let (orders_cancelled, rides_cancelled) = cancel_waiting(&mut tx, checkout_request_id).await?;
        tx.commit().await?;

        warn!(
            result_code,
            result_desc = result_desc.unwrap_or_default(),
            orders_cancelled,
            rides_cancelled,
            "Payment was not successful"
        );
        Ok(Reconciliation::Failed {
            orders_cancelled,
            rides_cancelled,
        })
    }

    async fn reconcile_payment(
        &self,
        confirmation: PaymentConfirmation,
    ) -> Result<Reconciliation, ReconcileError> {
        let checkout_request_id = confirmation.checkout_request_id.as_str();
        let mut tx = self.begin().await?;

        let Some(stk_request) = StkRequestRecord::lock(&mut *tx, checkout_request_id).await? else {
            tx.rollback().await?;
            warn!(amount = %confirmation.amount, "Confirmation for an unrecorded request");
            return Err(ReconcileError::UnknownCheckoutRequest {
                checkout_request_id: checkout_request_id.to_owned(),
            });
        };
        if !stk_request.status.is_open() {
            tx.rollback().await?;
            info!(status = ?stk_request.status, "Request already settled, skipping");
            return Ok(Reconciliation::Duplicate);
        }

        // Only anonymous prompts are attributed by the paying phone.
        let user_id = match stk_request.user_id {
            Some(user_id) => user_id,
            None => find_user_by_phone(&mut *tx, &confirmation.phone)
                .await?
                .ok_or_else(|| ReconcileError::UserNotFound {
                    phone: confirmation.phone.clone(),
                })?,
        };

        let paid = confirmation.amount.min(stk_request.amount);
        if confirmation.amount != stk_request.amount {
            warn!(
                requested = %stk_request.amount,
                reported = %confirmation.amount,
                "Callback amount differs from the requested amount"
            );
        }

        let first_delivery = TransactionRecord::insert_unique(
            &mut *tx,
            NewTransaction {
                user_id,
                kind: TransactionKind::Deposit,
                amount: paid,
                reference: checkout_request_id.to_owned(),
            },
        )
        .await?;
        if !first_delivery {
            tx.rollback().await?;
            info!("Transaction already processed, skipping");
            return Ok(Reconciliation::Duplicate);
        }

        StkRequestRecord::finish(
            &mut *tx,
            checkout_request_id,
            StkStatus::Completed,
            0,
            confirmation.result_desc.as_deref(),
            confirmation.receipt_number.as_deref(),
        )
        .await?;

        if paid < stk_request.amount {
            let (orders_cancelled, rides_cancelled) =
                cancel_waiting(&mut tx, checkout_request_id).await?;
            let new_balance = WalletRecord::credit(&mut *tx, user_id, paid).await?;
            tx.commit().await?;

            warn!(
                user_id = %user_id,
                paid = %paid,
                orders_cancelled,
                rides_cancelled,
                "Underpaid request credited to wallet"
            );
            return Ok(Reconciliation::Underpaid {
                user_id,
                paid,
                new_balance,
            });
        }

        let orders =
            OrderRecord::settle_for_checkout(&mut *tx, checkout_request_id, OrderStatus::Completed)
                .await?;
        if !orders.is_empty() {
            let total: Decimal = orders.iter().map(|order| order.total_amount).sum();
            TransactionRecord::insert_unique(
                &mut *tx,
                NewTransaction {
                    user_id,
                    kind: TransactionKind::OrderPayment,
                    amount: total,
                    reference: checkout_request_id.to_owned(),
                },
            )
            .await?;
            tx.commit().await?;

            let order_ids: Vec<Uuid> = orders.iter().map(|order| order.id).collect();
            info!(user_id = %user_id, orders = order_ids.len(), "Orders paid");
            return Ok(Reconciliation::OrdersPaid { user_id, order_ids });
        }

        // Anonymous and ride prompts may also pay the user's newest unlinked
        // pending ride.
        let allow_unlinked = stk_request.user_id.is_none() || stk_request.purpose == StkPurpose::Ride;
        if let Some(ride) = RideRecord::lock_pending_for_callback(
            &mut *tx,
            checkout_request_id,
            user_id,
            allow_unlinked,
            paid,
        )
        .await?
        {
            RideRecord::transition(
                &mut *tx,
                ride.id,
                RideStatus::PendingPayment,
                RideStatus::Confirmed,
                PaymentStatus::Completed,
            )
            .await?;
            TransactionRecord::insert_unique(
                &mut *tx,
                NewTransaction {
                    user_id,
                    kind: TransactionKind::RidePayment,
                    amount: ride.price,
                    reference: checkout_request_id.to_owned(),
                },
            )
            .await?;
            let change = paid - ride.price;
            if change > Decimal::ZERO {
                WalletRecord::credit(&mut *tx, user_id, change).await?;
            }
            tx.commit().await?;

            info!(user_id = %user_id, ride_id = %ride.id, "Ride paid");
            return Ok(Reconciliation::RidePaid {
                user_id,
                ride_id: ride.id,
            });
        }

        let new_balance = WalletRecord::credit(&mut *tx, user_id, paid).await?;
        tx.commit().await?;

        info!(
            user_id = %user_id,
            amount = %paid,
            new_balance = %new_balance,
            "Wallet credited"
        );
        Ok(Reconciliation::WalletCredited {
            user_id,
            new_balance,
        })
    }
}
