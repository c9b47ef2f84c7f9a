//! Staff confirmation of bank transfers.

use crate::entities::bank_payments::{BankPaymentRecord, GetBankPaymentById};
use crate::entities::orders::OrderRecord;
use crate::entities::rides::RideRecord;
use crate::entities::{PaymentStatus, RideStatus};
use crate::framework::DatabaseProcessor;
use kanau::processor::Processor;
use thiserror::Error;
use tracing::{info, warn};
use uuid::Uuid;

/// Errors from staff actions on orders and bank payments.
#[derive(Debug, Error)]
pub enum StaffActionError {
    #[error("order not found")]
    OrderNotFound,

    #[error("bank payment not found")]
    BankPaymentNotFound,

    #[error("order is not a manual top-up")]
    NotATopUp,

    #[error("not pending")]
    NotPending,

    #[error("top-up has already been approved")]
    AlreadyApproved,

    #[error("amount must be positive")]
    InvalidAmount,

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

#[derive(Debug, Clone)]
pub struct ConfirmBankPayment {
    pub bank_payment_id: Uuid,
}

impl Processor<ConfirmBankPayment> for DatabaseProcessor {
    type Output = BankPaymentRecord;
    type Error = StaffActionError;
    #[tracing::instrument(skip_all, err, fields(bank_payment_id = %confirm.bank_payment_id))]
    async fn process(
        &self,
        confirm: ConfirmBankPayment,
    ) -> Result<BankPaymentRecord, StaffActionError> {
        let mut tx = self.begin().await?;
        let Some(payment) = BankPaymentRecord::confirm(&mut *tx, confirm.bank_payment_id).await?
        else {
            tx.rollback().await?;
            let existing = self
                .process(GetBankPaymentById {
                    bank_payment_id: confirm.bank_payment_id,
                })
                .await?;
            return Err(match existing {
                Some(_) => StaffActionError::NotPending,
                None => StaffActionError::BankPaymentNotFound,
            });
        };

        let orders = OrderRecord::complete_for_bank_payment(&mut *tx, payment.id).await?;
        let mut ride_confirmed = false;
        if let Some(ride_id) = payment.ride_id {
            ride_confirmed = RideRecord::transition(
                &mut *tx,
                ride_id,
                RideStatus::Pending,
                RideStatus::Confirmed,
                PaymentStatus::Completed,
            )
            .await?
            .is_some();
            if !ride_confirmed {
                warn!(ride_id = %ride_id, "Linked ride is no longer pending; left unchanged");
            }
        }
        tx.commit().await?;

        info!(
            bank_payment_id = %payment.id,
            orders_completed = orders,
            ride_id = ?payment.ride_id,
            ride_confirmed,
            "Bank payment confirmed"
        );
        Ok(payment)
    }
}
