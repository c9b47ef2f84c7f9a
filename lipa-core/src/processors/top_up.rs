//! Wallet top-ups: by push prompt, or by a till payment a staff member
//! approves.

use crate::checkout::{CheckoutError, normalize_confirmation_code};
use crate::entities::orders::{NewOrder, OrderRecord};
use crate::entities::stk_requests::StkRequestRecord;
use crate::entities::transactions::{NewTransaction, TransactionRecord};
use crate::entities::wallets::WalletRecord;
use crate::entities::{OrderStatus, PaymentMethod, StkPurpose, TransactionKind};
use crate::framework::DatabaseProcessor;
use crate::mpesa::{Msisdn, whole_shillings};
use crate::processors::PaymentProcessor;
use crate::processors::bank_payments::StaffActionError;
use kanau::processor::Processor;
use lipa_sdk::objects::wallet::{ManualTopUpRequest, StkTopUpRequest, StkTopUpResponse};
use rust_decimal::Decimal;
use tracing::info;
use uuid::Uuid;

impl Processor<StkTopUpRequest> for PaymentProcessor {
    type Output = StkTopUpResponse;
    type Error = CheckoutError;
    #[tracing::instrument(skip_all, err, fields(user_id = %request.user_id))]
    async fn process(&self, request: StkTopUpRequest) -> Result<StkTopUpResponse, CheckoutError> {
        let phone = Msisdn::parse(&request.phone)?;
        let amount = whole_shillings(request.amount)?;
        let push = self.push(phone, amount).await?;

        StkRequestRecord::insert(
            &self.db.pool,
            push.to_stk_request(Some(request.user_id), StkPurpose::WalletTopUp),
        )
        .await?;

        Ok(StkTopUpResponse {
            customer_message: push.customer_message(),
            checkout_request_id: push.checkout_request_id,
        })
    }
}

/// Store a pending top-up order carrying the till confirmation code.
///
/// The amount is unknown until staff check the till statement, so the order
/// starts at zero.
impl Processor<ManualTopUpRequest> for DatabaseProcessor {
    type Output = OrderRecord;
    type Error = CheckoutError;
    #[tracing::instrument(skip_all, err, name = "SQL:InsertManualTopUp")]
    async fn process(&self, request: ManualTopUpRequest) -> Result<OrderRecord, CheckoutError> {
        let code = normalize_confirmation_code(&request.confirmation_code)?;
        let inserted = OrderRecord::insert(
            &self.pool,
            NewOrder {
                user_id: request.user_id,
                product_id: None,
                quantity: 1,
                total_amount: Decimal::ZERO,
                status: OrderStatus::Pending,
                payment_method: PaymentMethod::Mpesa,
                confirmation_code: Some(code),
                checkout_request_id: None,
                bank_payment_id: None,
            },
        )
        .await;

        match inserted {
            Ok(order) => Ok(order),
            Err(sqlx::Error::Database(e)) if e.is_unique_violation() => {
                Err(CheckoutError::DuplicateConfirmationCode)
            }
            Err(e) => Err(e.into()),
        }
    }
}

/// Staff approval of a manual top-up with the amount seen on the till.
#[derive(Debug, Clone)]
pub struct ApproveTopUp {
    pub order_id: Uuid,
    pub amount: Decimal,
}

#[derive(Debug, Clone)]
pub struct ApprovedTopUp {
    pub order: OrderRecord,
    pub new_balance: Decimal,
}

impl Processor<ApproveTopUp> for DatabaseProcessor {
    type Output = ApprovedTopUp;
    type Error = StaffActionError;
    #[tracing::instrument(skip_all, err, fields(order_id = %approval.order_id))]
    async fn process(&self, approval: ApproveTopUp) -> Result<ApprovedTopUp, StaffActionError> {
        if approval.amount <= Decimal::ZERO {
            return Err(StaffActionError::InvalidAmount);
        }

        let mut tx = self.begin().await?;
        let order = OrderRecord::lock_by_id(&mut *tx, approval.order_id)
            .await?
            .ok_or(StaffActionError::OrderNotFound)?;
        let Some(code) = order.confirmation_code.clone() else {
            return Err(StaffActionError::NotATopUp);
        };
        if order.product_id.is_some() {
            return Err(StaffActionError::NotATopUp);
        }
        if order.status != OrderStatus::Pending {
            return Err(StaffActionError::NotPending);
        }

        let recorded = TransactionRecord::insert_unique(
            &mut *tx,
            NewTransaction {
                user_id: order.user_id,
                kind: TransactionKind::Deposit,
                amount: approval.amount,
                reference: code,
            },
        )
        .await?;
        if !recorded {
            return Err(StaffActionError::AlreadyApproved);
        }

        let order = OrderRecord::complete_with_amount(&mut *tx, order.id, approval.amount).await?;
        let new_balance = WalletRecord::credit(&mut *tx, order.user_id, approval.amount).await?;
        tx.commit().await?;

        info!(
            order_id = %order.id,
            user_id = %order.user_id,
            amount = %approval.amount,
            "Manual top-up approved"
        );
        Ok(ApprovedTopUp { order, new_balance })
    }
}
