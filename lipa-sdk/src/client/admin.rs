//! Admin API client (staff dashboard → Lipa server).
//!
//! All requests carry the plaintext admin secret in the
//! `Lipa-Admin-Authorization` header.

use reqwest::Client;
use url::Url;
use uuid::Uuid;

use super::{ClientError, parse_response};
use crate::objects::OrderStatus;
use crate::objects::admin::{
    AdminOrderResponse, AdminWalletResponse, ApproveTopUpRequest, BankPaymentResponse,
    ListBankPaymentsQuery, ListOrdersQuery, Paginated, UpdateOrderStatusRequest,
};
use crate::signature::ADMIN_AUTH_HEADER;

/// Typed HTTP client for the Lipa **Admin API**.
#[derive(Debug, Clone)]
pub struct AdminClient {
    http: Client,
    base_url: Url,
    admin_secret: String,
}

impl AdminClient {
    pub fn new(base_url: Url, admin_secret: impl Into<String>) -> Self {
        Self {
            http: Client::new(),
            base_url,
            admin_secret: admin_secret.into(),
        }
    }

    /// Replace the default `reqwest::Client` with a custom one.
    pub fn with_http_client(mut self, client: Client) -> Self {
        self.http = client;
        self
    }

    /// `GET /api/v1/admin/orders`
    pub async fn list_orders(
        &self,
        query: &ListOrdersQuery,
    ) -> Result<Paginated<AdminOrderResponse>, ClientError> {
        let url = self.base_url.join("/api/v1/admin/orders")?;
        let resp = self
            .http
            .get(url)
            .header(ADMIN_AUTH_HEADER, &self.admin_secret)
            .query(query)
            .send()
            .await?;
        parse_response(resp).await
    }

    /// `POST /api/v1/admin/orders/{order_id}/status`
    pub async fn update_order_status(
        &self,
        order_id: Uuid,
        status: OrderStatus,
    ) -> Result<AdminOrderResponse, ClientError> {
        let url = self
            .base_url
            .join(&format!("/api/v1/admin/orders/{order_id}/status"))?;
        let resp = self
            .http
            .post(url)
            .header(ADMIN_AUTH_HEADER, &self.admin_secret)
            .json(&UpdateOrderStatusRequest { status })
            .send()
            .await?;
        parse_response(resp).await
    }

    /// `POST /api/v1/admin/orders/{order_id}/approve-top-up`
    pub async fn approve_top_up(
        &self,
        order_id: Uuid,
        request: &ApproveTopUpRequest,
    ) -> Result<AdminOrderResponse, ClientError> {
        let url = self
            .base_url
            .join(&format!("/api/v1/admin/orders/{order_id}/approve-top-up"))?;
        let resp = self
            .http
            .post(url)
            .header(ADMIN_AUTH_HEADER, &self.admin_secret)
            .json(request)
            .send()
            .await?;
        parse_response(resp).await
    }

    /// `GET /api/v1/admin/bank-payments`
    pub async fn list_bank_payments(
        &self,
        query: &ListBankPaymentsQuery,
    ) -> Result<Paginated<BankPaymentResponse>, ClientError> {
        let url = self.base_url.join("/api/v1/admin/bank-payments")?;
        let resp = self
            .http
            .get(url)
            .header(ADMIN_AUTH_HEADER, &self.admin_secret)
            .query(query)
            .send()
            .await?;
        parse_response(resp).await
    }

    /// `POST /api/v1/admin/bank-payments/{id}/confirm`
    pub async fn confirm_bank_payment(
        &self,
        bank_payment_id: Uuid,
    ) -> Result<BankPaymentResponse, ClientError> {
        let url = self
            .base_url
            .join(&format!("/api/v1/admin/bank-payments/{bank_payment_id}/confirm"))?;
        let resp = self
            .http
            .post(url)
            .header(ADMIN_AUTH_HEADER, &self.admin_secret)
            .send()
            .await?;
        parse_response(resp).await
    }

    /// `GET /api/v1/admin/wallets/{user_id}`
    pub async fn show_wallet(&self, user_id: Uuid) -> Result<AdminWalletResponse, ClientError> {
        let url = self
            .base_url
            .join(&format!("/api/v1/admin/wallets/{user_id}"))?;
        let resp = self
            .http
            .get(url)
            .header(ADMIN_AUTH_HEADER, &self.admin_secret)
            .send()
            .await?;
        parse_response(resp).await
    }
}
