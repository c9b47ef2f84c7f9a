//! Validated runtime configuration.
//!
//! The server crate parses the TOML file and environment overrides and
//! builds these types; everything downstream reads them through
//! [`SharedConfig`].

mod admin;
mod merchant;
mod mpesa;
mod payments;
mod receipt;
mod server;

pub use admin::AdminConfig;
pub use merchant::MerchantConfig;
pub use mpesa::{MpesaConfig, MpesaEnvironment};
pub use payments::PaymentsConfig;
pub use receipt::ReceiptConfig;
pub use server::ServerConfig;

use std::sync::Arc;
use tokio::sync::RwLock;

/// Shared configuration state with separate locks for each section.
///
/// This allows independent access to different configuration sections
/// without blocking other readers/writers.
#[derive(Clone)]
pub struct SharedConfig {
    /// Server configuration (listen address).
    pub server: Arc<RwLock<ServerConfig>>,
    /// Admin configuration (authentication).
    pub admin: Arc<RwLock<AdminConfig>>,
    /// Storefront signing secret.
    pub merchant: Arc<RwLock<MerchantConfig>>,
    /// Gateway credentials and push-payment defaults.
    pub mpesa: Arc<RwLock<MpesaConfig>>,
    /// Payment timeouts.
    pub payments: Arc<RwLock<PaymentsConfig>>,
    /// Receipt branding.
    pub receipt: Arc<RwLock<ReceiptConfig>>,
}
