//! TOML file configuration structures.
//!
//! These structs directly map to the `lipa-config.toml` file format.

use lipa_core::config::MpesaEnvironment;
use serde::{Deserialize, Serialize};
use std::net::{Ipv4Addr, SocketAddr};
use url::Url;

/// Root configuration structure as read from the TOML file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileConfig {
    pub server: ServerConfig,
    pub admin: AdminConfig,
    pub merchant: MerchantConfig,
    pub mpesa: MpesaConfig,
    #[serde(default)]
    pub payments: PaymentsConfig,
    #[serde(default)]
    pub receipt: ReceiptConfig,
}

/// Server configuration section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// The address and port to listen on (e.g., "0.0.0.0:8080").
    #[serde(default = "default_listen_addr")]
    pub listen: SocketAddr,
}

fn default_listen_addr() -> SocketAddr {
    SocketAddr::from((Ipv4Addr::UNSPECIFIED, 8080))
}

/// Admin configuration section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdminConfig {
    /// The admin secret. If this is plaintext (doesn't start with `$argon2`),
    /// it will be hashed and the config file will be rewritten.
    pub secret: String,
}

/// Storefront that signs Service API requests.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MerchantConfig {
    pub name: String,
    /// Secret key for signing API requests.
    pub secret: String,
}

/// M-Pesa (Daraja) section. Credentials may be left empty here and supplied
/// through `MPESA_*` environment variables instead.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MpesaConfig {
    #[serde(default = "default_environment")]
    pub environment: MpesaEnvironment,
    /// Overrides the URL implied by `environment`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<Url>,
    #[serde(default)]
    pub consumer_key: String,
    #[serde(default)]
    pub consumer_secret: String,
    #[serde(default)]
    pub shortcode: String,
    #[serde(default)]
    pub passkey: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub callback_url: Option<Url>,
    #[serde(default = "default_account_reference")]
    pub account_reference: String,
    #[serde(default = "default_transaction_desc")]
    pub transaction_desc: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub till_number: Option<String>,
    /// Seconds.
    #[serde(default = "default_request_timeout")]
    pub request_timeout: u64,
}

fn default_environment() -> MpesaEnvironment {
    MpesaEnvironment::Sandbox
}

fn default_account_reference() -> String {
    "Lipa".to_string()
}

fn default_transaction_desc() -> String {
    "Order Payment".to_string()
}

fn default_request_timeout() -> u64 {
    30
}

/// Payment expiry section. Seconds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentsConfig {
    #[serde(default = "default_payment_timeout")]
    pub payment_timeout: u64,
    #[serde(default = "default_sweep_interval")]
    pub sweep_interval: u64,
}

fn default_payment_timeout() -> u64 {
    15 * 60
}

fn default_sweep_interval() -> u64 {
    60
}

impl Default for PaymentsConfig {
    fn default() -> Self {
        Self {
            payment_timeout: default_payment_timeout(),
            sweep_interval: default_sweep_interval(),
        }
    }
}

/// Receipt branding section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReceiptConfig {
    #[serde(default = "default_business_name")]
    pub business_name: String,
    #[serde(default = "default_footer_lines")]
    pub footer_lines: Vec<String>,
    #[serde(default = "default_paper_width")]
    pub paper_width: usize,
}

fn default_business_name() -> String {
    "LIPA".to_string()
}

fn default_footer_lines() -> Vec<String> {
    vec![
        "Thank you for your business!".to_string(),
        "Visit us again".to_string(),
    ]
}

fn default_paper_width() -> usize {
    48
}

impl Default for ReceiptConfig {
    fn default() -> Self {
        Self {
            business_name: default_business_name(),
            footer_lines: default_footer_lines(),
            paper_width: default_paper_width(),
        }
    }
}

impl FileConfig {
    /// Check if the admin secret is already hashed (argon2 format).
    pub fn is_admin_secret_hashed(&self) -> bool {
        self.admin.secret.starts_with("$argon2")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_parsing() {
        let toml_str = r#"
[server]
listen = "127.0.0.1:3000"

[admin]
secret = "test-secret"

[merchant]
name = "Test Store"
secret = "secret123"

[mpesa]
environment = "production"
consumer_key = "key"
consumer_secret = "secret"
shortcode = "174379"
passkey = "pass"
callback_url = "https://shop.example.com/api/mpesa/callback"
till_number = "5432100"
"#;
        let config: FileConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.server.listen.port(), 3000);
        assert_eq!(config.merchant.name, "Test Store");
        assert_eq!(config.mpesa.environment, MpesaEnvironment::Production);
        assert_eq!(config.mpesa.account_reference, "Lipa");
        assert_eq!(config.mpesa.request_timeout, 30);
        assert_eq!(config.payments.payment_timeout, 900);
        assert_eq!(config.receipt.paper_width, 48);
        assert!(!config.is_admin_secret_hashed());
    }

    #[test]
    fn test_credentials_may_be_omitted() {
        let toml_str = r#"
[server]

[admin]
secret = "test-secret"

[merchant]
name = "Test Store"
secret = "secret123"

[mpesa]

[receipt]
business_name = "DUKA LTD"
paper_width = 32
"#;
        let config: FileConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.server.listen, default_listen_addr());
        assert_eq!(config.mpesa.environment, MpesaEnvironment::Sandbox);
        assert!(config.mpesa.consumer_key.is_empty());
        assert!(config.mpesa.callback_url.is_none());
        assert_eq!(config.receipt.business_name, "DUKA LTD");
        assert_eq!(config.receipt.footer_lines.len(), 2);
    }

    #[test]
    fn test_hashed_secret_detection() {
        let mut config: FileConfig = toml::from_str(
            r#"
[server]
[admin]
secret = "$argon2id$v=19$m=19456,t=2,p=1$abc123"
[merchant]
name = "Test Store"
secret = "secret123"
[mpesa]
"#,
        )
        .unwrap();
        assert!(config.is_admin_secret_hashed());

        config.admin.secret = "plain".to_string();
        assert!(!config.is_admin_secret_hashed());
    }
}
