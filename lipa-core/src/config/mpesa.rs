//! M-Pesa (Daraja) gateway configuration.

use std::time::Duration;
use url::Url;

/// Which Daraja deployment to talk to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MpesaEnvironment {
    Sandbox,
    Production,
}

impl MpesaEnvironment {
    pub fn base_url(self) -> &'static str {
        match self {
            MpesaEnvironment::Sandbox => "https://sandbox.safaricom.co.ke",
            MpesaEnvironment::Production => "https://api.safaricom.co.ke",
        }
    }
}

#[derive(Debug, Clone)]
pub struct MpesaConfig {
    /// Root URL of the gateway API.
    pub base_url: Url,
    pub consumer_key: String,
    pub consumer_secret: String,
    /// Paybill number prompts are billed to.
    pub shortcode: String,
    pub passkey: String,
    /// Where the gateway posts the payment outcome.
    pub callback_url: Url,
    pub account_reference: String,
    pub transaction_desc: String,
    /// Till number shown to customers paying by hand ("Buy Goods").
    pub till_number: Option<String>,
    /// Timeout for each outbound gateway call.
    pub request_timeout: Duration,
}
