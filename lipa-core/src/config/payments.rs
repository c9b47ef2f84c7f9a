use std::time::Duration;

/// Timeouts for payments that wait on the gateway.
#[derive(Debug, Clone)]
pub struct PaymentsConfig {
    /// How long an STK request may stay unanswered before it expires.
    pub payment_timeout: Duration,
    /// How often the expiry sweeper runs.
    pub sweep_interval: Duration,
}

impl Default for PaymentsConfig {
    fn default() -> Self {
        Self {
            payment_timeout: Duration::from_secs(15 * 60),
            sweep_interval: Duration::from_secs(60),
        }
    }
}
