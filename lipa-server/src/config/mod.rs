//! Configuration module for lipa-server.
//!
//! Handles loading configuration from TOML files, CLI arguments,
//! and environment variables. Also handles admin secret hashing.

pub mod file;

use crate::config::file::{FileConfig, MpesaConfig as FileMpesaConfig};
use lipa_core::config::{
    AdminConfig, MerchantConfig, MpesaConfig, PaymentsConfig, ReceiptConfig, ServerConfig,
    SharedConfig,
};
use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::RwLock;
use url::Url;

/// Environment variables that take precedence over the `[mpesa]` section.
pub const MPESA_CONSUMER_KEY: &str = "MPESA_CONSUMER_KEY";
pub const MPESA_CONSUMER_SECRET: &str = "MPESA_CONSUMER_SECRET";
pub const MPESA_PASSKEY: &str = "MPESA_PASSKEY";
pub const MPESA_SHORTCODE: &str = "MPESA_SHORTCODE";
pub const MPESA_CALLBACK_URL: &str = "MPESA_CALLBACK_URL";

/// Errors that can occur during configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("failed to parse config file: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("failed to serialize config: {0}")]
    SerializeError(#[from] toml::ser::Error),

    #[error("validation error: {0}")]
    ValidationError(String),

    #[error("password hashing error: {0}")]
    HashError(String),

    #[error("DATABASE_URL environment variable not set")]
    MissingDatabaseUrl,
}

/// Loaded configuration result containing all parts.
pub struct LoadedConfig {
    pub server: ServerConfig,
    pub admin: AdminConfig,
    pub merchant: MerchantConfig,
    pub mpesa: MpesaConfig,
    pub payments: PaymentsConfig,
    pub receipt: ReceiptConfig,
}

impl LoadedConfig {
    /// Convert into a SharedConfig with Arc<RwLock<T>> wrappers.
    pub fn into_shared(self) -> SharedConfig {
        SharedConfig {
            server: Arc::new(RwLock::new(self.server)),
            admin: Arc::new(RwLock::new(self.admin)),
            merchant: Arc::new(RwLock::new(self.merchant)),
            mpesa: Arc::new(RwLock::new(self.mpesa)),
            payments: Arc::new(RwLock::new(self.payments)),
            receipt: Arc::new(RwLock::new(self.receipt)),
        }
    }
}

/// Configuration loader that handles the complete loading process.
pub struct ConfigLoader {
    config_path: std::path::PathBuf,
    listen_override: Option<SocketAddr>,
}

impl ConfigLoader {
    pub fn new(config_path: impl AsRef<Path>, listen_override: Option<SocketAddr>) -> Self {
        Self {
            config_path: config_path.as_ref().to_path_buf(),
            listen_override,
        }
    }

    /// Load and process the configuration.
    ///
    /// This will:
    /// 1. Read the TOML file
    /// 2. Apply CLI and environment overrides
    /// 3. Validate the configuration
    /// 4. Hash the admin secret if it's plaintext (and rewrite the file)
    /// 5. Build the loaded configuration
    ///
    /// Environment overrides are never written back to the file.
    pub fn load(&self) -> Result<LoadedConfig, ConfigError> {
        let config_content = std::fs::read_to_string(&self.config_path)?;
        let mut file_config: FileConfig = toml::from_str(&config_content)?;

        if let Some(listen) = self.listen_override {
            file_config.server.listen = listen;
        }

        let mut effective = file_config.clone();
        apply_mpesa_env(&mut effective.mpesa, |key| std::env::var(key).ok());
        validate(&effective)?;

        let secret_hash = if file_config.is_admin_secret_hashed() {
            file_config.admin.secret.clone()
        } else {
            let hash = hash_secret(&file_config.admin.secret)?;
            file_config.admin.secret = hash.clone();
            self.rewrite_config(&file_config)?;
            tracing::info!("Admin secret hashed and config file updated");
            hash
        };

        build_loaded_config(effective, secret_hash)
    }

    /// Reload the configuration (used during SIGHUP).
    pub fn reload(&self) -> Result<LoadedConfig, ConfigError> {
        self.load()
    }

    fn rewrite_config(&self, config: &FileConfig) -> Result<(), ConfigError> {
        let toml_string = toml::to_string_pretty(config)?;

        // Write atomically: write to temp file, then rename
        let temp_path = self.config_path.with_extension("toml.tmp");
        std::fs::write(&temp_path, toml_string)?;
        std::fs::rename(&temp_path, &self.config_path)?;

        Ok(())
    }
}

/// Overlay `MPESA_*` variables that are set and non-empty.
fn apply_mpesa_env(mpesa: &mut FileMpesaConfig, lookup: impl Fn(&str) -> Option<String>) {
    let var = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

    if let Some(value) = var(MPESA_CONSUMER_KEY) {
        mpesa.consumer_key = value;
    }
    if let Some(value) = var(MPESA_CONSUMER_SECRET) {
        mpesa.consumer_secret = value;
    }
    if let Some(value) = var(MPESA_PASSKEY) {
        mpesa.passkey = value;
    }
    if let Some(value) = var(MPESA_SHORTCODE) {
        mpesa.shortcode = value;
    }
    if let Some(value) = var(MPESA_CALLBACK_URL) {
        match Url::parse(value.trim()) {
            Ok(url) => mpesa.callback_url = Some(url),
            Err(e) => tracing::warn!("Ignoring invalid {}: {}", MPESA_CALLBACK_URL, e),
        }
    }
}

fn validate(config: &FileConfig) -> Result<(), ConfigError> {
    if config.merchant.secret.is_empty() {
        return Err(ConfigError::ValidationError(
            "merchant secret must not be empty".to_string(),
        ));
    }

    let mpesa = &config.mpesa;
    let required = [
        ("consumer_key", &mpesa.consumer_key),
        ("consumer_secret", &mpesa.consumer_secret),
        ("shortcode", &mpesa.shortcode),
        ("passkey", &mpesa.passkey),
    ];
    for (name, value) in required {
        if value.trim().is_empty() {
            return Err(ConfigError::ValidationError(format!(
                "mpesa {name} is not set (config file or environment)"
            )));
        }
    }
    if mpesa.callback_url.is_none() {
        return Err(ConfigError::ValidationError(format!(
            "mpesa callback_url is not set (config file or {MPESA_CALLBACK_URL})"
        )));
    }
    if mpesa.request_timeout == 0 {
        return Err(ConfigError::ValidationError(
            "mpesa request_timeout must be positive".to_string(),
        ));
    }

    if config.payments.payment_timeout == 0 || config.payments.sweep_interval == 0 {
        return Err(ConfigError::ValidationError(
            "payment_timeout and sweep_interval must be positive".to_string(),
        ));
    }
    Ok(())
}

fn hash_secret(plaintext: &str) -> Result<String, ConfigError> {
    use argon2::{
        Argon2, PasswordHasher,
        password_hash::{SaltString, rand_core::OsRng},
    };

    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    argon2
        .hash_password(plaintext.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| ConfigError::HashError(e.to_string()))
}

/// The gateway client joins relative paths onto this URL, so it must end
/// with `/`.
fn gateway_base_url(mpesa: &FileMpesaConfig) -> Result<Url, ConfigError> {
    let mut url = match &mpesa.base_url {
        Some(url) => url.clone(),
        None => Url::parse(mpesa.environment.base_url())
            .map_err(|e| ConfigError::ValidationError(format!("mpesa base url: {e}")))?,
    };
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}

fn build_loaded_config(
    file_config: FileConfig,
    secret_hash: String,
) -> Result<LoadedConfig, ConfigError> {
    let base_url = gateway_base_url(&file_config.mpesa)?;
    let mpesa = file_config.mpesa;
    let callback_url = mpesa.callback_url.ok_or_else(|| {
        ConfigError::ValidationError("mpesa callback_url is not set".to_string())
    })?;

    Ok(LoadedConfig {
        server: ServerConfig {
            listen: file_config.server.listen,
        },
        admin: AdminConfig::new(secret_hash),
        merchant: MerchantConfig::new(
            file_config.merchant.name,
            file_config.merchant.secret.into_bytes(),
        ),
        mpesa: MpesaConfig {
            base_url,
            consumer_key: mpesa.consumer_key,
            consumer_secret: mpesa.consumer_secret,
            shortcode: mpesa.shortcode,
            passkey: mpesa.passkey,
            callback_url,
            account_reference: mpesa.account_reference,
            transaction_desc: mpesa.transaction_desc,
            till_number: mpesa.till_number,
            request_timeout: Duration::from_secs(mpesa.request_timeout),
        },
        payments: PaymentsConfig {
            payment_timeout: Duration::from_secs(file_config.payments.payment_timeout),
            sweep_interval: Duration::from_secs(file_config.payments.sweep_interval),
        },
        receipt: ReceiptConfig {
            business_name: file_config.receipt.business_name,
            footer_lines: file_config.receipt.footer_lines,
            paper_width: file_config.receipt.paper_width,
        },
    })
}

/// Get the database URL from the environment.
pub fn get_database_url() -> Result<String, ConfigError> {
    std::env::var("DATABASE_URL").map_err(|_| ConfigError::MissingDatabaseUrl)
}
