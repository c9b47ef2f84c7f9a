//! Wallet PIN handling and PIN-authorised debits.

use crate::entities::wallets::WalletRecord;
use crate::framework::PgTx;
use argon2::{
    Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
    password_hash::{SaltString, rand_core::OsRng},
};
use rust_decimal::Decimal;
use thiserror::Error;
use uuid::Uuid;

pub const PIN_LENGTH: usize = 4;

/// Errors surfaced by the wallet flows. The messages are shown to customers
/// as-is.
#[derive(Debug, Error)]
pub enum WalletError {
    #[error("PINs do not match")]
    PinMismatch,

    #[error("PIN must be 4 digits")]
    PinFormat,

    #[error("Wallet not found")]
    NotFound,

    /// The customer must set a PIN before paying from the wallet.
    #[error("PIN not set")]
    PinNotSet,

    #[error("Please enter your wallet PIN")]
    PinRequired,

    #[error("Invalid PIN")]
    InvalidPin,

    #[error("Insufficient wallet balance")]
    InsufficientBalance,

    #[error("failed to hash PIN: {0}")]
    Hash(String),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Check a new PIN and its confirmation.
pub fn validate_new_pin(pin: &str, confirm_pin: &str) -> Result<(), WalletError> {
    if pin != confirm_pin {
        return Err(WalletError::PinMismatch);
    }
    if pin.len() != PIN_LENGTH || !pin.bytes().all(|b| b.is_ascii_digit()) {
        return Err(WalletError::PinFormat);
    }
    Ok(())
}

pub fn hash_pin(pin: &str) -> Result<String, WalletError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(pin.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| WalletError::Hash(e.to_string()))
}

pub fn verify_pin(pin_hash: &str, pin: &str) -> bool {
    let Ok(parsed) = PasswordHash::new(pin_hash) else {
        return false;
    };
    Argon2::default()
        .verify_password(pin.as_bytes(), &parsed)
        .is_ok()
}

/// Debit `amount` from the user's wallet after checking the PIN.
///
/// Runs inside the caller's transaction so the orders or ride paid for are
/// committed together with the debit. Returns the new balance.
#[tracing::instrument(skip(tx, pin), err)]
pub async fn debit_with_pin(
    tx: &mut PgTx,
    user_id: Uuid,
    pin: &str,
    amount: Decimal,
) -> Result<Decimal, WalletError> {
    let wallet = WalletRecord::lock(&mut **tx, user_id)
        .await?
        .ok_or(WalletError::NotFound)?;
    let Some(pin_hash) = wallet.pin_hash.as_deref() else {
        return Err(WalletError::PinNotSet);
    };
    if pin.is_empty() {
        return Err(WalletError::PinRequired);
    }
    if !verify_pin(pin_hash, pin) {
        return Err(WalletError::InvalidPin);
    }

    WalletRecord::debit(&mut **tx, user_id, amount)
        .await?
        .ok_or(WalletError::InsufficientBalance)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mismatch_is_reported_before_format() {
        assert!(matches!(
            validate_new_pin("12a4", "1234"),
            Err(WalletError::PinMismatch)
        ));
        assert_eq!(
            validate_new_pin("1234", "4321").unwrap_err().to_string(),
            "PINs do not match"
        );
    }

    #[test]
    fn test_pin_must_be_four_ascii_digits() {
        for pin in ["123", "12345", "12a4", "", "١٢٣٤"] {
            let err = validate_new_pin(pin, pin).unwrap_err();
            assert_eq!(err.to_string(), "PIN must be 4 digits", "{pin}");
        }
        assert!(validate_new_pin("0000", "0000").is_ok());
    }

    #[test]
    fn test_hash_verifies_only_the_same_pin() {
        let hash = hash_pin("4821").unwrap();
        assert!(hash.starts_with("$argon2"));
        assert!(!hash.contains("4821"));
        assert!(verify_pin(&hash, "4821"));
        assert!(!verify_pin(&hash, "4820"));
        assert!(!verify_pin("4821", "4821"));
    }

    #[test]
    fn test_customer_facing_messages() {
        assert_eq!(WalletError::NotFound.to_string(), "Wallet not found");
        assert_eq!(WalletError::PinNotSet.to_string(), "PIN not set");
        assert_eq!(
            WalletError::PinRequired.to_string(),
            "Please enter your wallet PIN"
        );
        assert_eq!(WalletError::InvalidPin.to_string(), "Invalid PIN");
        assert_eq!(
            WalletError::InsufficientBalance.to_string(),
            "Insufficient wallet balance"
        );
    }
}

#[cfg(test)]
mod debit_tests {
    use super::*;
    use crate::entities::wallets::GetWallet;
    use crate::framework::DatabaseProcessor;
    use kanau::processor::Processor;
    use sqlx::PgPool;

    async fn wallet_with(pool: &PgPool, balance: i64, pin: Option<&str>) -> Uuid {
        let user_id = Uuid::new_v4();
        let pin_hash = pin.map(|pin| hash_pin(pin).unwrap());
        sqlx::query("INSERT INTO wallets (user_id, balance, pin_hash) VALUES ($1, $2, $3)")
            .bind(user_id)
            .bind(Decimal::from(balance))
            .bind(pin_hash)
            .execute(pool)
            .await
            .unwrap();
        user_id
    }

    async fn debit(pool: &PgPool, user_id: Uuid, pin: &str, amount: i64) -> Result<Decimal, WalletError> {
        let mut tx = pool.begin().await.unwrap();
        let result = debit_with_pin(&mut tx, user_id, pin, Decimal::from(amount)).await;
        if result.is_ok() {
            tx.commit().await.unwrap();
        }
        result
    }

    async fn balance(pool: &PgPool, user_id: Uuid) -> Decimal {
        DatabaseProcessor::new(pool.clone())
            .process(GetWallet { user_id })
            .await
            .unwrap()
            .unwrap()
            .balance
    }

    #[sqlx::test(migrations = "../migrations")]
    async fn test_debit_within_balance(pool: PgPool) {
        let user_id = wallet_with(&pool, 500, Some("4821")).await;
        assert_eq!(debit(&pool, user_id, "4821", 500).await.unwrap(), Decimal::ZERO);
        assert_eq!(balance(&pool, user_id).await, Decimal::ZERO);
    }

    #[sqlx::test(migrations = "../migrations")]
    async fn test_insufficient_balance_leaves_wallet_unchanged(pool: PgPool) {
        let user_id = wallet_with(&pool, 499, Some("4821")).await;
        assert!(matches!(
            debit(&pool, user_id, "4821", 500).await,
            Err(WalletError::InsufficientBalance)
        ));
        assert_eq!(balance(&pool, user_id).await, Decimal::from(499));
    }

    #[sqlx::test(migrations = "../migrations")]
    async fn test_wrong_pin_leaves_wallet_unchanged(pool: PgPool) {
        let user_id = wallet_with(&pool, 500, Some("4821")).await;
        assert!(matches!(
            debit(&pool, user_id, "4820", 100).await,
            Err(WalletError::InvalidPin)
        ));
        assert!(matches!(
            debit(&pool, user_id, "", 100).await,
            Err(WalletError::PinRequired)
        ));
        assert_eq!(balance(&pool, user_id).await, Decimal::from(500));
    }

    #[sqlx::test(migrations = "../migrations")]
    async fn test_missing_wallet_and_pin(pool: PgPool) {
        assert!(matches!(
            debit(&pool, Uuid::new_v4(), "4821", 1).await,
            Err(WalletError::NotFound)
        ));
        let user_id = wallet_with(&pool, 500, None).await;
        assert!(matches!(
            debit(&pool, user_id, "4821", 1).await,
            Err(WalletError::PinNotSet)
        ));
    }
}
