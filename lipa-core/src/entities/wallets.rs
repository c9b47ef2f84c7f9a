use crate::framework::DatabaseProcessor;
use kanau::processor::Processor;
use rust_decimal::Decimal;
use sqlx::PgExecutor;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct WalletRecord {
    pub user_id: Uuid,
    pub balance: Decimal,
    /// argon2 PHC string.
    pub pin_hash: Option<String>,
    pub created_at: time::OffsetDateTime,
    pub updated_at: time::OffsetDateTime,
}

const COLUMNS: &str = "user_id, balance, pin_hash, created_at, updated_at";

impl WalletRecord {
    pub fn has_pin(&self) -> bool {
        self.pin_hash.is_some()
    }

    /// Lock the wallet row for the rest of the transaction.
    pub async fn lock<'e>(
        executor: impl PgExecutor<'e>,
        user_id: Uuid,
    ) -> Result<Option<WalletRecord>, sqlx::Error> {
        sqlx::query_as::<_, WalletRecord>(&format!(
            "SELECT {COLUMNS} FROM wallets WHERE user_id = $1 FOR UPDATE"
        ))
        .bind(user_id)
        .fetch_optional(executor)
        .await
    }

    /// Debit `amount` only if the balance covers it.
    ///
    /// Returns the new balance, or `None` when the balance is insufficient
    /// (or the wallet does not exist). The check and the write are one
    /// statement, so two concurrent debits cannot both pass on the same
    /// balance.
    pub async fn debit<'e>(
        executor: impl PgExecutor<'e>,
        user_id: Uuid,
        amount: Decimal,
    ) -> Result<Option<Decimal>, sqlx::Error> {
        sqlx::query_scalar(
            "UPDATE wallets SET balance = balance - $2, updated_at = now() \
             WHERE user_id = $1 AND balance >= $2 RETURNING balance",
        )
        .bind(user_id)
        .bind(amount)
        .fetch_optional(executor)
        .await
    }

    /// Credit `amount`, creating the wallet if the user has none yet.
    pub async fn credit<'e>(
        executor: impl PgExecutor<'e>,
        user_id: Uuid,
        amount: Decimal,
    ) -> Result<Decimal, sqlx::Error> {
        sqlx::query_scalar(
            "INSERT INTO wallets (user_id, balance) VALUES ($1, $2) \
             ON CONFLICT (user_id) DO UPDATE \
             SET balance = wallets.balance + EXCLUDED.balance, updated_at = now() \
             RETURNING balance",
        )
        .bind(user_id)
        .bind(amount)
        .fetch_one(executor)
        .await
    }
}

#[derive(Debug, Clone)]
pub struct GetWallet {
    pub user_id: Uuid,
}

impl Processor<GetWallet> for DatabaseProcessor {
    type Output = Option<WalletRecord>;
    type Error = sqlx::Error;
    #[tracing::instrument(skip_all, err, name = "SQL:GetWallet")]
    async fn process(&self, query: GetWallet) -> Result<Option<WalletRecord>, sqlx::Error> {
        sqlx::query_as::<_, WalletRecord>(&format!(
            "SELECT {COLUMNS} FROM wallets WHERE user_id = $1"
        ))
        .bind(query.user_id)
        .fetch_optional(&self.pool)
        .await
    }
}

#[derive(Debug, Clone)]
/// Store a PIN hash, creating an empty wallet if needed.
pub struct SetWalletPin {
    pub user_id: Uuid,
    pub pin_hash: String,
}

impl Processor<SetWalletPin> for DatabaseProcessor {
    type Output = WalletRecord;
    type Error = sqlx::Error;
    #[tracing::instrument(skip_all, err, name = "SQL:SetWalletPin")]
    async fn process(&self, update: SetWalletPin) -> Result<WalletRecord, sqlx::Error> {
        sqlx::query_as::<_, WalletRecord>(&format!(
            "INSERT INTO wallets (user_id, pin_hash) VALUES ($1, $2) \
             ON CONFLICT (user_id) DO UPDATE SET pin_hash = EXCLUDED.pin_hash, updated_at = now() \
             RETURNING {COLUMNS}"
        ))
        .bind(update.user_id)
        .bind(update.pin_hash)
        .fetch_one(&self.pool)
        .await
    }
}
