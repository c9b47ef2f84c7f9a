//! Database access handles.
//!
//! Single-statement queries are modelled as input types that implement
//! [`kanau::processor::Processor`] for [`DatabaseProcessor`]. Multi-statement
//! operations (wallet debits, callback reconciliation) open a [`PgTx`] and
//! call the executor-generic helpers on the entity types.

use sqlx::{PgPool, Postgres, Transaction};

/// A PostgreSQL transaction that owns its connection.
pub type PgTx = Transaction<'static, Postgres>;

#[derive(Clone)]
pub struct DatabaseProcessor {
    pub pool: PgPool,
}

impl DatabaseProcessor {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Begin a transaction on the pool.
    pub async fn begin(&self) -> Result<PgTx, sqlx::Error> {
        self.pool.begin().await
    }
}
