//! Wallet service - ledger writes and balance reads

use anyhow::Result;
use chrono::Utc;
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use super::{LedgerTransaction, TransactionType, WalletSummary};
use crate::rental::Rental;

/// Append a ledger row inside the caller's transaction
pub async fn record_transaction(
    conn: &mut PgConnection,
    user_id: Uuid,
    rental_id: Option<Uuid>,
    transaction_type: TransactionType,
    amount: f64,
    description: &str,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO transactions (id, user_id, rental_id, transaction_type, amount, description, created_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(user_id)
    .bind(rental_id)
    .bind(transaction_type)
    .bind(amount)
    .bind(description)
    .bind(Utc::now())
    .execute(conn)
    .await?;

    tracing::debug!(
        user_id = %user_id,
        rental_id = ?rental_id,
        transaction_type = ?transaction_type,
        amount,
        "Ledger entry recorded"
    );
    Ok(())
}

/// Read side of the seller wallet
#[derive(Clone)]
pub struct WalletService {
    db_pool: PgPool,
}

impl WalletService {
    pub fn new(db_pool: PgPool) -> Self {
        Self { db_pool }
    }

    /// Ledger rows for a user, newest first
    pub async fn list_transactions(&self, user_id: Uuid) -> Result<Vec<LedgerTransaction>> {
        let rows = sqlx::query_as::<_, LedgerTransaction>(
            "SELECT * FROM transactions WHERE user_id = $1 ORDER BY created_at DESC",
        )
        .bind(user_id)
        .fetch_all(&self.db_pool)
        .await?;

        Ok(rows)
    }

    /// Balances derived from the ledger and the owner's rentals
    pub async fn get_summary(&self, owner_id: Uuid) -> Result<WalletSummary> {
        let ledger = self.list_transactions(owner_id).await?;
        let owned = sqlx::query_as::<_, Rental>("SELECT * FROM rentals WHERE owner_id = $1")
            .bind(owner_id)
            .fetch_all(&self.db_pool)
            .await?;

        Ok(WalletSummary::derive(owner_id, &ledger, &owned))
    }
}
