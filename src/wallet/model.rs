//! Seller-side ledger models

use serde::{Deserialize, Serialize};
use sqlx::types::chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::rental::{Rental, RentalStatus};

/// Ledger row
#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, Clone)]
#[serde(rename_all = "camelCase")]
pub struct LedgerTransaction {
    pub id: Uuid,
    pub user_id: Uuid,
    pub rental_id: Option<Uuid>,
    pub transaction_type: TransactionType,
    pub amount: f64,
    pub description: String,
    pub created_at: DateTime<Utc>,
}

/// Transaction types
#[derive(Debug, Serialize, Deserialize, sqlx::Type, Clone, Copy, PartialEq, Eq)]
#[sqlx(type_name = "transaction_type", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum TransactionType {
    RentalEarning,
    Withdrawal,
    Refund,
    DamageDeduction,
    SecurityDepositHold,
    SecurityDepositRelease,
}

/// Balances shown on the seller dashboard
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct WalletSummary {
    pub total_balance: f64,
    pub pending_balance: f64,
    pub withdrawable_balance: f64,
}

impl WalletSummary {
    /// Settled ledger credits minus withdrawals are withdrawable; rent of
    /// rentals still in flight is pending.
    pub fn derive(owner_id: Uuid, ledger: &[LedgerTransaction], owned: &[Rental]) -> Self {
        let withdrawable = ledger
            .iter()
            .filter(|t| t.user_id == owner_id)
            .map(|t| match t.transaction_type {
                TransactionType::RentalEarning | TransactionType::DamageDeduction => t.amount,
                TransactionType::Withdrawal => -t.amount,
                _ => 0.0,
            })
            .sum::<f64>();

        let pending = owned
            .iter()
            .filter(|r| r.owner_id == owner_id)
            .filter(|r| {
                matches!(
                    r.status,
                    RentalStatus::Approved | RentalStatus::Active | RentalStatus::Returned
                )
            })
            .map(|r| r.total_rent)
            .sum::<f64>();

        Self {
            total_balance: withdrawable + pending,
            pending_balance: pending,
            withdrawable_balance: withdrawable,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rental::lifecycle::tests::rental;
    use chrono::Utc;

    fn entry(user_id: Uuid, transaction_type: TransactionType, amount: f64) -> LedgerTransaction {
        LedgerTransaction {
            id: Uuid::new_v4(),
            user_id,
            rental_id: None,
            transaction_type,
            amount,
            description: String::new(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_summary_splits_settled_and_pending() {
        let mut active = rental(RentalStatus::Active);
        let owner = active.owner_id;
        active.total_rent = 400.0;
        let mut done = rental(RentalStatus::Completed);
        done.owner_id = owner;
        let mut requested = rental(RentalStatus::Requested);
        requested.owner_id = owner;

        let ledger = vec![
            entry(owner, TransactionType::RentalEarning, 1000.0),
            entry(owner, TransactionType::DamageDeduction, 150.0),
            entry(owner, TransactionType::Withdrawal, 300.0),
            entry(Uuid::new_v4(), TransactionType::RentalEarning, 999.0),
            entry(owner, TransactionType::SecurityDepositHold, 800.0),
        ];

        let summary = WalletSummary::derive(owner, &ledger, &[active, done, requested]);
        assert_eq!(summary.withdrawable_balance, 850.0);
        assert_eq!(summary.pending_balance, 400.0);
        assert_eq!(summary.total_balance, 1250.0);
    }

    #[test]
    fn test_empty_wallet() {
        assert_eq!(
            WalletSummary::derive(Uuid::new_v4(), &[], &[]),
            WalletSummary::default()
        );
    }
}
