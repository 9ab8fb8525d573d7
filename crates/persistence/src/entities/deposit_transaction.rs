//! Deposit transaction ledger entity (database row mapping).
//!
//! Append-only: rows are inserted on each deposit transition and never
//! mutated afterwards.

use chrono::{DateTime, Utc};
use sqlx::FromRow;

/// Database row mapping for the deposit_transactions table.
#[derive(Debug, Clone, FromRow)]
pub struct DepositTransactionEntity {
    pub id: i64,
    pub booking_id: i64,
    pub action: String,
    pub amount_cents: i64,
    pub reason: Option<String>,
    pub actor: String,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use domain::models::deposit::DepositAction;

    #[test]
    fn test_ledger_actions_parse() {
        let entity = DepositTransactionEntity {
            id: 1,
            booking_id: 7,
            action: "partial_refund".to_string(),
            amount_cents: 2000,
            reason: Some("goodwill".to_string()),
            actor: "staff:mara".to_string(),
            created_at: Utc::now(),
        };
        assert_eq!(
            DepositAction::parse(&entity.action),
            Some(DepositAction::PartialRefund)
        );
    }
}
