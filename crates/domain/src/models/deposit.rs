//! Deposit state machine and refund arithmetic.
//!
//! `deposit_status` is the mutable pointer on the booking; the append-only
//! `deposit_transactions` ledger is the audit source of truth. The guards
//! here are pure so every transition can be checked before touching the
//! payment gateway.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Deposit authorization state on a booking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DepositStatus {
    None,
    Pending,
    Captured,
    Cancelled,
    Refunded,
    PartiallyRefunded,
}

impl DepositStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            DepositStatus::None => "none",
            DepositStatus::Pending => "pending",
            DepositStatus::Captured => "captured",
            DepositStatus::Cancelled => "cancelled",
            DepositStatus::Refunded => "refunded",
            DepositStatus::PartiallyRefunded => "partially_refunded",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "none" => Some(DepositStatus::None),
            "pending" => Some(DepositStatus::Pending),
            "captured" => Some(DepositStatus::Captured),
            "cancelled" => Some(DepositStatus::Cancelled),
            "refunded" => Some(DepositStatus::Refunded),
            "partially_refunded" => Some(DepositStatus::PartiallyRefunded),
            _ => None,
        }
    }
}

impl std::fmt::Display for DepositStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Ledger action recorded per deposit transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DepositAction {
    Created,
    Captured,
    Cancelled,
    Refunded,
    PartialRefund,
}

impl DepositAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            DepositAction::Created => "created",
            DepositAction::Captured => "captured",
            DepositAction::Cancelled => "cancelled",
            DepositAction::Refunded => "refunded",
            DepositAction::PartialRefund => "partial_refund",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "created" => Some(DepositAction::Created),
            "captured" => Some(DepositAction::Captured),
            "cancelled" => Some(DepositAction::Cancelled),
            "refunded" => Some(DepositAction::Refunded),
            "partial_refund" => Some(DepositAction::PartialRefund),
            _ => None,
        }
    }
}

/// Why a deposit transition was rejected.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DepositGuardError {
    #[error("deposit can only be authorized when no deposit exists (current: {0})")]
    AlreadyAuthorized(DepositStatus),

    #[error("deposit can only be captured from pending (current: {0})")]
    NotCapturable(DepositStatus),

    #[error("deposit can only be cancelled from pending (current: {0})")]
    NotCancellable(DepositStatus),

    #[error("deposit can only be refunded after capture (current: {0})")]
    NotRefundable(DepositStatus),

    #[error("refund amount {requested} exceeds refundable remainder {remaining}")]
    RefundExceedsRemainder { requested: i64, remaining: i64 },

    #[error("refund amount must be positive")]
    NonPositiveRefund,
}

/// Guard: a new authorization is only legal when no deposit exists yet.
pub fn check_authorize(current: DepositStatus) -> Result<(), DepositGuardError> {
    match current {
        DepositStatus::None => Ok(()),
        other => Err(DepositGuardError::AlreadyAuthorized(other)),
    }
}

/// Guard: capture only from `pending`.
pub fn check_capture(current: DepositStatus) -> Result<(), DepositGuardError> {
    match current {
        DepositStatus::Pending => Ok(()),
        other => Err(DepositGuardError::NotCapturable(other)),
    }
}

/// Guard: cancel only from `pending`.
pub fn check_cancel(current: DepositStatus) -> Result<(), DepositGuardError> {
    match current {
        DepositStatus::Pending => Ok(()),
        other => Err(DepositGuardError::NotCancellable(other)),
    }
}

/// Outcome of a refund computation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RefundPlan {
    /// Amount to request from the gateway, in cents.
    pub amount_cents: i64,
    /// Total refunded after this refund succeeds.
    pub refunded_after_cents: i64,
    /// Resulting deposit status.
    pub new_status: DepositStatus,
    /// Ledger action to record.
    pub action: DepositAction,
}

/// Guard + arithmetic for a refund request.
///
/// `requested_cents = None` means "refund the remainder". The refund is
/// bounded by `deposit_amount - already_refunded`; refunding more than was
/// captured is rejected.
pub fn plan_refund(
    current: DepositStatus,
    deposit_amount_cents: i64,
    already_refunded_cents: i64,
    requested_cents: Option<i64>,
) -> Result<RefundPlan, DepositGuardError> {
    match current {
        DepositStatus::Captured | DepositStatus::PartiallyRefunded => {}
        other => return Err(DepositGuardError::NotRefundable(other)),
    }

    let remaining = deposit_amount_cents - already_refunded_cents;
    let amount = requested_cents.unwrap_or(remaining);

    if amount <= 0 {
        return Err(DepositGuardError::NonPositiveRefund);
    }
    if amount > remaining {
        return Err(DepositGuardError::RefundExceedsRemainder {
            requested: amount,
            remaining,
        });
    }

    let refunded_after = already_refunded_cents + amount;
    let (new_status, action) = if refunded_after == deposit_amount_cents {
        (DepositStatus::Refunded, DepositAction::Refunded)
    } else {
        (DepositStatus::PartiallyRefunded, DepositAction::PartialRefund)
    };

    Ok(RefundPlan {
        amount_cents: amount,
        refunded_after_cents: refunded_after,
        new_status,
        action,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capture_only_from_pending() {
        assert!(check_capture(DepositStatus::Pending).is_ok());
        for status in [
            DepositStatus::None,
            DepositStatus::Captured,
            DepositStatus::Cancelled,
            DepositStatus::Refunded,
            DepositStatus::PartiallyRefunded,
        ] {
            assert!(check_capture(status).is_err());
        }
    }

    #[test]
    fn test_cancel_only_from_pending() {
        assert!(check_cancel(DepositStatus::Pending).is_ok());
        assert_eq!(
            check_cancel(DepositStatus::Captured),
            Err(DepositGuardError::NotCancellable(DepositStatus::Captured))
        );
    }

    #[test]
    fn test_authorize_only_when_none() {
        assert!(check_authorize(DepositStatus::None).is_ok());
        assert!(check_authorize(DepositStatus::Pending).is_err());
    }

    #[test]
    fn test_full_refund() {
        let plan = plan_refund(DepositStatus::Captured, 5000, 0, None).unwrap();
        assert_eq!(plan.amount_cents, 5000);
        assert_eq!(plan.refunded_after_cents, 5000);
        assert_eq!(plan.new_status, DepositStatus::Refunded);
        assert_eq!(plan.action, DepositAction::Refunded);
    }

    #[test]
    fn test_partial_refund() {
        let plan = plan_refund(DepositStatus::Captured, 5000, 0, Some(2000)).unwrap();
        assert_eq!(plan.amount_cents, 2000);
        assert_eq!(plan.refunded_after_cents, 2000);
        assert_eq!(plan.new_status, DepositStatus::PartiallyRefunded);
        assert_eq!(plan.action, DepositAction::PartialRefund);
    }

    #[test]
    fn test_second_partial_refund_completes() {
        let plan = plan_refund(DepositStatus::PartiallyRefunded, 5000, 2000, Some(3000)).unwrap();
        assert_eq!(plan.refunded_after_cents, 5000);
        assert_eq!(plan.new_status, DepositStatus::Refunded);
    }

    #[test]
    fn test_refund_bounded_by_remainder() {
        let result = plan_refund(DepositStatus::PartiallyRefunded, 5000, 2000, Some(3001));
        assert_eq!(
            result,
            Err(DepositGuardError::RefundExceedsRemainder {
                requested: 3001,
                remaining: 3000
            })
        );
    }

    #[test]
    fn test_refund_rejects_non_positive_amount() {
        assert_eq!(
            plan_refund(DepositStatus::Captured, 5000, 0, Some(0)),
            Err(DepositGuardError::NonPositiveRefund)
        );
        assert_eq!(
            plan_refund(DepositStatus::Captured, 5000, 0, Some(-100)),
            Err(DepositGuardError::NonPositiveRefund)
        );
    }

    #[test]
    fn test_refund_requires_capture() {
        assert!(plan_refund(DepositStatus::Pending, 5000, 0, None).is_err());
        assert!(plan_refund(DepositStatus::None, 5000, 0, None).is_err());
        assert!(plan_refund(DepositStatus::Cancelled, 5000, 0, None).is_err());
    }

    #[test]
    fn test_fully_refunded_deposit_cannot_refund_again() {
        assert_eq!(
            plan_refund(DepositStatus::Refunded, 5000, 5000, Some(1)),
            Err(DepositGuardError::NotRefundable(DepositStatus::Refunded))
        );
    }

    #[test]
    fn test_status_round_trip() {
        for status in [
            DepositStatus::None,
            DepositStatus::Pending,
            DepositStatus::Captured,
            DepositStatus::Cancelled,
            DepositStatus::Refunded,
            DepositStatus::PartiallyRefunded,
        ] {
            assert_eq!(DepositStatus::parse(status.as_str()), Some(status));
        }
    }

    #[test]
    fn test_action_round_trip() {
        for action in [
            DepositAction::Created,
            DepositAction::Captured,
            DepositAction::Cancelled,
            DepositAction::Refunded,
            DepositAction::PartialRefund,
        ] {
            assert_eq!(DepositAction::parse(action.as_str()), Some(action));
        }
    }
}
