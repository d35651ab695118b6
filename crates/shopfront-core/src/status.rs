//! # Transaction Status State Machine
//!
//! ```text
//!   ┌─────────┐      ┌──────────┐      ┌───────────┐
//!   │ Created │ ───► │ Progress │ ───► │ Completed │  (terminal)
//!   └────┬────┘      └────┬─────┘      └───────────┘
//!        │                │
//!        │                ▼
//!        │          ┌───────────┐
//!        └────────► │ Cancelled │                     (terminal)
//!                   └───────────┘
//! ```
//!
//! Every other pair, self-transitions included, is rejected.

use chrono::{DateTime, Utc};

use crate::error::{CoreError, CoreResult};
use crate::types::{Transaction, TransactionStatus};

impl TransactionStatus {
    /// Whether no further transitions are possible.
    pub const fn is_terminal(&self) -> bool {
        matches!(self, TransactionStatus::Completed | TransactionStatus::Cancelled)
    }

    /// Whether moving from `self` to `next` is allowed.
    pub const fn can_transition_to(&self, next: TransactionStatus) -> bool {
        use TransactionStatus::*;

        matches!(
            (self, next),
            (Created, Progress) | (Progress, Completed) | (Created, Cancelled) | (Progress, Cancelled)
        )
    }

    /// Returns `next` if the transition is allowed.
    pub fn transition(self, next: TransactionStatus) -> CoreResult<TransactionStatus> {
        if self.can_transition_to(next) {
            Ok(next)
        } else {
            Err(CoreError::InvalidStatusTransition {
                from: self,
                to: next,
            })
        }
    }
}

impl Transaction {
    /// Moves the transaction to `next`, stamping `updated_at`.
    ///
    /// On error the transaction is left untouched.
    pub fn transition_to(&mut self, next: TransactionStatus, now: DateTime<Utc>) -> CoreResult<()> {
        self.status = self.status.transition(next)?;
        self.updated_at = now;
        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::money::Money;
    use crate::types::{NewTransaction, Product};
    use chrono::Duration;

    use TransactionStatus::*;

    const ALL: [TransactionStatus; 4] = [Created, Progress, Completed, Cancelled];

    #[test]
    fn test_allowed_transitions() {
        assert_eq!(Created.transition(Progress), Ok(Progress));
        assert_eq!(Progress.transition(Completed), Ok(Completed));
        assert_eq!(Created.transition(Cancelled), Ok(Cancelled));
        assert_eq!(Progress.transition(Cancelled), Ok(Cancelled));
    }

    #[test]
    fn test_rejected_transitions() {
        assert_eq!(
            Completed.transition(Progress),
            Err(CoreError::InvalidStatusTransition {
                from: Completed,
                to: Progress
            })
        );
        assert!(Created.transition(Completed).is_err());
        assert!(Cancelled.transition(Created).is_err());
        assert!(Progress.transition(Created).is_err());
    }

    #[test]
    fn test_terminal_states_have_no_exits() {
        for from in [Completed, Cancelled] {
            assert!(from.is_terminal());
            for to in ALL {
                assert!(!from.can_transition_to(to), "{from} -> {to} must be rejected");
            }
        }
        assert!(!Created.is_terminal());
        assert!(!Progress.is_terminal());
    }

    #[test]
    fn test_self_transitions_rejected() {
        for status in ALL {
            assert!(!status.can_transition_to(status));
        }
    }

    #[test]
    fn test_transaction_transition_updates_timestamp() {
        let created = chrono::Utc::now();
        let product = Product {
            id: 1,
            sku: "X".to_string(),
            name: "Sample".to_string(),
            stock: 5,
            price_cents: 100,
            created_at: created,
            updated_at: created,
            deleted_at: None,
        };
        let mut trx = NewTransaction::from_product("user-1", &product, 1, Money::from_cents(1_000), created)
            .unwrap()
            .into_transaction(1);

        let later = created + Duration::seconds(30);
        trx.transition_to(Progress, later).unwrap();
        assert_eq!(trx.status, Progress);
        assert_eq!(trx.updated_at, later);
        assert_eq!(trx.created_at, created);

        let even_later = later + Duration::seconds(30);
        assert!(trx.transition_to(Created, even_later).is_err());
        assert_eq!(trx.status, Progress);
        assert_eq!(trx.updated_at, later);
    }
}
