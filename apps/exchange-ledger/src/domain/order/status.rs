//! Order settlement status.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Fixed at creation by the settlement path; never transitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OrderStatus {
    /// Nothing paid; the full payable was booked to the balance.
    Pending,
    /// Partly paid; the remainder was booked to the balance.
    Manual,
    /// Paid in full outside the ledger.
    Complete,
}

impl OrderStatus {
    /// Whether creating the order moved the client's balance.
    #[must_use]
    pub const fn adjusts_balance(self) -> bool {
        matches!(self, Self::Pending | Self::Manual)
    }

    /// Whether a transaction was posted against the order's ticket.
    #[must_use]
    pub const fn posts_transaction(self) -> bool {
        matches!(self, Self::Manual | Self::Complete)
    }

    /// Lower-case label for metrics.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Manual => "manual",
            Self::Complete => "complete",
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pending => write!(f, "Pending"),
            Self::Manual => write!(f, "Manual"),
            Self::Complete => write!(f, "Complete"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reversal_table() {
        assert!(OrderStatus::Pending.adjusts_balance());
        assert!(!OrderStatus::Pending.posts_transaction());
        assert!(OrderStatus::Manual.adjusts_balance());
        assert!(OrderStatus::Manual.posts_transaction());
        assert!(!OrderStatus::Complete.adjusts_balance());
        assert!(OrderStatus::Complete.posts_transaction());
    }
}
