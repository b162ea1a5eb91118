//! Send/receive direction.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::domain::shared::Amount;

/// Direction of a transaction relative to the client's balance.
///
/// `Send` increases the client's bucket (the house sent value the client
/// now owes for), `Receive` decreases it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    /// Balance += amount.
    Send,
    /// Balance -= amount.
    Receive,
}

impl Direction {
    /// Signed delta this direction applies for `amount`.
    #[must_use]
    pub fn signed(self, amount: Amount) -> Amount {
        match self {
            Self::Send => amount,
            Self::Receive => -amount,
        }
    }

    /// The other direction.
    #[must_use]
    pub const fn opposite(self) -> Self {
        match self {
            Self::Send => Self::Receive,
            Self::Receive => Self::Send,
        }
    }

    /// Lower-case label for metrics.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Send => "send",
            Self::Receive => "receive",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Send => write!(f, "Send"),
            Self::Receive => write!(f, "Receive"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signed_delta() {
        let amt = Amount::from_units(48);
        assert_eq!(Direction::Send.signed(amt), amt);
        assert_eq!(Direction::Receive.signed(amt), -amt);
    }

    #[test]
    fn opposite_round_trips() {
        assert_eq!(Direction::Send.opposite(), Direction::Receive);
        assert_eq!(Direction::Send.opposite().opposite(), Direction::Send);
    }
}
