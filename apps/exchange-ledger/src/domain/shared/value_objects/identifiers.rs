//! Numeric identifiers for clients, accounts and orders.
//!
//! All three are short decimal numbers that desk operators type by hand,
//! each drawn at random from its own range.

use std::fmt;
use std::ops::RangeInclusive;

use serde::{Deserialize, Serialize};

macro_rules! define_id {
    ($name:ident, $range:expr, $doc:expr) => {
        #[doc = $doc]
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(u32);

        impl $name {
            /// Range new identifiers are drawn from.
            pub const RANGE: RangeInclusive<u32> = $range;

            /// Wrap a raw value.
            #[must_use]
            pub const fn new(value: u32) -> Self {
                Self(value)
            }

            /// Raw value.
            #[must_use]
            pub const fn value(&self) -> u32 {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<u32> for $name {
            fn from(value: u32) -> Self {
                Self(value)
            }
        }
    };
}

define_id!(ClientId, 1000..=9999, "Identifier of a registered client.");
define_id!(AccountId, 1000..=9999, "Identifier of a client's ledger account.");
define_id!(Ticket, 100_000..=999_999, "Order ticket number.");

impl Ticket {
    /// Ticket carried by transactions that are not linked to an order.
    pub const STANDALONE: Self = Self(0);

    /// Whether this is the standalone marker.
    #[must_use]
    pub const fn is_standalone(&self) -> bool {
        self.0 == 0
    }
}
