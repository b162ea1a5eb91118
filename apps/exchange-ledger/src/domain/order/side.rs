//! Order side value object.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::domain::transaction::Direction;

/// Buy or sell from the client's point of view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderSide {
    /// Client buys the asset from the house.
    Buy,
    /// Client sells the asset to the house.
    Sell,
}

impl OrderSide {
    /// Parse `B`, `BUY`, `S` or `SELL`, ignoring case.
    #[must_use]
    pub fn parse(token: &str) -> Option<Self> {
        match token.trim().to_uppercase().as_str() {
            "B" | "BUY" => Some(Self::Buy),
            "S" | "SELL" => Some(Self::Sell),
            _ => None,
        }
    }

    /// Direction of the settlement leg: a buy owes the house (`Send`),
    /// a sell is owed by the house (`Receive`).
    #[must_use]
    pub const fn settlement_direction(self) -> Direction {
        match self {
            Self::Buy => Direction::Send,
            Self::Sell => Direction::Receive,
        }
    }
}

impl fmt::Display for OrderSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Buy => write!(f, "BUY"),
            Self::Sell => write!(f, "SELL"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_tokens() {
        assert_eq!(OrderSide::parse("b"), Some(OrderSide::Buy));
        assert_eq!(OrderSide::parse("Buy"), Some(OrderSide::Buy));
        assert_eq!(OrderSide::parse("s"), Some(OrderSide::Sell));
        assert_eq!(OrderSide::parse("SELL"), Some(OrderSide::Sell));
        assert_eq!(OrderSide::parse("hold"), None);
    }

    #[test]
    fn direction_mapping() {
        assert_eq!(OrderSide::Buy.settlement_direction(), Direction::Send);
        assert_eq!(OrderSide::Sell.settlement_direction(), Direction::Receive);
    }

    #[test]
    fn serde_screaming_case() {
        assert_eq!(serde_json::to_string(&OrderSide::Sell).unwrap(), "\"SELL\"");
    }
}
