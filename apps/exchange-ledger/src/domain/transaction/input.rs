//! Grammar for operator-typed transaction lines: `send|receive SIZE CURRENCY`.

use super::Direction;
use crate::domain::shared::{Amount, Currency, LedgerError};

const FORMAT_HINT: &str = "Invalid format. Please use: \"send|receive SIZE CURRENCY\".";

/// A parsed transaction line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionInput {
    /// Direction.
    pub direction: Direction,
    /// Positive size.
    pub size: Amount,
    /// Currency, upper-cased.
    pub currency: Currency,
}

/// Parse `send|s|receive|r SIZE CURRENCY`.
pub fn parse_transaction_input(text: &str) -> Result<TransactionInput, LedgerError> {
    let tokens: Vec<&str> = text.split_whitespace().collect();
    let [kind, size, currency] = tokens.as_slice() else {
        return Err(LedgerError::validation(FORMAT_HINT));
    };

    let direction = match kind.to_lowercase().as_str() {
        "s" | "send" => Direction::Send,
        "r" | "receive" => Direction::Receive,
        _ => {
            return Err(LedgerError::validation(
                "Transaction type must be either \"send\" | \"s\" or \"receive\" | \"r\".",
            ));
        }
    };

    let size = Amount::parse(size)
        .ok_or_else(|| LedgerError::validation("Transaction size must be a numeric value."))?;
    if !size.is_positive() {
        return Err(LedgerError::validation(
            "Transaction size must be greater than zero.",
        ));
    }

    Ok(TransactionInput {
        direction,
        size,
        currency: Currency::parse(currency),
    })
}
