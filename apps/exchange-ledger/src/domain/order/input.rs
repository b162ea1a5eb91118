//! Grammar for operator-typed order lines:
//! `ORDER_TYPE ORDER_SIZE ORDER_CURRENCY ORDER_EXCHANGE_RATE`.

use super::OrderSide;
use crate::domain::shared::{Amount, Currency, LedgerError};

const OVERFLOW_HINT: &str = "Order size × exchange rate is too large to record.";

const FORMAT_HINT: &str = "Invalid order format. Please use: \"ORDER_TYPE ORDER_SIZE ORDER_CURRENCY ORDER_EXCHANGE_RATE\", e.g. \"BUY 100 USDT 500000\".";

/// A parsed order line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderInput {
    /// Buy or sell.
    pub side: OrderSide,
    /// Quantity.
    pub size: Amount,
    /// Traded currency, upper-cased.
    pub currency: Currency,
    /// Exchange rate.
    pub price: Amount,
}

impl OrderInput {
    /// `size × price`; rejects products past the decimal range.
    pub fn payable(&self) -> Result<Amount, LedgerError> {
        payable_of(self.size, self.price)
    }
}

pub(super) fn payable_of(size: Amount, price: Amount) -> Result<Amount, LedgerError> {
    size.checked_mul(price)
        .ok_or_else(|| LedgerError::validation(OVERFLOW_HINT))
}

/// Parse an order line of exactly four whitespace-separated tokens.
pub fn parse_order_input(text: &str) -> Result<OrderInput, LedgerError> {
    let tokens: Vec<&str> = text.split_whitespace().collect();
    let [kind, size, currency, price] = tokens.as_slice() else {
        return Err(LedgerError::validation(FORMAT_HINT));
    };

    let side = OrderSide::parse(kind)
        .ok_or_else(|| LedgerError::validation("Order type must be BUY | B or SELL | S."))?;

    let (Some(size), Some(price)) = (Amount::parse(size), Amount::parse(price)) else {
        return Err(LedgerError::validation(
            "Order size and exchange rate must be numeric.",
        ));
    };
    if !size.is_positive() || !price.is_positive() {
        return Err(LedgerError::validation(
            "Order size and price must be greater than zero.",
        ));
    }

    let input = OrderInput {
        side,
        size,
        currency: Currency::parse(currency),
        price,
    };
    input.payable()?;
    Ok(input)
}
