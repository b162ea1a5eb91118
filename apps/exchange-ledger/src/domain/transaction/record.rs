//! Transaction row.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use super::Direction;
use crate::domain::shared::{AccountId, Amount, Currency, LedgerError, Ticket};

/// One posted movement of funds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    /// When the movement was posted.
    pub date: NaiveDateTime,
    /// Account the movement belongs to.
    pub account_id: AccountId,
    /// Linked order, or [`Ticket::STANDALONE`].
    pub order_ticket: Ticket,
    /// Client name at posting time.
    pub client_name: String,
    /// Direction.
    #[serde(rename = "type")]
    pub direction: Direction,
    /// Currency moved.
    pub currency: Currency,
    /// Amount moved, always positive.
    pub size: Amount,
}

impl Transaction {
    /// Build a transaction, rejecting non-positive sizes.
    pub fn new(
        date: NaiveDateTime,
        account_id: AccountId,
        order_ticket: Ticket,
        client_name: impl Into<String>,
        direction: Direction,
        currency: Currency,
        size: Amount,
    ) -> Result<Self, LedgerError> {
        if !size.is_positive() {
            return Err(LedgerError::validation(
                "Transaction size must be greater than zero.",
            ));
        }
        Ok(Self {
            date,
            account_id,
            order_ticket,
            client_name: client_name.into(),
            direction,
            currency,
            size,
        })
    }

    /// Whether the transaction settles an order.
    #[must_use]
    pub const fn is_linked(&self) -> bool {
        !self.order_ticket.is_standalone()
    }
}
