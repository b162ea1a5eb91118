//! Order row and creation request.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use super::input::payable_of;
use super::{OrderInput, OrderSide, OrderStatus};
use crate::domain::shared::{AccountId, Amount, ClientId, Currency, LedgerError, Ticket};

/// Parameters of an order for a known client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderRequest {
    /// Client placing the order.
    pub client_id: ClientId,
    /// Buy or sell.
    pub side: OrderSide,
    /// Traded currency.
    pub currency: Currency,
    /// Quantity, > 0.
    pub size: Amount,
    /// Exchange rate in the settlement currency, > 0.
    pub price: Amount,
}

impl OrderRequest {
    /// Attach a parsed order line to a client.
    #[must_use]
    pub fn from_input(client_id: ClientId, input: OrderInput) -> Self {
        Self {
            client_id,
            side: input.side,
            currency: input.currency,
            size: input.size,
            price: input.price,
        }
    }

    /// `size × price`; rejects products past the decimal range.
    pub fn payable(&self) -> Result<Amount, LedgerError> {
        payable_of(self.size, self.price)
    }

    /// Reject non-positive size or price, or a payable that cannot be represented.
    pub fn validate(&self) -> Result<(), LedgerError> {
        if !self.size.is_positive() || !self.price.is_positive() {
            return Err(LedgerError::validation(
                "Order size and price must be greater than zero.",
            ));
        }
        self.payable().map(|_| ())
    }
}

/// A recorded order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    /// Ticket number.
    pub ticket: Ticket,
    /// Owning account.
    pub account_id: AccountId,
    /// Client name at creation time.
    pub client_name: String,
    /// Buy or sell.
    #[serde(rename = "type")]
    pub side: OrderSide,
    /// Traded currency.
    pub currency: Currency,
    /// Quantity.
    pub size: Amount,
    /// Exchange rate.
    pub price: Amount,
    /// `size × price`.
    pub payable: Amount,
    /// Amount settled when the order was taken.
    pub paid_by_client: Amount,
    /// `payable − paid_by_client`.
    pub debt: Amount,
    /// Settlement status.
    pub status: OrderStatus,
    /// Creation time.
    pub created_at: NaiveDateTime,
}

impl Order {
    /// Build an order, deriving `payable` and `debt`.
    pub fn new(
        ticket: Ticket,
        account_id: AccountId,
        client_name: impl Into<String>,
        request: &OrderRequest,
        status: OrderStatus,
        paid_by_client: Amount,
        created_at: NaiveDateTime,
    ) -> Result<Self, LedgerError> {
        request.validate()?;
        let payable = request.payable()?;
        if paid_by_client.is_negative() || paid_by_client > payable {
            return Err(LedgerError::validation(format!(
                "Paid amount must be between 0 and the payable {payable}."
            )));
        }
        Ok(Self {
            ticket,
            account_id,
            client_name: client_name.into(),
            side: request.side,
            currency: request.currency.clone(),
            size: request.size,
            price: request.price,
            payable,
            paid_by_client,
            debt: payable - paid_by_client,
            status,
            created_at,
        })
    }

    /// Portion still unpaid; what deletion reverses on the balance.
    #[must_use]
    pub fn unpaid(&self) -> Amount {
        self.payable - self.paid_by_client
    }

    /// Whether the order trades USDT on `side`.
    #[must_use]
    pub fn is_usdt(&self, side: OrderSide) -> bool {
        self.side == side && self.currency == Currency::Usdt
    }
}
