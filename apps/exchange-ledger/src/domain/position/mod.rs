//! Daily position rows and the totals they are derived from.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::domain::order::{Order, OrderSide};
use crate::domain::shared::{Amount, Currency};
use crate::domain::transaction::{Direction, Transaction};

/// One row per calendar date, upserted by date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyPosition {
    /// Calendar date key.
    pub date: NaiveDate,
    /// USDT bought by the house that day.
    pub bought_usdt: Amount,
    /// USDT sold by the house that day.
    pub sold_usdt: Amount,
    /// Cumulative bought-minus-sold carried forward to this date.
    pub net_position: Amount,
}

/// Bought and sold USDT over some set of orders.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TradeTotals {
    /// Sum of BUY USDT order sizes.
    pub bought_usdt: Amount,
    /// Sum of SELL USDT order sizes.
    pub sold_usdt: Amount,
}

impl TradeTotals {
    /// Fold orders into totals; non-USDT orders are ignored.
    pub fn from_orders<'a>(orders: impl IntoIterator<Item = &'a Order>) -> Self {
        let mut totals = Self::default();
        for order in orders {
            totals.record(order);
        }
        totals
    }

    /// Add one order.
    pub fn record(&mut self, order: &Order) {
        if order.is_usdt(OrderSide::Buy) {
            self.bought_usdt += order.size;
        } else if order.is_usdt(OrderSide::Sell) {
            self.sold_usdt += order.size;
        }
    }

    /// `bought − sold`.
    #[must_use]
    pub fn net(&self) -> Amount {
        self.bought_usdt - self.sold_usdt
    }
}

/// Sent and received sums for the two balanced currencies.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TransferTotals {
    /// TOMAN sent.
    pub sent_toman: Amount,
    /// USDT sent.
    pub sent_usdt: Amount,
    /// TOMAN received.
    pub received_toman: Amount,
    /// USDT received.
    pub received_usdt: Amount,
}

impl TransferTotals {
    /// Fold transactions into totals; other currencies are ignored.
    pub fn from_transactions<'a>(transactions: impl IntoIterator<Item = &'a Transaction>) -> Self {
        let mut totals = Self::default();
        for tx in transactions {
            totals.record(tx.direction, &tx.currency, tx.size);
        }
        totals
    }

    /// Add one movement.
    pub fn record(&mut self, direction: Direction, currency: &Currency, size: Amount) {
        let slot = match (direction, currency) {
            (Direction::Send, Currency::Toman) => &mut self.sent_toman,
            (Direction::Send, Currency::Usdt) => &mut self.sent_usdt,
            (Direction::Receive, Currency::Toman) => &mut self.received_toman,
            (Direction::Receive, Currency::Usdt) => &mut self.received_usdt,
            (_, Currency::Other(_)) => return,
        };
        *slot += size;
    }
}

/// House-wide totals for a single date.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DailyTotals {
    /// Order totals.
    pub trades: TradeTotals,
    /// Transaction totals.
    pub transfers: TransferTotals,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::order::{OrderRequest, OrderStatus};
    use crate::domain::shared::{AccountId, ClientId, Ticket};

    fn order(side: OrderSide, currency: Currency, size: i64) -> Order {
        let at = NaiveDate::from_ymd_opt(2026, 10, 17)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap();
        let request = OrderRequest {
            client_id: ClientId::new(1001),
            side,
            currency,
            size: Amount::from_units(size),
            price: Amount::from_units(1),
        };
        Order::new(
            Ticket::new(100_001),
            AccountId::new(2002),
            "c",
            &request,
            OrderStatus::Pending,
            Amount::ZERO,
            at,
        )
        .unwrap()
    }

    #[test]
    fn trade_totals_ignore_other_currencies() {
        let orders = [
            order(OrderSide::Buy, Currency::Usdt, 300),
            order(OrderSide::Sell, Currency::Usdt, 120),
            order(OrderSide::Buy, Currency::parse("eur"), 999),
        ];
        let totals = TradeTotals::from_orders(&orders);
        assert_eq!(totals.bought_usdt, Amount::from_units(300));
        assert_eq!(totals.sold_usdt, Amount::from_units(120));
        assert_eq!(totals.net(), Amount::from_units(180));
    }

    #[test]
    fn transfer_totals_bucket_by_direction() {
        let mut totals = TransferTotals::default();
        totals.record(Direction::Send, &Currency::Toman, Amount::from_units(5));
        totals.record(Direction::Receive, &Currency::Usdt, Amount::from_units(7));
        totals.record(Direction::Send, &Currency::parse("aed"), Amount::from_units(9));
        assert_eq!(totals.sent_toman, Amount::from_units(5));
        assert_eq!(totals.received_usdt, Amount::from_units(7));
        assert_eq!(totals.sent_usdt, Amount::ZERO);
    }
}
