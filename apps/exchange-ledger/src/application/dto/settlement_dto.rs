//! Settlement and transfer commands.

use serde::{Deserialize, Serialize};

use crate::domain::order::{OrderRequest, OrderStatus};
use crate::domain::shared::{Amount, ClientId, Currency};

/// How an order is settled; chosen by the operator per order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SettlementPath {
    /// Paid in full outside the ledger.
    FullPayment,
    /// Partly paid now, remainder booked to the balance.
    ManualPayment,
    /// Nothing paid now, full payable booked to the balance.
    DeferredPayment,
}

impl SettlementPath {
    /// Status the order is created with.
    #[must_use]
    pub const fn status(self) -> OrderStatus {
        match self {
            Self::FullPayment => OrderStatus::Complete,
            Self::ManualPayment => OrderStatus::Manual,
            Self::DeferredPayment => OrderStatus::Pending,
        }
    }

    /// Lower-case label for metrics.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::FullPayment => "full",
            Self::ManualPayment => "manual",
            Self::DeferredPayment => "deferred",
        }
    }
}

/// Settle one order along an explicit path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "path", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SettlementCommand {
    /// Order is paid in full.
    FullPayment {
        /// Order parameters.
        order: OrderRequest,
    },
    /// Client pays `paid_now` of the payable.
    ManualPayment {
        /// Order parameters.
        order: OrderRequest,
        /// Amount paid at order time, `0 < paid_now ≤ payable`.
        paid_now: Amount,
    },
    /// Client pays later.
    DeferredPayment {
        /// Order parameters.
        order: OrderRequest,
    },
}

impl SettlementCommand {
    /// Order parameters.
    #[must_use]
    pub const fn order(&self) -> &OrderRequest {
        match self {
            Self::FullPayment { order }
            | Self::ManualPayment { order, .. }
            | Self::DeferredPayment { order } => order,
        }
    }

    /// Path selected.
    #[must_use]
    pub const fn path(&self) -> SettlementPath {
        match self {
            Self::FullPayment { .. } => SettlementPath::FullPayment,
            Self::ManualPayment { .. } => SettlementPath::ManualPayment,
            Self::DeferredPayment { .. } => SettlementPath::DeferredPayment,
        }
    }
}

/// Move funds from one client to another.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferCommand {
    /// Paying client; takes a `Receive`.
    pub from: ClientId,
    /// Receiving client; takes a `Send`.
    pub to: ClientId,
    /// Currency moved.
    pub currency: Currency,
    /// Positive amount.
    pub amount: Amount,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::order::OrderSide;

    fn order() -> OrderRequest {
        OrderRequest {
            client_id: ClientId::new(4821),
            side: OrderSide::Buy,
            currency: Currency::Usdt,
            size: Amount::from_units(200),
            price: Amount::from_units(490_000),
        }
    }

    #[test]
    fn path_selects_status() {
        let cmd = SettlementCommand::ManualPayment {
            order: order(),
            paid_now: Amount::from_units(50_000_000),
        };
        assert_eq!(cmd.path(), SettlementPath::ManualPayment);
        assert_eq!(cmd.path().status(), OrderStatus::Manual);
        assert_eq!(cmd.order().client_id, ClientId::new(4821));
    }

    #[test]
    fn tagged_json_shape() {
        let cmd = SettlementCommand::DeferredPayment { order: order() };
        let json = serde_json::to_value(&cmd).unwrap();
        assert_eq!(json["path"], "DEFERRED_PAYMENT");
        assert_eq!(json["order"]["side"], "BUY");
        let back: SettlementCommand = serde_json::from_value(json).unwrap();
        assert_eq!(back, cmd);
    }
}
