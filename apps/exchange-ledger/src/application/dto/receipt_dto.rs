//! Workflow results with their rendered confirmations.

use std::fmt;

use super::SettlementPath;
use crate::application::services::{DeletedOrder, TransactionReceipt};
use crate::domain::account::ClientAccount;
use crate::domain::order::{Order, OrderInput};
use crate::domain::shared::{Amount, Currency};

/// Outcome of settling an order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SettlementReceipt {
    /// Path taken.
    pub path: SettlementPath,
    /// Order as recorded.
    pub order: Order,
    /// Account after the balance effect, when the path has one.
    pub balance: Option<ClientAccount>,
    /// Posted settlement leg, when the path posts one.
    pub transaction: Option<TransactionReceipt>,
}

impl fmt::Display for SettlementReceipt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let o = &self.order;
        writeln!(f, "Order {} recorded ({})", o.ticket, o.status)?;
        writeln!(f, "Client: {}", o.client_name)?;
        writeln!(f, "{} {} {} @ {}", o.side, o.size, o.currency, o.price)?;
        writeln!(f, "Payable: {} {}", o.payable, Currency::SETTLEMENT)?;
        writeln!(f, "Paid: {}", o.paid_by_client)?;
        write!(f, "Debt: {}", o.debt)?;
        if let Some(account) = &self.balance {
            write!(f, "\nTOMAN balance: {}", account.toman_balance)?;
        }
        if let Some(tx) = &self.transaction {
            write!(f, "\n\n{tx}")?;
        }
        Ok(())
    }
}

/// Outcome of deleting an order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeletionReceipt {
    /// What was removed.
    pub deleted: DeletedOrder,
    /// Amount taken back off the balance, for Pending and Manual orders.
    pub balance_reversed: Option<Amount>,
    /// Linked transaction rows removed.
    pub transactions_removed: usize,
}

impl fmt::Display for DeletionReceipt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Order {} ({}) deleted",
            self.deleted.ticket, self.deleted.status
        )?;
        if let Some(amount) = self.balance_reversed {
            write!(f, "; {amount} {} reversed", Currency::SETTLEMENT)?;
        }
        if self.transactions_removed > 0 {
            write!(f, "; {} transaction(s) removed", self.transactions_removed)?;
        }
        Ok(())
    }
}

/// Parsed order line priced for operator confirmation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderQuote {
    /// Client the order is for.
    pub client: ClientAccount,
    /// Parsed line.
    pub input: OrderInput,
    /// `size × price`.
    pub payable: Amount,
}

impl fmt::Display for OrderQuote {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Client: {} ({})", self.client.name, self.client.client_id)?;
        writeln!(
            f,
            "{} {} {} @ {}",
            self.input.side, self.input.size, self.input.currency, self.input.price
        )?;
        write!(f, "Payable: {} {}", self.payable, Currency::SETTLEMENT)
    }
}

/// Acknowledgement of an abandoned order entry. Nothing is mutated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CancelNotice {
    /// Message for the operator.
    pub message: &'static str,
}

impl Default for CancelNotice {
    fn default() -> Self {
        Self {
            message: "Order has been canceled.",
        }
    }
}

/// Both legs of a client-to-client transfer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferReceipt {
    /// Paying client's leg (`Receive`).
    pub sender: TransactionReceipt,
    /// Receiving client's leg (`Send`).
    pub receiver: TransactionReceipt,
}

impl fmt::Display for TransferReceipt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}\n\n{}", self.sender, self.receiver)
    }
}
