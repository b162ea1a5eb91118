//! Account History Query
//!
//! Per-client order and transaction pages for the presentation layer,
//! each with a one-line summary of today's activity.

use std::fmt;
use std::sync::Arc;

use crate::application::ports::TableStore;
use crate::application::services::{AccountStore, OrderLedger, TransactionLedger};
use crate::domain::account::ClientAccount;
use crate::domain::order::Order;
use crate::domain::position::{TradeTotals, TransferTotals};
use crate::domain::shared::{ClientId, LedgerError};
use crate::domain::transaction::Transaction;

/// A page of a client's orders.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderHistory {
    /// Client.
    pub account: ClientAccount,
    /// Today's USDT bought and sold by the client.
    pub today: TradeTotals,
    /// Orders on this page, newest first.
    pub orders: Vec<Order>,
}

impl fmt::Display for OrderHistory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({}): bought today {} USDT, sold today {} USDT",
            self.account.name, self.account.client_id, self.today.bought_usdt, self.today.sold_usdt
        )
    }
}

/// A page of a client's transactions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionHistory {
    /// Client.
    pub account: ClientAccount,
    /// Today's sent and received sums for the client.
    pub today: TransferTotals,
    /// Transactions on this page, newest first.
    pub transactions: Vec<Transaction>,
}

impl fmt::Display for TransactionHistory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let t = &self.today;
        write!(
            f,
            "{} ({}): sent today {} TOMAN / {} USDT, received today {} TOMAN / {} USDT",
            self.account.name,
            self.account.client_id,
            t.sent_toman,
            t.sent_usdt,
            t.received_toman,
            t.received_usdt
        )
    }
}

/// Query over one client's activity.
pub struct AccountHistory<S> {
    accounts: Arc<AccountStore<S>>,
    orders: Arc<OrderLedger<S>>,
    transactions: Arc<TransactionLedger<S>>,
}

impl<S: TableStore> AccountHistory<S> {
    /// Create a new `AccountHistory`.
    pub const fn new(
        accounts: Arc<AccountStore<S>>,
        orders: Arc<OrderLedger<S>>,
        transactions: Arc<TransactionLedger<S>>,
    ) -> Self {
        Self {
            accounts,
            orders,
            transactions,
        }
    }

    /// Orders page for `client_id`.
    pub async fn orders(
        &self,
        client_id: ClientId,
        offset: usize,
        page_size: usize,
    ) -> Result<OrderHistory, LedgerError> {
        let account = self.accounts.get(client_id).await?;
        let today = self.orders.daily_totals(account.account_id).await;
        let orders = self
            .orders
            .latest_orders(account.account_id, offset, page_size)
            .await;
        tracing::debug!(client_id = %client_id, offset, rows = orders.len(), "Order history page");
        Ok(OrderHistory {
            account,
            today,
            orders,
        })
    }

    /// Transactions page for `client_id`.
    pub async fn transactions(
        &self,
        client_id: ClientId,
        offset: usize,
        page_size: usize,
    ) -> Result<TransactionHistory, LedgerError> {
        let account = self.accounts.get(client_id).await?;
        let today = self.transactions.daily_totals(account.account_id).await;
        let transactions = self
            .transactions
            .latest_transactions(account.account_id, offset, page_size)
            .await;
        tracing::debug!(client_id = %client_id, offset, rows = transactions.len(), "Transaction history page");
        Ok(TransactionHistory {
            account,
            today,
            transactions,
        })
    }
}
