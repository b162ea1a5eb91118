//! Order Ledger
//!
//! Owns order records. Orders are created with a fixed status and live
//! until they are permanently deleted; nothing transitions them.
//! Lookup and deletion address the current period's table.

use std::sync::Arc;

use crate::application::ports::{Clock, IdSource, TableKind, TableRef, TableStore};
use crate::application::services::AccountStore;
use crate::application::services::tables::{append_record, draw_unique, load_records, newest_first_page};
use crate::application::session::LedgerSession;
use crate::domain::order::{Order, OrderInput, OrderRequest, OrderSide, OrderStatus, parse_order_input};
use crate::domain::position::TradeTotals;
use crate::domain::shared::{AccountId, Amount, LedgerError, Period, Ticket};
use crate::infrastructure::metrics;

/// Default page size for order history.
pub const DEFAULT_ORDER_PAGE_SIZE: usize = 3;

/// What deleting an order removed; the caller reverses the balance from it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeletedOrder {
    /// Ticket of the removed order.
    pub ticket: Ticket,
    /// Account the order belonged to.
    pub account_id: AccountId,
    /// Status the order was created with.
    pub status: OrderStatus,
    /// Buy or sell.
    pub side: OrderSide,
    /// `payable − paid_by_client` at deletion time.
    pub unpaid: Amount,
}

/// Order records for the current period.
pub struct OrderLedger<S> {
    store: Arc<S>,
    accounts: Arc<AccountStore<S>>,
    clock: Arc<dyn Clock>,
    ids: Arc<dyn IdSource>,
}

impl<S: TableStore> OrderLedger<S> {
    /// Create a ledger over `store`.
    pub fn new(
        store: Arc<S>,
        accounts: Arc<AccountStore<S>>,
        clock: Arc<dyn Clock>,
        ids: Arc<dyn IdSource>,
    ) -> Self {
        Self {
            store,
            accounts,
            clock,
            ids,
        }
    }

    /// Parse an operator-typed order line.
    pub fn parse_order_input(text: &str) -> Result<OrderInput, LedgerError> {
        parse_order_input(text)
    }

    fn table(&self, period: Period) -> TableRef {
        TableRef::new(TableKind::Orders, period)
    }

    /// Every order of `period`, in insertion order.
    pub async fn orders_in(&self, period: Period) -> Vec<Order> {
        load_records(&*self.store, self.table(period)).await
    }

    async fn current_orders(&self) -> Vec<Order> {
        self.orders_in(self.clock.current_period()).await
    }

    /// Order by ticket in the current period, or `None`.
    pub async fn find(&self, ticket: Ticket) -> Option<Order> {
        self.current_orders().await.into_iter().find(|o| o.ticket == ticket)
    }

    /// Draw a ticket not used by any order of the current period.
    pub async fn next_ticket(&self, _session: &LedgerSession<'_>) -> Result<Ticket, LedgerError> {
        let orders = self.current_orders().await;
        let ticket = draw_unique(&*self.ids, Ticket::RANGE, "ticket", |t| {
            orders.iter().any(|o| o.ticket.value() == t)
        })?;
        Ok(Ticket::new(ticket))
    }

    /// Create an order and return its ticket.
    pub async fn create_order(
        &self,
        session: &LedgerSession<'_>,
        request: &OrderRequest,
        status: OrderStatus,
        paid_by_client: Amount,
    ) -> Result<Ticket, LedgerError> {
        let ticket = self.next_ticket(session).await?;
        self.record_order(session, ticket, request, status, paid_by_client)
            .await?;
        Ok(ticket)
    }

    /// Create an order under a ticket drawn earlier with [`Self::next_ticket`].
    pub async fn record_order(
        &self,
        _session: &LedgerSession<'_>,
        ticket: Ticket,
        request: &OrderRequest,
        status: OrderStatus,
        paid_by_client: Amount,
    ) -> Result<Order, LedgerError> {
        let account = self.accounts.get(request.client_id).await?;
        let order = Order::new(
            ticket,
            account.account_id,
            account.name,
            request,
            status,
            paid_by_client,
            self.clock.now(),
        )?;

        append_record(&*self.store, self.table(self.clock.current_period()), &order).await?;
        tracing::info!(
            ticket = %order.ticket,
            account_id = %order.account_id,
            side = %order.side,
            currency = %order.currency,
            size = %order.size,
            price = %order.price,
            payable = %order.payable,
            paid = %order.paid_by_client,
            status = %order.status,
            "Order created"
        );
        metrics::record_order_created(status);
        Ok(order)
    }

    /// Permanently remove an order.
    pub async fn delete_order(
        &self,
        _session: &LedgerSession<'_>,
        ticket: Ticket,
    ) -> Result<DeletedOrder, LedgerError> {
        let order = self
            .find(ticket)
            .await
            .ok_or_else(|| LedgerError::not_found("order", ticket))?;

        let target = ticket.value();
        let removed = self
            .store
            .delete_rows_where(self.table(self.clock.current_period()), &|row| {
                row.get("ticket").and_then(serde_json::Value::as_u64) == Some(u64::from(target))
            })
            .await?;
        if removed > 1 {
            tracing::warn!(ticket = %ticket, removed, "Deleted more than one order row for ticket");
        }

        tracing::info!(ticket = %ticket, status = %order.status, unpaid = %order.unpaid(), "Order deleted");
        metrics::record_order_deleted(order.status);
        Ok(DeletedOrder {
            ticket,
            account_id: order.account_id,
            status: order.status,
            side: order.side,
            unpaid: order.unpaid(),
        })
    }

    /// `[offset, offset + page_size)` of the account's orders, newest first.
    pub async fn latest_orders(
        &self,
        account_id: AccountId,
        offset: usize,
        page_size: usize,
    ) -> Vec<Order> {
        let orders: Vec<Order> = self
            .current_orders()
            .await
            .into_iter()
            .filter(|o| o.account_id == account_id)
            .collect();
        newest_first_page(orders, |o| o.created_at, offset, page_size)
    }

    /// Today's USDT bought and sold by one account.
    pub async fn daily_totals(&self, account_id: AccountId) -> TradeTotals {
        let today = self.clock.today();
        let orders = self.current_orders().await;
        TradeTotals::from_orders(
            orders
                .iter()
                .filter(|o| o.account_id == account_id && o.created_at.date() == today),
        )
    }
}
