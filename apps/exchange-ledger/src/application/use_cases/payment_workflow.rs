//! Payment Workflow Use Case
//!
//! Settles orders along one of three paths and deletes them again,
//! sequencing the account, order and transaction stores under one session.
//!
//! | Path     | Balance effect         | Order status | Transaction     |
//! |----------|------------------------|--------------|-----------------|
//! | Full     | none                   | Complete     | payable         |
//! | Manual   | `payable − paid_now`   | Manual       | `paid_now`      |
//! | Deferred | `payable`              | Pending      | none            |
//!
//! Deletion mirrors the table: Pending reverses the balance, Manual reverses
//! the balance and removes the transaction, Complete removes the transaction.

use std::sync::Arc;

use crate::application::dto::{
    CancelNotice, DeletionReceipt, OrderQuote, SettlementCommand, SettlementPath, SettlementReceipt,
};
use crate::application::ports::TableStore;
use crate::application::services::{AccountStore, OrderLedger, TransactionLedger, TransactionReceipt};
use crate::application::session::{LedgerGate, LedgerSession};
use crate::application::use_cases::retry::StepRetryPolicy;
use crate::application::use_cases::steps::{Posting, post_with_retry, record_with_retry, stranded};
use crate::domain::order::{Order, OrderRequest, parse_order_input};
use crate::domain::shared::{Amount, ClientId, Currency, LedgerError, Ticket};
use crate::infrastructure::metrics;

/// Use case for settling and deleting orders.
pub struct PaymentWorkflow<S> {
    gate: Arc<LedgerGate>,
    accounts: Arc<AccountStore<S>>,
    orders: Arc<OrderLedger<S>>,
    transactions: Arc<TransactionLedger<S>>,
    retry: StepRetryPolicy,
}

impl<S: TableStore> PaymentWorkflow<S> {
    /// Create a new `PaymentWorkflow`.
    pub const fn new(
        gate: Arc<LedgerGate>,
        accounts: Arc<AccountStore<S>>,
        orders: Arc<OrderLedger<S>>,
        transactions: Arc<TransactionLedger<S>>,
        retry: StepRetryPolicy,
    ) -> Self {
        Self {
            gate,
            accounts,
            orders,
            transactions,
            retry,
        }
    }

    /// Parse an order line for a client and price it, without mutating anything.
    pub async fn quote(&self, client_id: ClientId, text: &str) -> Result<OrderQuote, LedgerError> {
        let input = parse_order_input(text)?;
        let client = self.accounts.get(client_id).await?;
        let payable = input.payable()?;
        Ok(OrderQuote {
            client,
            input,
            payable,
        })
    }

    /// Abandon an order entry. Performs no ledger mutation.
    pub fn cancel(&self) -> CancelNotice {
        tracing::debug!("Order entry canceled");
        CancelNotice::default()
    }

    /// Settle an order along the command's path.
    pub async fn settle(&self, command: SettlementCommand) -> Result<SettlementReceipt, LedgerError> {
        let request = command.order();
        request.validate()?;

        let session = self.gate.begin().await;
        self.accounts.get(request.client_id).await?;

        let path = command.path();
        let receipt = match &command {
            SettlementCommand::FullPayment { .. } => self.settle_full(&session, request).await?,
            SettlementCommand::ManualPayment { paid_now, .. } => {
                self.settle_manual(&session, request, *paid_now).await?
            }
            SettlementCommand::DeferredPayment { .. } => {
                self.settle_deferred(&session, request).await?
            }
        };

        tracing::info!(
            path = path.as_str(),
            ticket = %receipt.order.ticket,
            client_id = %request.client_id,
            payable = %receipt.order.payable,
            held_ms = session.elapsed_ms(),
            "Order settled"
        );
        metrics::record_settlement(path);
        Ok(receipt)
    }

    async fn settle_full(
        &self,
        session: &LedgerSession<'_>,
        request: &OrderRequest,
    ) -> Result<SettlementReceipt, LedgerError> {
        let payable = request.payable()?;
        let status = SettlementPath::FullPayment.status();

        let ticket = self.orders.next_ticket(session).await?;
        let order = record_with_retry(&self.orders, session, &self.retry, ticket, request, status, payable).await?;

        let transaction = self
            .post_settlement_leg(session, &order, request.client_id, payable)
            .await
            .map_err(|e| stranded(&format!("order {ticket}"), "settlement transaction", &e))?;

        Ok(SettlementReceipt {
            path: SettlementPath::FullPayment,
            order,
            balance: None,
            transaction: Some(transaction),
        })
    }

    async fn settle_manual(
        &self,
        session: &LedgerSession<'_>,
        request: &OrderRequest,
        paid_now: Amount,
    ) -> Result<SettlementReceipt, LedgerError> {
        let payable = request.payable()?;
        if !paid_now.is_positive() || paid_now > payable {
            return Err(LedgerError::validation(format!(
                "Paid amount must be greater than zero and at most the payable {payable}."
            )));
        }
        let direction = request.side.settlement_direction();

        let balance = self
            .transactions
            .update_client_balance(session, request.client_id, direction, &Currency::SETTLEMENT, payable - paid_now)
            .await?;

        let committed = format!("balance adjustment for client {}", request.client_id);
        let ticket = self
            .orders
            .next_ticket(session)
            .await
            .map_err(|e| stranded(&committed, "order creation", &e))?;
        let order = record_with_retry(
            &self.orders,
            session,
            &self.retry,
            ticket,
            request,
            SettlementPath::ManualPayment.status(),
            paid_now,
        )
        .await
        .map_err(|e| stranded(&committed, "order creation", &e))?;

        let transaction = self
            .post_settlement_leg(session, &order, request.client_id, paid_now)
            .await
            .map_err(|e| stranded(&format!("{committed} and order {ticket}"), "settlement transaction", &e))?;

        Ok(SettlementReceipt {
            path: SettlementPath::ManualPayment,
            order,
            balance: Some(balance),
            transaction: Some(transaction),
        })
    }

    async fn settle_deferred(
        &self,
        session: &LedgerSession<'_>,
        request: &OrderRequest,
    ) -> Result<SettlementReceipt, LedgerError> {
        let payable = request.payable()?;
        let direction = request.side.settlement_direction();

        let balance = self
            .transactions
            .update_client_balance(session, request.client_id, direction, &Currency::SETTLEMENT, payable)
            .await?;

        let committed = format!("balance adjustment for client {}", request.client_id);
        let ticket = self
            .orders
            .next_ticket(session)
            .await
            .map_err(|e| stranded(&committed, "order creation", &e))?;
        let order = record_with_retry(
            &self.orders,
            session,
            &self.retry,
            ticket,
            request,
            SettlementPath::DeferredPayment.status(),
            Amount::ZERO,
        )
        .await
        .map_err(|e| stranded(&committed, "order creation", &e))?;

        Ok(SettlementReceipt {
            path: SettlementPath::DeferredPayment,
            order,
            balance: Some(balance),
            transaction: None,
        })
    }

    async fn post_settlement_leg(
        &self,
        session: &LedgerSession<'_>,
        order: &Order,
        client_id: ClientId,
        size: Amount,
    ) -> Result<TransactionReceipt, LedgerError> {
        let posting = Posting {
            client_id,
            ticket: order.ticket,
            direction: order.side.settlement_direction(),
            currency: &Currency::SETTLEMENT,
            size,
        };
        post_with_retry(&self.accounts, &self.transactions, session, &self.retry, &posting).await
    }

    /// Delete an order and undo exactly what its settlement path did.
    pub async fn delete_order(&self, ticket: Ticket) -> Result<DeletionReceipt, LedgerError> {
        let session = self.gate.begin().await;

        let order = self
            .orders
            .find(ticket)
            .await
            .ok_or_else(|| LedgerError::not_found("order", ticket))?;
        let owner = self.accounts.find_by_account(order.account_id).await;
        if order.status.adjusts_balance() && owner.is_none() {
            return Err(LedgerError::inconsistency(format!(
                "order {ticket} belongs to unknown account {}",
                order.account_id
            )));
        }

        let deleted = self.orders.delete_order(&session, ticket).await?;
        let committed = format!("deletion of order {ticket}");

        let mut balance_reversed = None;
        if let Some(owner) = owner.filter(|_| deleted.status.adjusts_balance()) {
            self.transactions
                .update_client_balance(
                    &session,
                    owner.client_id,
                    deleted.side.settlement_direction().opposite(),
                    &Currency::SETTLEMENT,
                    deleted.unpaid,
                )
                .await
                .map_err(|e| stranded(&committed, "balance reversal", &e))?;
            balance_reversed = Some(deleted.unpaid);
        }

        let mut transactions_removed = 0;
        if deleted.status.posts_transaction() {
            transactions_removed = self
                .transactions
                .remove_transaction(&session, ticket)
                .await
                .map_err(|e| stranded(&committed, "transaction removal", &e))?;
            if transactions_removed == 0 {
                tracing::warn!(ticket = %ticket, status = %deleted.status, "Deleted order had no linked transaction");
                return Err(LedgerError::inconsistency(format!(
                    "order {ticket} ({}) was deleted but had no linked transaction",
                    deleted.status
                )));
            }
        }

        tracing::info!(
            ticket = %ticket,
            status = %deleted.status,
            reversed = ?balance_reversed.map(|a| a.to_string()),
            transactions_removed,
            "Order reversed"
        );
        Ok(DeletionReceipt {
            deleted,
            balance_reversed,
            transactions_removed,
        })
    }
}
