//! Idempotent ledger steps shared by the workflows.

use crate::application::ports::TableStore;
use crate::application::services::{AccountStore, OrderLedger, TransactionLedger, TransactionReceipt};
use crate::application::session::LedgerSession;
use crate::application::use_cases::retry::StepRetryPolicy;
use crate::domain::order::{Order, OrderRequest, OrderStatus};
use crate::domain::shared::{AccountId, Amount, ClientId, Currency, LedgerError, Ticket};
use crate::domain::transaction::{Direction, Transaction};
use crate::infrastructure::metrics;

/// One transaction to post.
#[derive(Debug, Clone, Copy)]
pub struct Posting<'a> {
    /// Client whose account is posted to.
    pub client_id: ClientId,
    /// Linked ticket or standalone.
    pub ticket: Ticket,
    /// Direction.
    pub direction: Direction,
    /// Currency.
    pub currency: &'a Currency,
    /// Positive size.
    pub size: Amount,
}

impl Posting<'_> {
    fn matches(&self, tx: &Transaction) -> bool {
        tx.order_ticket == self.ticket
            && tx.direction == self.direction
            && &tx.currency == self.currency
            && tx.size == self.size
    }
}

async fn matching<S: TableStore>(
    ledger: &TransactionLedger<S>,
    account_id: AccountId,
    posting: &Posting<'_>,
) -> Vec<Transaction> {
    ledger
        .latest_transactions(account_id, 0, usize::MAX)
        .await
        .into_iter()
        .filter(|tx| posting.matches(tx))
        .collect()
}

/// Post a transaction, retrying transient failures without duplicating the row.
pub async fn post_with_retry<S: TableStore>(
    accounts: &AccountStore<S>,
    ledger: &TransactionLedger<S>,
    session: &LedgerSession<'_>,
    policy: &StepRetryPolicy,
    posting: &Posting<'_>,
) -> Result<TransactionReceipt, LedgerError> {
    let account = accounts.get(posting.client_id).await?;
    let baseline = matching(ledger, account.account_id, posting).await.len();
    let mut retry = 0;

    loop {
        let err = match ledger
            .add_transaction(
                session,
                posting.client_id,
                posting.ticket,
                posting.direction,
                posting.currency,
                posting.size,
            )
            .await
        {
            Ok(receipt) => return Ok(receipt),
            Err(e) if e.is_retryable() => e,
            Err(e) => return Err(e),
        };

        let landed = matching(ledger, account.account_id, posting).await;
        if landed.len() > baseline
            && let Some(transaction) = landed.into_iter().next()
        {
            tracing::warn!(ticket = %posting.ticket, error = %err, "Transaction row present after failed write");
            let account = accounts.get(posting.client_id).await?;
            return Ok(TransactionReceipt {
                transaction,
                client_id: posting.client_id,
                usdt_balance: account.usdt_balance,
                toman_balance: account.toman_balance,
            });
        }

        if retry >= policy.max_retries {
            return Err(err);
        }
        retry += 1;
        metrics::record_step_retry("post_transaction");
        tracing::warn!(ticket = %posting.ticket, retry, error = %err, "Retrying transaction posting");
        tokio::time::sleep(policy.backoff(retry)).await;
    }
}

/// Record an order under `ticket`, retrying transient failures without
/// duplicating the row.
pub async fn record_with_retry<S: TableStore>(
    orders: &OrderLedger<S>,
    session: &LedgerSession<'_>,
    policy: &StepRetryPolicy,
    ticket: Ticket,
    request: &OrderRequest,
    status: OrderStatus,
    paid_by_client: Amount,
) -> Result<Order, LedgerError> {
    let mut retry = 0;

    loop {
        let err = match orders
            .record_order(session, ticket, request, status, paid_by_client)
            .await
        {
            Ok(order) => return Ok(order),
            Err(e) if e.is_retryable() => e,
            Err(e) => return Err(e),
        };

        if let Some(order) = orders.find(ticket).await {
            tracing::warn!(ticket = %ticket, error = %err, "Order row present after failed write");
            return Ok(order);
        }

        if retry >= policy.max_retries {
            return Err(err);
        }
        retry += 1;
        metrics::record_step_retry("record_order");
        tracing::warn!(ticket = %ticket, retry, error = %err, "Retrying order creation");
        tokio::time::sleep(policy.backoff(retry)).await;
    }
}

/// Wrap a failure that left earlier steps committed.
pub fn stranded(committed: &str, failed_step: &str, err: &LedgerError) -> LedgerError {
    tracing::error!(
        committed,
        failed_step,
        error = %err,
        "Workflow stopped after a committed step; ledger needs manual completion"
    );
    LedgerError::inconsistency(format!(
        "{committed} was committed but {failed_step} failed ({err}); complete it manually"
    ))
}
