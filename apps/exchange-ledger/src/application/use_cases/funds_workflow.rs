//! Funds Workflow Use Case
//!
//! Standalone deposits and withdrawals and client-to-client transfers.
//! Every movement here is posted with the standalone ticket.

use std::sync::Arc;

use crate::application::dto::{TransferCommand, TransferReceipt};
use crate::application::ports::TableStore;
use crate::application::services::{AccountStore, TransactionLedger, TransactionReceipt};
use crate::application::session::{LedgerGate, LedgerSession};
use crate::application::use_cases::retry::StepRetryPolicy;
use crate::application::use_cases::steps::{Posting, post_with_retry, stranded};
use crate::domain::shared::{ClientId, LedgerError, Ticket};
use crate::domain::transaction::{Direction, TransactionInput, parse_transaction_input};

/// Use case for movements of funds that are not tied to an order.
pub struct FundsWorkflow<S> {
    gate: Arc<LedgerGate>,
    accounts: Arc<AccountStore<S>>,
    transactions: Arc<TransactionLedger<S>>,
    retry: StepRetryPolicy,
}

impl<S: TableStore> FundsWorkflow<S> {
    /// Create a new `FundsWorkflow`.
    pub const fn new(
        gate: Arc<LedgerGate>,
        accounts: Arc<AccountStore<S>>,
        transactions: Arc<TransactionLedger<S>>,
        retry: StepRetryPolicy,
    ) -> Self {
        Self {
            gate,
            accounts,
            transactions,
            retry,
        }
    }

    /// Parse and post an operator-typed line such as `send 100 usdt`.
    pub async fn post_line(&self, client_id: ClientId, text: &str) -> Result<TransactionReceipt, LedgerError> {
        let input = parse_transaction_input(text)?;
        self.post(client_id, &input).await
    }

    /// Apply the balance rule and record the movement.
    ///
    /// Currencies without a balance bucket are recorded without touching
    /// any balance.
    pub async fn post(&self, client_id: ClientId, input: &TransactionInput) -> Result<TransactionReceipt, LedgerError> {
        let session = self.gate.begin().await;
        self.accounts.get(client_id).await?;
        self.post_leg(&session, client_id, input).await
    }

    async fn post_leg(
        &self,
        session: &LedgerSession<'_>,
        client_id: ClientId,
        input: &TransactionInput,
    ) -> Result<TransactionReceipt, LedgerError> {
        let direction = input.direction;
        let posting = Posting {
            client_id,
            ticket: Ticket::STANDALONE,
            direction,
            currency: &input.currency,
            size: input.size,
        };

        if !input.currency.has_balance() {
            tracing::debug!(currency = %input.currency, "No balance bucket, recording only");
            return post_with_retry(&self.accounts, &self.transactions, session, &self.retry, &posting).await;
        }

        self.transactions
            .update_client_balance(session, client_id, direction, &input.currency, input.size)
            .await?;
        post_with_retry(&self.accounts, &self.transactions, session, &self.retry, &posting)
            .await
            .map_err(|e| stranded(&format!("balance adjustment for client {client_id}"), "transaction posting", &e))
    }

    /// Move funds between two clients: the payer takes a `Receive`, the payee a `Send`.
    pub async fn transfer(&self, command: &TransferCommand) -> Result<TransferReceipt, LedgerError> {
        if command.from == command.to {
            return Err(LedgerError::validation("Cannot transfer funds to the same client."));
        }
        if !command.amount.is_positive() {
            return Err(LedgerError::validation("Transfer amount must be greater than zero."));
        }

        let session = self.gate.begin().await;
        self.accounts.get(command.from).await?;
        self.accounts.get(command.to).await?;

        let outgoing = TransactionInput {
            direction: Direction::Receive,
            size: command.amount,
            currency: command.currency.clone(),
        };
        let sender = self
            .post_leg(&session, command.from, &outgoing)
            .await?;
        let receiver = self
            .post_leg(&session, command.to, &TransactionInput {
                direction: Direction::Send,
                ..outgoing
            })
            .await
            .map_err(|e| stranded(&format!("transfer leg from client {}", command.from), "receiving leg", &e))?;

        tracing::info!(
            from = %command.from,
            to = %command.to,
            currency = %command.currency,
            amount = %command.amount,
            "Funds transferred"
        );
        Ok(TransferReceipt { sender, receiver })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::ports::{FixedClock, IdSource, RandomIdSource};
    use crate::domain::shared::{Amount, Currency};
    use crate::infrastructure::persistence::InMemoryTableStore;
    use chrono::NaiveDate;

    struct Fixture {
        funds: FundsWorkflow<InMemoryTableStore>,
        accounts: Arc<AccountStore<InMemoryTableStore>>,
        gate: Arc<LedgerGate>,
    }

    fn fixture() -> Fixture {
        let store = Arc::new(InMemoryTableStore::new());
        let clock = Arc::new(FixedClock::at_date(NaiveDate::from_ymd_opt(2026, 10, 17).unwrap()));
        let ids: Arc<dyn IdSource> = Arc::new(RandomIdSource::seeded(4));
        let accounts = Arc::new(AccountStore::new(Arc::clone(&store), clock.clone(), ids));
        let transactions = Arc::new(TransactionLedger::new(store, Arc::clone(&accounts), clock));
        let gate = Arc::new(LedgerGate::new());
        let funds = FundsWorkflow::new(
            Arc::clone(&gate),
            Arc::clone(&accounts),
            transactions,
            StepRetryPolicy::none(),
        );
        Fixture { funds, accounts, gate }
    }

    async fn client(fx: &Fixture, name: &str) -> ClientId {
        let session = fx.gate.begin().await;
        fx.accounts
            .create(&session, name, Amount::ZERO, Amount::ZERO)
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn post_line_applies_balance_rule() {
        let fx = fixture();
        let c = client(&fx, "Ali").await;
        let receipt = fx.funds.post_line(c, "r 250 usdt").await.unwrap();
        assert_eq!(receipt.usdt_balance, Amount::from_units(-250));
        assert!(receipt.transaction.order_ticket.is_standalone());
    }

    #[tokio::test]
    async fn other_currency_is_recorded_only() {
        let fx = fixture();
        let c = client(&fx, "Ali").await;
        let receipt = fx.funds.post_line(c, "send 10 aed").await.unwrap();
        assert_eq!(receipt.transaction.currency, Currency::parse("AED"));
        let account = fx.accounts.get(c).await.unwrap();
        assert_eq!(account.usdt_balance, Amount::ZERO);
        assert_eq!(account.toman_balance, Amount::ZERO);
    }

    #[tokio::test]
    async fn transfer_moves_between_clients() {
        let fx = fixture();
        let a = client(&fx, "Ali").await;
        let b = client(&fx, "Mina").await;
        let receipt = fx
            .funds
            .transfer(&TransferCommand {
                from: a,
                to: b,
                currency: Currency::Toman,
                amount: Amount::from_units(1_000_000),
            })
            .await
            .unwrap();

        assert_eq!(receipt.sender.toman_balance, Amount::from_units(-1_000_000));
        assert_eq!(receipt.receiver.toman_balance, Amount::from_units(1_000_000));
        assert_eq!(receipt.sender.transaction.direction, Direction::Receive);
        assert_eq!(receipt.receiver.transaction.direction, Direction::Send);
    }

    #[tokio::test]
    async fn transfer_validation() {
        let fx = fixture();
        let a = client(&fx, "Ali").await;
        let same = fx
            .funds
            .transfer(&TransferCommand {
                from: a,
                to: a,
                currency: Currency::Toman,
                amount: Amount::from_units(1),
            })
            .await
            .unwrap_err();
        assert!(matches!(same, LedgerError::Validation { .. }));

        let unknown = fx
            .funds
            .transfer(&TransferCommand {
                from: a,
                to: ClientId::new(1),
                currency: Currency::Toman,
                amount: Amount::from_units(1),
            })
            .await
            .unwrap_err();
        assert!(matches!(unknown, LedgerError::NotFound { .. }));
        assert_eq!(fx.accounts.get(a).await.unwrap().toman_balance, Amount::ZERO);
    }
}
