//! Transaction Ledger
//!
//! Owns the append-mostly transaction log and the one balance rule the
//! whole ledger is built on: `Send` adds to the client's bucket, `Receive`
//! subtracts from it.

use std::fmt;
use std::sync::Arc;

use crate::application::ports::{Clock, TableKind, TableRef, TableStore};
use crate::application::services::AccountStore;
use crate::application::services::tables::{append_record, load_records, newest_first_page};
use crate::application::session::LedgerSession;
use crate::domain::account::ClientAccount;
use crate::domain::position::TransferTotals;
use crate::domain::shared::{AccountId, Amount, ClientId, Currency, LedgerError, Period, Ticket};
use crate::domain::transaction::{Direction, Transaction, TransactionInput, parse_transaction_input};
use crate::infrastructure::metrics;

/// Default page size for transaction history.
pub const DEFAULT_TRANSACTION_PAGE_SIZE: usize = 3;

/// Confirmation of a posted transaction with the client's balances after it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionReceipt {
    /// The posted row.
    pub transaction: Transaction,
    /// Client id.
    pub client_id: ClientId,
    /// USDT balance after posting.
    pub usdt_balance: Amount,
    /// TOMAN balance after posting.
    pub toman_balance: Amount,
}

impl fmt::Display for TransactionReceipt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tx = &self.transaction;
        writeln!(f, "Transaction recorded")?;
        writeln!(f, "Client: {} ({})", tx.client_name, self.client_id)?;
        writeln!(f, "Type: {}", tx.direction)?;
        writeln!(f, "Amount: {} {}", tx.size, tx.currency)?;
        if tx.is_linked() {
            writeln!(f, "Order: {}", tx.order_ticket)?;
        }
        writeln!(f, "USDT balance: {}", self.usdt_balance)?;
        write!(f, "TOMAN balance: {}", self.toman_balance)
    }
}

/// Transaction log for the current period.
pub struct TransactionLedger<S> {
    store: Arc<S>,
    accounts: Arc<AccountStore<S>>,
    clock: Arc<dyn Clock>,
}

impl<S: TableStore> TransactionLedger<S> {
    /// Create a ledger over `store`.
    pub fn new(store: Arc<S>, accounts: Arc<AccountStore<S>>, clock: Arc<dyn Clock>) -> Self {
        Self {
            store,
            accounts,
            clock,
        }
    }

    /// Parse an operator-typed transaction line.
    pub fn parse_transaction_input(text: &str) -> Result<TransactionInput, LedgerError> {
        parse_transaction_input(text)
    }

    fn table(&self, period: Period) -> TableRef {
        TableRef::new(TableKind::Transactions, period)
    }

    /// Every transaction of `period`, in posting order.
    pub async fn transactions_in(&self, period: Period) -> Vec<Transaction> {
        load_records(&*self.store, self.table(period)).await
    }

    async fn current_transactions(&self) -> Vec<Transaction> {
        self.transactions_in(self.clock.current_period()).await
    }

    /// Apply the balance rule for `direction` to the client's `currency` bucket.
    ///
    /// Fails loudly: an unknown client is an inconsistency, not a miss.
    pub async fn update_client_balance(
        &self,
        session: &LedgerSession<'_>,
        client_id: ClientId,
        direction: Direction,
        currency: &Currency,
        amount: Amount,
    ) -> Result<ClientAccount, LedgerError> {
        if amount.is_negative() {
            return Err(LedgerError::validation("Balance adjustment amount cannot be negative."));
        }
        self.accounts
            .adjust_balance(session, client_id, currency, direction.signed(amount))
            .await
            .map_err(|e| match e {
                LedgerError::NotFound { .. } => {
                    tracing::error!(client_id = %client_id, "Balance update for unknown client");
                    LedgerError::inconsistency(format!(
                        "balance update requested for unknown client {client_id}"
                    ))
                }
                other => other,
            })
    }

    /// Append a transaction and confirm it with the client's current balances.
    ///
    /// Any balance update must already have been applied.
    pub async fn add_transaction(
        &self,
        _session: &LedgerSession<'_>,
        client_id: ClientId,
        ticket: Ticket,
        direction: Direction,
        currency: &Currency,
        size: Amount,
    ) -> Result<TransactionReceipt, LedgerError> {
        let account = self.accounts.get(client_id).await?;
        let transaction = Transaction::new(
            self.clock.now(),
            account.account_id,
            ticket,
            account.name.clone(),
            direction,
            currency.clone(),
            size,
        )?;

        append_record(&*self.store, self.table(self.clock.current_period()), &transaction).await?;
        tracing::info!(
            account_id = %transaction.account_id,
            ticket = %ticket,
            direction = %direction,
            currency = %currency,
            size = %size,
            "Transaction posted"
        );
        metrics::record_transaction_posted(direction);

        Ok(TransactionReceipt {
            transaction,
            client_id,
            usdt_balance: account.usdt_balance,
            toman_balance: account.toman_balance,
        })
    }

    /// Delete every transaction carrying `ticket`; zero matches is not an error.
    ///
    /// The standalone ticket is rejected: it would match every unlinked
    /// deposit and withdrawal of the period.
    pub async fn remove_transaction(
        &self,
        _session: &LedgerSession<'_>,
        ticket: Ticket,
    ) -> Result<usize, LedgerError> {
        if ticket.is_standalone() {
            return Err(LedgerError::validation(
                "Standalone transactions cannot be removed by ticket.",
            ));
        }
        let target = u64::from(ticket.value());
        let removed = self
            .store
            .delete_rows_where(self.table(self.clock.current_period()), &|row| {
                row.get("order_ticket").and_then(serde_json::Value::as_u64) == Some(target)
            })
            .await?;
        tracing::info!(ticket = %ticket, removed, "Transactions removed");
        Ok(removed)
    }

    /// Transactions posted against `ticket` in the current period.
    pub async fn find_linked(&self, ticket: Ticket) -> Vec<Transaction> {
        self.current_transactions()
            .await
            .into_iter()
            .filter(|t| t.order_ticket == ticket)
            .collect()
    }

    /// `[offset, offset + page_size)` of the account's transactions, newest first.
    pub async fn latest_transactions(
        &self,
        account_id: AccountId,
        offset: usize,
        page_size: usize,
    ) -> Vec<Transaction> {
        let rows: Vec<Transaction> = self
            .current_transactions()
            .await
            .into_iter()
            .filter(|t| t.account_id == account_id)
            .collect();
        newest_first_page(rows, |t| t.date, offset, page_size)
    }

    /// Today's sent and received sums for one account.
    pub async fn daily_totals(&self, account_id: AccountId) -> TransferTotals {
        let today = self.clock.today();
        let rows = self.current_transactions().await;
        TransferTotals::from_transactions(
            rows.iter()
                .filter(|t| t.account_id == account_id && t.date.date() == today),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::LedgerGate;
    use crate::application::ports::{FixedClock, IdSource, RandomIdSource};
    use crate::infrastructure::persistence::InMemoryTableStore;
    use chrono::NaiveDate;
    use proptest::prelude::*;
    use rust_decimal::Decimal;

    struct Fixture {
        ledger: TransactionLedger<InMemoryTableStore>,
        accounts: Arc<AccountStore<InMemoryTableStore>>,
        gate: LedgerGate,
    }

    fn fixture() -> Fixture {
        let store = Arc::new(InMemoryTableStore::new());
        let clock = Arc::new(FixedClock::at_date(NaiveDate::from_ymd_opt(2026, 10, 17).unwrap()));
        let ids: Arc<dyn IdSource> = Arc::new(RandomIdSource::seeded(3));
        let accounts = Arc::new(AccountStore::new(Arc::clone(&store), clock.clone(), ids));
        let ledger = TransactionLedger::new(store, Arc::clone(&accounts), clock);
        Fixture {
            ledger,
            accounts,
            gate: LedgerGate::new(),
        }
    }

    #[tokio::test]
    async fn receipt_reflects_prior_balance_update() {
        let fx = fixture();
        let session = fx.gate.begin().await;
        let client = fx.accounts.create(&session, "Ali", Amount::ZERO, Amount::ZERO).await.unwrap();

        fx.ledger
            .update_client_balance(&session, client, Direction::Send, &Currency::Toman, Amount::from_units(700))
            .await
            .unwrap();
        let receipt = fx
            .ledger
            .add_transaction(&session, client, Ticket::STANDALONE, Direction::Send, &Currency::Toman, Amount::from_units(700))
            .await
            .unwrap();

        assert_eq!(receipt.toman_balance, Amount::from_units(700));
        assert!(receipt.to_string().contains("TOMAN balance: 700"));
        assert!(!receipt.transaction.is_linked());
    }

    #[tokio::test]
    async fn update_unknown_client_is_inconsistency() {
        let fx = fixture();
        let session = fx.gate.begin().await;
        let err = fx
            .ledger
            .update_client_balance(&session, ClientId::new(1111), Direction::Receive, &Currency::Toman, Amount::from_units(1))
            .await
            .unwrap_err();
        assert!(matches!(err, LedgerError::Inconsistency { .. }));
    }

    #[tokio::test]
    async fn remove_transaction_by_ticket() {
        let fx = fixture();
        let session = fx.gate.begin().await;
        let client = fx.accounts.create(&session, "Ali", Amount::ZERO, Amount::ZERO).await.unwrap();
        let ticket = Ticket::new(400_400);
        fx.ledger
            .add_transaction(&session, client, ticket, Direction::Receive, &Currency::Toman, Amount::from_units(5))
            .await
            .unwrap();
        fx.ledger
            .add_transaction(&session, client, Ticket::STANDALONE, Direction::Send, &Currency::Usdt, Amount::from_units(1))
            .await
            .unwrap();

        assert_eq!(fx.ledger.find_linked(ticket).await.len(), 1);
        assert_eq!(fx.ledger.remove_transaction(&session, ticket).await.unwrap(), 1);
        assert_eq!(fx.ledger.remove_transaction(&session, ticket).await.unwrap(), 0);
        assert!(fx.ledger.find_linked(ticket).await.is_empty());
    }

    #[tokio::test]
    async fn standalone_ticket_cannot_be_removed() {
        let fx = fixture();
        let session = fx.gate.begin().await;
        let client = fx.accounts.create(&session, "Ali", Amount::ZERO, Amount::ZERO).await.unwrap();
        for size in [1, 2] {
            fx.ledger
                .add_transaction(&session, client, Ticket::STANDALONE, Direction::Receive, &Currency::Usdt, Amount::from_units(size))
                .await
                .unwrap();
        }

        let err = fx
            .ledger
            .remove_transaction(&session, Ticket::STANDALONE)
            .await
            .unwrap_err();
        assert!(matches!(err, LedgerError::Validation { .. }));
        assert_eq!(fx.ledger.find_linked(Ticket::STANDALONE).await.len(), 2);
    }

    #[tokio::test]
    async fn daily_totals_and_history() {
        let fx = fixture();
        let session = fx.gate.begin().await;
        let client = fx.accounts.create(&session, "Ali", Amount::ZERO, Amount::ZERO).await.unwrap();
        let account_id = fx.accounts.get(client).await.unwrap().account_id;
        for (direction, currency, size) in [
            (Direction::Send, Currency::Toman, 100),
            (Direction::Receive, Currency::Toman, 40),
            (Direction::Send, Currency::Usdt, 3),
            (Direction::Send, Currency::parse("aed"), 9),
        ] {
            fx.ledger
                .add_transaction(&session, client, Ticket::STANDALONE, direction, &currency, Amount::from_units(size))
                .await
                .unwrap();
        }

        let totals = fx.ledger.daily_totals(account_id).await;
        assert_eq!(totals.sent_toman, Amount::from_units(100));
        assert_eq!(totals.received_toman, Amount::from_units(40));
        assert_eq!(totals.sent_usdt, Amount::from_units(3));

        let page = fx.ledger.latest_transactions(account_id, 0, DEFAULT_TRANSACTION_PAGE_SIZE).await;
        assert_eq!(page.len(), 3);
        assert_eq!(page[0].currency, Currency::parse("AED"));
    }

    proptest! {
        #[test]
        fn send_then_receive_restores_balance(units in 0_i64..1_000_000_000_000, scale in 0_u32..4, start in -1_000_000_i64..1_000_000) {
            let rt = tokio::runtime::Builder::new_current_thread().build().unwrap();
            rt.block_on(async {
                let fx = fixture();
                let session = fx.gate.begin().await;
                let client = fx.accounts
                    .create(&session, "Ali", Amount::ZERO, Amount::from_units(start))
                    .await
                    .unwrap();
                let amount = Amount::new(Decimal::new(units, scale));

                fx.ledger.update_client_balance(&session, client, Direction::Send, &Currency::Toman, amount).await.unwrap();
                let after = fx.ledger.update_client_balance(&session, client, Direction::Receive, &Currency::Toman, amount).await.unwrap();
                prop_assert_eq!(after.toman_balance, Amount::from_units(start));
                Ok(())
            })?;
        }
    }
}
