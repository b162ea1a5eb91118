//! Dependency Injection Container
//!
//! Builds the ledger services once over a single table store and hands out
//! the workflows and queries that share them.

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use super::LedgerConfig;
use crate::application::LedgerGate;
use crate::application::ports::{
    Clock, IdSource, RandomIdSource, SharedPeriodPort, SystemClock, TableStore,
};
use crate::application::services::{
    AccountStore, OrderLedger, PositionAggregator, PositionRollupService, TransactionLedger,
};
use crate::application::use_cases::{
    AccountHistory, ExportSnapshot, FundsWorkflow, PaymentWorkflow, StepRetryPolicy,
};
use crate::infrastructure::persistence::{FileShareMarker, InMemoryTableStore, JsonFileTableStore};

/// Dependency injection container.
///
/// Every workflow created here shares one [`LedgerGate`] and one set of
/// ledger services.
pub struct Container<S>
where
    S: TableStore + 'static,
{
    // Ports
    store: Arc<S>,
    clock: Arc<dyn Clock>,
    shared: Arc<dyn SharedPeriodPort>,

    // Services
    gate: Arc<LedgerGate>,
    accounts: Arc<AccountStore<S>>,
    orders: Arc<OrderLedger<S>>,
    transactions: Arc<TransactionLedger<S>>,
    aggregator: Arc<PositionAggregator<S>>,
    retry: StepRetryPolicy,
}

impl Container<JsonFileTableStore> {
    /// File-backed container with the system clock.
    #[must_use]
    pub fn file_backed(config: &LedgerConfig) -> Self {
        Self::new(
            Arc::new(JsonFileTableStore::new(&config.data_dir)),
            Arc::new(SystemClock),
            Arc::new(RandomIdSource::new()),
            Arc::new(FileShareMarker::new(&config.share_marker_path)),
            config.retry,
        )
    }
}

impl Container<InMemoryTableStore> {
    /// Memory-only container with the system clock.
    #[must_use]
    pub fn in_memory(config: &LedgerConfig) -> Self {
        Self::new(
            Arc::new(InMemoryTableStore::new()),
            Arc::new(SystemClock),
            Arc::new(RandomIdSource::new()),
            Arc::new(FileShareMarker::new(&config.share_marker_path)),
            config.retry,
        )
    }
}

impl<S> Container<S>
where
    S: TableStore + 'static,
{
    /// Create a new container with all dependencies.
    pub fn new(
        store: Arc<S>,
        clock: Arc<dyn Clock>,
        ids: Arc<dyn IdSource>,
        shared: Arc<dyn SharedPeriodPort>,
        retry: StepRetryPolicy,
    ) -> Self {
        let accounts = Arc::new(AccountStore::new(
            Arc::clone(&store),
            Arc::clone(&clock),
            Arc::clone(&ids),
        ));
        let orders = Arc::new(OrderLedger::new(
            Arc::clone(&store),
            Arc::clone(&accounts),
            Arc::clone(&clock),
            ids,
        ));
        let transactions = Arc::new(TransactionLedger::new(
            Arc::clone(&store),
            Arc::clone(&accounts),
            Arc::clone(&clock),
        ));
        let aggregator = Arc::new(PositionAggregator::new(
            Arc::clone(&store),
            Arc::clone(&accounts),
            Arc::clone(&orders),
            Arc::clone(&transactions),
            Arc::clone(&clock),
        ));

        Self {
            store,
            clock,
            shared,
            gate: Arc::new(LedgerGate::new()),
            accounts,
            orders,
            transactions,
            aggregator,
            retry,
        }
    }

    /// Get the table store.
    pub fn store(&self) -> Arc<S> {
        Arc::clone(&self.store)
    }

    /// Get the clock.
    pub fn clock(&self) -> Arc<dyn Clock> {
        Arc::clone(&self.clock)
    }

    /// Get the ledger gate.
    pub fn gate(&self) -> Arc<LedgerGate> {
        Arc::clone(&self.gate)
    }

    /// Get the account store.
    pub fn accounts(&self) -> Arc<AccountStore<S>> {
        Arc::clone(&self.accounts)
    }

    /// Get the order ledger.
    pub fn orders(&self) -> Arc<OrderLedger<S>> {
        Arc::clone(&self.orders)
    }

    /// Get the transaction ledger.
    pub fn transactions(&self) -> Arc<TransactionLedger<S>> {
        Arc::clone(&self.transactions)
    }

    /// Get the position aggregator.
    pub fn aggregator(&self) -> Arc<PositionAggregator<S>> {
        Arc::clone(&self.aggregator)
    }

    /// Create a `PaymentWorkflow`.
    pub fn payment_workflow(&self) -> PaymentWorkflow<S> {
        PaymentWorkflow::new(
            Arc::clone(&self.gate),
            Arc::clone(&self.accounts),
            Arc::clone(&self.orders),
            Arc::clone(&self.transactions),
            self.retry,
        )
    }

    /// Create a `FundsWorkflow`.
    pub fn funds_workflow(&self) -> FundsWorkflow<S> {
        FundsWorkflow::new(
            Arc::clone(&self.gate),
            Arc::clone(&self.accounts),
            Arc::clone(&self.transactions),
            self.retry,
        )
    }

    /// Create an `AccountHistory` query.
    pub fn account_history(&self) -> AccountHistory<S> {
        AccountHistory::new(
            Arc::clone(&self.accounts),
            Arc::clone(&self.orders),
            Arc::clone(&self.transactions),
        )
    }

    /// Create an `ExportSnapshot` query.
    pub fn export_snapshot(&self) -> ExportSnapshot<S> {
        ExportSnapshot::new(
            Arc::clone(&self.store),
            Arc::clone(&self.accounts),
            Arc::clone(&self.shared),
            Arc::clone(&self.clock),
            Arc::clone(&self.gate),
        )
    }

    /// Create the background rollup service.
    pub fn position_rollup(
        &self,
        interval: Duration,
        shutdown: CancellationToken,
    ) -> PositionRollupService<S> {
        PositionRollupService::new(
            Arc::clone(&self.aggregator),
            Arc::clone(&self.gate),
            interval,
            shutdown,
        )
    }
}
