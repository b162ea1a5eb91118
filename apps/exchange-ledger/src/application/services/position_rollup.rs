//! Periodic position rollup.
//!
//! Recomputes today's position on a fixed interval so the daily position
//! table stays current without operator action. Shares the ledger gate with
//! the interactive workflows.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::application::ports::TableStore;
use crate::application::services::position_aggregator::{PositionAggregator, PositionSummary};
use crate::application::session::LedgerGate;
use crate::domain::shared::LedgerError;

/// Background task driving [`PositionAggregator::summary`].
pub struct PositionRollupService<S> {
    aggregator: Arc<PositionAggregator<S>>,
    gate: Arc<LedgerGate>,
    interval: Duration,
    shutdown: CancellationToken,
}

impl<S: TableStore + 'static> PositionRollupService<S> {
    /// Create a service ticking every `interval` until `shutdown` fires.
    pub fn new(
        aggregator: Arc<PositionAggregator<S>>,
        gate: Arc<LedgerGate>,
        interval: Duration,
        shutdown: CancellationToken,
    ) -> Self {
        Self {
            aggregator,
            gate,
            interval,
            shutdown,
        }
    }

    /// Run one rollup under the gate.
    pub async fn run_once(&self) -> Result<PositionSummary, LedgerError> {
        let session = self.gate.begin().await;
        let summary = self.aggregator.summary(&session).await?;
        tracing::debug!(held_ms = session.elapsed_ms(), "Rollup session closed");
        Ok(summary)
    }

    /// Spawn the periodic loop. The first tick fires immediately.
    pub fn start(self) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(self.interval);
            interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    _ = interval.tick() => {
                        match self.run_once().await {
                            Ok(summary) => tracing::info!(
                                date = %summary.date,
                                net = %summary.net_position,
                                "Periodic rollup complete"
                            ),
                            Err(e) => tracing::error!(error = %e, "Periodic rollup failed"),
                        }
                    }
                    () = self.shutdown.cancelled() => {
                        tracing::info!("Position rollup shutting down");
                        break;
                    }
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::ports::{Clock, FixedClock, IdSource, RandomIdSource, TableKind, TableRef};
    use crate::application::services::{AccountStore, OrderLedger, TransactionLedger};
    use crate::domain::shared::Period;
    use crate::infrastructure::persistence::InMemoryTableStore;
    use chrono::NaiveDate;

    fn aggregator(store: &Arc<InMemoryTableStore>) -> Arc<PositionAggregator<InMemoryTableStore>> {
        let clock: Arc<dyn Clock> =
            Arc::new(FixedClock::at_date(NaiveDate::from_ymd_opt(2026, 10, 17).unwrap()));
        let ids: Arc<dyn IdSource> = Arc::new(RandomIdSource::seeded(1));
        let accounts = Arc::new(AccountStore::new(Arc::clone(store), Arc::clone(&clock), Arc::clone(&ids)));
        let orders = Arc::new(OrderLedger::new(Arc::clone(store), Arc::clone(&accounts), Arc::clone(&clock), ids));
        let transactions = Arc::new(TransactionLedger::new(Arc::clone(store), Arc::clone(&accounts), Arc::clone(&clock)));
        Arc::new(PositionAggregator::new(Arc::clone(store), accounts, orders, transactions, clock))
    }

    #[tokio::test]
    async fn loop_writes_position_and_stops_on_cancel() {
        let store = Arc::new(InMemoryTableStore::new());
        let shutdown = CancellationToken::new();
        let service = PositionRollupService::new(
            aggregator(&store),
            Arc::new(LedgerGate::new()),
            Duration::from_millis(10),
            shutdown.clone(),
        );

        let handle = service.start();
        tokio::time::sleep(Duration::from_millis(50)).await;
        shutdown.cancel();
        handle.await.unwrap();

        let table = TableRef::new(TableKind::DailyPositions, Period::new(2026, 10).unwrap());
        assert_eq!(store.row_count(table), 1);
    }

    #[tokio::test]
    async fn run_once_returns_summary() {
        let store = Arc::new(InMemoryTableStore::new());
        let service = PositionRollupService::new(
            aggregator(&store),
            Arc::new(LedgerGate::new()),
            Duration::from_secs(60),
            CancellationToken::new(),
        );
        let summary = service.run_once().await.unwrap();
        assert!(summary.net_position.is_zero());
    }
}
