//! Export Snapshot Query
//!
//! Point-in-time copies of the ledger tables for the reporting layer.
//!
//! A capture copies the period's tables in one store read while no ledger
//! session is open, and copies again if a session ran in between. It only
//! falls back to taking the gate when sessions keep interrupting it, so
//! exports do not block settlement in ordinary operation.

use std::sync::Arc;

use chrono::NaiveDateTime;
use serde::Serialize;

use crate::application::ports::{
    Clock, PeriodTables, Row, SharedPeriodPort, TableKind, TableRef, TableStore,
};
use crate::application::services::AccountStore;
use crate::application::services::tables::decode_records;
use crate::application::session::LedgerGate;
use crate::domain::account::ClientAccount;
use crate::domain::order::Order;
use crate::domain::position::DailyPosition;
use crate::domain::shared::{LedgerError, Period};
use crate::domain::transaction::Transaction;

/// Owned copy of one period's tables.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LedgerSnapshot {
    /// Period captured.
    pub period: Period,
    /// Capture time.
    pub taken_at: NaiveDateTime,
    /// Last period the reporting layer shared, if known.
    pub last_shared_period: Option<Period>,
    /// Client accounts.
    pub clients: Vec<ClientAccount>,
    /// Orders.
    pub orders: Vec<Order>,
    /// Transactions.
    pub transactions: Vec<Transaction>,
    /// Daily positions.
    pub positions: Vec<DailyPosition>,
}

/// Copies attempted without the gate before a capture waits for it.
const OPTIMISTIC_CAPTURES: usize = 4;

/// Read-only export queries.
pub struct ExportSnapshot<S> {
    store: Arc<S>,
    accounts: Arc<AccountStore<S>>,
    shared: Arc<dyn SharedPeriodPort>,
    clock: Arc<dyn Clock>,
    gate: Arc<LedgerGate>,
}

impl<S: TableStore> ExportSnapshot<S> {
    /// Create a new `ExportSnapshot`.
    pub fn new(
        store: Arc<S>,
        accounts: Arc<AccountStore<S>>,
        shared: Arc<dyn SharedPeriodPort>,
        clock: Arc<dyn Clock>,
        gate: Arc<LedgerGate>,
    ) -> Self {
        Self {
            store,
            accounts,
            shared,
            clock,
            gate,
        }
    }

    /// Snapshot of the current period.
    pub async fn capture(&self) -> LedgerSnapshot {
        let period = self.clock.current_period();

        let mut copied = None;
        for attempt in 1..=OPTIMISTIC_CAPTURES {
            let epoch = self.gate.idle().await;
            let copy = self.copy_period(period).await;
            if self.gate.epoch() == epoch {
                copied = Some(copy);
                break;
            }
            tracing::debug!(period = %period, attempt, "Ledger changed during capture, copying again");
        }
        let (clients, mut tables) = match copied {
            Some(copy) => copy,
            None => {
                tracing::warn!(period = %period, "Ledger kept changing, capturing under the gate");
                let _session = self.gate.begin().await;
                self.copy_period(period).await
            }
        };

        let snapshot = LedgerSnapshot {
            period,
            taken_at: self.clock.now(),
            last_shared_period: self.last_shared_period().await,
            clients,
            orders: take_records(&mut tables, TableKind::Orders, period),
            transactions: take_records(&mut tables, TableKind::Transactions, period),
            positions: take_records(&mut tables, TableKind::DailyPositions, period),
        };
        tracing::debug!(
            period = %period,
            clients = snapshot.clients.len(),
            orders = snapshot.orders.len(),
            transactions = snapshot.transactions.len(),
            "Snapshot captured"
        );
        snapshot
    }

    /// One store read of the period, with clients carried forward when the
    /// period has no clients table yet.
    async fn copy_period(&self, period: Period) -> (Vec<ClientAccount>, PeriodTables) {
        let mut tables = match self.store.snapshot(period).await {
            Ok(tables) => tables,
            Err(e) => {
                tracing::warn!(period = %period, error = %e, "Period unreadable, treating as empty");
                PeriodTables::new()
            }
        };
        let clients = match tables.remove(&TableKind::Clients) {
            Some(rows) => decode_records(TableRef::new(TableKind::Clients, period), rows),
            None => self.accounts.all().await,
        };
        (clients, tables)
    }

    /// Raw rows of any table.
    pub async fn table(&self, kind: TableKind, period: Period) -> Result<Vec<Row>, LedgerError> {
        Ok(self.store.load_table(TableRef::new(kind, period)).await?)
    }

    /// Periods that have a table of `kind`.
    pub async fn periods(&self, kind: TableKind) -> Result<Vec<Period>, LedgerError> {
        Ok(self.store.list_periods(kind).await?)
    }

    /// Marker maintained by the reporting layer; unreadable counts as unknown.
    pub async fn last_shared_period(&self) -> Option<Period> {
        match self.shared.last_shared_period().await {
            Ok(period) => period,
            Err(e) => {
                tracing::warn!(error = %e, "Last shared period unreadable");
                None
            }
        }
    }
}

fn take_records<T: serde::de::DeserializeOwned>(
    tables: &mut PeriodTables,
    kind: TableKind,
    period: Period,
) -> Vec<T> {
    let rows = tables.remove(&kind).unwrap_or_default();
    decode_records(TableRef::new(kind, period), rows)
}
