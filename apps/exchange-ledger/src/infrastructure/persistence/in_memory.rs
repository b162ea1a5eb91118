//! In-memory table store.
//!
//! Backs tests and the `memory` store mode. Supports injected write
//! failures so retry paths can be exercised.

use std::collections::{BTreeSet, HashMap};

use async_trait::async_trait;
use parking_lot::{Mutex, RwLock};

use crate::application::ports::{
    PeriodTables, Row, RowPredicate, StoreError, TableKind, TableRef, TableStore,
};
use crate::domain::shared::Period;

/// When an injected write failure strikes relative to the in-memory update.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteFailure {
    /// The write is rejected and nothing changes.
    BeforeApply,
    /// The rows change but the write still reports failure, like a remote
    /// write that timed out after landing.
    AfterApply,
}

#[derive(Debug, Clone, Copy)]
struct Fault {
    kind: TableKind,
    remaining: usize,
    mode: WriteFailure,
}

/// `HashMap`-backed implementation of [`TableStore`].
#[derive(Debug, Default)]
pub struct InMemoryTableStore {
    tables: RwLock<HashMap<TableRef, Vec<Row>>>,
    faults: Mutex<Vec<Fault>>,
}

impl InMemoryTableStore {
    /// Empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next `count` writes to `kind` fail.
    pub fn inject_write_failures(&self, kind: TableKind, count: usize, mode: WriteFailure) {
        self.faults.lock().push(Fault {
            kind,
            remaining: count,
            mode,
        });
    }

    /// Number of rows in `table`.
    #[must_use]
    pub fn row_count(&self, table: TableRef) -> usize {
        self.tables.read().get(&table).map_or(0, Vec::len)
    }

    fn take_fault(&self, kind: TableKind) -> Option<WriteFailure> {
        let mut faults = self.faults.lock();
        let fault = faults
            .iter_mut()
            .find(|f| f.kind == kind && f.remaining > 0)?;
        fault.remaining -= 1;
        let mode = fault.mode;
        faults.retain(|f| f.remaining > 0);
        Some(mode)
    }

    fn write(&self, table: TableRef, apply: impl FnOnce(&mut Vec<Row>)) -> Result<(), StoreError> {
        let fault = self.take_fault(table.kind);
        if fault == Some(WriteFailure::BeforeApply) {
            return Err(StoreError::io(table, "injected write failure"));
        }
        apply(self.tables.write().entry(table).or_default());
        match fault {
            Some(_) => Err(StoreError::io(table, "injected write failure")),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl TableStore for InMemoryTableStore {
    async fn load_table(&self, table: TableRef) -> Result<Vec<Row>, StoreError> {
        Ok(self.tables.read().get(&table).cloned().unwrap_or_default())
    }

    async fn save_table(&self, table: TableRef, rows: Vec<Row>) -> Result<(), StoreError> {
        self.write(table, |existing| *existing = rows)
    }

    async fn append_row(&self, table: TableRef, row: Row) -> Result<(), StoreError> {
        self.write(table, |existing| existing.push(row))
    }

    async fn delete_rows_where(
        &self,
        table: TableRef,
        predicate: RowPredicate<'_>,
    ) -> Result<usize, StoreError> {
        let mut tables = self.tables.write();
        let Some(rows) = tables.get_mut(&table) else {
            return Ok(0);
        };
        let before = rows.len();
        rows.retain(|row| !predicate(row));
        Ok(before - rows.len())
    }

    async fn table_exists(&self, table: TableRef) -> Result<bool, StoreError> {
        Ok(self.tables.read().contains_key(&table))
    }

    async fn list_periods(&self, kind: TableKind) -> Result<Vec<Period>, StoreError> {
        let periods: BTreeSet<Period> = self
            .tables
            .read()
            .keys()
            .filter(|t| t.kind == kind)
            .map(|t| t.period)
            .collect();
        Ok(periods.into_iter().collect())
    }

    async fn snapshot(&self, period: Period) -> Result<PeriodTables, StoreError> {
        Ok(self
            .tables
            .read()
            .iter()
            .filter(|(t, _)| t.period == period)
            .map(|(t, rows)| (t.kind, rows.clone()))
            .collect())
    }
}
