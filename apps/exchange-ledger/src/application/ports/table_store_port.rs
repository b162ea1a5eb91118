//! Table Store Port
//!
//! Row-oriented persistence partitioned by (kind, period). Every ledger
//! component reads and writes through this port.
//!
//! A write that reports failure normally leaves the table unchanged, but an
//! adapter cannot always tell (a remote write that timed out may still have
//! landed), so callers that retry must first check whether their row is
//! already there.

use std::collections::HashMap;
use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::shared::{LedgerError, Period};

/// A stored row. Records are serialized to JSON objects.
pub type Row = serde_json::Value;

/// Predicate used by [`TableStore::delete_rows_where`].
pub type RowPredicate<'a> = &'a (dyn Fn(&Row) -> bool + Send + Sync);

/// Every table of one period, keyed by kind. Tables never written are absent.
pub type PeriodTables = HashMap<TableKind, Vec<Row>>;

/// Logical tables of the ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum TableKind {
    /// Client accounts.
    Clients,
    /// Orders.
    Orders,
    /// Transactions.
    Transactions,
    /// Daily position rows.
    DailyPositions,
}

impl TableKind {
    /// All kinds, in export order.
    pub const ALL: [Self; 4] = [
        Self::Clients,
        Self::Orders,
        Self::Transactions,
        Self::DailyPositions,
    ];

    /// Storage name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Clients => "clients",
            Self::Orders => "orders",
            Self::Transactions => "transactions",
            Self::DailyPositions => "daily_positions",
        }
    }

    /// Inverse of [`Self::as_str`].
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.as_str() == name)
    }
}

/// A physical table: one kind for one period.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TableRef {
    /// Logical table.
    pub kind: TableKind,
    /// Month partition.
    pub period: Period,
}

impl TableRef {
    /// Table of `kind` for `period`.
    #[must_use]
    pub const fn new(kind: TableKind, period: Period) -> Self {
        Self { kind, period }
    }

    /// Same kind, previous period.
    #[must_use]
    pub const fn previous(&self) -> Self {
        Self {
            kind: self.kind,
            period: self.period.previous(),
        }
    }
}

impl fmt::Display for TableRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.kind.as_str(), self.period.label())
    }
}

/// Failures raised by table store adapters.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// The backing resource could not be read or written.
    #[error("I/O error on {table}: {message}")]
    Io {
        /// Table name.
        table: String,
        /// Cause.
        message: String,
    },

    /// A row could not be encoded or decoded.
    #[error("serialization error on {table}: {message}")]
    Serialization {
        /// Table name.
        table: String,
        /// Cause.
        message: String,
    },
}

impl StoreError {
    /// I/O failure on `table`.
    pub fn io(table: TableRef, message: impl ToString) -> Self {
        Self::Io {
            table: table.to_string(),
            message: message.to_string(),
        }
    }

    /// Encoding failure on `table`.
    pub fn serialization(table: TableRef, message: impl ToString) -> Self {
        Self::Serialization {
            table: table.to_string(),
            message: message.to_string(),
        }
    }
}

impl From<StoreError> for LedgerError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Io { table, message } | StoreError::Serialization { table, message } => {
                Self::Persistence { table, message }
            }
        }
    }
}

/// Port for monthly-partitioned table storage.
#[async_trait]
pub trait TableStore: Send + Sync {
    /// All rows of a table; an absent table is empty.
    async fn load_table(&self, table: TableRef) -> Result<Vec<Row>, StoreError>;

    /// Replace a table's rows wholesale, creating it if absent.
    async fn save_table(&self, table: TableRef, rows: Vec<Row>) -> Result<(), StoreError>;

    /// Append one row, creating the table if absent.
    async fn append_row(&self, table: TableRef, row: Row) -> Result<(), StoreError>;

    /// Remove matching rows and return how many were removed.
    async fn delete_rows_where(
        &self,
        table: TableRef,
        predicate: RowPredicate<'_>,
    ) -> Result<usize, StoreError>;

    /// Whether the table has ever been written.
    async fn table_exists(&self, table: TableRef) -> Result<bool, StoreError>;

    /// Periods for which `kind` has a table, ascending.
    async fn list_periods(&self, kind: TableKind) -> Result<Vec<Period>, StoreError>;

    /// Copy every table of `period` as of a single instant, so no write
    /// lands between the copies of two tables.
    async fn snapshot(&self, period: Period) -> Result<PeriodTables, StoreError>;
}
