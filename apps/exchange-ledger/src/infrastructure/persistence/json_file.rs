//! JSON-lines table store.
//!
//! Each table lives in `<data_dir>/<kind>-<YYYY_MM>.jsonl`, one row per
//! line. Tables are cached after the first read; every mutation rewrites
//! the whole file through a temporary file and a rename, and only then
//! replaces the cached rows. A failed rewrite is reported as
//! [`StoreError::Io`] and leaves both the file and the cache untouched, so
//! reads never show rows that are not on disk.

use std::collections::{BTreeSet, HashMap};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use parking_lot::RwLock;
use tokio::sync::Mutex;

use crate::application::ports::{
    PeriodTables, Row, RowPredicate, StoreError, TableKind, TableRef, TableStore,
};
use crate::domain::shared::Period;

const EXTENSION: &str = "jsonl";

/// File-backed implementation of [`TableStore`].
#[derive(Debug)]
pub struct JsonFileTableStore {
    dir: PathBuf,
    cache: RwLock<HashMap<TableRef, Vec<Row>>>,
    flush: Mutex<()>,
}

impl JsonFileTableStore {
    /// Store rooted at `dir`. The directory is created on first write.
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            cache: RwLock::new(HashMap::new()),
            flush: Mutex::new(()),
        }
    }

    /// Directory holding the table files.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// File backing `table`.
    #[must_use]
    pub fn path_of(&self, table: TableRef) -> PathBuf {
        self.dir.join(file_name(table))
    }

    async fn read_file(&self, table: TableRef) -> Result<Vec<Row>, StoreError> {
        let contents = match tokio::fs::read_to_string(self.path_of(table)).await {
            Ok(contents) => contents,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(StoreError::io(table, e)),
        };

        let rows = contents
            .lines()
            .enumerate()
            .filter(|(_, line)| !line.trim().is_empty())
            .filter_map(|(index, line)| match serde_json::from_str(line) {
                Ok(row) => Some(row),
                Err(e) => {
                    tracing::warn!(table = %table, line = index + 1, error = %e, "Skipping malformed line");
                    None
                }
            })
            .collect();
        Ok(rows)
    }

    /// Cached rows of `table`, reading the file on a miss.
    async fn rows(&self, table: TableRef) -> Result<Vec<Row>, StoreError> {
        if let Some(rows) = self.cache.read().get(&table) {
            return Ok(rows.clone());
        }
        let rows = self.read_file(table).await?;
        self.cache.write().entry(table).or_insert_with(|| rows.clone());
        Ok(rows)
    }

    async fn write_file(&self, table: TableRef, rows: &[Row]) -> Result<(), StoreError> {
        let mut contents = String::new();
        for row in rows {
            let line = serde_json::to_string(row).map_err(|e| StoreError::serialization(table, e))?;
            contents.push_str(&line);
            contents.push('\n');
        }

        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|e| StoreError::io(table, e))?;
        let path = self.path_of(table);
        let tmp = path.with_extension("jsonl.tmp");
        tokio::fs::write(&tmp, contents)
            .await
            .map_err(|e| StoreError::io(table, e))?;
        tokio::fs::rename(&tmp, &path)
            .await
            .map_err(|e| StoreError::io(table, e))
    }

    /// Apply `change` to a copy of the table, rewrite its file, then cache it.
    async fn mutate<T>(
        &self,
        table: TableRef,
        change: impl FnOnce(&mut Vec<Row>) -> T,
    ) -> Result<T, StoreError> {
        let _flush = self.flush.lock().await;
        let mut rows = self.rows(table).await?;
        let outcome = change(&mut rows);

        if let Err(e) = self.write_file(table, &rows).await {
            tracing::error!(table = %table, error = %e, "Table write failed; cached rows unchanged");
            return Err(e);
        }
        tracing::trace!(table = %table, rows = rows.len(), "Table written");
        self.cache.write().insert(table, rows);
        Ok(outcome)
    }
}

fn file_name(table: TableRef) -> String {
    format!("{}-{}.{EXTENSION}", table.kind.as_str(), table.period.label())
}

/// Inverse of [`file_name`].
fn parse_file_name(name: &str) -> Option<TableRef> {
    let stem = name.strip_suffix(EXTENSION)?.strip_suffix('.')?;
    let (kind, period) = stem.rsplit_once('-')?;
    let kind = TableKind::from_name(kind)?;
    let period: Period = period.parse().ok()?;
    Some(TableRef::new(kind, period))
}

#[async_trait]
impl TableStore for JsonFileTableStore {
    async fn load_table(&self, table: TableRef) -> Result<Vec<Row>, StoreError> {
        self.rows(table).await
    }

    async fn save_table(&self, table: TableRef, rows: Vec<Row>) -> Result<(), StoreError> {
        self.mutate(table, |existing| *existing = rows).await
    }

    async fn append_row(&self, table: TableRef, row: Row) -> Result<(), StoreError> {
        self.mutate(table, |existing| existing.push(row)).await
    }

    async fn delete_rows_where(
        &self,
        table: TableRef,
        predicate: RowPredicate<'_>,
    ) -> Result<usize, StoreError> {
        self.mutate(table, |rows| {
            let before = rows.len();
            rows.retain(|row| !predicate(row));
            before - rows.len()
        })
        .await
    }

    async fn table_exists(&self, table: TableRef) -> Result<bool, StoreError> {
        // The cache only holds rows that reached disk.
        if self.cache.read().get(&table).is_some_and(|rows| !rows.is_empty()) {
            return Ok(true);
        }
        tokio::fs::try_exists(self.path_of(table))
            .await
            .map_err(|e| StoreError::io(table, e))
    }

    async fn list_periods(&self, kind: TableKind) -> Result<Vec<Period>, StoreError> {
        let mut periods: BTreeSet<Period> = self
            .cache
            .read()
            .iter()
            .filter(|(t, rows)| t.kind == kind && !rows.is_empty())
            .map(|(t, _)| t.period)
            .collect();

        let mut entries = match tokio::fs::read_dir(&self.dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(periods.into_iter().collect()),
            Err(e) => {
                return Err(StoreError::Io {
                    table: kind.as_str().to_string(),
                    message: e.to_string(),
                });
            }
        };
        while let Ok(Some(entry)) = entries.next_entry().await {
            let name = entry.file_name();
            if let Some(table) = name.to_str().and_then(parse_file_name)
                && table.kind == kind
            {
                periods.insert(table.period);
            }
        }
        Ok(periods.into_iter().collect())
    }

    async fn snapshot(&self, period: Period) -> Result<PeriodTables, StoreError> {
        let mut existing = Vec::with_capacity(TableKind::ALL.len());
        for kind in TableKind::ALL {
            let table = TableRef::new(kind, period);
            if self.table_exists(table).await? {
                self.rows(table).await?;
                existing.push(kind);
            }
        }

        // Every existing table is cached now; copy them under one read.
        let cache = self.cache.read();
        Ok(TableKind::ALL
            .into_iter()
            .filter_map(|kind| {
                let rows = cache.get(&TableRef::new(kind, period))?;
                (existing.contains(&kind) || !rows.is_empty()).then(|| (kind, rows.clone()))
            })
            .collect())
    }
}
