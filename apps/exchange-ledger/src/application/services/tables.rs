//! Typed access to the row store shared by the ledger services.
//!
//! Read failures degrade to an empty table with a warning; write failures
//! surface as [`LedgerError::Persistence`].

use std::ops::RangeInclusive;

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::application::ports::{IdSource, Row, TableRef, TableStore};
use crate::domain::shared::LedgerError;

/// Redraws allowed before an identifier space is treated as exhausted.
pub const MAX_ID_ATTEMPTS: usize = 1_000;

/// Load and decode every row of `table`. Undecodable rows are skipped.
pub async fn load_records<S, T>(store: &S, table: TableRef) -> Vec<T>
where
    S: TableStore + ?Sized,
    T: DeserializeOwned,
{
    match store.load_table(table).await {
        Ok(rows) => decode_records(table, rows),
        Err(e) => {
            tracing::warn!(table = %table, error = %e, "Table unreadable, treating as empty");
            Vec::new()
        }
    }
}

/// Decode rows already read from `table`. Undecodable rows are skipped.
pub fn decode_records<T: DeserializeOwned>(table: TableRef, rows: Vec<Row>) -> Vec<T> {
    rows.into_iter()
        .enumerate()
        .filter_map(|(index, row)| match serde_json::from_value(row) {
            Ok(record) => Some(record),
            Err(e) => {
                tracing::warn!(table = %table, index, error = %e, "Skipping undecodable row");
                None
            }
        })
        .collect()
}

/// Encode a record as a row.
pub fn encode<T: Serialize>(table: TableRef, record: &T) -> Result<Row, LedgerError> {
    serde_json::to_value(record).map_err(|e| LedgerError::Persistence {
        table: table.to_string(),
        message: e.to_string(),
    })
}

/// Replace `table` with `records`.
pub async fn save_records<S, T>(store: &S, table: TableRef, records: &[T]) -> Result<(), LedgerError>
where
    S: TableStore + ?Sized,
    T: Serialize,
{
    let rows = records
        .iter()
        .map(|record| encode(table, record))
        .collect::<Result<Vec<_>, _>>()?;
    store.save_table(table, rows).await?;
    Ok(())
}

/// Append one record to `table`.
pub async fn append_record<S, T>(store: &S, table: TableRef, record: &T) -> Result<(), LedgerError>
where
    S: TableStore + ?Sized,
    T: Serialize,
{
    let row = encode(table, record)?;
    store.append_row(table, row).await?;
    Ok(())
}

/// Draw from `range` until `taken` rejects nothing.
pub fn draw_unique(
    ids: &dyn IdSource,
    range: RangeInclusive<u32>,
    what: &'static str,
    taken: impl Fn(u32) -> bool,
) -> Result<u32, LedgerError> {
    for _ in 0..MAX_ID_ATTEMPTS {
        let candidate = ids.draw(range.clone());
        if !taken(candidate) {
            return Ok(candidate);
        }
    }
    Err(LedgerError::inconsistency(format!(
        "no free {what} after {MAX_ID_ATTEMPTS} draws"
    )))
}

/// Order rows newest first, breaking timestamp ties by insertion order, and
/// return the `[offset, offset + page_size)` slice.
pub fn newest_first_page<T, K: Ord>(
    records: Vec<T>,
    key: impl Fn(&T) -> K,
    offset: usize,
    page_size: usize,
) -> Vec<T> {
    let mut indexed: Vec<(usize, T)> = records.into_iter().enumerate().collect();
    indexed.sort_by(|(ia, a), (ib, b)| key(b).cmp(&key(a)).then(ib.cmp(ia)));
    indexed
        .into_iter()
        .skip(offset)
        .take(page_size)
        .map(|(_, record)| record)
        .collect()
}
