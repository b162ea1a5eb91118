//! Application Ports (Driven)
//!
//! Interfaces the ledger uses to reach storage, time and randomness.
//! Adapters live in `infrastructure`; test doubles live beside the ports.

mod clock_port;
mod id_source_port;
mod shared_period_port;
mod table_store_port;

pub use clock_port::{Clock, FixedClock, SystemClock};
pub use id_source_port::{IdSource, RandomIdSource};
pub use shared_period_port::{NoSharedPeriod, SharedPeriodPort};
pub use table_store_port::{
    PeriodTables, Row, RowPredicate, StoreError, TableKind, TableRef, TableStore,
};
