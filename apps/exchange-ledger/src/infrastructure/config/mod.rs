//! Configuration Module
//!
//! Environment-driven settings and dependency wiring for the ledger.

mod container;
mod settings;

pub use container::Container;
pub use settings::{ConfigError, LedgerConfig, StoreMode};
