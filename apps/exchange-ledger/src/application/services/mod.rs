//! Application Services
//!
//! The four ledger stores plus the periodic rollup that drives the
//! aggregator in the background.

pub mod account_store;
pub mod order_ledger;
pub mod position_aggregator;
pub mod position_rollup;
pub mod tables;
pub mod transaction_ledger;

pub use account_store::{AccountStore, DEFAULT_CLIENT_PAGE_SIZE};
pub use order_ledger::{DEFAULT_ORDER_PAGE_SIZE, DeletedOrder, OrderLedger};
pub use position_aggregator::{PositionAggregator, PositionSummary};
pub use position_rollup::PositionRollupService;
pub use transaction_ledger::{DEFAULT_TRANSACTION_PAGE_SIZE, TransactionLedger, TransactionReceipt};
