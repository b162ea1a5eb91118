//! Use Cases
//!
//! Workflows that sequence the ledger services under one session, and the
//! read-only queries exposed to the presentation and reporting layers.

pub mod account_history;
pub mod export_snapshot;
pub mod funds_workflow;
pub mod payment_workflow;
pub mod retry;
mod steps;

pub use account_history::{AccountHistory, OrderHistory, TransactionHistory};
pub use export_snapshot::{ExportSnapshot, LedgerSnapshot};
pub use funds_workflow::FundsWorkflow;
pub use payment_workflow::PaymentWorkflow;
pub use retry::StepRetryPolicy;
