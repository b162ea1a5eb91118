//! Application layer.
//!
//! Ports to storage and time, the ledger session boundary, the ledger
//! services, and the workflows and queries built on them.

pub mod dto;
pub mod ports;
pub mod services;
pub mod session;
pub mod use_cases;

pub use session::{LedgerGate, LedgerSession};
