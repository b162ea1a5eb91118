#![cfg_attr(
    test,
    allow(
        clippy::unwrap_used,
        clippy::expect_used,
        clippy::significant_drop_tightening,
        clippy::too_many_lines,
        clippy::needless_pass_by_value,
        clippy::items_after_statements
    )
)]

//! Exchange Ledger - OTC Desk Back Office
//!
//! Bookkeeping for an over-the-counter USDT/TOMAN desk: client accounts
//! with running balances, monthly order and transaction ledgers, daily net
//! USDT positions, and the payment workflows that keep them consistent.
//!
//! # Layers (inside → outside)
//!
//! - **Domain**: Records and value objects with no I/O
//!   - `account`: Client accounts and balance arithmetic
//!   - `order`: Orders, sides, settlement statuses, order line parsing
//!   - `transaction`: Postings and transaction line parsing
//!   - `position`: Daily positions and trade/transfer totals
//!
//! - **Application**: Ports, ledger services and workflows
//!   - `ports`: Table store, clock, identifier source, share marker
//!   - `services`: Account store, order and transaction ledgers, aggregator
//!   - `use_cases`: Payment and funds workflows, history and export queries
//!
//! - **Infrastructure**: Adapters and wiring
//!   - `persistence`: JSON-lines and in-memory table stores
//!   - `config`: Environment settings and the dependency container
//!   - `telemetry`, `metrics`: Tracing and Prometheus
//!
//! # Consistency
//!
//! Every mutation runs inside a [`LedgerSession`] obtained from the shared
//! [`LedgerGate`], so workflows and the background rollup never interleave.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::pedantic)]

// =============================================================================
// Module Declarations
// =============================================================================

/// Domain layer - Ledger records and value objects.
pub mod domain;

/// Application layer - Ports, services and workflows.
pub mod application;

/// Infrastructure layer - Adapters and external integrations.
pub mod infrastructure;

// =============================================================================
// Re-exports
// =============================================================================

// Domain types
pub use domain::account::ClientAccount;
pub use domain::order::{Order, OrderRequest, OrderSide, OrderStatus};
pub use domain::position::DailyPosition;
pub use domain::shared::{AccountId, Amount, ClientId, Currency, LedgerError, Period, Ticket};
pub use domain::transaction::{Direction, Transaction};

// Session boundary
pub use application::{LedgerGate, LedgerSession};

// Workflows and queries
pub use application::dto::{SettlementCommand, SettlementPath, TransferCommand};
pub use application::use_cases::{
    AccountHistory, ExportSnapshot, FundsWorkflow, LedgerSnapshot, PaymentWorkflow,
    StepRetryPolicy,
};

// Infrastructure config
pub use infrastructure::config::{ConfigError, Container, LedgerConfig, StoreMode};

// Persistence
pub use infrastructure::persistence::{FileShareMarker, InMemoryTableStore, JsonFileTableStore};

// Metrics
pub use infrastructure::metrics::{init_metrics, render_metrics};

// Telemetry
pub use infrastructure::telemetry::{TelemetryConfig, TelemetryGuard, init as init_telemetry};
