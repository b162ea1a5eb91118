//! Prometheus Metrics Module
//!
//! Ledger activity counters and the latest net position, rendered in
//! Prometheus text format for whichever surface scrapes them.
//!
//! # Metrics Categories
//!
//! - **Clients**: Accounts opened
//! - **Orders**: Orders recorded and deleted by status
//! - **Transactions**: Postings by direction
//! - **Settlement**: Workflow runs by path, step retries
//! - **Position**: Rollups and the latest net USDT position
//!
//! Recording before [`init_metrics`] is a no-op.

use std::sync::OnceLock;

use metrics::{counter, describe_counter, describe_gauge, gauge};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder, PrometheusHandle};
use rust_decimal::prelude::ToPrimitive;

use crate::application::dto::SettlementPath;
use crate::domain::order::OrderStatus;
use crate::domain::shared::Amount;
use crate::domain::transaction::Direction;

// =============================================================================
// Global Metrics Handle
// =============================================================================

static PROMETHEUS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

/// Install the Prometheus recorder. Later calls return the first handle.
///
/// # Errors
///
/// Returns an error if another global recorder is already installed.
pub fn init_metrics() -> Result<PrometheusHandle, BuildError> {
    if let Some(handle) = PROMETHEUS_HANDLE.get() {
        return Ok(handle.clone());
    }
    let handle = PrometheusBuilder::new().install_recorder()?;
    register_metrics();
    Ok(PROMETHEUS_HANDLE.get_or_init(|| handle).clone())
}

/// Get the Prometheus handle for rendering metrics.
///
/// Returns `None` if metrics have not been initialized.
#[must_use]
pub fn get_metrics_handle() -> Option<PrometheusHandle> {
    PROMETHEUS_HANDLE.get().cloned()
}

/// Current metrics in Prometheus text format.
#[must_use]
pub fn render_metrics() -> Option<String> {
    PROMETHEUS_HANDLE.get().map(PrometheusHandle::render)
}

// =============================================================================
// Metric Registration
// =============================================================================

fn register_metrics() {
    describe_counter!("ledger_clients_created_total", "Client accounts opened");
    describe_counter!(
        "ledger_orders_created_total",
        "Orders recorded, by settlement status"
    );
    describe_counter!(
        "ledger_orders_deleted_total",
        "Orders deleted, by settlement status"
    );
    describe_counter!(
        "ledger_transactions_posted_total",
        "Transactions posted, by direction"
    );
    describe_counter!(
        "ledger_settlements_total",
        "Settlement workflows completed, by path"
    );
    describe_counter!(
        "ledger_step_retries_total",
        "Post-commit workflow steps retried after a persistence failure"
    );
    describe_counter!(
        "ledger_position_rollups_total",
        "Daily position rows written"
    );
    describe_gauge!(
        "ledger_net_position_usdt",
        "Net USDT position from the latest rollup"
    );
}

// =============================================================================
// Metric Recording Functions
// =============================================================================

/// Record a new client account.
pub fn record_client_created() {
    counter!("ledger_clients_created_total").increment(1);
}

/// Record a new order.
pub fn record_order_created(status: OrderStatus) {
    counter!("ledger_orders_created_total", "status" => status.as_str()).increment(1);
}

/// Record a deleted order.
pub fn record_order_deleted(status: OrderStatus) {
    counter!("ledger_orders_deleted_total", "status" => status.as_str()).increment(1);
}

/// Record a posted transaction.
pub fn record_transaction_posted(direction: Direction) {
    counter!("ledger_transactions_posted_total", "direction" => direction.as_str()).increment(1);
}

/// Record a completed settlement workflow.
pub fn record_settlement(path: SettlementPath) {
    counter!("ledger_settlements_total", "path" => path.as_str()).increment(1);
}

/// Record a retried workflow step.
pub fn record_step_retry(step: &'static str) {
    counter!("ledger_step_retries_total", "step" => step).increment(1);
}

/// Record a position rollup and publish its net position.
pub fn record_position_rollup(net_position: Amount) {
    counter!("ledger_position_rollups_total").increment(1);
    if let Some(net) = net_position.value().to_f64() {
        gauge!("ledger_net_position_usdt").set(net);
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recording_without_recorder_is_noop() {
        record_client_created();
        record_order_created(OrderStatus::Pending);
        record_transaction_posted(Direction::Send);
        record_settlement(SettlementPath::FullPayment);
        record_step_retry("record_order");
        record_position_rollup(Amount::from_units(-50));
    }

    #[test]
    fn handle_absent_until_initialized() {
        if PROMETHEUS_HANDLE.get().is_none() {
            assert!(get_metrics_handle().is_none());
            assert!(render_metrics().is_none());
        }
    }
}
