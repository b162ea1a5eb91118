//! Write Failure Integration Tests
//!
//! Blocks individual table files of the JSON-lines store and checks that
//! settlements never report success for rows that did not reach disk.

#![allow(clippy::unwrap_used)]

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use chrono::NaiveDate;

use exchange_ledger::application::ports::{FixedClock, NoSharedPeriod, RandomIdSource, TableKind, TableRef};
use exchange_ledger::{
    Amount, ClientId, Container, Currency, JsonFileTableStore, LedgerError, OrderRequest,
    OrderSide, Period, SettlementCommand, StepRetryPolicy,
};

const OCTOBER: (i32, u32) = (2026, 10);

fn october() -> Period {
    Period::new(OCTOBER.0, OCTOBER.1).unwrap()
}

fn open(dir: &Path) -> Container<JsonFileTableStore> {
    Container::new(
        Arc::new(JsonFileTableStore::new(dir)),
        Arc::new(FixedClock::at_date(
            NaiveDate::from_ymd_opt(OCTOBER.0, OCTOBER.1, 14).unwrap(),
        )),
        Arc::new(RandomIdSource::seeded(11)),
        Arc::new(NoSharedPeriod),
        StepRetryPolicy::new(2, Duration::ZERO, Duration::ZERO),
    )
}

async fn open_client(ledger: &Container<JsonFileTableStore>) -> ClientId {
    let gate = ledger.gate();
    let session = gate.begin().await;
    ledger
        .accounts()
        .create(&session, "Sara", Amount::ZERO, Amount::ZERO)
        .await
        .unwrap()
}

/// Squat a directory on the table's temporary file so every rewrite fails.
fn block(ledger: &Container<JsonFileTableStore>, kind: TableKind) -> PathBuf {
    let tmp = ledger
        .store()
        .path_of(TableRef::new(kind, october()))
        .with_extension("jsonl.tmp");
    std::fs::create_dir_all(&tmp).unwrap();
    tmp
}

fn sell(client_id: ClientId) -> OrderRequest {
    OrderRequest {
        client_id,
        side: OrderSide::Sell,
        currency: Currency::Usdt,
        size: Amount::from_units(100),
        price: Amount::from_units(500_000),
    }
}

#[tokio::test]
async fn unwritable_orders_table_surfaces_inconsistency() {
    let dir = tempfile::tempdir().unwrap();
    let ledger = open(dir.path());
    let client = open_client(&ledger).await;
    block(&ledger, TableKind::Orders);

    let err = ledger
        .payment_workflow()
        .settle(SettlementCommand::DeferredPayment { order: sell(client) })
        .await
        .unwrap_err();
    assert!(matches!(err, LedgerError::Inconsistency { .. }), "got {err:?}");

    // The balance landed; the order that explains it did not, and nothing claims otherwise.
    let reopened = open(dir.path());
    assert!(reopened.orders().orders_in(october()).await.is_empty());
    assert!(ledger.orders().orders_in(october()).await.is_empty());
    assert_eq!(
        reopened.accounts().get(client).await.unwrap().toman_balance,
        Amount::from_units(-50_000_000)
    );
}

#[tokio::test]
async fn unwritable_transactions_table_keeps_recorded_order() {
    let dir = tempfile::tempdir().unwrap();
    let ledger = open(dir.path());
    let client = open_client(&ledger).await;
    block(&ledger, TableKind::Transactions);

    let err = ledger
        .payment_workflow()
        .settle(SettlementCommand::FullPayment { order: sell(client) })
        .await
        .unwrap_err();
    assert!(matches!(err, LedgerError::Inconsistency { .. }), "got {err:?}");

    let reopened = open(dir.path());
    let orders = reopened.orders().orders_in(october()).await;
    assert_eq!(orders.len(), 1);
    assert!(reopened.transactions().find_linked(orders[0].ticket).await.is_empty());
    assert!(ledger.transactions().find_linked(orders[0].ticket).await.is_empty());
}

#[tokio::test]
async fn settlement_succeeds_once_the_table_is_writable_again() {
    let dir = tempfile::tempdir().unwrap();
    let ledger = open(dir.path());
    let client = open_client(&ledger).await;
    let blocker = block(&ledger, TableKind::Orders);

    let workflow = ledger.payment_workflow();
    workflow
        .settle(SettlementCommand::FullPayment { order: sell(client) })
        .await
        .unwrap_err();

    std::fs::remove_dir(&blocker).unwrap();
    let receipt = workflow
        .settle(SettlementCommand::FullPayment { order: sell(client) })
        .await
        .unwrap();

    let reopened = open(dir.path());
    let orders = reopened.orders().orders_in(october()).await;
    assert_eq!(orders.len(), 1);
    assert_eq!(orders[0].ticket, receipt.order.ticket);
    assert_eq!(reopened.transactions().find_linked(receipt.order.ticket).await.len(), 1);
}

#[tokio::test]
async fn oversized_order_line_leaves_disk_untouched() {
    let dir = tempfile::tempdir().unwrap();
    let ledger = open(dir.path());
    let client = open_client(&ledger).await;

    let err = ledger
        .payment_workflow()
        .quote(client, "buy 100000000000000000000 usdt 100000000000000000000")
        .await
        .unwrap_err();
    assert!(matches!(err, LedgerError::Validation { .. }));

    let orders_file = ledger.store().path_of(TableRef::new(TableKind::Orders, october()));
    assert!(!orders_file.exists());
}
