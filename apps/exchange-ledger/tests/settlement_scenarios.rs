//! Settlement Integration Tests
//!
//! Drives the payment and funds workflows through the container against the
//! in-memory store, checking balances, orders and transactions together.

#![allow(clippy::unwrap_used)]

use std::sync::Arc;

use chrono::NaiveDate;
use rust_decimal_macros::dec;

use exchange_ledger::application::ports::{Clock, FixedClock, NoSharedPeriod, RandomIdSource};
use exchange_ledger::application::services::DEFAULT_ORDER_PAGE_SIZE;
use exchange_ledger::{
    Amount, ClientId, Container, Currency, Direction, InMemoryTableStore, LedgerError,
    OrderRequest, OrderSide, OrderStatus, SettlementCommand, StepRetryPolicy, TransferCommand,
};

// =============================================================================
// Fixture
// =============================================================================

fn container() -> Container<InMemoryTableStore> {
    Container::new(
        Arc::new(InMemoryTableStore::new()),
        Arc::new(FixedClock::at_date(
            NaiveDate::from_ymd_opt(2026, 10, 14).unwrap(),
        )),
        Arc::new(RandomIdSource::seeded(7)),
        Arc::new(NoSharedPeriod),
        StepRetryPolicy::none(),
    )
}

async fn open_client(container: &Container<InMemoryTableStore>, name: &str) -> ClientId {
    let gate = container.gate();
    let session = gate.begin().await;
    container
        .accounts()
        .create(&session, name, Amount::ZERO, Amount::ZERO)
        .await
        .unwrap()
}

fn request(client_id: ClientId, side: OrderSide, size: i64, price: i64) -> OrderRequest {
    OrderRequest {
        client_id,
        side,
        currency: Currency::Usdt,
        size: Amount::from_units(size),
        price: Amount::from_units(price),
    }
}

async fn toman_balance(container: &Container<InMemoryTableStore>, client_id: ClientId) -> Amount {
    container.accounts().get(client_id).await.unwrap().toman_balance
}

/// Balance implied by the recorded orders and standalone transactions.
async fn implied_toman_balance(
    container: &Container<InMemoryTableStore>,
    client_id: ClientId,
) -> Amount {
    let account = container.accounts().get(client_id).await.unwrap();
    let period = container.clock().current_period();

    let from_orders: Amount = container
        .orders()
        .orders_in(period)
        .await
        .into_iter()
        .filter(|o| o.account_id == account.account_id && o.status.adjusts_balance())
        .map(|o| o.side.settlement_direction().signed(o.unpaid()))
        .sum();
    let from_postings: Amount = container
        .transactions()
        .transactions_in(period)
        .await
        .into_iter()
        .filter(|t| {
            t.account_id == account.account_id && !t.is_linked() && t.currency == Currency::Toman
        })
        .map(|t| t.direction.signed(t.size))
        .sum();
    from_orders + from_postings
}

// =============================================================================
// Settlement paths
// =============================================================================

#[tokio::test]
async fn deferred_sell_puts_client_in_debt() {
    let container = container();
    let client = open_client(&container, "Ali").await;

    let receipt = container
        .payment_workflow()
        .settle(SettlementCommand::DeferredPayment {
            order: request(client, OrderSide::Sell, 100, 500_000),
        })
        .await
        .unwrap();

    assert_eq!(receipt.order.payable, Amount::new(dec!(50000000)));
    assert_eq!(receipt.order.status, OrderStatus::Pending);
    assert_eq!(receipt.order.debt, Amount::new(dec!(50000000)));
    assert!(receipt.transaction.is_none());
    assert_eq!(toman_balance(&container, client).await, Amount::new(dec!(-50000000)));
}

#[tokio::test]
async fn deleting_deferred_order_restores_balance() {
    let container = container();
    let client = open_client(&container, "Ali").await;
    let workflow = container.payment_workflow();

    let receipt = workflow
        .settle(SettlementCommand::DeferredPayment {
            order: request(client, OrderSide::Sell, 100, 500_000),
        })
        .await
        .unwrap();
    let deletion = workflow.delete_order(receipt.order.ticket).await.unwrap();

    assert_eq!(deletion.transactions_removed, 0);
    assert_eq!(deletion.balance_reversed, Some(Amount::new(dec!(50000000))));
    assert_eq!(toman_balance(&container, client).await, Amount::ZERO);
    assert!(container.orders().find(receipt.order.ticket).await.is_none());
}

#[tokio::test]
async fn manual_buy_nets_remainder_and_posts_paid_part() {
    let container = container();
    let client = open_client(&container, "Sara").await;

    let receipt = container
        .payment_workflow()
        .settle(SettlementCommand::ManualPayment {
            order: request(client, OrderSide::Buy, 200, 490_000),
            paid_now: Amount::new(dec!(50000000)),
        })
        .await
        .unwrap();

    let order = &receipt.order;
    assert_eq!(order.payable, Amount::new(dec!(98000000)));
    assert_eq!(order.status, OrderStatus::Manual);
    assert_eq!(order.paid_by_client, Amount::new(dec!(50000000)));
    assert_eq!(order.debt, Amount::new(dec!(48000000)));
    assert_eq!(toman_balance(&container, client).await, Amount::new(dec!(48000000)));

    let linked = container.transactions().find_linked(order.ticket).await;
    assert_eq!(linked.len(), 1);
    assert_eq!(linked[0].size, Amount::new(dec!(50000000)));
    assert_eq!(linked[0].direction, Direction::Send);
}

#[tokio::test]
async fn full_payment_leaves_balance_alone() {
    let container = container();
    let client = open_client(&container, "Reza").await;

    let receipt = container
        .payment_workflow()
        .settle(SettlementCommand::FullPayment {
            order: request(client, OrderSide::Buy, 10, 500_000),
        })
        .await
        .unwrap();

    assert_eq!(receipt.order.status, OrderStatus::Complete);
    assert_eq!(receipt.order.debt, Amount::ZERO);
    assert_eq!(toman_balance(&container, client).await, Amount::ZERO);
    assert_eq!(container.transactions().find_linked(receipt.order.ticket).await.len(), 1);

    let deletion = container
        .payment_workflow()
        .delete_order(receipt.order.ticket)
        .await
        .unwrap();
    assert_eq!(deletion.balance_reversed, None);
    assert_eq!(deletion.transactions_removed, 1);
}

#[tokio::test]
async fn overpayment_rejected_without_side_effects() {
    let container = container();
    let client = open_client(&container, "Ali").await;

    let err = container
        .payment_workflow()
        .settle(SettlementCommand::ManualPayment {
            order: request(client, OrderSide::Buy, 1, 1_000),
            paid_now: Amount::from_units(2_000),
        })
        .await
        .unwrap_err();

    assert!(matches!(err, LedgerError::Validation { .. }));
    assert_eq!(toman_balance(&container, client).await, Amount::ZERO);
    let period = container.clock().current_period();
    assert!(container.orders().orders_in(period).await.is_empty());
}

// =============================================================================
// History
// =============================================================================

#[tokio::test]
async fn history_pages_past_the_end_are_short() {
    let container = container();
    let client = open_client(&container, "Ali").await;
    let workflow = container.payment_workflow();
    for _ in 0..4 {
        workflow
            .settle(SettlementCommand::FullPayment {
                order: request(client, OrderSide::Buy, 1, 1_000),
            })
            .await
            .unwrap();
    }

    let history = container.account_history();
    let first = history.orders(client, 0, DEFAULT_ORDER_PAGE_SIZE).await.unwrap();
    let second = history.orders(client, 3, DEFAULT_ORDER_PAGE_SIZE).await.unwrap();

    assert_eq!(first.orders.len(), 3);
    assert_eq!(second.orders.len(), 1);
    assert_eq!(first.today.bought_usdt, Amount::from_units(4));
}

// =============================================================================
// Cross-entity consistency
// =============================================================================

#[tokio::test]
async fn balances_match_orders_and_postings() {
    let container = container();
    let ali = open_client(&container, "Ali").await;
    let sara = open_client(&container, "Sara").await;
    let payments = container.payment_workflow();
    let funds = container.funds_workflow();

    let pending = payments
        .settle(SettlementCommand::DeferredPayment {
            order: request(ali, OrderSide::Sell, 100, 500_000),
        })
        .await
        .unwrap();
    payments
        .settle(SettlementCommand::ManualPayment {
            order: request(ali, OrderSide::Buy, 200, 490_000),
            paid_now: Amount::new(dec!(50000000)),
        })
        .await
        .unwrap();
    payments
        .settle(SettlementCommand::FullPayment {
            order: request(sara, OrderSide::Sell, 5, 510_000),
        })
        .await
        .unwrap();
    funds.post_line(ali, "send 1000000 toman").await.unwrap();
    funds.post_line(sara, "receive 10 usdt").await.unwrap();
    funds
        .transfer(&TransferCommand {
            from: ali,
            to: sara,
            currency: Currency::Toman,
            amount: Amount::from_units(250_000),
        })
        .await
        .unwrap();
    payments.delete_order(pending.order.ticket).await.unwrap();

    for client in [ali, sara] {
        assert_eq!(
            toman_balance(&container, client).await,
            implied_toman_balance(&container, client).await
        );
    }
    assert_eq!(
        container.accounts().get(sara).await.unwrap().usdt_balance,
        Amount::from_units(-10)
    );
}
