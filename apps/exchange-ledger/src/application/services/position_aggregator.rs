//! Position Aggregator
//!
//! Derives the house's daily trading totals and the net USDT position
//! carried forward day to day and across month boundaries. Owns the daily
//! position table; only reads orders, transactions and accounts.

use std::fmt;
use std::sync::Arc;

use chrono::{Datelike, NaiveDate};

use crate::application::ports::{Clock, TableKind, TableRef, TableStore};
use crate::application::services::tables::{load_records, save_records};
use crate::application::services::{AccountStore, OrderLedger, TransactionLedger};
use crate::application::session::LedgerSession;
use crate::domain::position::{DailyPosition, DailyTotals, TradeTotals, TransferTotals};
use crate::domain::shared::{Amount, LedgerError, Period};
use crate::infrastructure::metrics;

/// Result of a rollup: today's totals, house balances and the net position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PositionSummary {
    /// Date summarized.
    pub date: NaiveDate,
    /// Today's house-wide totals.
    pub totals: DailyTotals,
    /// Summed USDT balances across clients.
    pub house_usdt_balance: Amount,
    /// Summed TOMAN balances across clients.
    pub house_toman_balance: Amount,
    /// Net position carried in from before today.
    pub previous_net_position: Amount,
    /// `bought − sold + previous`.
    pub net_position: Amount,
}

impl PositionSummary {
    /// Rendered report.
    #[must_use]
    pub fn text(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for PositionSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let trades = &self.totals.trades;
        let transfers = &self.totals.transfers;
        writeln!(f, "Summary for {}", self.date.format("%Y-%m-%d"))?;
        writeln!(f, "Bought USDT: {}", trades.bought_usdt)?;
        writeln!(f, "Sold USDT: {}", trades.sold_usdt)?;
        writeln!(f, "Sent TOMAN: {}", transfers.sent_toman)?;
        writeln!(f, "Received TOMAN: {}", transfers.received_toman)?;
        writeln!(f, "Sent USDT: {}", transfers.sent_usdt)?;
        writeln!(f, "Received USDT: {}", transfers.received_usdt)?;
        writeln!(f, "House TOMAN balance: {}", self.house_toman_balance)?;
        writeln!(f, "House USDT balance: {}", self.house_usdt_balance)?;
        writeln!(f, "Previous net position: {}", self.previous_net_position)?;
        write!(f, "Net position: {}", self.net_position)
    }
}

/// House-wide rollups over the other three stores.
pub struct PositionAggregator<S> {
    store: Arc<S>,
    accounts: Arc<AccountStore<S>>,
    orders: Arc<OrderLedger<S>>,
    transactions: Arc<TransactionLedger<S>>,
    clock: Arc<dyn Clock>,
}

impl<S: TableStore> PositionAggregator<S> {
    /// Create an aggregator reading the given stores.
    pub fn new(
        store: Arc<S>,
        accounts: Arc<AccountStore<S>>,
        orders: Arc<OrderLedger<S>>,
        transactions: Arc<TransactionLedger<S>>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            store,
            accounts,
            orders,
            transactions,
            clock,
        }
    }

    fn table(period: Period) -> TableRef {
        TableRef::new(TableKind::DailyPositions, period)
    }

    /// Daily position rows of `period`, ordered by date.
    pub async fn positions(&self, period: Period) -> Vec<DailyPosition> {
        let mut rows: Vec<DailyPosition> = load_records(&*self.store, Self::table(period)).await;
        rows.sort_by_key(|p| p.date);
        rows
    }

    /// House-wide totals of orders and transactions dated today.
    pub async fn daily_totals(&self) -> DailyTotals {
        let today = self.clock.today();
        let period = Period::of(today);
        let orders = self.orders.orders_in(period).await;
        let transactions = self.transactions.transactions_in(period).await;
        DailyTotals {
            trades: TradeTotals::from_orders(orders.iter().filter(|o| o.created_at.date() == today)),
            transfers: TransferTotals::from_transactions(
                transactions.iter().filter(|t| t.date.date() == today),
            ),
        }
    }

    /// House-wide USDT bought and sold across every recorded period.
    pub async fn all_time_totals(&self) -> TradeTotals {
        let periods = match self.store.list_periods(TableKind::Orders).await {
            Ok(periods) => periods,
            Err(e) => {
                tracing::warn!(error = %e, "Could not list order periods");
                Vec::new()
            }
        };
        let mut totals = TradeTotals::default();
        for period in periods {
            for order in self.orders.orders_in(period).await {
                totals.record(&order);
            }
        }
        totals
    }

    /// Net position carried into `date`.
    ///
    /// On the first day of a month this is the last row of the previous
    /// month's table (zero if that table is absent); otherwise the latest row
    /// strictly before `date` in the current table (zero if none).
    pub async fn previous_net_position(&self, date: NaiveDate) -> Amount {
        let period = Period::of(date);
        if date.day() == 1 {
            let previous = Self::table(period.previous());
            match self.store.table_exists(previous).await {
                Ok(true) => {}
                Ok(false) => return Amount::ZERO,
                Err(e) => {
                    tracing::warn!(table = %previous, error = %e, "Previous position table unreadable");
                    return Amount::ZERO;
                }
            }
            return self
                .positions(period.previous())
                .await
                .last()
                .map_or(Amount::ZERO, |p| p.net_position);
        }

        self.positions(period)
            .await
            .into_iter()
            .rfind(|p| p.date < date)
            .map_or(Amount::ZERO, |p| p.net_position)
    }

    /// Recompute today's position and upsert its row.
    pub async fn summary(&self, _session: &LedgerSession<'_>) -> Result<PositionSummary, LedgerError> {
        let date = self.clock.today();
        let totals = self.daily_totals().await;
        let previous_net_position = self.previous_net_position(date).await;
        let net_position = totals.trades.net() + previous_net_position;
        let (house_usdt_balance, house_toman_balance) = self.accounts.house_balances().await;

        self.upsert(DailyPosition {
            date,
            bought_usdt: totals.trades.bought_usdt,
            sold_usdt: totals.trades.sold_usdt,
            net_position,
        })
        .await?;

        tracing::info!(
            date = %date,
            bought = %totals.trades.bought_usdt,
            sold = %totals.trades.sold_usdt,
            previous = %previous_net_position,
            net = %net_position,
            "Daily position updated"
        );
        metrics::record_position_rollup(net_position);

        Ok(PositionSummary {
            date,
            totals,
            house_usdt_balance,
            house_toman_balance,
            previous_net_position,
            net_position,
        })
    }

    async fn upsert(&self, row: DailyPosition) -> Result<(), LedgerError> {
        let period = Period::of(row.date);
        let mut rows = self.positions(period).await;
        match rows.iter_mut().find(|p| p.date == row.date) {
            Some(existing) => *existing = row,
            None => rows.push(row),
        }
        save_records(&*self.store, Self::table(period), &rows).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::LedgerGate;
    use crate::application::ports::{FixedClock, IdSource, RandomIdSource};
    use crate::domain::order::{OrderRequest, OrderSide, OrderStatus};
    use crate::domain::shared::{ClientId, Currency};
    use crate::infrastructure::persistence::InMemoryTableStore;
    use chrono::TimeDelta;

    struct Fixture {
        aggregator: PositionAggregator<InMemoryTableStore>,
        accounts: Arc<AccountStore<InMemoryTableStore>>,
        orders: Arc<OrderLedger<InMemoryTableStore>>,
        store: Arc<InMemoryTableStore>,
        clock: Arc<FixedClock>,
        gate: LedgerGate,
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn fixture(today: NaiveDate) -> Fixture {
        let store = Arc::new(InMemoryTableStore::new());
        let clock = Arc::new(FixedClock::at_date(today));
        let ids: Arc<dyn IdSource> = Arc::new(RandomIdSource::seeded(9));
        let accounts = Arc::new(AccountStore::new(Arc::clone(&store), clock.clone(), Arc::clone(&ids)));
        let orders = Arc::new(OrderLedger::new(Arc::clone(&store), Arc::clone(&accounts), clock.clone(), ids));
        let transactions = Arc::new(TransactionLedger::new(Arc::clone(&store), Arc::clone(&accounts), clock.clone()));
        let aggregator = PositionAggregator::new(
            Arc::clone(&store),
            Arc::clone(&accounts),
            Arc::clone(&orders),
            transactions,
            clock.clone(),
        );
        Fixture {
            aggregator,
            accounts,
            orders,
            store,
            clock,
            gate: LedgerGate::new(),
        }
    }

    async fn trade(fx: &Fixture, client: ClientId, side: OrderSide, size: i64) {
        let session = fx.gate.begin().await;
        let request = OrderRequest {
            client_id: client,
            side,
            currency: Currency::Usdt,
            size: Amount::from_units(size),
            price: Amount::from_units(1),
        };
        fx.orders
            .create_order(&session, &request, OrderStatus::Pending, Amount::ZERO)
            .await
            .unwrap();
    }

    async fn client(fx: &Fixture) -> ClientId {
        let session = fx.gate.begin().await;
        fx.accounts
            .create(&session, "Ali", Amount::ZERO, Amount::ZERO)
            .await
            .unwrap()
    }

    async fn seed_position(fx: &Fixture, day: NaiveDate, net: i64) {
        let row = DailyPosition {
            date: day,
            bought_usdt: Amount::ZERO,
            sold_usdt: Amount::ZERO,
            net_position: Amount::from_units(net),
        };
        fx.aggregator.upsert(row).await.unwrap();
    }

    #[tokio::test]
    async fn summary_is_idempotent_within_a_day() {
        let fx = fixture(date(2026, 10, 17));
        let c = client(&fx).await;
        trade(&fx, c, OrderSide::Buy, 300).await;
        trade(&fx, c, OrderSide::Sell, 100).await;
        seed_position(&fx, date(2026, 10, 16), 50).await;

        let first = {
            let session = fx.gate.begin().await;
            fx.aggregator.summary(&session).await.unwrap()
        };
        let second = {
            let session = fx.gate.begin().await;
            fx.aggregator.summary(&session).await.unwrap()
        };

        assert_eq!(first.net_position, Amount::from_units(250));
        assert_eq!(first.net_position, second.net_position);
        assert_eq!(fx.aggregator.positions(Period::of(date(2026, 10, 17))).await.len(), 2);
    }

    #[tokio::test]
    async fn previous_uses_latest_earlier_row() {
        let fx = fixture(date(2026, 10, 17));
        seed_position(&fx, date(2026, 10, 3), 10).await;
        seed_position(&fx, date(2026, 10, 12), 40).await;
        seed_position(&fx, date(2026, 10, 17), 99).await;
        assert_eq!(fx.aggregator.previous_net_position(date(2026, 10, 17)).await, Amount::from_units(40));
        assert_eq!(fx.aggregator.previous_net_position(date(2026, 10, 2)).await, Amount::ZERO);
    }

    #[tokio::test]
    async fn first_of_month_reads_previous_month() {
        let fx = fixture(date(2026, 11, 1));
        assert_eq!(fx.aggregator.previous_net_position(date(2026, 11, 1)).await, Amount::ZERO);

        seed_position(&fx, date(2026, 10, 30), 70).await;
        seed_position(&fx, date(2026, 10, 31), 85).await;
        assert_eq!(fx.aggregator.previous_net_position(date(2026, 11, 1)).await, Amount::from_units(85));
    }

    #[tokio::test]
    async fn net_position_carries_across_month_end() {
        let fx = fixture(date(2026, 10, 31));
        let c = client(&fx).await;
        trade(&fx, c, OrderSide::Buy, 120).await;
        {
            let session = fx.gate.begin().await;
            fx.aggregator.summary(&session).await.unwrap();
        }

        fx.clock.advance(TimeDelta::days(1));
        trade(&fx, c, OrderSide::Sell, 20).await;
        let november = {
            let session = fx.gate.begin().await;
            fx.aggregator.summary(&session).await.unwrap()
        };
        assert_eq!(november.previous_net_position, Amount::from_units(120));
        assert_eq!(november.net_position, Amount::from_units(100));
        assert!(november.text().contains("Net position: 100"));
    }

    #[tokio::test]
    async fn all_time_totals_span_periods() {
        let fx = fixture(date(2026, 9, 20));
        let c = client(&fx).await;
        trade(&fx, c, OrderSide::Buy, 10).await;
        fx.clock.set(date(2026, 10, 5).and_hms_opt(9, 0, 0).unwrap());
        trade(&fx, c, OrderSide::Buy, 5).await;
        trade(&fx, c, OrderSide::Sell, 2).await;

        let totals = fx.aggregator.all_time_totals().await;
        assert_eq!(totals.bought_usdt, Amount::from_units(15));
        assert_eq!(totals.sold_usdt, Amount::from_units(2));

        let today = fx.aggregator.daily_totals().await;
        assert_eq!(today.trades.bought_usdt, Amount::from_units(5));
        assert!(fx.store.table_exists(TableRef::new(TableKind::Orders, Period::new(2026, 9).unwrap())).await.unwrap());
    }
}
