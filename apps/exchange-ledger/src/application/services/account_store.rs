//! Account Store
//!
//! Owns client identity and the USDT/TOMAN balance buckets. The clients
//! table is partitioned by period like every other table; when the current
//! period has no table yet, the latest earlier one is read and the next
//! write carries it forward.

use std::sync::Arc;

use crate::application::ports::{Clock, IdSource, TableKind, TableRef, TableStore};
use crate::application::services::tables::{draw_unique, load_records, save_records};
use crate::application::session::LedgerSession;
use crate::domain::account::{BalanceOverride, ClientAccount, normalize_name};
use crate::domain::shared::{AccountId, Amount, ClientId, Currency, LedgerError};
use crate::infrastructure::metrics;

/// Page size of [`AccountStore::list`] when the caller has no preference.
pub const DEFAULT_CLIENT_PAGE_SIZE: usize = 5;

/// Client registry and balance buckets.
pub struct AccountStore<S> {
    store: Arc<S>,
    clock: Arc<dyn Clock>,
    ids: Arc<dyn IdSource>,
}

impl<S: TableStore> AccountStore<S> {
    /// Create a store over `store`.
    pub fn new(store: Arc<S>, clock: Arc<dyn Clock>, ids: Arc<dyn IdSource>) -> Self {
        Self { store, clock, ids }
    }

    fn current_table(&self) -> TableRef {
        TableRef::new(TableKind::Clients, self.clock.current_period())
    }

    /// Every client, in registration order.
    pub async fn all(&self) -> Vec<ClientAccount> {
        let current = self.current_table();
        match self.store.table_exists(current).await {
            Ok(true) => return load_records(&*self.store, current).await,
            Ok(false) => {}
            Err(e) => {
                tracing::warn!(table = %current, error = %e, "Clients table unreadable, treating as empty");
                return Vec::new();
            }
        }

        let earlier = match self.store.list_periods(TableKind::Clients).await {
            Ok(periods) => periods.into_iter().filter(|p| *p < current.period).max(),
            Err(e) => {
                tracing::warn!(error = %e, "Could not list client periods");
                None
            }
        };
        match earlier {
            Some(period) => {
                let source = TableRef::new(TableKind::Clients, period);
                tracing::debug!(from = %source, to = %current, "Carrying clients forward");
                load_records(&*self.store, source).await
            }
            None => Vec::new(),
        }
    }

    async fn save(&self, accounts: &[ClientAccount]) -> Result<(), LedgerError> {
        save_records(&*self.store, self.current_table(), accounts).await
    }

    /// Register a client and return the new client id.
    pub async fn create(
        &self,
        _session: &LedgerSession<'_>,
        name: &str,
        usdt0: Amount,
        toman0: Amount,
    ) -> Result<ClientId, LedgerError> {
        let name = normalize_name(name)?;
        let mut accounts = self.all().await;
        if accounts.iter().any(|a| a.has_name(&name)) {
            return Err(LedgerError::duplicate("client name", name));
        }

        let client_id = draw_unique(&*self.ids, ClientId::RANGE, "client id", |c| {
            accounts.iter().any(|a| a.client_id.value() == c)
        })?;
        let account_id = draw_unique(&*self.ids, AccountId::RANGE, "account id", |c| {
            accounts.iter().any(|a| a.account_id.value() == c)
        })?;

        let account = ClientAccount {
            client_id: ClientId::new(client_id),
            account_id: AccountId::new(account_id),
            name,
            usdt_balance: usdt0,
            toman_balance: toman0,
        };
        tracing::info!(
            client_id = %account.client_id,
            account_id = %account.account_id,
            name = %account.name,
            "Client registered"
        );
        let client_id = account.client_id;
        accounts.push(account);
        self.save(&accounts).await?;
        metrics::record_client_created();
        Ok(client_id)
    }

    /// Client by id, or `None`.
    pub async fn find(&self, client_id: ClientId) -> Option<ClientAccount> {
        self.all().await.into_iter().find(|a| a.client_id == client_id)
    }

    /// Client by id.
    pub async fn get(&self, client_id: ClientId) -> Result<ClientAccount, LedgerError> {
        self.find(client_id)
            .await
            .ok_or_else(|| LedgerError::not_found("client", client_id))
    }

    /// Client owning `account_id`, or `None`.
    pub async fn find_by_account(&self, account_id: AccountId) -> Option<ClientAccount> {
        self.all().await.into_iter().find(|a| a.account_id == account_id)
    }

    /// Client by case-insensitive name, or `None`.
    pub async fn find_by_name(&self, name: &str) -> Option<ClientAccount> {
        self.all().await.into_iter().find(|a| a.has_name(name))
    }

    /// `[offset, offset + page_size)` of the registration-ordered client list.
    pub async fn list(&self, offset: usize, page_size: usize) -> Vec<ClientAccount> {
        self.all().await.into_iter().skip(offset).take(page_size).collect()
    }

    /// Number of registered clients.
    pub async fn count(&self) -> usize {
        self.all().await.len()
    }

    /// Clients whose name, client id or account id contains `query`.
    pub async fn search(&self, query: &str) -> Vec<ClientAccount> {
        self.all().await.into_iter().filter(|a| a.matches(query)).collect()
    }

    /// Clients owing the house TOMAN.
    pub async fn payables(&self) -> Vec<ClientAccount> {
        self.all()
            .await
            .into_iter()
            .filter(|a| a.toman_balance.is_positive())
            .collect()
    }

    /// Clients the house owes TOMAN.
    pub async fn receivables(&self) -> Vec<ClientAccount> {
        self.all()
            .await
            .into_iter()
            .filter(|a| a.toman_balance.is_negative())
            .collect()
    }

    /// Summed (USDT, TOMAN) balances across all clients.
    pub async fn house_balances(&self) -> (Amount, Amount) {
        self.all().await.iter().fold((Amount::ZERO, Amount::ZERO), |(usdt, toman), a| {
            (usdt + a.usdt_balance, toman + a.toman_balance)
        })
    }

    /// Add `delta` to the client's `currency` bucket and return the updated account.
    pub async fn adjust_balance(
        &self,
        session: &LedgerSession<'_>,
        client_id: ClientId,
        currency: &Currency,
        delta: Amount,
    ) -> Result<ClientAccount, LedgerError> {
        self.mutate(session, client_id, |account| {
            let before = account.balance(currency).unwrap_or_default();
            let after = account.apply_delta(currency, delta)?;
            tracing::info!(
                client_id = %client_id,
                currency = %currency,
                delta = %delta,
                before = %before,
                after = %after,
                "Balance adjusted"
            );
            Ok(())
        })
        .await
    }

    /// Replace the client's name.
    pub async fn rename(
        &self,
        session: &LedgerSession<'_>,
        client_id: ClientId,
        new_name: &str,
    ) -> Result<ClientAccount, LedgerError> {
        let new_name = normalize_name(new_name)?;
        let clash = self
            .all()
            .await
            .into_iter()
            .any(|a| a.client_id != client_id && a.has_name(&new_name));
        if clash {
            return Err(LedgerError::duplicate("client name", new_name));
        }
        self.mutate(session, client_id, |account| {
            tracing::info!(client_id = %client_id, from = %account.name, to = %new_name, "Client renamed");
            account.name.clone_from(&new_name);
            Ok(())
        })
        .await
    }

    /// Replace one or both balance buckets outright.
    pub async fn override_balances(
        &self,
        session: &LedgerSession<'_>,
        client_id: ClientId,
        replacement: BalanceOverride,
    ) -> Result<ClientAccount, LedgerError> {
        self.mutate(session, client_id, |account| {
            replacement.apply_to(account);
            tracing::info!(
                client_id = %client_id,
                usdt = %account.usdt_balance,
                toman = %account.toman_balance,
                "Balances overridden"
            );
            Ok(())
        })
        .await
    }

    async fn mutate(
        &self,
        _session: &LedgerSession<'_>,
        client_id: ClientId,
        change: impl FnOnce(&mut ClientAccount) -> Result<(), LedgerError>,
    ) -> Result<ClientAccount, LedgerError> {
        let mut accounts = self.all().await;
        let account = accounts
            .iter_mut()
            .find(|a| a.client_id == client_id)
            .ok_or_else(|| LedgerError::not_found("client", client_id))?;
        change(account)?;
        let updated = account.clone();
        self.save(&accounts).await?;
        Ok(updated)
    }
}
