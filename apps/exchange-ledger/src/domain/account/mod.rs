//! Client accounts and their per-currency balances.

use serde::{Deserialize, Serialize};

use crate::domain::shared::{AccountId, Amount, ClientId, Currency, LedgerError};

/// A registered client with USDT and TOMAN balance buckets.
///
/// Positive balances are owed by the client to the house, negative
/// balances are owed to the client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientAccount {
    /// Client identifier.
    pub client_id: ClientId,
    /// Ledger account identifier, referenced by orders and transactions.
    pub account_id: AccountId,
    /// Display name, unique case-insensitively.
    pub name: String,
    /// USDT bucket.
    pub usdt_balance: Amount,
    /// TOMAN bucket.
    pub toman_balance: Amount,
}

impl ClientAccount {
    /// Balance held in `currency`, if that currency has a bucket.
    #[must_use]
    pub fn balance(&self, currency: &Currency) -> Option<Amount> {
        match currency {
            Currency::Usdt => Some(self.usdt_balance),
            Currency::Toman => Some(self.toman_balance),
            Currency::Other(_) => None,
        }
    }

    /// Add `delta` to the bucket for `currency` and return the new balance.
    pub fn apply_delta(&mut self, currency: &Currency, delta: Amount) -> Result<Amount, LedgerError> {
        let bucket = match currency {
            Currency::Usdt => &mut self.usdt_balance,
            Currency::Toman => &mut self.toman_balance,
            Currency::Other(code) => {
                return Err(LedgerError::validation(format!(
                    "Currency {code} has no balance; use USDT or TOMAN."
                )));
            }
        };
        *bucket = bucket.checked_add(delta).ok_or_else(|| {
            LedgerError::validation(format!("{currency} balance would exceed the supported range."))
        })?;
        Ok(*bucket)
    }

    /// Case-insensitive name comparison.
    #[must_use]
    pub fn has_name(&self, name: &str) -> bool {
        self.name.to_lowercase() == name.trim().to_lowercase()
    }

    /// Substring match on name, client id or account id, ignoring case.
    #[must_use]
    pub fn matches(&self, query: &str) -> bool {
        let needle = query.trim().to_lowercase();
        self.name.to_lowercase().contains(&needle)
            || self.client_id.to_string().contains(&needle)
            || self.account_id.to_string().contains(&needle)
    }
}

/// Trim a client name, rejecting blank input.
pub fn normalize_name(name: &str) -> Result<String, LedgerError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(LedgerError::validation("Client name cannot be empty."));
    }
    Ok(trimmed.to_string())
}

/// Direct replacement of one or both balance buckets.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BalanceOverride {
    /// New USDT balance.
    pub usdt: Option<Amount>,
    /// New TOMAN balance.
    pub toman: Option<Amount>,
}

impl BalanceOverride {
    /// Apply to an account.
    pub fn apply_to(&self, account: &mut ClientAccount) {
        if let Some(usdt) = self.usdt {
            account.usdt_balance = usdt;
        }
        if let Some(toman) = self.toman {
            account.toman_balance = toman;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn account() -> ClientAccount {
        ClientAccount {
            client_id: ClientId::new(4821),
            account_id: AccountId::new(7310),
            name: "Reza Karimi".to_string(),
            usdt_balance: Amount::ZERO,
            toman_balance: Amount::ZERO,
        }
    }

    #[test]
    fn apply_delta_targets_bucket() {
        let mut acc = account();
        let after = acc
            .apply_delta(&Currency::Toman, Amount::from_units(-50_000_000))
            .unwrap();
        assert_eq!(after, Amount::from_units(-50_000_000));
        assert_eq!(acc.usdt_balance, Amount::ZERO);
    }

    #[test]
    fn apply_delta_rejects_unbalanced_currency() {
        let mut acc = account();
        let err = acc
            .apply_delta(&Currency::parse("eur"), Amount::from_units(1))
            .unwrap_err();
        assert!(matches!(err, LedgerError::Validation { .. }));
    }

    #[test]
    fn apply_delta_rejects_overflow_and_keeps_balance() {
        let mut acc = account();
        acc.apply_delta(&Currency::Usdt, Amount::new(rust_decimal::Decimal::MAX))
            .unwrap();
        let err = acc
            .apply_delta(&Currency::Usdt, Amount::from_units(1))
            .unwrap_err();
        assert!(matches!(err, LedgerError::Validation { .. }));
        assert_eq!(acc.usdt_balance, Amount::new(rust_decimal::Decimal::MAX));
    }

    #[test]
    fn search_matches_name_and_ids() {
        let acc = account();
        assert!(acc.matches("karimi"));
        assert!(acc.matches("482"));
        assert!(acc.matches("731"));
        assert!(!acc.matches("ahmadi"));
    }

    #[test]
    fn name_comparison_ignores_case() {
        assert!(account().has_name("  reza KARIMI "));
        assert!(normalize_name("   ").is_err());
        assert_eq!(normalize_name(" Sara ").unwrap(), "Sara");
    }

    #[test]
    fn balance_override_partial() {
        let mut acc = account();
        BalanceOverride {
            usdt: Some(Amount::from_units(12)),
            toman: None,
        }
        .apply_to(&mut acc);
        assert_eq!(acc.usdt_balance, Amount::from_units(12));
        assert_eq!(acc.toman_balance, Amount::ZERO);
    }
}
