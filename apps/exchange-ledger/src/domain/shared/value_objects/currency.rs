//! Currency codes.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Currency traded or settled at the desk.
///
/// Codes are case-insensitive on input and always held upper-cased. Only
/// [`Currency::Usdt`] and [`Currency::Toman`] carry client balances.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Currency {
    /// Tether, the traded asset.
    Usdt,
    /// Local currency in which orders are settled.
    Toman,
    /// Any other code; recorded but never balanced.
    Other(String),
}

impl Currency {
    /// Currency in which order payables are paid.
    pub const SETTLEMENT: Self = Self::Toman;

    /// Parse a currency token, upper-casing it.
    #[must_use]
    pub fn parse(token: &str) -> Self {
        let code = token.trim().to_uppercase();
        match code.as_str() {
            "USDT" => Self::Usdt,
            "TOMAN" => Self::Toman,
            _ => Self::Other(code),
        }
    }

    /// Upper-cased code.
    #[must_use]
    pub fn code(&self) -> &str {
        match self {
            Self::Usdt => "USDT",
            Self::Toman => "TOMAN",
            Self::Other(code) => code,
        }
    }

    /// Whether client balances are tracked in this currency.
    #[must_use]
    pub const fn has_balance(&self) -> bool {
        matches!(self, Self::Usdt | Self::Toman)
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl From<String> for Currency {
    fn from(value: String) -> Self {
        Self::parse(&value)
    }
}

impl From<Currency> for String {
    fn from(value: Currency) -> Self {
        value.code().to_string()
    }
}
