//! Value objects for the ledger domain.

mod amount;
mod currency;
mod identifiers;
mod period;

pub use amount::Amount;
pub use currency::Currency;
pub use identifiers::{AccountId, ClientId, Ticket};
pub use period::Period;
