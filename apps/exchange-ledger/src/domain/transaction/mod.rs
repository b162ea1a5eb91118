//! Transaction log entries and the balance-mutation rule.

mod direction;
mod input;
mod record;

pub use direction::Direction;
pub use input::{TransactionInput, parse_transaction_input};
pub use record::Transaction;
