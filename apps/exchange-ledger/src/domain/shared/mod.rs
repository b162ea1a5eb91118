//! Shared kernel: error taxonomy and value objects used by every aggregate.

pub mod errors;
pub mod value_objects;

pub use errors::LedgerError;
pub use value_objects::{AccountId, Amount, ClientId, Currency, Period, Ticket};
