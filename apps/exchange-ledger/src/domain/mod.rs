//! Domain layer.
//!
//! Entities and value objects of the desk ledger. Nothing here touches
//! storage, clocks or randomness; those arrive through application ports.

pub mod account;
pub mod order;
pub mod position;
pub mod shared;
pub mod transaction;
