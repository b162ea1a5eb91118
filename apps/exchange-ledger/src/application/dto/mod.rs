//! Data Transfer Objects (DTOs)
//!
//! Typed commands accepted by the workflows and the receipts they return.

mod receipt_dto;
mod settlement_dto;

pub use receipt_dto::{CancelNotice, DeletionReceipt, OrderQuote, SettlementReceipt, TransferReceipt};
pub use settlement_dto::{SettlementCommand, SettlementPath, TransferCommand};
