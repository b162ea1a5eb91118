//! Persistence Adapters
//!
//! Table store implementations and the share marker reader.

pub mod in_memory;
pub mod json_file;
pub mod share_marker;

pub use in_memory::{InMemoryTableStore, WriteFailure};
pub use json_file::JsonFileTableStore;
pub use share_marker::FileShareMarker;
