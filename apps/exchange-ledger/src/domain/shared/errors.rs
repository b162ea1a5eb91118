//! Ledger error taxonomy.
//!
//! Every component reports failures through [`LedgerError`]. Validation
//! messages are user-facing and rendered verbatim.

use thiserror::Error;

/// Errors surfaced by ledger operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedgerError {
    /// Malformed command grammar or out-of-range field.
    #[error("{message}")]
    Validation {
        /// User-facing description of the problem.
        message: String,
    },

    /// Unknown client, account or order ticket.
    #[error("{entity} not found: {id}")]
    NotFound {
        /// Kind of record looked up.
        entity: &'static str,
        /// Identifier that missed.
        id: String,
    },

    /// Uniqueness violation, e.g. a client name already in use.
    #[error("{entity} already exists: {value}")]
    Duplicate {
        /// Kind of record.
        entity: &'static str,
        /// Conflicting value.
        value: String,
    },

    /// The stores disagree with each other or a mutation targeted a missing record.
    #[error("ledger inconsistency: {message}")]
    Inconsistency {
        /// What was found out of line.
        message: String,
    },

    /// A table could not be written.
    #[error("persistence failure on {table}: {message}")]
    Persistence {
        /// Table that failed.
        table: String,
        /// Underlying cause.
        message: String,
    },
}

impl LedgerError {
    /// Build a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Build a not-found error.
    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    /// Build a duplicate error.
    pub fn duplicate(entity: &'static str, value: impl Into<String>) -> Self {
        Self::Duplicate {
            entity,
            value: value.into(),
        }
    }

    /// Build an inconsistency error.
    pub fn inconsistency(message: impl Into<String>) -> Self {
        Self::Inconsistency {
            message: message.into(),
        }
    }

    /// Whether the failure is transient and the step may be attempted again.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::Persistence { .. })
    }

    /// Stable label for metrics and logs.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Validation { .. } => "validation",
            Self::NotFound { .. } => "not_found",
            Self::Duplicate { .. } => "duplicate",
            Self::Inconsistency { .. } => "inconsistency",
            Self::Persistence { .. } => "persistence",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_message_is_verbatim() {
        let err = LedgerError::validation("Order size must be numeric.");
        assert_eq!(err.to_string(), "Order size must be numeric.");
        assert_eq!(err.kind(), "validation");
    }

    #[test]
    fn not_found_display() {
        let err = LedgerError::not_found("client", 4821);
        assert_eq!(err.to_string(), "client not found: 4821");
    }

    #[test]
    fn duplicate_display() {
        let err = LedgerError::duplicate("client name", "Reza");
        assert_eq!(err.to_string(), "client name already exists: Reza");
    }

    #[test]
    fn only_persistence_is_retryable() {
        let persistence = LedgerError::Persistence {
            table: "orders-2026_10".to_string(),
            message: "disk full".to_string(),
        };
        assert!(persistence.is_retryable());
        assert!(!LedgerError::inconsistency("x").is_retryable());
        assert!(!LedgerError::validation("x").is_retryable());
    }
}
