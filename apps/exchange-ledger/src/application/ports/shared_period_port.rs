//! Shared Period Port
//!
//! The reporting layer records which month it last shared externally.
//! The ledger exposes the marker read-only and never updates it.

use async_trait::async_trait;

use super::StoreError;
use crate::domain::shared::Period;

/// Read access to the "last shared period" marker.
#[async_trait]
pub trait SharedPeriodPort: Send + Sync {
    /// Last period the reporting layer shared, if any.
    async fn last_shared_period(&self) -> Result<Option<Period>, StoreError>;
}

/// Marker source for deployments without a reporting layer.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoSharedPeriod;

#[async_trait]
impl SharedPeriodPort for NoSharedPeriod {
    async fn last_shared_period(&self) -> Result<Option<Period>, StoreError> {
        Ok(None)
    }
}
