//! Infrastructure layer.
//!
//! Table store adapters, configuration and wiring, logging and tracing,
//! and Prometheus metrics.

pub mod config;
pub mod metrics;
pub mod persistence;
pub mod telemetry;
