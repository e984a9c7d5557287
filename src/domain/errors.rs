//! Error taxonomy for the energy pipeline.
//!
//! Nothing here is fatal to the process: a transient fetch failure means
//! "no data this cycle", a persistence failure leaves the in-memory
//! pipeline running, and missing configuration degrades the dependent
//! checks.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum PipelineError {
    /// Gateway unreachable, auth failure, or timeout. The previous
    /// cached reading remains the last-known value.
    #[error("gateway fetch failed: {0}")]
    TransientFetch(String),

    /// Durable store write failed. Derived values are still broadcast.
    #[error("persistence failed: {0}")]
    Persistence(String),

    /// An optional collaborator is absent; dependent checks are skipped.
    #[error("configuration missing: {0}")]
    ConfigurationMissing(String),
}
