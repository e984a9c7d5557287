//! Seams for optional external collaborators.

use async_trait::async_trait;

/// Supplies the inside temperature used by the temperature alert rules.
///
/// The provider is optional: when none is configured, or a read fails,
/// the pipeline evaluates every other rule and skips the temperature
/// checks.
#[async_trait]
pub trait TemperatureProvider: Send + Sync {
    /// Current inside temperature in °F, or `None` when unavailable.
    async fn inside_temperature_f(&self) -> Option<f64>;
}
