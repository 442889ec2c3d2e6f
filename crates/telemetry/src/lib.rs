//! Cost tracking for Sitewright.
//!
//! Provides the per-model rate table and the cost meter that turns the token
//! counts of every successful generation into a running session total.

pub mod ledger;
pub mod pricing;

pub use ledger::{CostLedger, CostMeter, ModelUsage, format_usd};
pub use pricing::{ModelRate, RateTable};

/// Errors from the pricing subsystem.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PricingError {
    /// A supported model has no entry in the rate table.
    #[error("no rate configured for model {model}")]
    MissingRate { model: String },
}
