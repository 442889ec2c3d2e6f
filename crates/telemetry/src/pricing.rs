//! Built-in rate table for the supported models.
//!
//! Prices are in USD per `unit_size` tokens. Both built-in entries are per
//! 1 million tokens. The table is fixed once built; config overrides are
//! applied at construction.

use serde::{Deserialize, Serialize};
use sitewright_core::ModelId;
use std::collections::HashMap;

/// Tokens per million, the unit both providers price in.
pub const PER_MILLION: u64 = 1_000_000;

/// Pricing for one model.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ModelRate {
    /// Price per `unit_size` input tokens in USD.
    pub input_price: f64,
    /// Price per `unit_size` output tokens in USD.
    pub output_price: f64,
    /// Number of tokens a price applies to.
    pub unit_size: u64,
}

impl ModelRate {
    /// Create a rate priced per 1M tokens.
    pub fn per_million(input_price: f64, output_price: f64) -> Self {
        Self {
            input_price,
            output_price,
            unit_size: PER_MILLION,
        }
    }

    /// Compute cost for the given token counts. No rounding.
    pub fn cost(&self, input_tokens: u32, output_tokens: u32) -> f64 {
        let unit = self.unit_size.max(1) as f64;
        input_tokens as f64 / unit * self.input_price
            + output_tokens as f64 / unit * self.output_price
    }
}

/// Rates keyed by model.
#[derive(Debug, Clone, Default)]
pub struct RateTable {
    rates: HashMap<ModelId, ModelRate>,
}

impl RateTable {
    /// Create a rate table with the built-in prices.
    pub fn with_defaults() -> Self {
        let mut rates = HashMap::new();
        rates.insert(ModelId::Fast, ModelRate::per_million(0.15, 0.60));
        rates.insert(ModelId::Quality, ModelRate::per_million(3.00, 15.00));
        Self { rates }
    }

    /// Create an empty rate table.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Built-in prices with per-million overrides from configuration.
    ///
    /// Override keys that are not model ids are skipped; config validation
    /// rejects them before this point.
    pub fn from_config(config: &sitewright_config::PricingConfig) -> Self {
        let mut table = Self::with_defaults();
        for (model, price) in &config.overrides {
            match model.parse::<ModelId>() {
                Ok(id) => table.set(id, ModelRate::per_million(price.input_per_m, price.output_per_m)),
                Err(e) => tracing::warn!(error = %e, "Skipping pricing override"),
            }
        }
        table
    }

    /// Look up the rate for a model.
    pub fn get(&self, model: ModelId) -> Option<ModelRate> {
        self.rates.get(&model).copied()
    }

    /// Add or update the rate for a model.
    pub fn set(&mut self, model: ModelId, rate: ModelRate) {
        self.rates.insert(model, rate);
    }

    /// Models with a rate, in catalog order.
    pub fn models(&self) -> Vec<ModelId> {
        ModelId::ALL
            .into_iter()
            .filter(|m| self.rates.contains_key(m))
            .collect()
    }

    /// Supported models with no rate.
    pub fn missing(&self) -> Vec<ModelId> {
        ModelId::ALL
            .into_iter()
            .filter(|m| !self.rates.contains_key(m))
            .collect()
    }

    /// Number of models in the table.
    pub fn len(&self) -> usize {
        self.rates.len()
    }

    /// Whether the table is empty.
    pub fn is_empty(&self) -> bool {
        self.rates.is_empty()
    }
}
