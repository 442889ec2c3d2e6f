//! The session cost ledger and the meter that feeds it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sitewright_core::ModelId;
use std::collections::BTreeMap;

use crate::PricingError;
use crate::pricing::RateTable;

/// Running totals for one session. Only ever grows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CostLedger {
    pub input_tokens: u64,
    pub output_tokens: u64,
    /// Full-precision cost; round only for display.
    pub cost_usd: f64,
    pub generations: u32,
    /// Per-model breakdown, keyed by model id.
    pub by_model: BTreeMap<String, ModelUsage>,
    pub started_at: DateTime<Utc>,
}

/// Totals attributed to one model.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ModelUsage {
    pub input_tokens: u64,
    pub output_tokens: u64,
    pub cost_usd: f64,
    pub generations: u32,
}

impl CostLedger {
    fn new() -> Self {
        Self {
            input_tokens: 0,
            output_tokens: 0,
            cost_usd: 0.0,
            generations: 0,
            by_model: BTreeMap::new(),
            started_at: Utc::now(),
        }
    }

    fn add(&mut self, model: ModelId, input_tokens: u32, output_tokens: u32, cost: f64) {
        self.input_tokens += u64::from(input_tokens);
        self.output_tokens += u64::from(output_tokens);
        self.cost_usd += cost;
        self.generations += 1;

        let entry = self.by_model.entry(model.as_str().to_string()).or_default();
        entry.input_tokens += u64::from(input_tokens);
        entry.output_tokens += u64::from(output_tokens);
        entry.cost_usd += cost;
        entry.generations += 1;
    }
}

impl Default for CostLedger {
    fn default() -> Self {
        Self::new()
    }
}

/// Turns token counts into money and keeps the session ledger.
#[derive(Debug, Clone)]
pub struct CostMeter {
    rates: RateTable,
    ledger: CostLedger,
}

impl CostMeter {
    /// Build a meter. Fails if any supported model has no rate.
    pub fn new(rates: RateTable) -> Result<Self, PricingError> {
        if let Some(model) = rates.missing().first() {
            return Err(PricingError::MissingRate {
                model: model.as_str().to_string(),
            });
        }
        Ok(Self {
            rates,
            ledger: CostLedger::new(),
        })
    }

    /// A meter over the built-in rates.
    pub fn with_defaults() -> Self {
        Self {
            rates: RateTable::with_defaults(),
            ledger: CostLedger::new(),
        }
    }

    /// Price one generation and add it to the ledger.
    ///
    /// Returns the incremental cost. The ledger is untouched on error.
    pub fn record(
        &mut self,
        model: ModelId,
        input_tokens: u32,
        output_tokens: u32,
    ) -> Result<f64, PricingError> {
        let rate = self.rates.get(model).ok_or_else(|| PricingError::MissingRate {
            model: model.as_str().to_string(),
        })?;

        let cost = rate.cost(input_tokens, output_tokens);
        self.ledger.add(model, input_tokens, output_tokens, cost);

        tracing::debug!(
            model = %model,
            input_tokens,
            output_tokens,
            cost_usd = cost,
            total_usd = self.ledger.cost_usd,
            "Recorded generation cost"
        );

        Ok(cost)
    }

    /// Price token counts without touching the ledger.
    pub fn quote(&self, model: ModelId, input_tokens: u32, output_tokens: u32) -> Result<f64, PricingError> {
        self.rates
            .get(model)
            .map(|rate| rate.cost(input_tokens, output_tokens))
            .ok_or_else(|| PricingError::MissingRate {
                model: model.as_str().to_string(),
            })
    }

    pub fn ledger(&self) -> &CostLedger {
        &self.ledger
    }

    pub fn rates(&self) -> &RateTable {
        &self.rates
    }

    /// Start a fresh ledger, keeping the rates.
    pub fn reset(&mut self) {
        self.ledger = CostLedger::new();
    }
}

/// Format a USD amount for display, rounded to four decimals.
pub fn format_usd(amount: f64) -> String {
    format!("${amount:.4}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pricing::ModelRate;

    #[test]
    fn one_million_each_on_the_fast_model() {
        let mut meter = CostMeter::with_defaults();
        let cost = meter.record(ModelId::Fast, 1_000_000, 1_000_000).unwrap();
        assert!((cost - 0.75).abs() < 1e-10);
        assert!((meter.ledger().cost_usd - 0.75).abs() < 1e-10);
    }

    #[test]
    fn repeated_records_accumulate() {
        let mut meter = CostMeter::with_defaults();
        meter.record(ModelId::Fast, 1_000_000, 1_000_000).unwrap();
        let after_one = meter.ledger().cost_usd;
        meter.record(ModelId::Fast, 1_000_000, 1_000_000).unwrap();
        let after_two = meter.ledger().cost_usd;

        assert!((after_two - 2.0 * after_one).abs() < 1e-10);
        assert!(after_two >= after_one);
        assert_eq!(meter.ledger().input_tokens, 2_000_000);
        assert_eq!(meter.ledger().output_tokens, 2_000_000);
        assert_eq!(meter.ledger().generations, 2);
    }

    #[test]
    fn zero_tokens_cost_nothing_but_count_as_a_generation() {
        let mut meter = CostMeter::with_defaults();
        let cost = meter.record(ModelId::Quality, 0, 0).unwrap();
        assert_eq!(cost, 0.0);
        assert_eq!(meter.ledger().generations, 1);
    }

    #[test]
    fn ledger_keeps_full_precision() {
        let mut meter = CostMeter::with_defaults();
        for _ in 0..1000 {
            meter.record(ModelId::Fast, 1, 1).unwrap();
        }
        // 1000 * (0.15 + 0.60) / 1M
        assert!((meter.ledger().cost_usd - 0.00075).abs() < 1e-12);
    }

    #[test]
    fn per_model_breakdown() {
        let mut meter = CostMeter::with_defaults();
        meter.record(ModelId::Fast, 100, 50).unwrap();
        meter.record(ModelId::Quality, 10, 5).unwrap();
        meter.record(ModelId::Quality, 10, 5).unwrap();

        let ledger = meter.ledger();
        assert_eq!(ledger.by_model["gpt-4o-mini"].generations, 1);
        assert_eq!(ledger.by_model["claude-3-5-sonnet"].generations, 2);
        assert_eq!(ledger.by_model["claude-3-5-sonnet"].input_tokens, 20);
    }

    #[test]
    fn construction_rejects_incomplete_rates() {
        let mut rates = RateTable::empty();
        rates.set(ModelId::Fast, ModelRate::per_million(0.15, 0.60));
        let err = CostMeter::new(rates).unwrap_err();
        assert_eq!(
            err,
            PricingError::MissingRate {
                model: "claude-3-5-sonnet".into()
            }
        );
        assert!(CostMeter::new(RateTable::with_defaults()).is_ok());
    }

    #[test]
    fn quote_leaves_ledger_alone() {
        let meter = CostMeter::with_defaults();
        let quote = meter.quote(ModelId::Quality, 1_000_000, 0).unwrap();
        assert!((quote - 3.0).abs() < 1e-10);
        assert_eq!(meter.ledger().generations, 0);
    }

    #[test]
    fn reset_starts_a_new_ledger() {
        let mut meter = CostMeter::with_defaults();
        meter.record(ModelId::Fast, 10, 10).unwrap();
        meter.reset();
        assert_eq!(meter.ledger().cost_usd, 0.0);
        assert_eq!(meter.ledger().generations, 0);
        assert!(meter.ledger().by_model.is_empty());
    }

    #[test]
    fn usd_formatting() {
        assert_eq!(format_usd(0.0), "$0.0000");
        assert_eq!(format_usd(0.75), "$0.7500");
        assert_eq!(format_usd(0.00123), "$0.0012");
        assert_eq!(format_usd(12.345678), "$12.3457");
    }
}
