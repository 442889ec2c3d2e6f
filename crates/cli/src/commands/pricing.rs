//! CLI commands for model pricing and cost estimates.

use sitewright_config::AppConfig;
use sitewright_core::ModelId;
use sitewright_telemetry::{CostMeter, RateTable, format_usd};

/// List the rate table, including config overrides.
pub async fn pricing() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load()?;
    let table = RateTable::from_config(&config.pricing);

    println!("💰 Model Pricing (per 1M tokens)");
    println!("─────────────────────────────────────────────────────");
    println!("{:<24} {:>10} {:>10}", "Model", "Input", "Output");
    println!("{:<24} {:>10} {:>10}", "─────", "─────", "──────");

    for model in table.models() {
        if let Some(rate) = table.get(model) {
            let scale = sitewright_telemetry::pricing::PER_MILLION as f64 / rate.unit_size.max(1) as f64;
            println!(
                "{:<24} ${:>8.3} ${:>8.3}",
                model.as_str(),
                rate.input_price * scale,
                rate.output_price * scale
            );
        }
    }

    println!();
    println!("  {} models with pricing data", table.len());

    Ok(())
}

/// Estimate cost for a given model and token counts.
pub async fn estimate(
    model: &str,
    input_tokens: u32,
    output_tokens: u32,
) -> Result<(), Box<dyn std::error::Error>> {
    let model: ModelId = match model.parse() {
        Ok(model) => model,
        Err(e) => {
            println!("⚠ {e}");
            println!("  Use `sitewright pricing` to see available models.");
            return Ok(());
        }
    };

    let config = AppConfig::load()?;
    let meter = CostMeter::new(RateTable::from_config(&config.pricing))?;
    let cost = meter.quote(model, input_tokens, output_tokens)?;

    println!("💵 Cost estimate for {model}");
    println!("   Input tokens:   {input_tokens}");
    println!("   Output tokens:  {output_tokens}");
    println!("   Estimated cost: {}", format_usd(cost));

    Ok(())
}
