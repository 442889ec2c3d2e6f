//! `sitewright serve` — Start the HTTP generation gateway.

use sitewright_config::AppConfig;
use std::path::PathBuf;

pub async fn run(port: Option<u16>, static_dir: Option<PathBuf>) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;

    if let Some(p) = port {
        config.gateway.port = p;
    }
    if let Some(dir) = static_dir {
        config.gateway.static_dir = Some(dir.display().to_string());
    }

    println!("🌐 Starting Sitewright gateway...");
    println!("   Listening: {}:{}", config.gateway.host, config.gateway.port);
    println!("   Endpoint:  POST /generate");
    if let Some(dir) = &config.gateway.static_dir {
        println!("   Static:    {dir}");
    }

    sitewright_gateway::start(config).await?;

    Ok(())
}
