//! `sitewright onboard` — First-time setup.

use sitewright_config::AppConfig;

pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config_dir = AppConfig::config_dir();
    let config_path = config_dir.join("config.toml");

    println!("Sitewright — First-Time Setup");
    println!("=============================\n");

    if !config_dir.exists() {
        std::fs::create_dir_all(&config_dir)?;
        println!("✅ Created config directory: {}", config_dir.display());
    } else {
        println!("  Config directory exists: {}", config_dir.display());
    }

    if config_path.exists() {
        println!("\n⚠️  Config already exists at: {}", config_path.display());
        println!("   Edit it manually or delete and re-run onboard.\n");
    } else {
        std::fs::write(&config_path, AppConfig::default_toml())?;
        println!("✅ Created config.toml at: {}", config_path.display());
        println!("\n📝 Next steps:");
        println!("   1. Export OPENAI_API_KEY and/or ANTHROPIC_API_KEY,");
        println!("      or add them under [providers.openai] / [providers.anthropic]");
        println!("   2. Run: sitewright chat");
        println!("   3. Or share one set of keys: sitewright serve\n");
    }

    println!("🎉 Setup complete! Run `sitewright chat` to start.\n");

    Ok(())
}
