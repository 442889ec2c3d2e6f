//! `sitewright pack` — Bundle a project into one Markdown file.

use sitewright_config::AppConfig;
use std::path::PathBuf;

pub async fn run(
    root: PathBuf,
    output: Option<PathBuf>,
    excludes: Vec<String>,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load()?;

    let output = output.unwrap_or_else(|| PathBuf::from(&config.packer.output));
    let mut extra = config.packer.extra_excludes.clone();
    extra.extend(excludes);

    let report = sitewright_packer::pack(&root, &output, &extra)?;

    println!("📦 Codebase packaged into {}", report.output.display());
    println!("   Files:  {}", report.files);
    println!("   Size:   {} bytes", report.bytes);
    if !report.skipped.is_empty() {
        println!("   Skipped (not UTF-8):");
        for path in &report.skipped {
            println!("     {path}");
        }
    }

    Ok(())
}
