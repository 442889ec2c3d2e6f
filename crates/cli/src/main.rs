//! Sitewright CLI — the main entry point.
//!
//! Commands:
//! - `onboard`  — Write a default config file
//! - `serve`    — Start the HTTP generation gateway
//! - `chat`     — Interactive chat or single-message mode
//! - `pricing`  — Show the model rate table
//! - `estimate` — Price a token count
//! - `pack`     — Bundle a project directory into one Markdown file

use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod commands;

#[derive(Parser)]
#[command(
    name = "sitewright",
    about = "Sitewright — chat your way to a small web project",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a default configuration file
    Onboard,

    /// Start the HTTP generation gateway
    Serve {
        /// Override the port
        #[arg(short, long)]
        port: Option<u16>,

        /// Serve this directory for every non-API path
        #[arg(long)]
        static_dir: Option<PathBuf>,
    },

    /// Chat with the assistant
    Chat {
        /// Send a single message instead of entering interactive mode
        #[arg(short, long)]
        message: Option<String>,

        /// Model to use (gpt-4o-mini or claude-3-5-sonnet)
        #[arg(long)]
        model: Option<String>,

        /// Talk to a running gateway instead of the providers directly
        #[arg(long, env = "SITEWRIGHT_GATEWAY_URL")]
        gateway: Option<String>,
    },

    /// Show the model rate table
    Pricing,

    /// Estimate the cost of a generation
    Estimate {
        /// Model id
        model: String,
        /// Input tokens
        input_tokens: u32,
        /// Output tokens
        output_tokens: u32,
    },

    /// Pack a project directory into one Markdown file
    Pack {
        /// Directory to pack
        #[arg(default_value = ".")]
        root: PathBuf,

        /// Output file, relative to the packed directory unless absolute
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Extra exclude pattern (repeatable)
        #[arg(short, long = "exclude")]
        excludes: Vec<String>,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Onboard => commands::onboard::run().await?,
        Commands::Serve { port, static_dir } => commands::serve::run(port, static_dir).await?,
        Commands::Chat {
            message,
            model,
            gateway,
        } => commands::chat::run(message, model, gateway).await?,
        Commands::Pricing => commands::pricing::pricing().await?,
        Commands::Estimate {
            model,
            input_tokens,
            output_tokens,
        } => commands::pricing::estimate(&model, input_tokens, output_tokens).await?,
        Commands::Pack {
            root,
            output,
            excludes,
        } => commands::pack::run(root, output, excludes).await?,
    }

    Ok(())
}
