//! Wayfarer CLI — the main entry point.
//!
//! Commands:
//! - `onboard` — Initialize the config directory and a default config file
//! - `ask`     — Ask one question, or enter interactive mode
//! - `status`  — Show configuration, corpus, and knowledge-base summary
//! - `doctor`  — Diagnose configuration and data-file health

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(
    name = "wayfarer",
    about = "Wayfarer — travel assistant: sights, visas, weather, routes",
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
    /// Initialize configuration
    Onboard,

    /// Ask the assistant
    Ask {
        /// Ask a single question instead of entering interactive mode
        #[arg(short, long)]
        question: Option<String>,

        /// Reuse a named session (slot memory and summary carry over)
        #[arg(short, long)]
        session: Option<String>,

        /// Where you are now, e.g. "Osaka, Japan" (fallback when the
        /// question names no place)
        #[arg(short, long)]
        location: Option<String>,
    },

    /// Show configuration and data status
    Status,

    /// Diagnose configuration and data-file health
    Doctor,
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
        .init();

    match cli.command {
        Commands::Onboard => commands::onboard::run().await?,
        Commands::Ask { question, session, location } => {
            commands::ask::run(question, session, location).await?
        }
        Commands::Status => commands::status::run().await?,
        Commands::Doctor => commands::doctor::run().await?,
    }

    Ok(())
}
