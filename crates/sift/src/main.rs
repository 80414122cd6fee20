//! Sift CLI - word-list enrichment and a label-analysis relay over
//! generative AI providers.
//!
//! # Usage
//!
//! ```bash
//! # Enrich a word list in chunks of 50 (resumes automatically)
//! sift enrich words.txt --output-dir ./out
//!
//! # Rebuild the combined file from existing chunks
//! sift enrich --combine-only --format jsonl
//!
//! # Run the HTTP relay
//! sift serve --bind 0.0.0.0:8080 --providers gemini,groq
//!
//! # One-off prompt
//! sift ask "Define 'ephemeral'" --provider groq
//! ```

use std::path::PathBuf;

use clap::{Parser, Subcommand};

mod cli;
mod logging;
mod server;

/// Sift - word-list enrichment and label analysis over generative AI providers.
#[derive(Parser, Debug)]
#[command(name = "sift")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable verbose (debug) logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Output logs in JSON format
    #[arg(long, global = true)]
    json_logs: bool,

    /// Config file (defaults to the platform config directory)
    #[arg(long, global = true, env = "SIFT_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Enrich a newline-delimited word list chunk by chunk
    Enrich(cli::enrich::EnrichArgs),

    /// Run the image-analysis HTTP relay
    Serve(cli::serve::ServeArgs),

    /// Send one prompt to a provider and print the reply
    Ask(cli::ask::AskArgs),

    /// View and manage configuration
    Config(cli::config::ConfigArgs),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Logging isn't initialized yet, so config warnings go through eprintln.
    let config = match &cli.config {
        Some(path) => sift_core::Config::load_from(path)?,
        None => match sift_core::Config::load() {
            Ok(config) => config,
            Err(e) => {
                eprintln!(
                    "Warning: Failed to load config: {e}\n  \
                     Using default configuration. Check your config file with `sift config path`."
                );
                sift_core::Config::default()
            }
        },
    };
    logging::init_from_config(&config, cli.verbose, cli.json_logs);

    tracing::debug!("Sift v{}", sift_core::VERSION);

    match cli.command {
        Commands::Enrich(args) => cli::enrich::execute(args, config).await,
        Commands::Serve(args) => cli::serve::execute(args, config).await,
        Commands::Ask(args) => cli::ask::execute(args, &config).await,
        Commands::Config(args) => {
            let path = cli.config.clone().unwrap_or_else(sift_core::Config::default_path);
            cli::config::execute(args, &config, &path).await
        }
    }
}
