mod repl;

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use docent_core::ChatBot;
use docent_core::bootstrap::{create_provider, resolve_config_path};
use docent_core::config::Config;

#[derive(Parser)]
#[command(name = "docent")]
#[command(about = "Ask questions about your documents, or just do the math")]
struct Cli {
    /// Configuration file (defaults to `DOCENT_CONFIG`, then config/default.toml)
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Documents to ingest before the prompt opens
    #[arg(short, long, value_name = "PATH", num_args = 1..)]
    upload: Vec<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_subscriber();

    let config_path = resolve_config_path(cli.config.as_deref());
    let config = Config::load(&config_path)?;
    tracing::debug!(path = %config_path.display(), "configuration loaded");

    let provider = Arc::new(create_provider(&config)?);
    let mut bot = ChatBot::new(provider, &config).await;

    if !cli.upload.is_empty() {
        println!("{}", repl::upload(&bot, &cli.upload).await);
    }
    repl::run(&mut bot).await
}

/// Logs go to stderr so stdout carries only the conversation.
fn init_subscriber() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
