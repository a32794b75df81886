mod ai_summarizer;
mod app;
mod baseline;
mod config;
mod db;
mod diff;
mod fetcher;
mod logger;
mod models;
mod report;
mod sink;
mod teams;
mod utils;

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;

#[derive(Parser)]
#[command(name = "matchmind")]
#[command(about = "Greek Super League new-result tracker and summarizer")]
struct Cli {
    /// Skip the summarization model and use template summaries
    #[arg(long)]
    no_ai: bool,

    /// Skip the document store (the JSON backup is still written)
    #[arg(long)]
    no_db: bool,

    /// Read this config file instead of the one in the XDG config directory
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    app::run(app::RunOptions {
        no_ai: cli.no_ai,
        no_db: cli.no_db,
        config_path: cli.config,
    })
    .await
}
