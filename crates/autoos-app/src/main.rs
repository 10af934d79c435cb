use std::process::ExitCode;

use autoos_config::Config;
use clap::Parser;
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

mod cli;
mod commands;

use self::cli::{Cli, Commands};
use self::commands::AppContext;

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => Config::load(path)?,
        None => Config::new(),
    };

    init_logging(&config.log_level, cli.json_logs);

    // Ctrl+C aborts a running download, install or OCR run
    let cancel = CancellationToken::new();
    let on_signal = cancel.clone();
    tokio::spawn(async move {
        if signal::ctrl_c().await.is_ok() {
            tracing::info!("Shutdown requested");
            on_signal.cancel();
        }
    });

    let ctx = AppContext::new(config, cancel);

    match &cli.command {
        Commands::Ensure => commands::ensure(&ctx).await,
        Commands::Screenshot { output, source } => commands::screenshot(&ctx, output, source).await,
        Commands::Windows => commands::windows(),
        Commands::Text { source } => commands::text(&ctx, source).await,
        Commands::Locate {
            query,
            json,
            source,
        } => commands::locate(&ctx, query, *json, source).await,
        Commands::FindImage {
            template,
            threshold,
            source,
        } => commands::find_image(&ctx, template, *threshold, source).await,
        Commands::Highlight {
            query,
            output,
            source,
        } => commands::highlight(&ctx, query, output, source).await,
    }
}

fn init_logging(default_level: &str, json: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("autoos={default_level},autoos_ocr={default_level}")));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);

    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}
