//! doccache command-line entry point.

use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use doccache_client::CacheDocumentService;
use doccache_core::{AppConfig, open_store};
use tokio::io::AsyncWriteExt;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::filter::LevelFilter;

mod cli;

use cli::{CliArgs, Command};

fn main() {
    if let Err(e) = bootstrap() {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

#[tokio::main]
async fn bootstrap() -> Result<()> {
    let args = CliArgs::parse();

    let level = if args.verbose { LevelFilter::DEBUG } else { LevelFilter::WARN };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(level.into()))
        .with_writer(std::io::stderr)
        .init();

    let config = args.resolve_config(&AppConfig::figment())?;
    tracing::debug!(?config, "loaded configuration");

    if let Command::CheckMime { mime } = &args.command {
        doccache_core::filter_mime_types(mime)?;
        println!("{mime}: allowed");
        return Ok(());
    }

    let store = open_store(&config).await?;
    let service = CacheDocumentService::from_config(&config, store)?;

    match args.command {
        Command::Save { url } => {
            let saved = service.save_remote_file_to_cache(&url).await?;
            println!("{}\t{}\t{}", saved.path, saved.mime, saved.size);
        }
        Command::Get { path, output } => {
            let content = service.get_content_from_cache(&path).await?;
            match output {
                Some(file) => tokio::fs::write(&file, &content).await?,
                None => {
                    let mut stdout = tokio::io::stdout();
                    stdout.write_all(&content).await?;
                    stdout.flush().await?;
                }
            }
        }
        Command::CheckMime { .. } => {}
    }

    Ok(())
}
