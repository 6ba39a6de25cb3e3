//! `entities`: extract entities from text on the command line.
//!
//! Reads a file (or stdin), prints JSON to stdout. Logs go to stderr and
//! follow `RUST_LOG`.

mod config;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use entity_extraction::{
    extract_metadata_with, is_match, CacheHandle, ExtractionKind, MetadataFetcher, RichText,
};

use crate::config::Config;

#[derive(Parser)]
#[command(name = "entities", version, about = "Extract links, mentions, tags and more from text")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print the unique values of one kind as a JSON array
    Extract {
        /// links, emails, mentions, hashtags, images, phones, dates,
        /// markdown_tables or markdown_code
        kind: ExtractionKind,
        /// Input file (default: stdin)
        file: Option<PathBuf>,
    },
    /// Print every kind as one JSON object
    Report { file: Option<PathBuf> },
    /// Print link objects, optionally with preview metadata
    Links {
        /// Fetch preview metadata for each link
        #[arg(long)]
        metadata: bool,
        file: Option<PathBuf>,
    },
    /// Fetch and print the preview metadata of one URL
    Metadata { url: String },
    /// Exit successfully iff VALUE is exactly one entity of KIND
    Check { kind: ExtractionKind, value: String },
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,entity_extraction=debug".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(true)
                .with_line_number(true),
        )
        .init();

    let cli = Cli::parse();
    let config = Config::from_env().context("Failed to load configuration")?;

    match cli.command {
        Command::Extract { kind, file } => {
            let text = RichText::new(read_input(file.as_deref())?);
            print_json(&text.extract(kind))?;
        }
        Command::Report { file } => {
            let text = RichText::new(read_input(file.as_deref())?);
            print_json(&text.report())?;
        }
        Command::Links { metadata, file } => {
            let text = RichText::new(read_input(file.as_deref())?);
            if metadata {
                let fetcher = MetadataFetcher::new(config.fetch.clone())
                    .context("Failed to build HTTP client")?;
                let cache = CacheHandle::memory();
                let links = text
                    .link_objects_with(&fetcher, &config.enrich, Some(&cache), &config.cache)
                    .await;
                tracing::info!(links = links.len(), "links enriched");
                print_json(&links)?;
            } else {
                print_json(&text.link_objects(false, None, &config.cache).await)?;
            }
        }
        Command::Metadata { url } => {
            let record = extract_metadata_with(&url, None, &config.cache, Some(&config.fetch)).await;
            print_json(&record)?;
        }
        Command::Check { kind, value } => {
            if !is_match(&value, kind) {
                return Ok(ExitCode::FAILURE);
            }
        }
    }

    Ok(ExitCode::SUCCESS)
}

fn read_input(file: Option<&Path>) -> Result<String> {
    match file {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display())),
        None => {
            let mut text = String::new();
            std::io::stdin()
                .read_to_string(&mut text)
                .context("Failed to read stdin")?;
            Ok(text)
        }
    }
}

fn print_json<T: serde::Serialize + ?Sized>(value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value).context("Failed to serialize output")?;
    println!("{json}");
    Ok(())
}
