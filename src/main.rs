//! Main entry point for the capzip CLI application.
//!
//! Reads a ZIP archive of CAP alerts from disk and writes the resulting
//! GeoJSON FeatureCollection to a file or stdout.

use anyhow::{Context, Result};
use clap::Parser;
use std::sync::Arc;
use tokio::io::AsyncWriteExt;
use tracing_subscriber::EnvFilter;

use capzip::{Cli, DocumentArchive, FeatureCollection, MemoryReader, Pipeline};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // RUST_LOG wins over -q
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(cli.log_filter()));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let buffer = tokio::fs::read(&cli.archive)
        .await
        .with_context(|| format!("failed to read {}", cli.archive))?;

    if cli.list || cli.verbose {
        return list_documents(buffer, &cli).await;
    }

    convert(buffer, &cli).await
}

/// Run the pipeline and write the FeatureCollection.
async fn convert(buffer: Vec<u8>, cli: &Cli) -> Result<()> {
    let pipeline = Pipeline::new(cli.config());
    let quiet = cli.is_quiet();

    let result = pipeline
        .run_bytes(buffer, |processed, total| {
            if !quiet {
                eprintln!("  parsing: {processed}/{total}");
            }
        })
        .await
        .with_context(|| format!("failed to process {}", cli.archive))?;

    for failure in &result.failures {
        tracing::warn!("skipped {}: {}", failure.entry, failure.error);
    }

    let collection = FeatureCollection::from(result.features);
    let mut json = if cli.pretty {
        serde_json::to_vec_pretty(&collection)?
    } else {
        serde_json::to_vec(&collection)?
    };
    json.push(b'\n');

    match &cli.output {
        Some(path) => {
            tokio::fs::write(path, &json)
                .await
                .with_context(|| format!("failed to write {path}"))?;
            if !quiet {
                eprintln!(
                    "  wrote {} features from {} documents to {path}",
                    collection.features.len(),
                    result.total
                );
            }
        }
        None => {
            let mut stdout = tokio::io::stdout();
            stdout.write_all(&json).await?;
            stdout.flush().await?;
        }
    }

    Ok(())
}

/// List the alert documents in the archive.
///
/// - Simple format (`-l`): one entry name per line
/// - Verbose format (`-v`): sizes, compression ratio and timestamps
async fn list_documents(buffer: Vec<u8>, cli: &Cli) -> Result<()> {
    let archive = DocumentArchive::open(Arc::new(MemoryReader::new(buffer)), &cli.config())
        .await
        .with_context(|| format!("failed to open {}", cli.archive))?;

    if !cli.verbose {
        for entry in archive.entries() {
            println!("{}", entry.file_name);
        }
        return Ok(());
    }

    println!(
        "{:>10}  {:>10}  {:>5}  {:>10}  {:>5}  Name",
        "Length", "Size", "Cmpr", "Date", "Time"
    );
    println!("{}", "-".repeat(70));

    let mut total_uncompressed = 0u64;
    let mut total_compressed = 0u64;

    for entry in archive.entries() {
        let (year, month, day) = entry.mod_date();
        let (hour, minute, _second) = entry.mod_time();

        println!(
            "{:>10}  {:>10}  {}  {:04}-{:02}-{:02}  {:02}:{:02}  {}",
            entry.uncompressed_size,
            entry.compressed_size,
            ratio(entry.compressed_size, entry.uncompressed_size),
            year,
            month,
            day,
            hour,
            minute,
            entry.file_name
        );

        total_uncompressed += entry.uncompressed_size;
        total_compressed += entry.compressed_size;
    }

    println!("{}", "-".repeat(70));
    println!(
        "{:>10}  {:>10}  {}  {:>21}  {} documents",
        total_uncompressed,
        total_compressed,
        ratio(total_compressed, total_uncompressed),
        "",
        archive.len()
    );

    Ok(())
}

/// Space saved by compression as a right-aligned percentage.
fn ratio(compressed: u64, uncompressed: u64) -> String {
    if uncompressed > 0 && compressed <= uncompressed {
        format!("{:>4}%", 100 - (compressed * 100 / uncompressed))
    } else {
        "  0%".to_string()
    }
}
