//! Main entry point for the objstream CLI application.
//!
//! This binary opens one object through an HTTP or local directory store
//! and writes a byte range of it to stdout.

use anyhow::{Context, Result};
use clap::Parser;
use std::io::Write;
use std::sync::Arc;

use objstream::config::resolve_readahead;
use objstream::{
    Cli, HttpObjectStore, LocalObjectStore, ObjectStore, ObjectStream, SeekableStream,
    StreamOptions,
};

/// Application entry point.
///
/// Parses command-line arguments, sets up logging, picks the store from the
/// location argument and copies the requested range to stdout.
fn main() -> Result<()> {
    let cli = Cli::parse();

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(cli.log_filter()))
        .init();

    let options = StreamOptions::new().with_readahead(resolve_readahead(cli.readahead)?);

    let (stats, transferred) = if cli.is_http_url() {
        // Remote objects via HTTP Range requests
        let store = Arc::new(HttpObjectStore::new(cli.store.clone())?);
        let stats = copy_range(store.clone(), &cli, options)?;
        (stats, Some(store.transferred_bytes()))
    } else {
        let store = Arc::new(LocalObjectStore::new(&cli.store));
        (copy_range(store, &cli, options)?, None)
    };

    if cli.stats && !cli.quiet {
        eprintln!(
            "\nFetches: {}, bytes fetched: {}",
            stats.fetches,
            format_size(stats.bytes_fetched)
        );
        if let Some(transferred) = transferred {
            eprintln!("Total bytes transferred: {}", format_size(transferred));
        }
    }

    Ok(())
}

/// Open the object named on the command line and write the requested range
/// to stdout.
///
/// # Returns
///
/// The stream's fetch statistics once the copy is done.
fn copy_range<S: ObjectStore + 'static>(
    store: Arc<S>,
    cli: &Cli,
    options: StreamOptions,
) -> Result<objstream::FetchStats> {
    let mut stream = ObjectStream::open(store, cli.container.as_str(), cli.key.as_str(), options)
        .with_context(|| format!("failed to open {}/{}", cli.container, cli.key))?;

    let stdout = std::io::stdout();
    let mut out = stdout.lock();

    match cli.length {
        Some(length) => {
            // Exact range: fail if the object ends early
            let mut buf = vec![0u8; length];
            stream.read_fully(cli.offset, &mut buf, 0, length)?;
            out.write_all(&buf)?;
        }
        None => {
            stream.seek(cli.offset)?;
            std::io::copy(&mut stream, &mut out)?;
        }
    }
    out.flush()?;

    let stats = stream.stats();
    stream.close();
    Ok(stats)
}

/// Format a byte size into a human-readable string.
///
/// Automatically selects the appropriate unit (bytes, KB, MB, GB)
/// based on the size magnitude.
///
/// # Examples
///
/// ```ignore
/// assert_eq!(format_size(500), "500 bytes");
/// assert_eq!(format_size(1536), "1.50 KB");
/// assert_eq!(format_size(1048576), "1.00 MB");
/// ```
fn format_size(size: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if size >= GB {
        format!("{:.2} GB", size as f64 / GB as f64)
    } else if size >= MB {
        format!("{:.2} MB", size as f64 / MB as f64)
    } else if size >= KB {
        format!("{:.2} KB", size as f64 / KB as f64)
    } else {
        format!("{} bytes", size)
    }
}
