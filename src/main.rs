//! gcap CLI

use std::path::{Path, PathBuf};
use std::process;

use anyhow::{Context, Result};
use gcap::capture::Destination;
use gcap::packet::Unroller;
use gcap::{CaptureReader, ReaderConfig};
use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let mut args = std::env::args().skip(1);
    let mut config_path: Option<PathBuf> = None;
    let mut files = Vec::new();

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--config" => match args.next() {
                Some(path) => config_path = Some(PathBuf::from(path)),
                None => usage(),
            },
            "-h" | "--help" => usage(),
            _ => files.push(PathBuf::from(arg)),
        }
    }

    if files.is_empty() {
        usage();
    }

    let config = match config_path {
        Some(path) => match ReaderConfig::from_file(&path) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("error: {e}");
                process::exit(1);
            }
        },
        None => ReaderConfig::default(),
    };

    let mut failed = 0;
    for file in &files {
        if let Err(e) = summarize(file, &config) {
            eprintln!("error: {e:#}");
            failed += 1;
        }
    }

    if failed > 0 {
        process::exit(1);
    }
}

fn usage() -> ! {
    eprintln!("gcap v{}", env!("CARGO_PKG_VERSION"));
    eprintln!();
    eprintln!("Usage: gcap [--config <file>] <capture.gcap>...");
    eprintln!();
    eprintln!("Prints capture metadata and a packet summary for each file.");
    process::exit(2);
}

fn summarize(path: &Path, config: &ReaderConfig) -> Result<()> {
    let reader = CaptureReader::open_with_config(path, config)
        .with_context(|| format!("could not read {}", path.display()))?;
    let metadata = reader
        .metadata()
        .with_context(|| format!("{}: no metadata", path.display()))?;

    println!("File: {}", path.display());
    println!("{metadata}");
    println!();

    let unroller = Unroller::new(config.unroll);
    let mut to_server = 0u64;
    let mut to_client = 0u64;
    let mut atomic = 0usize;

    for record in reader.records_in(1..reader.record_count()) {
        let record = record.with_context(|| format!("{}: bad record", path.display()))?;
        let Some(packet) = record.as_packet() else {
            continue;
        };

        match packet.destination {
            Destination::Server => to_server += 1,
            Destination::Client => to_client += 1,
        }
        atomic += unroller
            .unroll(packet.raw)
            .with_context(|| format!("{}: could not unroll packet", path.display()))?
            .len();
    }

    println!("Packets to server: {to_server}");
    println!("Packets to client: {to_client}");
    println!("Atomic packets: {atomic}");
    Ok(())
}
