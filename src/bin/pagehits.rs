//! Demo application counting keys read from standard input.
//!
//! Run with:
//! ```bash
//! printf 'a\nb\na\n' | cargo run --features demo -- --data-dir ./data --interval-ms 500
//! ```

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use pagehits::{HitCounter, HitCounterConfig};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::EnvFilter;

/// Count keys read line by line from stdin, persisting the counts.
#[derive(Debug, Parser)]
#[command(name = "pagehits", version, about)]
struct Args {
    /// Directory holding the snapshot files
    #[arg(long, default_value = "./data")]
    data_dir: PathBuf,

    /// Throttle interval between the first hit and the save, in milliseconds
    #[arg(long, default_value_t = 10_000)]
    interval_ms: u64,

    /// Write pretty-printed snapshots
    #[arg(long)]
    pretty: bool,

    /// Print the final counts as JSON on exit
    #[arg(long)]
    dump: bool,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let config = HitCounterConfig::new()
        .data_dir(args.data_dir)
        .save_interval(Duration::from_millis(args.interval_ms))
        .pretty(args.pretty);

    let hits = HitCounter::open(config).await;
    tracing::info!(keys = hits.len(), persistent = hits.is_persistent(), "counter ready");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let key = line.trim();
        match hits.count(Some(key)) {
            Some(total) => println!("{key} {total}"),
            None => tracing::debug!("blank line skipped"),
        }
    }

    if hits.is_persistent() {
        let file = hits.flush().await?;
        tracing::info!(path = %file.path.display(), "final snapshot stored");
    }

    if args.dump {
        println!("{}", hits.snapshot().to_json(true)?);
    }

    Ok(())
}
