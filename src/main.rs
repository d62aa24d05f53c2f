#[macro_use]
extern crate log;

mod aggregator;
mod bitset;
mod chunk_source;
mod codec;
mod config;
mod dispatcher;
mod error;
mod pipeline;
mod progress_reporter;
mod shared_types;
mod worker;

#[cfg(test)]
mod test_utils;

use std::error::Error;
use std::path::PathBuf;

use clap::Parser;
use indicatif::MultiProgress;
use indicatif_log_bridge::LogWrapper;
use tokio::time::Instant;

use config::{PipelineConfig, DEFAULT_CHUNK_SIZE, DEFAULT_WORKERS};
use pipeline::count_file;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct CliArgs {
    /// Newline-delimited file of dotted-decimal IPv4 addresses
    #[arg(default_value = "ip_addresses")]
    path: PathBuf,

    #[arg(short, long, default_value_t = DEFAULT_WORKERS)]
    workers: usize,

    /// Chunk buffer size in bytes
    #[arg(short, long, default_value_t = DEFAULT_CHUNK_SIZE)]
    chunk_size: usize,

    /// Reject malformed records instead of trusting the input
    #[arg(long)]
    strict: bool,

    #[arg(long)]
    progress: bool,

    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let args = CliArgs::parse();

    let level = if args.verbose {
        simplelog::LevelFilter::Debug
    } else {
        simplelog::LevelFilter::Info
    };
    let multi = MultiProgress::new();
    let logger = simplelog::TermLogger::new(
        level,
        simplelog::Config::default(),
        simplelog::TerminalMode::Mixed,
        simplelog::ColorChoice::Auto,
    );
    LogWrapper::new(multi.clone(), logger).try_init()?;
    log::set_max_level(level);

    let config = PipelineConfig {
        chunk_size: args.chunk_size,
        workers: args.workers,
        strict: args.strict,
    };

    let start = Instant::now();
    let summary = match count_file(&args.path, config, args.progress.then_some(multi)).await {
        Ok(summary) => summary,
        Err(e) => {
            error!("{e}");
            log::logger().flush();
            std::process::exit(1);
        }
    };
    let elapsed = start.elapsed();

    debug!(
        "{} records, {} bytes, {} chunks",
        summary.records, summary.bytes, summary.chunks
    );
    println!("Result: {} unique addresses", summary.unique);
    println!("Counting unique addresses took {:?}", elapsed);

    Ok(())
}
