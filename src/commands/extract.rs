use anyhow::Result;
use log::info;
use std::path::Path;
use std::time::Instant;

use crate::cli::ExtractArgs;
use crate::common::{format_elapsed, setup_logging, ExtractStats};
use crate::pipeline::{run_extraction, ExtractConfig};
use crate::shard::Compression;

/// Run the extract command with the given arguments
pub fn run_extract(args: ExtractArgs) -> Result<ExtractStats> {
    let start_time = Instant::now();

    setup_logging(&args.log_level)?;

    info!("Starting TFRecord image extraction");
    info!("Input: {}", args.input);
    info!("Output: {}", args.output.as_deref().unwrap_or("<none>"));

    let config = ExtractConfig::new(
        Path::new(&args.input),
        args.output.as_deref(),
        args.threads,
        Compression::from_flag(args.zlib),
    )?;

    let stats = run_extraction(&config)?;
    let total_time = start_time.elapsed();

    info!("==================== FINAL SUMMARY ====================");
    info!("Total execution time: {}", format_elapsed(total_time));
    info!("Worker threads: {}", config.threads);
    info!(
        "Shards processed: {} / {}",
        stats.shards_processed, stats.shards_total
    );
    info!("Images written: {}", stats.images_written);
    info!("Distinct labels: {}", stats.labels);
    info!("Output directory: {}", config.outdir.display());
    info!("Index file: {}", stats.index_path.display());
    info!("========================================================");

    Ok(stats)
}
