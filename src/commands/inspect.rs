use anyhow::{Context, Result};
use log::{debug, info};
use std::collections::BTreeMap;
use std::path::Path;
use std::time::Instant;

use crate::cli::InspectArgs;
use crate::common::{create_spinner, format_elapsed, setup_logging, ExtractError, InspectStats};
use crate::pipeline::list_shards;
use crate::shard::{open_shard, Compression};

/// Decode every image in every shard without writing anything
pub fn inspect_shards(input: &Path, compression: Compression) -> Result<InspectStats, ExtractError> {
    let shards = list_shards(input)?;
    let progress = create_spinner("Reading shards...");

    let mut stats = InspectStats::default();
    let mut labels: BTreeMap<String, usize> = BTreeMap::new();

    for shard in &shards {
        let file_name = shard
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| "unknown".to_string());
        progress.set_message(format!(
            "Reading: {} | {} images",
            file_name, stats.images_decoded
        ));

        let reader = open_shard(shard, compression).map_err(|e| ExtractError::io(shard, e))?;
        let mut in_shard = 0;
        for entity in reader {
            let image = entity.map_err(|e| ExtractError::decode(shard, e))?;
            stats.images_decoded += 1;
            stats.bytes_decoded += image.raw.len();
            *labels.entry(image.label_text).or_insert(0) += 1;
            in_shard += 1;
        }

        debug!("{}: {} images", shard.display(), in_shard);
        stats.shards_read += 1;
    }

    progress.finish_and_clear();
    stats.label_counts = labels.into_iter().collect();
    Ok(stats)
}

/// Run the inspect command with the given arguments
pub fn run_inspect(args: InspectArgs) -> Result<InspectStats> {
    let start_time = Instant::now();

    setup_logging(&args.log_level)?;

    info!("Inspecting TFRecord shards");
    info!("Input: {}", args.input);

    let stats = inspect_shards(Path::new(&args.input), Compression::from_flag(args.zlib))
        .with_context(|| format!("Failed to inspect: {}", args.input))?;

    info!("==================== INSPECT SUMMARY ====================");
    info!("Total execution time: {}", format_elapsed(start_time.elapsed()));
    info!("Shards read: {}", stats.shards_read);
    info!("Images decoded: {}", stats.images_decoded);
    info!("Encoded bytes: {}", stats.bytes_decoded);
    for (label, count) in &stats.label_counts {
        info!("  {}: {}", label, count);
    }
    info!("=========================================================");

    Ok(stats)
}
