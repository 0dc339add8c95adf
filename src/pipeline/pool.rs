use crossbeam_channel::bounded;
use log::{debug, info};
use std::path::PathBuf;
use std::thread;

use super::aggregator::{aggregate, IndexWriter};
use super::enumerate::{feed_shards, list_shards};
use super::worker::run_worker;
use super::{CancelScope, ExtractConfig};
use crate::common::{create_count_progress_bar, ExtractError, ExtractStats, ShardResult};

/// Run the whole extraction: enumerate shards, fan them out to `config.threads`
/// workers, stream their results into the index and commit it.
///
/// The feeder, the workers and the aggregator (on the calling thread) share one
/// [`CancelScope`]; the first error any of them records is the returned error.
pub fn run_extraction(config: &ExtractConfig) -> Result<ExtractStats, ExtractError> {
    let layout = config.layout();
    let threads = config.threads.max(1);

    let shards = list_shards(&config.input)?;
    let shards_total = shards.len();
    info!(
        "Found {} shard(s) in {}",
        shards_total,
        config.input.display()
    );

    let mut index = IndexWriter::create(&layout)?;
    let progress = create_count_progress_bar(shards_total as u64);
    let scope = CancelScope::new();

    // Unbuffered handoffs keep at most one shard and one result per worker in flight
    let (path_tx, path_rx) = bounded::<PathBuf>(0);
    let (result_tx, result_rx) = bounded::<ShardResult>(0);

    let shards_processed = thread::scope(|s| {
        let scope = &scope;
        let layout = &layout;

        s.spawn(move || match feed_shards(shards, path_tx, scope) {
            Ok(sent) => debug!("Handed off {} shard(s) to workers", sent),
            Err(e) => scope.fail(e),
        });

        for worker_id in 0..threads {
            let path_rx = path_rx.clone();
            let result_tx = result_tx.clone();
            let compression = config.compression;
            s.spawn(move || {
                run_worker(worker_id, &path_rx, result_tx, layout, compression, scope)
            });
        }

        // Only the workers may hold these, so the channels close when they finish
        drop(path_rx);
        drop(result_tx);

        aggregate(&result_rx, &mut index, scope, &progress)
    });

    progress.finish_and_clear();
    scope.into_result()?;

    let images_written = index.rows_written();
    if images_written == 0 {
        return Err(ExtractError::NoImages(config.input.clone()));
    }

    let labels = index.label_count();
    let index_path = index.commit()?;

    Ok(ExtractStats {
        shards_total,
        shards_processed,
        images_written,
        labels,
        index_path,
    })
}
