use crossbeam_channel::{Receiver, Sender};
use log::{debug, info};
use std::fs;
use std::path::{Path, PathBuf};

use super::CancelScope;
use crate::common::{ExtractError, IndexRecord, OutputLayout, ShardResult};
use crate::shard::{open_shard, Compression};

/// Extract every image of one shard into `<outdir>/<label_text>/<id>.jpg`.
///
/// Stops at the first decode, directory or write error. Images written
/// before the failure are left on disk; the records built so far are dropped.
pub fn extract_shard(
    path: &Path,
    layout: &OutputLayout,
    compression: Compression,
    scope: &CancelScope,
) -> Result<Vec<IndexRecord>, ExtractError> {
    info!(
        "Processing file: {} (zlib: {})",
        path.display(),
        compression.is_zlib()
    );

    let reader = open_shard(path, compression).map_err(|e| ExtractError::io(path, e))?;
    let mut records = Vec::new();

    for entity in reader {
        if scope.is_cancelled() {
            return Err(ExtractError::Cancelled);
        }

        let image = entity.map_err(|e| ExtractError::decode(path, e))?;

        let label_dir = layout.label_dir(&image.label_text);
        fs::create_dir_all(&label_dir).map_err(|e| ExtractError::io(&label_dir, e))?;

        let image_path = layout.image_path(&image.label_text, image.id);
        image
            .save(&image_path)
            .map_err(|e| ExtractError::io(&image_path, e))?;

        debug!("Wrote {}", image_path.display());

        records.push(IndexRecord {
            path: image_path,
            id: image.id,
            label_id: image.label_id,
            label_text: image.label_text,
            organization: image.organization,
        });
    }

    debug!(
        "Completed processing: {} ({} images)",
        path.display(),
        records.len()
    );

    Ok(records)
}

/// Worker loop: claim shards until the path channel closes or the scope is cancelled
pub fn run_worker(
    worker_id: usize,
    paths: &Receiver<PathBuf>,
    results: Sender<ShardResult>,
    layout: &OutputLayout,
    compression: Compression,
    scope: &CancelScope,
) {
    while let Some(shard) = scope.recv(paths) {
        match extract_shard(&shard, layout, compression, scope) {
            Ok(records) => {
                let result = ShardResult { shard, records };
                if let Err(e) = scope.send(&results, result) {
                    scope.fail(e);
                    break;
                }
            }
            Err(e) => {
                scope.fail(e);
                break;
            }
        }
    }
    debug!("Worker {} exiting", worker_id);
}
