use crossbeam_channel::Receiver;
use indicatif::ProgressBar;
use log::{debug, warn};
use std::collections::HashSet;
use std::fs::{self, File};
use std::io::{self, BufWriter};
use std::path::{Path, PathBuf};
use uuid::Uuid;

use super::CancelScope;
use crate::common::{ExtractError, IndexRecord, OutputLayout, ShardResult, INDEX_HEADER};

/// Streams index rows into a staging file that only becomes `info.csv` on commit.
///
/// Dropping an uncommitted writer removes the staging file, so a failed run
/// never leaves a partial index behind.
pub struct IndexWriter {
    writer: Option<csv::Writer<BufWriter<File>>>,
    staging_path: PathBuf,
    final_path: PathBuf,
    seen_paths: HashSet<PathBuf>,
    labels: HashSet<String>,
    rows_written: usize,
}

impl IndexWriter {
    /// Create the staging file and write the header row
    pub fn create(layout: &OutputLayout) -> Result<Self, ExtractError> {
        let run_id = &Uuid::new_v4().to_string()[..8];
        let staging_path = layout.staging_index(run_id);

        let file = File::create(&staging_path).map_err(|e| ExtractError::io(&staging_path, e))?;
        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(BufWriter::new(file));

        writer
            .write_record(INDEX_HEADER)
            .map_err(|e| ExtractError::index(&staging_path, e))?;

        debug!("Streaming index rows to {}", staging_path.display());

        Ok(Self {
            writer: Some(writer),
            staging_path,
            final_path: layout.index.clone(),
            seen_paths: HashSet::new(),
            labels: HashSet::new(),
            rows_written: 0,
        })
    }

    /// Append the records of one shard, in their decode order
    pub fn write_result(&mut self, result: &ShardResult) -> Result<(), ExtractError> {
        for record in &result.records {
            self.write_record(record)?;
        }
        Ok(())
    }

    fn write_record(&mut self, record: &IndexRecord) -> Result<(), ExtractError> {
        if !self.seen_paths.insert(record.path.clone()) {
            return Err(ExtractError::DuplicateImage(record.path.clone()));
        }

        let writer = self.writer.as_mut().ok_or(ExtractError::Cancelled)?;
        writer
            .serialize(record)
            .map_err(|e| ExtractError::index(&self.staging_path, e))?;

        self.labels.insert(record.label_text.clone());
        self.rows_written += 1;
        Ok(())
    }

    pub fn rows_written(&self) -> usize {
        self.rows_written
    }

    pub fn label_count(&self) -> usize {
        self.labels.len()
    }

    /// Flush, sync and atomically move the staging file to `info.csv`
    pub fn commit(mut self) -> Result<PathBuf, ExtractError> {
        let mut writer = self.writer.take().ok_or(ExtractError::Cancelled)?;
        writer
            .flush()
            .map_err(|e| ExtractError::io(&self.staging_path, e))?;
        let buffered = writer.into_inner().map_err(|e| {
            let err = e.error();
            ExtractError::io(&self.staging_path, io::Error::new(err.kind(), err.to_string()))
        })?;
        let file = buffered
            .into_inner()
            .map_err(|e| ExtractError::io(&self.staging_path, e.into_error()))?;
        file.sync_all()
            .map_err(|e| ExtractError::io(&self.staging_path, e))?;
        drop(file);

        fs::rename(&self.staging_path, &self.final_path)
            .map_err(|e| ExtractError::io(&self.final_path, e))?;

        Ok(self.final_path.clone())
    }

    pub fn staging_path(&self) -> &Path {
        &self.staging_path
    }
}

impl Drop for IndexWriter {
    fn drop(&mut self) {
        // Still holding the writer means the index was never committed
        if let Some(mut writer) = self.writer.take() {
            let _ = writer.flush();
            drop(writer);
            if let Err(e) = fs::remove_file(&self.staging_path) {
                warn!(
                    "Failed to remove staging index {}: {}",
                    self.staging_path.display(),
                    e
                );
            }
        }
    }
}

/// Consume shard results in arrival order until the workers are done
pub fn aggregate(
    results: &Receiver<ShardResult>,
    index: &mut IndexWriter,
    scope: &CancelScope,
    progress: &ProgressBar,
) -> usize {
    let mut shards = 0;
    while let Some(result) = scope.recv(results) {
        if let Err(e) = index.write_result(&result) {
            scope.fail(e);
            break;
        }
        shards += 1;
        progress.inc(1);
        progress.set_message(format!("{} images", index.rows_written()));
        debug!(
            "Indexed {} images from {}",
            result.records.len(),
            result.shard.display()
        );
    }
    shards
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn record(layout: &OutputLayout, id: i64, label: &str) -> IndexRecord {
        IndexRecord {
            path: layout.image_path(label, id),
            id,
            label_id: if label == "cat" { 0 } else { 1 },
            label_text: label.to_string(),
            organization: "org, inc".to_string(),
        }
    }

    #[test]
    fn test_commit_writes_header_and_rows() {
        let dir = tempdir().unwrap();
        let layout = OutputLayout::new(dir.path());

        let mut index = IndexWriter::create(&layout).unwrap();
        let staging = index.staging_path().to_path_buf();
        assert!(staging.exists());
        assert!(!layout.index.exists());

        index
            .write_result(&ShardResult {
                shard: PathBuf::from("s0"),
                records: vec![record(&layout, 1, "cat"), record(&layout, 2, "dog")],
            })
            .unwrap();
        assert_eq!(index.rows_written(), 2);
        assert_eq!(index.label_count(), 2);

        let path = index.commit().unwrap();
        assert_eq!(path, layout.index);
        assert!(!staging.exists());

        let content = fs::read_to_string(&layout.index).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines[0], "image_path,id,label_id,label_text,organization");
        assert_eq!(
            lines[1],
            format!("{},1,0,cat,\"org, inc\"", layout.image_path("cat", 1).display())
        );
        assert_eq!(lines.len(), 3);
    }

    #[test]
    fn test_header_only_index() {
        let dir = tempdir().unwrap();
        let layout = OutputLayout::new(dir.path());

        IndexWriter::create(&layout).unwrap().commit().unwrap();

        let content = fs::read_to_string(&layout.index).unwrap();
        assert_eq!(content, "image_path,id,label_id,label_text,organization\n");
    }

    #[test]
    fn test_dropped_writer_leaves_no_index() {
        let dir = tempdir().unwrap();
        let layout = OutputLayout::new(dir.path());

        let index = IndexWriter::create(&layout).unwrap();
        let staging = index.staging_path().to_path_buf();
        drop(index);

        assert!(!staging.exists());
        assert!(!layout.index.exists());
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn test_index_write_failure_cancels_scope() {
        use crossbeam_channel::bounded;
        use std::ffi::OsStr;
        use std::os::unix::ffi::OsStrExt;

        // csv cannot serialize a path that is not valid UTF-8
        let dir = tempdir().unwrap();
        let root = dir.path().join(OsStr::from_bytes(b"out-\xff"));
        fs::create_dir_all(&root).unwrap();
        let layout = OutputLayout::new(&root);

        let mut index = IndexWriter::create(&layout).unwrap();
        let staging = index.staging_path().to_path_buf();
        let scope = CancelScope::new();

        let (tx, rx) = bounded(1);
        tx.send(ShardResult {
            shard: PathBuf::from("s0"),
            records: vec![record(&layout, 1, "cat")],
        })
        .unwrap();
        drop(tx);

        let shards = aggregate(&rx, &mut index, &scope, &ProgressBar::hidden());
        assert_eq!(shards, 0);
        assert!(scope.is_cancelled());
        assert!(matches!(scope.into_result(), Err(ExtractError::Index { .. })));

        drop(index);
        assert!(!staging.exists());
        assert!(!layout.index.exists());
    }

    #[test]
    fn test_duplicate_path_is_rejected() {
        let dir = tempdir().unwrap();
        let layout = OutputLayout::new(dir.path());
        let mut index = IndexWriter::create(&layout).unwrap();

        let first = ShardResult {
            shard: PathBuf::from("s0"),
            records: vec![record(&layout, 7, "cat")],
        };
        let second = ShardResult {
            shard: PathBuf::from("s1"),
            records: vec![record(&layout, 7, "cat")],
        };

        index.write_result(&first).unwrap();
        let err = index.write_result(&second).unwrap_err();
        assert!(matches!(err, ExtractError::DuplicateImage(p) if p == layout.image_path("cat", 7)));
    }
}
