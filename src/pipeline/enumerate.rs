use crossbeam_channel::Sender;
use log::debug;
use std::fs;
use std::path::{Path, PathBuf};

use super::CancelScope;
use crate::common::ExtractError;

/// Resolve the input argument into the shard paths to process.
///
/// A file yields itself. A directory yields its immediate non-directory
/// entries in the order the filesystem lists them.
pub fn list_shards(input: &Path) -> Result<Vec<PathBuf>, ExtractError> {
    let metadata = fs::metadata(input).map_err(|e| ExtractError::io(input, e))?;

    if !metadata.is_dir() {
        return Ok(vec![input.to_path_buf()]);
    }

    let mut shards = Vec::new();
    for entry in fs::read_dir(input).map_err(|e| ExtractError::io(input, e))? {
        let entry = entry.map_err(|e| ExtractError::io(input, e))?;
        let file_type = entry
            .file_type()
            .map_err(|e| ExtractError::io(entry.path(), e))?;

        if file_type.is_dir() {
            debug!("Skipping sub-directory: {}", entry.path().display());
            continue;
        }
        shards.push(entry.path());
    }

    Ok(shards)
}

/// Offer each shard, in order, to the workers; returns how many were handed off
pub fn feed_shards(
    shards: Vec<PathBuf>,
    paths: Sender<PathBuf>,
    scope: &CancelScope,
) -> Result<usize, ExtractError> {
    let mut sent = 0;
    for shard in shards {
        scope.send(&paths, shard)?;
        sent += 1;
    }
    // Dropping `paths` here closes the channel so idle workers exit
    Ok(sent)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossbeam_channel::bounded;
    use std::collections::HashSet;
    use std::fs::File;
    use std::thread;
    use tempfile::tempdir;

    #[test]
    fn test_single_file_yields_itself() {
        let dir = tempdir().unwrap();
        let shard = dir.path().join("train-00000-of-00001");
        File::create(&shard).unwrap();

        assert_eq!(list_shards(&shard).unwrap(), vec![shard]);
    }

    #[test]
    fn test_directory_skips_subdirectories() {
        let dir = tempdir().unwrap();
        File::create(dir.path().join("a")).unwrap();
        File::create(dir.path().join("b")).unwrap();
        fs::create_dir(dir.path().join("nested")).unwrap();
        File::create(dir.path().join("nested").join("c")).unwrap();

        let shards: HashSet<PathBuf> = list_shards(dir.path()).unwrap().into_iter().collect();
        let expected: HashSet<PathBuf> =
            [dir.path().join("a"), dir.path().join("b")].into_iter().collect();
        assert_eq!(shards, expected);
    }

    #[test]
    fn test_empty_directory_yields_nothing() {
        let dir = tempdir().unwrap();
        fs::create_dir(dir.path().join("only-a-dir")).unwrap();
        assert!(list_shards(dir.path()).unwrap().is_empty());
    }

    #[test]
    fn test_missing_input_is_io_error() {
        let dir = tempdir().unwrap();
        let err = list_shards(&dir.path().join("missing")).unwrap_err();
        assert!(matches!(err, ExtractError::Io { .. }));
    }

    #[test]
    fn test_feed_preserves_order_and_closes() {
        let scope = CancelScope::new();
        let (tx, rx) = bounded(0);
        let shards: Vec<PathBuf> = (0..4).map(|i| PathBuf::from(format!("s{}", i))).collect();

        thread::scope(|s| {
            let feeder = s.spawn(|| feed_shards(shards.clone(), tx, &scope));
            let received: Vec<PathBuf> = rx.iter().collect();
            assert_eq!(received, shards);
            assert_eq!(feeder.join().unwrap().unwrap(), 4);
        });
    }

    #[test]
    fn test_feed_stops_when_cancelled() {
        let scope = CancelScope::new();
        let (tx, _rx) = bounded(0);
        scope.cancel();

        let err = feed_shards(vec![PathBuf::from("s0")], tx, &scope).unwrap_err();
        assert!(err.is_cancelled());
    }
}
