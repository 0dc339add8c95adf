use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::shard::ShardError;

/// Errors produced by the extraction pipeline.
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("I/O error on '{}': {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to decode shard '{}': {source}", .path.display())]
    Decode {
        path: PathBuf,
        #[source]
        source: ShardError,
    },

    #[error("Failed to write index '{}': {source}", .path.display())]
    Index {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("No images found in {}", .0.display())]
    NoImages(PathBuf),

    #[error("Duplicate image path '{}' (same label and id in more than one record)", .0.display())]
    DuplicateImage(PathBuf),

    #[error("Extraction cancelled")]
    Cancelled,
}

impl ExtractError {
    pub fn io(path: impl AsRef<Path>, source: io::Error) -> Self {
        ExtractError::Io {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }

    pub fn decode(path: impl AsRef<Path>, source: ShardError) -> Self {
        ExtractError::Decode {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }

    pub fn index(path: impl AsRef<Path>, source: csv::Error) -> Self {
        ExtractError::Index {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }

    /// True for the internal signal raised while unwinding a cancelled scope
    pub fn is_cancelled(&self) -> bool {
        matches!(self, ExtractError::Cancelled)
    }
}
