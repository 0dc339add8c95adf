//! TFRecord shards of `tf.train.Example` image records.
//!
//! A shard is a sequence of length-prefixed, checksummed records, optionally
//! wrapped in a single zlib stream. Each record decodes to an [`ImageEntity`].

pub mod example;
pub mod image;
pub mod reader;
pub mod writer;

pub use example::{Example, Feature, Features};
pub use image::ImageEntity;
pub use reader::{open_shard, RecordReader, ShardReader};
pub use writer::{write_shard, RecordWriter};

use std::io;
use thiserror::Error;

/// Value added to a rotated CRC32C when masking record checksums
const CRC_MASK_DELTA: u32 = 0xa282_ead8;

/// Size of the length prefix and of each checksum in a record frame
pub(crate) const LENGTH_BYTES: usize = 8;
pub(crate) const CRC_BYTES: usize = 4;

/// Whether shard bytes are stored raw or inside a zlib stream
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Compression {
    #[default]
    None,
    Zlib,
}

impl Compression {
    pub fn from_flag(zlib: bool) -> Self {
        if zlib {
            Compression::Zlib
        } else {
            Compression::None
        }
    }

    pub fn is_zlib(self) -> bool {
        self == Compression::Zlib
    }
}

/// Errors raised while reading or decoding shard content
#[derive(Debug, Error)]
pub enum ShardError {
    #[error("read failed: {0}")]
    Io(#[from] io::Error),

    #[error("truncated record: expected {expected} bytes, got {actual}")]
    Truncated { expected: usize, actual: usize },

    #[error("record length {0} does not fit in memory on this platform")]
    RecordTooLarge(u64),

    #[error("{section} checksum mismatch: stored {stored:#010x}, computed {computed:#010x}")]
    Checksum {
        section: &'static str,
        stored: u32,
        computed: u32,
    },

    #[error("invalid Example protobuf: {0}")]
    Protobuf(#[from] prost::DecodeError),

    #[error("missing required feature '{0}'")]
    MissingFeature(&'static str),
}

/// Masked CRC32C as used by TFRecord framing
pub fn masked_crc(data: &[u8]) -> u32 {
    let crc = crc32c::crc32c(data);
    ((crc >> 15) | (crc << 17)).wrapping_add(CRC_MASK_DELTA)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_masked_crc_of_empty_input() {
        // crc32c("") == 0, so only the mask delta remains
        assert_eq!(masked_crc(b""), CRC_MASK_DELTA);
    }

    #[test]
    fn test_masked_crc_differs_from_plain_crc() {
        let data = b"123456789";
        assert_eq!(crc32c::crc32c(data), 0xe306_9283);
        assert_ne!(masked_crc(data), 0xe306_9283);
    }

    #[test]
    fn test_compression_from_flag() {
        assert_eq!(Compression::from_flag(true), Compression::Zlib);
        assert_eq!(Compression::from_flag(false), Compression::None);
        assert!(!Compression::default().is_zlib());
    }
}
