use prost::Message;
use std::fs;
use std::io;
use std::path::Path;

use super::{Example, Feature, ShardError};

pub const KEY_ID: &str = "image/id";
pub const KEY_LABEL_ID: &str = "image/class/label";
pub const KEY_LABEL_TEXT: &str = "image/class/text";
pub const KEY_ORGANIZATION: &str = "image/organization";
pub const KEY_FILENAME: &str = "image/filename";
pub const KEY_FORMAT: &str = "image/format";
pub const KEY_COLORSPACE: &str = "image/colorspace";
pub const KEY_HEIGHT: &str = "image/height";
pub const KEY_WIDTH: &str = "image/width";
pub const KEY_CHANNELS: &str = "image/channels";
pub const KEY_ENCODED: &str = "image/encoded";

/// A decoded image record: encoded payload plus label metadata
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ImageEntity {
    pub id: i64,
    pub label_id: i64,
    pub label_text: String,
    pub organization: String,
    pub filename: String,
    pub format: String,
    pub colorspace: String,
    pub height: i64,
    pub width: i64,
    pub channels: i64,
    pub raw: Vec<u8>,
}

impl ImageEntity {
    /// Decode one serialized `Example` record
    pub fn decode(record: &[u8]) -> Result<Self, ShardError> {
        let example = Example::decode(record)?;
        Self::from_example(&example)
    }

    /// Build an entity from an `Example`; only the encoded payload is required
    pub fn from_example(example: &Example) -> Result<Self, ShardError> {
        let raw = example
            .bytes(KEY_ENCODED)
            .ok_or(ShardError::MissingFeature(KEY_ENCODED))?
            .to_vec();

        let text = |key: &str| example.text(key).unwrap_or_default();
        let int = |key: &str| example.int64(key).unwrap_or(0);

        Ok(Self {
            id: int(KEY_ID),
            label_id: int(KEY_LABEL_ID),
            label_text: text(KEY_LABEL_TEXT),
            organization: text(KEY_ORGANIZATION),
            filename: text(KEY_FILENAME),
            format: text(KEY_FORMAT),
            colorspace: text(KEY_COLORSPACE),
            height: int(KEY_HEIGHT),
            width: int(KEY_WIDTH),
            channels: int(KEY_CHANNELS),
            raw,
        })
    }

    pub fn to_example(&self) -> Example {
        let mut example = Example::default();
        example.insert(KEY_ID, Feature::int64(self.id));
        example.insert(KEY_LABEL_ID, Feature::int64(self.label_id));
        example.insert(KEY_LABEL_TEXT, Feature::bytes(self.label_text.as_str()));
        example.insert(KEY_ORGANIZATION, Feature::bytes(self.organization.as_str()));
        example.insert(KEY_FILENAME, Feature::bytes(self.filename.as_str()));
        example.insert(KEY_FORMAT, Feature::bytes(self.format.as_str()));
        example.insert(KEY_COLORSPACE, Feature::bytes(self.colorspace.as_str()));
        example.insert(KEY_HEIGHT, Feature::int64(self.height));
        example.insert(KEY_WIDTH, Feature::int64(self.width));
        example.insert(KEY_CHANNELS, Feature::int64(self.channels));
        example.insert(KEY_ENCODED, Feature::bytes(self.raw.clone()));
        example
    }

    /// Serialized `Example` bytes, ready to be framed into a shard
    pub fn encode(&self) -> Vec<u8> {
        self.to_example().encode_to_vec()
    }

    /// Write the encoded image payload to `path`
    pub fn save(&self, path: &Path) -> io::Result<()> {
        fs::write(path, &self.raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> ImageEntity {
        ImageEntity {
            id: 12,
            label_id: 3,
            label_text: "heron".into(),
            organization: "ubc".into(),
            filename: "IMG_0012.JPG".into(),
            format: "JPEG".into(),
            colorspace: "RGB".into(),
            height: 32,
            width: 48,
            channels: 3,
            raw: vec![0xff, 0xd8, 0x00, 0x01],
        }
    }

    #[test]
    fn test_decode_encoded_entity() {
        let image = sample();
        assert_eq!(ImageEntity::decode(&image.encode()).unwrap(), image);
    }

    #[test]
    fn test_missing_payload_is_an_error() {
        let mut example = Example::default();
        example.insert(KEY_ID, Feature::int64(1));

        let err = ImageEntity::from_example(&example).unwrap_err();
        assert!(matches!(err, ShardError::MissingFeature(KEY_ENCODED)));
    }

    #[test]
    fn test_missing_metadata_defaults() {
        let mut example = Example::default();
        example.insert(KEY_ENCODED, Feature::bytes(vec![1, 2, 3]));

        let image = ImageEntity::from_example(&example).unwrap();
        assert_eq!(image.id, 0);
        assert_eq!(image.label_text, "");
        assert_eq!(image.raw, vec![1, 2, 3]);
    }

    #[test]
    fn test_save_writes_raw_payload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("12.jpg");
        sample().save(&path).unwrap();
        assert_eq!(fs::read(&path).unwrap(), vec![0xff, 0xd8, 0x00, 0x01]);
    }
}
