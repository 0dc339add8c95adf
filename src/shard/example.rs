//! `tf.train.Example` protobuf messages.

use std::collections::HashMap;

#[derive(Clone, PartialEq, prost::Message)]
pub struct BytesList {
    #[prost(bytes = "vec", repeated, tag = "1")]
    pub value: Vec<Vec<u8>>,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct FloatList {
    #[prost(float, repeated, packed = "true", tag = "1")]
    pub value: Vec<f32>,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct Int64List {
    #[prost(int64, repeated, packed = "true", tag = "1")]
    pub value: Vec<i64>,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct Feature {
    #[prost(oneof = "feature::Kind", tags = "1, 2, 3")]
    pub kind: Option<feature::Kind>,
}

pub mod feature {
    #[derive(Clone, PartialEq, prost::Oneof)]
    pub enum Kind {
        #[prost(message, tag = "1")]
        BytesList(super::BytesList),
        #[prost(message, tag = "2")]
        FloatList(super::FloatList),
        #[prost(message, tag = "3")]
        Int64List(super::Int64List),
    }
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct Features {
    #[prost(map = "string, message", tag = "1")]
    pub feature: HashMap<String, Feature>,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct Example {
    #[prost(message, optional, tag = "1")]
    pub features: Option<Features>,
}

impl Feature {
    pub fn bytes(value: impl Into<Vec<u8>>) -> Self {
        Self {
            kind: Some(feature::Kind::BytesList(BytesList {
                value: vec![value.into()],
            })),
        }
    }

    pub fn int64(value: i64) -> Self {
        Self {
            kind: Some(feature::Kind::Int64List(Int64List { value: vec![value] })),
        }
    }

    /// First value of a bytes feature
    pub fn first_bytes(&self) -> Option<&[u8]> {
        match &self.kind {
            Some(feature::Kind::BytesList(list)) => list.value.first().map(Vec::as_slice),
            _ => None,
        }
    }

    /// First value of an int64 feature
    pub fn first_int64(&self) -> Option<i64> {
        match &self.kind {
            Some(feature::Kind::Int64List(list)) => list.value.first().copied(),
            _ => None,
        }
    }
}

impl Example {
    pub fn get(&self, key: &str) -> Option<&Feature> {
        self.features.as_ref()?.feature.get(key)
    }

    pub fn int64(&self, key: &str) -> Option<i64> {
        self.get(key)?.first_int64()
    }

    pub fn bytes(&self, key: &str) -> Option<&[u8]> {
        self.get(key)?.first_bytes()
    }

    /// Bytes feature as text, lossily converted from UTF-8
    pub fn text(&self, key: &str) -> Option<String> {
        self.bytes(key)
            .map(|b| String::from_utf8_lossy(b).into_owned())
    }

    pub fn insert(&mut self, key: &str, feature: Feature) {
        self.features
            .get_or_insert_with(Features::default)
            .feature
            .insert(key.to_string(), feature);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use prost::Message;

    #[test]
    fn test_feature_accessors() {
        let mut example = Example::default();
        example.insert("image/id", Feature::int64(7));
        example.insert("image/class/text", Feature::bytes("cat"));

        assert_eq!(example.int64("image/id"), Some(7));
        assert_eq!(example.text("image/class/text").as_deref(), Some("cat"));
        assert_eq!(example.int64("image/class/text"), None);
        assert_eq!(example.bytes("image/missing"), None);
    }

    #[test]
    fn test_example_wire_decoding() {
        let mut example = Example::default();
        example.insert("image/encoded", Feature::bytes(vec![0xff, 0xd8, 0xff]));
        example.insert("image/height", Feature::int64(480));

        let decoded = Example::decode(example.encode_to_vec().as_slice()).unwrap();
        assert_eq!(decoded.bytes("image/encoded"), Some(&[0xff, 0xd8, 0xff][..]));
        assert_eq!(decoded.int64("image/height"), Some(480));
    }

    #[test]
    fn test_empty_example_has_no_features() {
        let example = Example::default();
        assert!(example.get("image/id").is_none());
    }
}
