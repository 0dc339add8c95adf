use serde::Serialize;
use std::path::PathBuf;

/// Column names of the consolidated index, in row order
pub const INDEX_HEADER: [&str; 5] = ["image_path", "id", "label_id", "label_text", "organization"];

/// One row of the consolidated index describing a written image file
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct IndexRecord {
    #[serde(rename = "image_path")]
    pub path: PathBuf,
    pub id: i64,
    pub label_id: i64,
    pub label_text: String,
    pub organization: String,
}

/// Index records produced from a single shard, in decode order
#[derive(Debug, Clone)]
pub struct ShardResult {
    pub shard: PathBuf,
    pub records: Vec<IndexRecord>,
}

/// Statistics from extract step
#[derive(Debug, Clone, Default)]
pub struct ExtractStats {
    pub shards_total: usize,
    pub shards_processed: usize,
    pub images_written: usize,
    pub labels: usize,
    pub index_path: PathBuf,
}

/// Statistics from inspect step
#[derive(Debug, Clone, Default)]
pub struct InspectStats {
    pub shards_read: usize,
    pub images_decoded: usize,
    pub bytes_decoded: usize,
    pub label_counts: Vec<(String, usize)>,
}
