//! Extract labeled images from TFRecord shards into `<outdir>/<label>/<id>.jpg`
//! plus a consolidated `info.csv` index.

pub mod cli;
pub mod commands;
pub mod common;
pub mod pipeline;
pub mod shard;

pub use common::{ExtractError, ExtractStats, IndexRecord};
pub use pipeline::{run_extraction, ExtractConfig};
