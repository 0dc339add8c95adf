//! Concurrent extraction pipeline.
//!
//! shard paths → path channel → workers → result channel → index writer,
//! all sharing one [`CancelScope`] so the first failure stops every stage.

pub mod aggregator;
pub mod config;
pub mod coordinator;
pub mod enumerate;
pub mod pool;
pub mod worker;

pub use aggregator::{aggregate, IndexWriter};
pub use config::{resolve_threads, ExtractConfig};
pub use coordinator::CancelScope;
pub use enumerate::{feed_shards, list_shards};
pub use pool::run_extraction;
pub use worker::{extract_shard, run_worker};
