pub mod extract;
pub mod inspect;

pub use extract::run_extract;
pub use inspect::{inspect_shards, run_inspect};
