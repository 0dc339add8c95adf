pub mod error;
pub mod logging;
pub mod output;
pub mod progress;
pub mod types;
pub mod utils;

pub use error::ExtractError;
pub use logging::*;
pub use output::{OutputLayout, IMAGE_EXTENSION, INDEX_FILE};
pub use progress::{create_count_progress_bar, create_spinner};
pub use types::*;
pub use utils::*;
