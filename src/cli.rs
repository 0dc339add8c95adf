use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "terf")]
#[command(about = "Extract labeled images and a CSV index from TFRecord shards")]
#[command(version = "1.0.0")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Extract images from a TFRecord file or a directory of shards
    Extract(ExtractArgs),

    /// Decode every record of the input without writing anything and report counts
    Inspect(InspectArgs),
}

#[derive(Parser, Clone)]
pub struct ExtractArgs {
    /// TFRecord file or directory of TFRecord shards
    #[arg(short, long, required = true)]
    pub input: String,

    /// Output directory for images and info.csv
    #[arg(short, long)]
    pub output: Option<String>,

    /// Number of worker threads (0 = auto-detect)
    #[arg(short = 'n', long, default_value = "0")]
    pub threads: usize,

    /// Shards are zlib compressed
    #[arg(short, long, default_value = "false")]
    pub zlib: bool,

    /// Logging level (DEBUG, INFO, WARN, ERROR)
    #[arg(short, long, default_value = "INFO")]
    pub log_level: String,
}

#[derive(Parser, Clone)]
pub struct InspectArgs {
    /// TFRecord file or directory of TFRecord shards
    #[arg(short, long, required = true)]
    pub input: String,

    /// Shards are zlib compressed
    #[arg(short, long, default_value = "false")]
    pub zlib: bool,

    /// Logging level (DEBUG, INFO, WARN, ERROR)
    #[arg(short, long, default_value = "INFO")]
    pub log_level: String,
}
