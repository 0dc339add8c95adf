use anyhow::Result;
use clap::Parser;

use terf_extract::cli::{Cli, Commands};
use terf_extract::commands::{run_extract, run_inspect};

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Extract(args) => {
            run_extract(args)?;
        }
        Commands::Inspect(args) => {
            run_inspect(args)?;
        }
    }

    Ok(())
}
