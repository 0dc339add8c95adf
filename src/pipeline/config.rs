use log::info;
use std::fs;
use std::path::{Path, PathBuf};

use crate::common::{ExtractError, OutputLayout};
use crate::shard::Compression;

/// Resolved settings for one extraction run
#[derive(Debug, Clone)]
pub struct ExtractConfig {
    pub input: PathBuf,
    pub outdir: PathBuf,
    pub threads: usize,
    pub compression: Compression,
}

impl ExtractConfig {
    /// Validate arguments, create and canonicalize the output directory and
    /// resolve the worker count (`0` means one worker per logical CPU).
    pub fn new(
        input: impl AsRef<Path>,
        output: Option<&str>,
        threads: usize,
        compression: Compression,
    ) -> Result<Self, ExtractError> {
        let output = output.map(str::trim).unwrap_or_default();
        if output.is_empty() {
            return Err(ExtractError::Config(
                "Please provide an output directory".to_string(),
            ));
        }

        let input = input.as_ref().to_path_buf();
        if input.as_os_str().is_empty() {
            return Err(ExtractError::Config(
                "Please provide an input file or directory".to_string(),
            ));
        }

        fs::create_dir_all(output).map_err(|e| ExtractError::io(output, e))?;
        let outdir = fs::canonicalize(output).map_err(|e| ExtractError::io(output, e))?;

        Ok(Self {
            input,
            outdir,
            threads: resolve_threads(threads),
            compression,
        })
    }

    pub fn layout(&self) -> OutputLayout {
        OutputLayout::new(&self.outdir)
    }
}

/// Resolve a requested worker count, where `0` means all logical CPUs
pub fn resolve_threads(requested: usize) -> usize {
    if requested == 0 {
        let cores = num_cpus::get().max(1);
        info!("Auto-detected {} CPU cores. Using {} threads.", cores, cores);
        cores
    } else {
        info!("Using specified {} threads.", requested);
        requested
    }
}
