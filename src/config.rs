//! Configuration module.
//!
//! This module defines the command-line interface (CLI) using `clap`.
//! It handles the target image path and the optional map/output overrides.

use clap::Parser;
use std::path::PathBuf;

use crate::error::{PadError, Result};
use crate::loader::map_path_for;
use crate::writer::output_path_for;

/// Rewrites the int3 padding between functions of a PE image as nop sleds.
///
/// Function boundaries come from the MSVC map file produced alongside the image.
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Config {
    /// Target executable or DLL
    #[arg(short, long)]
    pub file: PathBuf,

    /// Map file (defaults to the target with a .map extension)
    #[arg(short, long)]
    pub map: Option<PathBuf>,

    /// Output file (defaults to <file>.padsmashed)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Report what would be patched without writing the output
    #[arg(long)]
    pub dry_run: bool,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, default_value = "info", help = "Set the logging level")]
    pub log_level: String,
}

impl Config {
    /// Config for `file` with every other option at its default.
    pub fn for_file(file: impl Into<PathBuf>) -> Self {
        Self {
            file: file.into(),
            map: None,
            output: None,
            dry_run: false,
            log_level: "info".to_string(),
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.file.as_os_str().is_empty() {
            return Err(PadError::Configuration("no target file given".to_string()));
        }
        Ok(())
    }

    pub fn map_path(&self) -> PathBuf {
        self.map.clone().unwrap_or_else(|| map_path_for(&self.file))
    }

    pub fn output_path(&self) -> PathBuf {
        self.output.clone().unwrap_or_else(|| output_path_for(&self.file))
    }
}
