//! Command line configuration.

use anyhow::{Result, bail};
use clap::Parser;
use std::path::PathBuf;

/// Command line configuration for readmekit.
#[derive(Debug, Clone, Parser)]
#[command(name = "readmekit", version, about, long_about = None)]
pub struct Config {
    /// README file to render (reads stdin when omitted)
    pub input: Option<PathBuf>,

    /// Output file (writes stdout when omitted)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Treat input as base64 encoded content, as returned by repository APIs
    #[arg(long)]
    pub base64: bool,

    /// Emit a complete HTML page with the document inside a README panel
    #[arg(long)]
    pub standalone: bool,

    /// Title for the standalone page and panel header
    #[arg(long, default_value = "README.md")]
    pub title: String,

    /// Enable debug logging (overrides RUST_LOG)
    #[arg(short, long)]
    pub verbose: bool,
}

impl Config {
    /// Parses configuration from command line arguments.
    pub fn parse() -> Self {
        <Self as Parser>::parse()
    }

    /// Validates configuration.
    ///
    /// # Errors
    ///
    /// Returns error if the input path does not exist or is not a file.
    pub fn validate(&self) -> Result<()> {
        if let Some(input) = &self.input {
            if !input.exists() {
                bail!("Input path does not exist: {}", input.display());
            }
            if !input.is_file() {
                bail!("Input path is not a file: {}", input.display());
            }
        }

        Ok(())
    }
}
