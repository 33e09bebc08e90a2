use clap::{Args, Parser, Subcommand};
use std::path::{Path, PathBuf};

use crate::config::Config;
use crate::rows::InputFormat;

#[derive(Parser)]
#[command(name = "litfetch")]
#[command(about = "Bulk-download literary texts listed in a spreadsheet or CSV file")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Args, Debug, Clone, Default)]
pub struct InputArgs {
    /// Input file with title, last name, first name and year columns
    #[arg(short, long)]
    pub input: Option<PathBuf>,

    /// Input format (csv, xlsx); inferred from the file extension when omitted
    #[arg(short, long)]
    pub format: Option<String>,

    /// Origin and path prefix prepended to every download
    #[arg(long)]
    pub base_uri: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Download every text listed in the input file
    Download {
        #[command(flatten)]
        input: InputArgs,

        /// Output directory
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Error report path
        #[arg(short, long)]
        errors: Option<PathBuf>,
    },

    /// Print the download targets without fetching anything
    Plan {
        #[command(flatten)]
        input: InputArgs,
    },
}

impl InputArgs {
    /// Apply command line overrides on top of the environment configuration.
    pub fn apply(&self, config: &mut Config) {
        if let Some(input) = &self.input {
            config.input_path = input.clone();
        }
        if let Some(base_uri) = &self.base_uri {
            config.base_uri = base_uri.clone();
        }
    }

    pub fn input_format(&self, input_path: &Path) -> Result<InputFormat, anyhow::Error> {
        let format = match &self.format {
            Some(format) => InputFormat::parse(format)?,
            None => InputFormat::from_path(input_path)?,
        };
        Ok(format)
    }
}
