//! Command-line argument definitions using clap

use std::path::{Path, PathBuf};

use clap::Parser;

use crate::config::{PipelineConfig, DEFAULT_DATA_DIR};
use crate::pipeline::{InvalidValuePolicy, Result};
use crate::utils::LogFormat;

/// loanprep - Clean and merge loan-uptake extracts into training and testing tables
#[derive(Parser, Debug)]
#[command(name = "loanprep")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Data root holding raw/, external/ and processed/.
    /// Defaults to ../data. Ignored when --config is given.
    #[arg(short, long)]
    pub data_dir: Option<PathBuf>,

    /// JSON file with a full pipeline configuration (paths, column types, policy)
    #[arg(short, long, conflicts_with = "data_dir")]
    pub config: Option<PathBuf>,

    /// Override the cleaned training table destination
    #[arg(long)]
    pub training_output: Option<PathBuf>,

    /// Override the cleaned testing table destination
    #[arg(long)]
    pub testing_output: Option<PathBuf>,

    /// What to do with values that cannot be cast to their final type.
    /// "fail" stops the run (default), "null" leaves the cell empty.
    #[arg(long, value_enum)]
    pub on_invalid: Option<InvalidValuePolicy>,

    /// Write a JSON run report to this path
    #[arg(long)]
    pub report: Option<PathBuf>,

    /// Skip interactive confirmation prompts
    #[arg(long, default_value = "false")]
    pub no_confirm: bool,

    /// Increase diagnostic logging on stderr (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Diagnostic log format
    #[arg(long, value_enum, default_value = "pretty")]
    pub log_format: LogFormat,
}

impl Cli {
    /// Build the run configuration: config file or data root, then flag overrides.
    pub fn resolve_config(&self) -> Result<PipelineConfig> {
        let mut config = match (&self.config, &self.data_dir) {
            (Some(path), _) => PipelineConfig::from_json_file(path)?,
            (None, Some(root)) => PipelineConfig::from_data_dir(root),
            (None, None) => PipelineConfig::from_data_dir(Path::new(DEFAULT_DATA_DIR)),
        };

        if let Some(path) = &self.training_output {
            config.outputs.training = path.clone();
        }
        if let Some(path) = &self.testing_output {
            config.outputs.testing = path.clone();
        }
        if let Some(policy) = self.on_invalid {
            config.on_invalid = policy;
        }

        Ok(config)
    }
}
