/*!
 * Configuration handling for dirdigest
 */

use std::path::PathBuf;

use clap::Parser;
use clap_complete::Shell;
use tracing::warn;

use crate::error::Result;
use crate::types::{TraversalOptions, DEFAULT_MAX_FILE_SIZE};
use crate::utils::parse_size;

/// Command-line arguments for dirdigest
#[derive(Parser, Debug, Clone)]
#[clap(
    name = "dirdigest",
    version = env!("CARGO_PKG_VERSION"),
    about = "Concatenate the text files of a directory into a single digest",
    long_about = "Walks a directory, keeps the text files that pass the size, binary and hidden filters, and writes them into one delimited digest ready to paste into an LLM prompt. Configured attachments (such as log tails) can be placed before or after the digest."
)]
pub struct Args {
    /// Root directory to digest
    #[clap(default_value = ".")]
    pub directory_path: String,

    /// Write the digest to this file instead of stdout
    #[clap(short, long)]
    pub output: Option<String>,

    /// Include hidden files and directories
    #[clap(long)]
    pub include_hidden: bool,

    /// Include files that look binary
    #[clap(long)]
    pub include_binaries: bool,

    /// Skip files larger than this (bytes, or with a K/M/G suffix)
    #[clap(long, default_value = "1M")]
    pub max_size: String,

    /// Emit files in name order instead of directory-listing order
    #[clap(long)]
    pub sort: bool,

    /// Number of threads used to read files
    #[clap(long, default_value = "4")]
    pub threads: usize,

    /// Settings file with attachments and per-folder selections
    #[clap(long)]
    pub settings: Option<String>,

    /// Skip the summary report
    #[clap(long)]
    pub no_report: bool,

    /// Increase log verbosity (-v for info, -vv for debug)
    #[clap(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Generate shell completions
    #[clap(long = "generate", value_enum)]
    pub generate: Option<Shell>,
}

/// Application configuration
#[derive(Clone, Debug)]
pub struct Config {
    /// Root directory to process
    pub target_dir: PathBuf,

    /// Output file; stdout when `None`
    pub output_file: Option<PathBuf>,

    /// Traversal and admission options
    pub options: TraversalOptions,

    /// Sort traversal by file name
    pub sorted: bool,

    /// Number of threads to use for processing
    pub num_threads: usize,

    /// Settings file, if one is available
    pub settings_path: Option<PathBuf>,

    /// Print the summary report
    pub report: bool,
}

impl Config {
    /// Create configuration from command-line arguments
    ///
    /// An unparsable size limit falls back to the default with a warning.
    pub fn from_args(args: Args) -> Self {
        let max_file_size_bytes = parse_size(&args.max_size).unwrap_or_else(|| {
            warn!(
                "Invalid --max-size '{}', using {} bytes",
                args.max_size, DEFAULT_MAX_FILE_SIZE
            );
            DEFAULT_MAX_FILE_SIZE
        });

        Self {
            target_dir: PathBuf::from(args.directory_path),
            output_file: args.output.map(PathBuf::from),
            options: TraversalOptions {
                include_hidden: args.include_hidden,
                include_binaries: args.include_binaries,
                max_file_size_bytes,
            },
            sorted: args.sort,
            num_threads: args.threads.max(1),
            settings_path: args
                .settings
                .map(PathBuf::from)
                .or_else(crate::settings::Settings::default_path),
            report: !args.no_report,
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        crate::ensure!(
            self.target_dir.is_dir(),
            PathNotFound,
            "Target directory not found: {}",
            self.target_dir.display()
        );

        if let Some(output) = &self.output_file {
            if let Some(parent) = output.parent() {
                crate::ensure!(
                    parent.as_os_str().is_empty() || parent.is_dir(),
                    PathNotFound,
                    "Output directory not found: {}",
                    parent.display()
                );
            }
            crate::ensure!(
                !output.is_dir(),
                InvalidArgument,
                "Output path is a directory: {}",
                output.display()
            );
        }

        Ok(())
    }
}
