use crate::config::{CliOverrides, Config};
use crate::error::Result;
use clap::{Parser, ValueEnum};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "dumpsplit")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Split a concatenated codebase dump back into files")]
#[command(
    long_about = "DumpSplit reads a text export in which files are separated by \
                  '==========' / 'FILE: <path>' / '==========' marker blocks and writes \
                  each section to <OUTPUT_DIR>/<path>, creating directories as needed."
)]
#[command(after_help = "EXAMPLES:\n  \
    dumpsplit codebase.txt restored/\n  \
    dumpsplit codebase.txt restored/ --dry-run -v\n  \
    dumpsplit codebase.txt restored/ --strict-paths --report report.json\n  \
    dumpsplit --generate-config")]
#[command(arg_required_else_help = true)]
pub struct Cli {
    /// Dump file to split
    #[arg(required_unless_present = "generate_config")]
    pub source: Option<PathBuf>,

    /// Directory the extracted files are written under
    pub output_dir: Option<PathBuf>,

    /// Configuration file path
    #[arg(short, long, help = "Path to TOML configuration file")]
    pub config: Option<PathBuf>,

    /// Output format for results
    #[arg(long, value_enum, default_value_t = OutputFormat::Human)]
    pub output_format: OutputFormat,

    /// Minimum number of '=' characters on a delimiter line
    #[arg(long, value_name = "N")]
    pub min_delimiter: Option<usize>,

    /// Reject marker paths that are absolute or contain '..'
    #[arg(long)]
    pub strict_paths: bool,

    /// Write a JSON extraction report to this file
    #[arg(long, value_name = "FILE")]
    pub report: Option<PathBuf>,

    /// Verbose output level (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Quiet mode (only errors and the final summary)
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Dry run (list what would be written without writing)
    #[arg(long, help = "Show what would be extracted without writing any files")]
    pub dry_run: bool,

    /// Generate sample configuration file
    #[arg(long, help = "Generate a sample configuration file")]
    pub generate_config: bool,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable colored output
    Human,
    /// JSON formatted output
    Json,
    /// Plain text output
    Plain,
}

impl Cli {
    pub fn load_config(&self) -> Result<Config> {
        let mut config = Config::load_with_defaults(self.config.as_ref())?;

        let overrides = self.create_cli_overrides();
        config.merge_with_cli_args(&overrides);
        config.validate()?;

        Ok(config)
    }

    pub fn create_cli_overrides(&self) -> CliOverrides {
        CliOverrides::new()
            .with_output_dir(self.output_dir.clone())
            .with_report_path(self.report.clone())
            .with_min_delimiter_len(self.min_delimiter)
            .with_strict_paths(self.strict_paths)
    }

    pub fn verbosity_level(&self) -> u8 {
        if self.quiet {
            0
        } else {
            self.verbose
        }
    }
}
