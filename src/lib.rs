pub mod cli;
pub mod config;
pub mod error;
pub mod extractor;
pub mod parser;
pub mod ui;

// Public API re-exports
pub use cli::{Cli, OutputFormat};
pub use config::{CliOverrides, Config, ExtractionConfig, OutputConfig, PathPolicy};
pub use error::{DumpSplitError, Result, UserFriendlyError};

// Core functionality re-exports
pub use extractor::{ExtractionProgress, ExtractionReport, FileWriter, ReportWriter, WrittenFile};
pub use parser::{DumpParser, FileRecord, ParsedDump};
pub use ui::{GracefulShutdown, OutputFormatter, OutputMode, ProgressManager};

use std::path::Path;

/// Main library interface for DumpSplit functionality
pub struct DumpSplit {
    config: Config,
    output_formatter: OutputFormatter,
    progress_manager: ProgressManager,
    shutdown: GracefulShutdown,
}

impl DumpSplit {
    /// Create an instance that stops cleanly on Ctrl+C.
    pub fn new(config: Config, output_mode: OutputMode, verbose: u8, quiet: bool) -> Result<Self> {
        let shutdown = GracefulShutdown::new()?;
        Ok(Self::with_shutdown(config, output_mode, verbose, quiet, shutdown))
    }

    /// Create an instance without touching the process signal handler.
    pub fn detached(config: Config, output_mode: OutputMode, verbose: u8, quiet: bool) -> Self {
        Self::with_shutdown(
            config,
            output_mode,
            verbose,
            quiet,
            GracefulShutdown::without_handler(),
        )
    }

    fn with_shutdown(
        config: Config,
        output_mode: OutputMode,
        verbose: u8,
        quiet: bool,
        shutdown: GracefulShutdown,
    ) -> Self {
        let output_formatter = OutputFormatter::new(output_mode, verbose, quiet);
        let progress_manager = ProgressManager::new(!quiet && output_mode == OutputMode::Human);

        Self {
            config,
            output_formatter,
            progress_manager,
            shutdown,
        }
    }

    /// Create DumpSplit instance from CLI arguments
    pub fn from_cli(cli_args: &Cli) -> Result<Self> {
        let config = cli_args.load_config()?;
        let output_mode = match cli_args.output_format {
            crate::cli::OutputFormat::Human => OutputMode::Human,
            crate::cli::OutputFormat::Json => OutputMode::Json,
            crate::cli::OutputFormat::Plain => OutputMode::Plain,
        };

        Self::new(config, output_mode, cli_args.verbosity_level(), cli_args.quiet)
    }

    /// Split `source` into the configured output directory.
    pub fn extract(&self, source: &Path) -> Result<ExtractionReport> {
        self.shutdown.check_shutdown()?;
        let output_dir = self.config.output.directory.as_path();

        let document = self.read_source(source)?;
        let parsed = self.parse_document(&document)?;

        if parsed.is_empty() {
            self.output_formatter
                .warning("No file markers found; nothing to extract");
        }

        let progress = self.write_files(&parsed, output_dir)?;

        for path in &progress.overwritten {
            self.output_formatter.warning(&format!(
                "{} was declared more than once; kept the last section",
                path
            ));
        }

        let report = ExtractionReport::from_progress(source, output_dir, &parsed, &progress);
        self.save_report(&report)?;

        Ok(report)
    }

    /// Parse `source` and describe what `extract` would write.
    pub fn plan(&self, source: &Path) -> Result<ExtractionReport> {
        let document = self.read_source(source)?;
        let parsed = self.parse_document(&document)?;

        let report =
            ExtractionReport::planned(source, self.config.output.directory.as_path(), &parsed);
        self.save_report(&report)?;

        Ok(report)
    }

    fn read_source(&self, source: &Path) -> Result<String> {
        self.output_formatter
            .start_operation(&format!("Reading {}", source.display()));

        std::fs::read_to_string(source)
            .map(parser::normalize_line_endings)
            .map_err(|e| DumpSplitError::SourceRead {
                path: source.display().to_string(),
                source: e,
            })
    }

    fn parse_document<'a>(&self, document: &'a str) -> Result<ParsedDump<'a>> {
        let parser = DumpParser::new(&self.config.extraction)?;
        let parsed = parser.parse(document);

        self.output_formatter
            .info(&format!("Found {} file sections", parsed.len()));
        self.output_formatter
            .debug(&parsed.statistics().display_summary());

        Ok(parsed)
    }

    fn write_files(&self, parsed: &ParsedDump<'_>, output_dir: &Path) -> Result<ExtractionProgress> {
        self.output_formatter
            .start_operation(&format!("Writing files to {}", output_dir.display()));

        let file_progress = self.progress_manager.create_file_progress(parsed.len() as u64);
        let progress_callback = {
            let pb = file_progress.clone();
            move |progress: &ExtractionProgress| {
                ui::progress::update_file_progress(&pb, progress);
            }
        };

        let writer = FileWriter::new()
            .with_path_policy(self.config.extraction.path_policy)
            .with_cancel_flag(self.shutdown.running_flag());

        let result = writer.write_records(&parsed.records, output_dir, Some(&progress_callback));

        let progress = match result {
            Ok(progress) => progress,
            Err(e) => {
                file_progress.abandon();
                return Err(e);
            }
        };

        ui::progress::finish_progress_with_summary(
            &file_progress,
            &format!("Wrote {} files", progress.files_processed),
            progress.elapsed(),
        );
        self.progress_manager.clear();

        for file in &progress.written {
            self.output_formatter.debug(&format!(
                "{} ({} bytes)",
                file.destination.display(),
                file.bytes
            ));
        }

        Ok(progress)
    }

    fn save_report(&self, report: &ExtractionReport) -> Result<()> {
        if let Some(ref report_path) = self.config.output.report_path {
            let writer = ReportWriter::new(report_path.clone());
            writer.save_json(report)?;
            self.output_formatter.info(&format!(
                "Report written to {}",
                writer.report_path().display()
            ));
        }
        Ok(())
    }

    /// Generate sample configuration file
    pub fn generate_sample_config<P: AsRef<Path>>(output_path: P) -> Result<()> {
        let sample_config = Config::create_sample_config();
        std::fs::write(output_path.as_ref(), sample_config)?;
        Ok(())
    }

    pub fn output_formatter(&self) -> &OutputFormatter {
        &self.output_formatter
    }

    /// Handle error with user-friendly output
    pub fn handle_error(&self, error: &DumpSplitError) {
        self.progress_manager
            .suspend(|| self.output_formatter.print_user_friendly_error(error));
    }
}

/// Split the dump at `source` into `output_dir` with default settings.
///
/// Returns the number of sections written. Nothing is printed.
pub fn extract<S: AsRef<Path>, O: AsRef<Path>>(source: S, output_dir: O) -> Result<usize> {
    let mut config = Config::default();
    config.output.directory = output_dir.as_ref().to_path_buf();

    let dumpsplit = DumpSplit::detached(config, OutputMode::Plain, 0, true);
    let report = dumpsplit.extract(source.as_ref())?;

    Ok(report.files_extracted)
}
