use crate::error::{DumpSplitError, Result};
use crate::extractor::{ExtractionProgress, WrittenFile};
use crate::parser::ParsedDump;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractionReport {
    pub source: PathBuf,
    pub output_directory: PathBuf,
    pub dry_run: bool,
    pub files_extracted: usize,
    pub bytes_written: u64,
    pub preamble_bytes: u64,
    pub files: Vec<WrittenFile>,
    pub overwritten_paths: Vec<String>,
    pub extraction_time: DateTime<Utc>,
    pub extraction_duration: Duration,
}

impl ExtractionReport {
    pub fn from_progress(
        source: &Path,
        output_directory: &Path,
        parsed: &ParsedDump<'_>,
        progress: &ExtractionProgress,
    ) -> Self {
        Self {
            source: source.to_path_buf(),
            output_directory: output_directory.to_path_buf(),
            dry_run: false,
            files_extracted: progress.files_processed,
            bytes_written: progress.bytes_processed,
            preamble_bytes: parsed.preamble.len() as u64,
            files: progress.written.clone(),
            overwritten_paths: progress.overwritten.clone(),
            extraction_time: Utc::now(),
            extraction_duration: progress.elapsed(),
        }
    }

    /// Describes what a run would write without touching the filesystem.
    pub fn planned(source: &Path, output_directory: &Path, parsed: &ParsedDump<'_>) -> Self {
        let stats = parsed.statistics();
        let files = parsed
            .records
            .iter()
            .map(|record| WrittenFile {
                relative_path: record.relative_path.to_string(),
                destination: output_directory.join(record.relative_path),
                bytes: record.output_len(),
            })
            .collect();

        Self {
            source: source.to_path_buf(),
            output_directory: output_directory.to_path_buf(),
            dry_run: true,
            files_extracted: stats.total_records,
            bytes_written: stats.total_bytes,
            preamble_bytes: stats.preamble_bytes,
            files,
            overwritten_paths: stats.duplicate_paths,
            extraction_time: Utc::now(),
            extraction_duration: Duration::ZERO,
        }
    }

    /// One-line summary printed after a successful run.
    pub fn summary_line(&self) -> String {
        if self.dry_run {
            format!(
                "Would extract {} files to {}",
                self.files_extracted,
                self.output_directory.display()
            )
        } else {
            format!(
                "Extracted {} files to {}",
                self.files_extracted,
                self.output_directory.display()
            )
        }
    }
}

pub struct ReportWriter {
    report_path: PathBuf,
}

impl ReportWriter {
    pub fn new<P: Into<PathBuf>>(report_path: P) -> Self {
        Self {
            report_path: report_path.into(),
        }
    }

    pub fn save_json(&self, report: &ExtractionReport) -> Result<()> {
        if let Some(parent) = self.report_path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|e| DumpSplitError::OutputWrite {
                    path: parent.display().to_string(),
                    source: e,
                })?;
            }
        }

        let json_content =
            serde_json::to_string_pretty(report).map_err(|e| DumpSplitError::Config {
                message: format!("Failed to serialize report to JSON: {}", e),
            })?;

        fs::write(&self.report_path, json_content).map_err(|e| DumpSplitError::OutputWrite {
            path: self.report_path.display().to_string(),
            source: e,
        })?;

        Ok(())
    }

    pub fn report_path(&self) -> &Path {
        &self.report_path
    }
}
