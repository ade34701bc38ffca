use crate::config::ExtractionConfig;
use crate::error::{DumpSplitError, Result};
use crate::ui::output::format_bytes;
use regex::Regex;
use std::collections::HashMap;
use std::path::{Component, Path, PathBuf};

/// One marker section: the declared path and the text that follows it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileRecord<'a> {
    pub relative_path: &'a str,
    pub content: &'a str,
}

impl<'a> FileRecord<'a> {
    /// Builds a record from the raw capture and the raw section body.
    ///
    /// The path loses surrounding whitespace; the body loses leading and
    /// trailing `\n` only, so trailing spaces survive. Line endings are
    /// expected to be normalized already (see [`normalize_line_endings`]).
    pub fn new(raw_path: &'a str, raw_content: &'a str) -> Self {
        Self {
            relative_path: raw_path.trim(),
            content: raw_content.trim_matches('\n'),
        }
    }

    /// Size of the file this record produces, including the added newline.
    pub fn output_len(&self) -> u64 {
        let len = self.content.len() as u64;
        if self.needs_trailing_newline() {
            len + 1
        } else {
            len
        }
    }

    pub fn needs_trailing_newline(&self) -> bool {
        !self.content.is_empty() && !self.content.ends_with('\n')
    }

    /// The declared path with `.` components removed.
    ///
    /// Records with equal normalized paths write the same output file.
    pub fn normalized_path(&self) -> PathBuf {
        Path::new(self.relative_path)
            .components()
            .filter(|c| !matches!(c, Component::CurDir))
            .collect()
    }
}

/// Converts `\r\n` and lone `\r` line endings to `\n`.
pub fn normalize_line_endings(text: String) -> String {
    if !text.contains('\r') {
        return text;
    }
    text.replace("\r\n", "\n").replace('\r', "\n")
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedDump<'a> {
    pub preamble: &'a str,
    pub records: Vec<FileRecord<'a>>,
}

impl<'a> ParsedDump<'a> {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn statistics(&self) -> ParseStatistics {
        let mut occurrences: HashMap<PathBuf, usize> = HashMap::new();
        for record in &self.records {
            *occurrences.entry(record.normalized_path()).or_insert(0) += 1;
        }

        let mut duplicate_paths: Vec<String> = occurrences
            .into_iter()
            .filter(|(_, count)| *count > 1)
            .map(|(path, _)| path.display().to_string())
            .collect();
        duplicate_paths.sort();

        ParseStatistics {
            total_records: self.records.len(),
            total_bytes: self.records.iter().map(FileRecord::output_len).sum(),
            preamble_bytes: self.preamble.len() as u64,
            duplicate_paths,
        }
    }
}

/// Splits a dump on three-line `=====` / `FILE: path` / `=====` markers.
pub struct DumpParser {
    marker: Regex,
}

impl DumpParser {
    pub fn new(config: &ExtractionConfig) -> Result<Self> {
        let marker = build_marker_pattern(config.min_delimiter_len, &config.marker_keyword)?;
        Ok(Self { marker })
    }

    pub fn parse<'a>(&self, document: &'a str) -> ParsedDump<'a> {
        let mut records = Vec::new();
        let mut preamble_end = document.len();
        let mut pending: Option<(&'a str, usize)> = None;

        for captures in self.marker.captures_iter(document) {
            let (Some(whole), Some(path)) = (captures.get(0), captures.get(1)) else {
                continue;
            };

            match pending.take() {
                Some((prev_path, body_start)) => {
                    records.push(FileRecord::new(prev_path, &document[body_start..whole.start()]));
                }
                None => preamble_end = whole.start(),
            }

            pending = Some((path.as_str(), whole.end()));
        }

        if let Some((path, body_start)) = pending {
            records.push(FileRecord::new(path, &document[body_start..]));
        }

        ParsedDump {
            preamble: &document[..preamble_end],
            records,
        }
    }
}

fn build_marker_pattern(min_len: usize, keyword: &str) -> Result<Regex> {
    let pattern = format!(
        r"(?m)^={{{min},}}\n{keyword}\s+(.+)\n={{{min},}}$",
        min = min_len,
        keyword = regex::escape(keyword),
    );

    Regex::new(&pattern).map_err(|e| DumpSplitError::Config {
        message: format!("Invalid marker pattern: {}", e),
    })
}

#[derive(Debug, Default)]
pub struct ParseStatistics {
    pub total_records: usize,
    pub total_bytes: u64,
    pub preamble_bytes: u64,
    pub duplicate_paths: Vec<String>,
}

impl ParseStatistics {
    pub fn display_summary(&self) -> String {
        let mut summary = format!(
            "Parse Results:\n  Sections: {}\n  Content size: {}\n  Preamble size: {}\n",
            self.total_records,
            format_bytes(self.total_bytes),
            format_bytes(self.preamble_bytes)
        );

        if !self.duplicate_paths.is_empty() {
            summary.push_str("  Declared more than once (last one wins):\n");
            for path in &self.duplicate_paths {
                summary.push_str(&format!("    {}\n", path));
            }
        }

        summary
    }
}
