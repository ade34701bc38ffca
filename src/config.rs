use crate::error::{DumpSplitError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub extraction: ExtractionConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ExtractionConfig {
    /// Minimum run of '=' characters on each delimiter line.
    pub min_delimiter_len: usize,
    pub marker_keyword: String,
    pub path_policy: PathPolicy,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct OutputConfig {
    pub directory: PathBuf,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub report_path: Option<PathBuf>,
}

/// How marker paths that point outside the output directory are treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PathPolicy {
    /// Join the marker path onto the output directory as-is.
    #[default]
    Permissive,
    /// Reject absolute paths and `..` components.
    Strict,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            min_delimiter_len: 10,
            marker_keyword: "FILE:".to_string(),
            path_policy: PathPolicy::Permissive,
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            directory: PathBuf::from("."),
            report_path: None,
        }
    }
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(DumpSplitError::Config {
                message: format!("Configuration file not found: {}", path.display()),
            });
        }

        let content = std::fs::read_to_string(path).map_err(|e| DumpSplitError::Config {
            message: format!("Failed to read config file {}: {}", path.display(), e),
        })?;

        let config: Config = toml::from_str(&content).map_err(|e| DumpSplitError::Config {
            message: format!("Failed to parse config file {}: {}", path.display(), e),
        })?;

        Ok(config)
    }

    pub fn load_with_defaults<P: AsRef<Path>>(config_path: Option<P>) -> Result<Self> {
        match config_path {
            Some(path) => Self::load_from_file(path),
            None => {
                let default_paths = ["dumpsplit.toml", ".dumpsplit.toml"];

                for default_path in &default_paths {
                    if Path::new(default_path).exists() {
                        return Self::load_from_file(default_path);
                    }
                }

                Ok(Self::default())
            }
        }
    }

    pub fn merge_with_cli_args(&mut self, cli_args: &CliOverrides) {
        if let Some(ref output_dir) = cli_args.output_dir {
            self.output.directory = output_dir.clone();
        }

        if let Some(ref report_path) = cli_args.report_path {
            self.output.report_path = Some(report_path.clone());
        }

        if let Some(min_len) = cli_args.min_delimiter_len {
            self.extraction.min_delimiter_len = min_len;
        }

        if cli_args.strict_paths {
            self.extraction.path_policy = PathPolicy::Strict;
        }
    }

    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let content = toml::to_string_pretty(self).map_err(|e| DumpSplitError::Config {
            message: format!("Failed to serialize config: {}", e),
        })?;

        std::fs::write(path, content).map_err(|e| DumpSplitError::Config {
            message: format!("Failed to write config file {}: {}", path.display(), e),
        })?;

        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.extraction.min_delimiter_len == 0 {
            return Err(DumpSplitError::Config {
                message: "Minimum delimiter length must be greater than 0".to_string(),
            });
        }

        let keyword = &self.extraction.marker_keyword;
        if keyword.trim().is_empty() {
            return Err(DumpSplitError::Config {
                message: "Marker keyword must not be empty".to_string(),
            });
        }

        if keyword.contains('\n') || keyword.contains('\r') {
            return Err(DumpSplitError::Config {
                message: "Marker keyword must fit on a single line".to_string(),
            });
        }

        if self.output.directory.as_os_str().is_empty() {
            return Err(DumpSplitError::Config {
                message: "Output directory must not be empty".to_string(),
            });
        }

        Ok(())
    }

    pub fn create_sample_config() -> String {
        let sample_config = Self::default();
        toml::to_string_pretty(&sample_config).unwrap_or_else(|_| String::new())
    }
}

#[derive(Debug, Default)]
pub struct CliOverrides {
    pub output_dir: Option<PathBuf>,
    pub report_path: Option<PathBuf>,
    pub min_delimiter_len: Option<usize>,
    pub strict_paths: bool,
}

impl CliOverrides {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_output_dir(mut self, output_dir: Option<PathBuf>) -> Self {
        self.output_dir = output_dir;
        self
    }

    pub fn with_report_path(mut self, report_path: Option<PathBuf>) -> Self {
        self.report_path = report_path;
        self
    }

    pub fn with_min_delimiter_len(mut self, min_len: Option<usize>) -> Self {
        self.min_delimiter_len = min_len;
        self
    }

    pub fn with_strict_paths(mut self, strict: bool) -> Self {
        self.strict_paths = strict;
        self
    }
}
