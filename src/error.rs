use thiserror::Error;

#[derive(Error, Debug)]
pub enum DumpSplitError {
    #[error("Failed to read source document {path}: {source}")]
    SourceRead {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write output {path}: {source}")]
    OutputWrite {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("IO operation failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid file path: {path}")]
    InvalidPath { path: String },

    #[error("Unsafe file path rejected: {path}")]
    UnsafePath { path: String },

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Operation was cancelled by user")]
    Cancelled,
}

impl DumpSplitError {
    /// Process exit status for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            DumpSplitError::Cancelled => 130, // Interrupted (SIGINT)
            DumpSplitError::SourceRead { .. } => 3,
            DumpSplitError::OutputWrite { .. } => 4,
            DumpSplitError::InvalidPath { .. } | DumpSplitError::UnsafePath { .. } => 5,
            _ => 1,
        }
    }
}

pub trait UserFriendlyError {
    fn user_message(&self) -> String;
    fn suggestion(&self) -> Option<String>;
}

impl UserFriendlyError for DumpSplitError {
    fn user_message(&self) -> String {
        match self {
            DumpSplitError::SourceRead { path, source } => {
                format!("Could not read source document {}: {}", path, source)
            }
            DumpSplitError::OutputWrite { path, source } => {
                format!("Could not write {}: {}", path, source)
            }
            DumpSplitError::InvalidPath { path } => {
                format!("Invalid file path in marker: {:?}", path)
            }
            DumpSplitError::UnsafePath { path } => {
                format!("Refusing to write outside the output directory: {}", path)
            }
            DumpSplitError::Config { message } => {
                format!("Configuration error: {}", message)
            }
            DumpSplitError::Cancelled => "Operation was cancelled by user".to_string(),
            _ => self.to_string(),
        }
    }

    fn suggestion(&self) -> Option<String> {
        match self {
            DumpSplitError::SourceRead { .. } => Some(
                "Check that the source file exists, is readable, and is valid UTF-8 text.".to_string()
            ),
            DumpSplitError::OutputWrite { .. } => Some(
                "Ensure you have write permission for the output directory and enough free disk space. Files written before the failure were kept.".to_string()
            ),
            DumpSplitError::InvalidPath { .. } => Some(
                "Every 'FILE:' marker line must name a non-empty path.".to_string()
            ),
            DumpSplitError::UnsafePath { .. } => Some(
                "Remove --strict-paths (or set path_policy = \"permissive\") to allow absolute and '..' paths.".to_string()
            ),
            DumpSplitError::Config { .. } => Some(
                "Check your configuration file syntax and ensure all values are valid.".to_string()
            ),
            _ => None,
        }
    }
}

impl From<toml::de::Error> for DumpSplitError {
    fn from(error: toml::de::Error) -> Self {
        DumpSplitError::Config {
            message: error.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, DumpSplitError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn test_user_friendly_messages() {
        let error = DumpSplitError::SourceRead {
            path: "dump.txt".to_string(),
            source: io::Error::new(io::ErrorKind::NotFound, "not found"),
        };
        assert!(error.user_message().contains("dump.txt"));
        assert!(error.suggestion().is_some());

        assert!(DumpSplitError::Cancelled.suggestion().is_none());
    }

    #[test]
    fn test_exit_codes() {
        let read = DumpSplitError::SourceRead {
            path: "x".to_string(),
            source: io::Error::new(io::ErrorKind::NotFound, "gone"),
        };
        let write = DumpSplitError::OutputWrite {
            path: "y".to_string(),
            source: io::Error::new(io::ErrorKind::PermissionDenied, "denied"),
        };

        assert_eq!(read.exit_code(), 3);
        assert_eq!(write.exit_code(), 4);
        assert_eq!(DumpSplitError::UnsafePath { path: "../x".into() }.exit_code(), 5);
        assert_eq!(DumpSplitError::Cancelled.exit_code(), 130);
        assert_eq!(DumpSplitError::Config { message: "bad".into() }.exit_code(), 1);
    }

    #[test]
    fn test_toml_error_conversion() {
        let toml_error = toml::from_str::<toml::Table>("not = [valid").unwrap_err();
        let error = DumpSplitError::from(toml_error);
        assert!(matches!(error, DumpSplitError::Config { .. }));
    }
}
