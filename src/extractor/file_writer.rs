use crate::config::PathPolicy;
use crate::error::{DumpSplitError, Result};
use crate::parser::FileRecord;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::io::{BufWriter, Write};
use std::path::{Component, Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WrittenFile {
    pub relative_path: String,
    pub destination: PathBuf,
    pub bytes: u64,
}

#[derive(Debug, Clone)]
pub struct ExtractionProgress {
    pub files_processed: usize,
    pub total_files: usize,
    pub bytes_processed: u64,
    pub current_file: Option<String>,
    pub start_time: Instant,
    pub written: Vec<WrittenFile>,
    /// Paths written more than once in this run; the later section won.
    pub overwritten: Vec<String>,
}

impl ExtractionProgress {
    pub fn new(total_files: usize) -> Self {
        Self {
            files_processed: 0,
            total_files,
            bytes_processed: 0,
            current_file: None,
            start_time: Instant::now(),
            written: Vec::new(),
            overwritten: Vec::new(),
        }
    }

    pub fn update_file(&mut self, file: WrittenFile) {
        self.files_processed += 1;
        self.bytes_processed += file.bytes;
        self.current_file = Some(file.relative_path.clone());
        self.written.push(file);
    }

    pub fn add_overwrite<S: Into<String>>(&mut self, path: S) {
        self.overwritten.push(path.into());
    }

    pub fn elapsed(&self) -> Duration {
        self.start_time.elapsed()
    }
}

/// Materializes parsed records under an output root.
///
/// Records are written in order and a later record with the same path
/// replaces the earlier file. The first failure aborts the run; files
/// already written are left in place.
pub struct FileWriter {
    path_policy: PathPolicy,
    buffer_size: usize,
    running: Option<Arc<AtomicBool>>,
}

impl FileWriter {
    pub fn new() -> Self {
        Self {
            path_policy: PathPolicy::Permissive,
            buffer_size: 64 * 1024, // 64KB buffer
            running: None,
        }
    }

    pub fn with_path_policy(mut self, policy: PathPolicy) -> Self {
        self.path_policy = policy;
        self
    }

    /// Stop between files once `running` flips to false.
    pub fn with_cancel_flag(mut self, running: Arc<AtomicBool>) -> Self {
        self.running = Some(running);
        self
    }

    pub fn write_records(
        &self,
        records: &[FileRecord<'_>],
        output_root: &Path,
        progress_callback: Option<&dyn Fn(&ExtractionProgress)>,
    ) -> Result<ExtractionProgress> {
        let mut progress = ExtractionProgress::new(records.len());
        let mut seen: HashSet<PathBuf> = HashSet::new();

        for record in records {
            self.check_cancelled()?;

            if let Some(callback) = progress_callback {
                callback(&progress);
            }

            let written = self.write_record(record, output_root)?;
            let key = record.normalized_path();
            if seen.contains(&key) {
                progress.add_overwrite(key.display().to_string());
            } else {
                seen.insert(key);
            }
            progress.update_file(written);
        }

        if let Some(callback) = progress_callback {
            callback(&progress);
        }

        Ok(progress)
    }

    pub fn write_record(&self, record: &FileRecord<'_>, output_root: &Path) -> Result<WrittenFile> {
        let dest_path = self.resolve_destination(record.relative_path, output_root)?;

        if let Some(parent) = dest_path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|e| DumpSplitError::OutputWrite {
                    path: parent.display().to_string(),
                    source: e,
                })?;
            }
        }

        let bytes = self
            .write_content(&dest_path, record)
            .map_err(|e| DumpSplitError::OutputWrite {
                path: dest_path.display().to_string(),
                source: e,
            })?;

        Ok(WrittenFile {
            relative_path: record.relative_path.to_string(),
            destination: dest_path,
            bytes,
        })
    }

    /// Joins `relative_path` onto `output_root` after applying the path policy.
    pub fn resolve_destination(&self, relative_path: &str, output_root: &Path) -> Result<PathBuf> {
        if relative_path.is_empty() {
            return Err(DumpSplitError::InvalidPath {
                path: relative_path.to_string(),
            });
        }

        let relative = Path::new(relative_path);
        if self.path_policy == PathPolicy::Strict {
            validate_contained_path(relative)?;
        }

        Ok(output_root.join(relative))
    }

    fn write_content(&self, dest: &Path, record: &FileRecord<'_>) -> std::io::Result<u64> {
        let file = fs::File::create(dest)?;
        let mut writer = BufWriter::with_capacity(self.buffer_size, file);

        writer.write_all(record.content.as_bytes())?;
        let mut total_bytes = record.content.len() as u64;

        if record.needs_trailing_newline() {
            writer.write_all(b"\n")?;
            total_bytes += 1;
        }

        writer.flush()?;
        Ok(total_bytes)
    }

    fn check_cancelled(&self) -> Result<()> {
        match &self.running {
            Some(running) if !running.load(Ordering::SeqCst) => Err(DumpSplitError::Cancelled),
            _ => Ok(()),
        }
    }
}

impl Default for FileWriter {
    fn default() -> Self {
        Self::new()
    }
}

/// Rejects paths that would land outside the directory they are joined onto.
pub fn validate_contained_path(path: &Path) -> Result<()> {
    let escapes = path.is_absolute()
        || path.components().any(|c| {
            matches!(
                c,
                Component::ParentDir | Component::RootDir | Component::Prefix(_)
            )
        });

    if escapes {
        return Err(DumpSplitError::UnsafePath {
            path: path.display().to_string(),
        });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_write_records_creates_files() {
        let dest_dir = TempDir::new().unwrap();
        let records = vec![
            FileRecord::new("a.txt", "hello"),
            FileRecord::new("dir/b.txt", "world"),
        ];

        let progress = FileWriter::new()
            .write_records(&records, dest_dir.path(), None)
            .unwrap();

        assert_eq!(progress.files_processed, 2);
        assert_eq!(progress.bytes_processed, 12);
        assert_eq!(
            fs::read_to_string(dest_dir.path().join("a.txt")).unwrap(),
            "hello\n"
        );
        assert_eq!(
            fs::read_to_string(dest_dir.path().join("dir").join("b.txt")).unwrap(),
            "world\n"
        );
    }

    #[test]
    fn test_nested_directories_created() {
        let dest_dir = TempDir::new().unwrap();
        let record = FileRecord::new("src/lib/util.ext", "x");

        FileWriter::new().write_record(&record, dest_dir.path()).unwrap();

        assert!(dest_dir.path().join("src").is_dir());
        assert!(dest_dir.path().join("src").join("lib").is_dir());
        assert!(dest_dir.path().join("src/lib/util.ext").is_file());
    }

    #[test]
    fn test_empty_content_writes_empty_file() {
        let dest_dir = TempDir::new().unwrap();
        let record = FileRecord::new("empty.txt", "\n\n");

        let written = FileWriter::new().write_record(&record, dest_dir.path()).unwrap();

        assert_eq!(written.bytes, 0);
        assert_eq!(fs::read(dest_dir.path().join("empty.txt")).unwrap(), b"");
    }

    #[test]
    fn test_last_write_wins() {
        let dest_dir = TempDir::new().unwrap();
        let records = vec![
            FileRecord::new("same.txt", "first"),
            FileRecord::new("same.txt", "second"),
        ];

        let progress = FileWriter::new()
            .write_records(&records, dest_dir.path(), None)
            .unwrap();

        assert_eq!(progress.files_processed, 2);
        assert_eq!(progress.overwritten, vec!["same.txt".to_string()]);
        assert_eq!(
            fs::read_to_string(dest_dir.path().join("same.txt")).unwrap(),
            "second\n"
        );
    }

    #[test]
    fn test_current_dir_prefix_counts_as_overwrite() {
        let dest_dir = TempDir::new().unwrap();
        let records = vec![
            FileRecord::new("a.txt", "first"),
            FileRecord::new("./a.txt", "second"),
        ];

        let progress = FileWriter::new()
            .write_records(&records, dest_dir.path(), None)
            .unwrap();

        assert_eq!(progress.overwritten, vec!["a.txt".to_string()]);
        assert_eq!(
            fs::read_to_string(dest_dir.path().join("a.txt")).unwrap(),
            "second\n"
        );
    }

    #[test]
    fn test_existing_file_is_truncated() {
        let dest_dir = TempDir::new().unwrap();
        let target = dest_dir.path().join("old.txt");
        fs::write(&target, "a much longer previous body\n").unwrap();

        FileWriter::new()
            .write_record(&FileRecord::new("old.txt", "new"), dest_dir.path())
            .unwrap();

        assert_eq!(fs::read_to_string(target).unwrap(), "new\n");
    }

    #[test]
    fn test_permissive_policy_allows_parent_paths() {
        let root = TempDir::new().unwrap();
        let output = root.path().join("out");

        FileWriter::new()
            .write_record(&FileRecord::new("../escaped.txt", "x"), &output)
            .unwrap();

        assert!(root.path().join("escaped.txt").exists());
    }

    #[test]
    fn test_strict_policy_rejects_unsafe_paths() {
        let dest_dir = TempDir::new().unwrap();
        let writer = FileWriter::new().with_path_policy(PathPolicy::Strict);

        let result = writer.write_record(&FileRecord::new("../escaped.txt", "x"), dest_dir.path());
        assert!(matches!(result, Err(DumpSplitError::UnsafePath { .. })));

        let result = writer.resolve_destination("/etc/passwd", dest_dir.path());
        assert!(matches!(result, Err(DumpSplitError::UnsafePath { .. })));

        assert!(writer.resolve_destination("ok/inner.txt", dest_dir.path()).is_ok());
        assert!(!dest_dir.path().parent().unwrap().join("escaped.txt").exists());
    }

    #[test]
    fn test_empty_path_is_rejected() {
        let dest_dir = TempDir::new().unwrap();
        let result = FileWriter::new().write_record(&FileRecord::new("   ", "x"), dest_dir.path());
        assert!(matches!(result, Err(DumpSplitError::InvalidPath { .. })));
    }

    #[test]
    fn test_write_failure_keeps_earlier_files() {
        let dest_dir = TempDir::new().unwrap();
        // A regular file where a directory is needed makes the second write fail.
        let records = vec![
            FileRecord::new("blocker", "plain file"),
            FileRecord::new("blocker/child.txt", "x"),
            FileRecord::new("never.txt", "y"),
        ];

        let result = FileWriter::new().write_records(&records, dest_dir.path(), None);

        assert!(matches!(result, Err(DumpSplitError::OutputWrite { .. })));
        assert!(dest_dir.path().join("blocker").is_file());
        assert!(!dest_dir.path().join("never.txt").exists());
    }

    #[test]
    fn test_cancel_flag_stops_before_writing() {
        let dest_dir = TempDir::new().unwrap();
        let running = Arc::new(AtomicBool::new(false));
        let writer = FileWriter::new().with_cancel_flag(running);

        let result = writer.write_records(&[FileRecord::new("a.txt", "x")], dest_dir.path(), None);

        assert!(matches!(result, Err(DumpSplitError::Cancelled)));
        assert!(!dest_dir.path().join("a.txt").exists());
    }

    #[test]
    fn test_progress_tracking() {
        let mut progress = ExtractionProgress::new(4);
        assert_eq!(progress.files_processed, 0);

        progress.update_file(WrittenFile {
            relative_path: "a.txt".to_string(),
            destination: PathBuf::from("out/a.txt"),
            bytes: 25,
        });

        assert_eq!(progress.files_processed, 1);
        assert_eq!(progress.bytes_processed, 25);
        assert_eq!(progress.current_file.as_deref(), Some("a.txt"));
    }
}
