//! Read-only document access.
//!
//! The engine never touches the filesystem directly: every read goes through
//! a `DocumentSource`, so hosts can substitute their own storage and tests
//! can script exactly what each read returns. Every method answers `None`
//! for "absent or unreadable"; the engine treats both as empty input.

use crate::text::normalize_eol;
use std::collections::BTreeMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirEntry {
    pub name: String,
    pub is_dir: bool,
}

pub trait DocumentSource {
    /// Full text of the document with line endings normalized.
    fn read_text(&self, path: &Path) -> Option<String>;

    /// Entries of a directory, sorted by name.
    fn list_dir(&self, path: &Path) -> Option<Vec<DirEntry>>;

    /// Last modification time of a file.
    fn modified(&self, path: &Path) -> Option<SystemTime>;
}

/// `DocumentSource` over the local filesystem.
#[derive(Debug, Clone, Copy, Default)]
pub struct FsSource;

impl DocumentSource for FsSource {
    fn read_text(&self, path: &Path) -> Option<String> {
        match std::fs::read(path) {
            Ok(bytes) => Some(normalize_eol(&String::from_utf8_lossy(&bytes))),
            Err(e) => {
                report(path, &e);
                None
            }
        }
    }

    fn list_dir(&self, path: &Path) -> Option<Vec<DirEntry>> {
        let rd = match std::fs::read_dir(path) {
            Ok(rd) => rd,
            Err(e) => {
                report(path, &e);
                return None;
            }
        };
        let mut entries = Vec::new();
        for entry in rd {
            let entry = match entry {
                Ok(e) => e,
                Err(e) => {
                    report(path, &e);
                    continue;
                }
            };
            let is_dir = entry.file_type().map(|t| t.is_dir()).unwrap_or(false);
            entries.push(DirEntry {
                name: entry.file_name().to_string_lossy().into_owned(),
                is_dir,
            });
        }
        entries.sort_by(|a, b| a.name.cmp(&b.name));
        Some(entries)
    }

    fn modified(&self, path: &Path) -> Option<SystemTime> {
        match std::fs::metadata(path).and_then(|m| m.modified()) {
            Ok(t) => Some(t),
            Err(e) => {
                report(path, &e);
                None
            }
        }
    }
}

/// Missing resources are routine; anything else is worth a warning.
fn report(path: &Path, e: &std::io::Error) {
    if e.kind() != ErrorKind::NotFound {
        tracing::warn!(path = %path.display(), error = %e, "skipping unreadable path");
    }
}

// ---------------------------------------------------------------------------
// MemorySource
// ---------------------------------------------------------------------------

/// In-memory `DocumentSource` for hosts that already hold document text.
/// Directories are implied by the paths of the files inserted under them.
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    files: BTreeMap<PathBuf, String>,
    modified: BTreeMap<PathBuf, SystemTime>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, path: impl Into<PathBuf>, text: &str) -> &mut Self {
        let path = path.into();
        self.modified.entry(path.clone()).or_insert(SystemTime::UNIX_EPOCH);
        self.files.insert(path, normalize_eol(text));
        self
    }

    /// Set a file's modification time, creating it empty if absent.
    pub fn touch(&mut self, path: impl Into<PathBuf>, at: SystemTime) -> &mut Self {
        let path = path.into();
        self.files.entry(path.clone()).or_default();
        self.modified.insert(path, at);
        self
    }
}

impl DocumentSource for MemorySource {
    fn read_text(&self, path: &Path) -> Option<String> {
        self.files.get(path).cloned()
    }

    fn list_dir(&self, path: &Path) -> Option<Vec<DirEntry>> {
        let mut entries: BTreeMap<String, bool> = BTreeMap::new();
        for file in self.files.keys() {
            let Ok(rest) = file.strip_prefix(path) else {
                continue;
            };
            let mut parts = rest.components();
            let Some(first) = parts.next() else { continue };
            let is_dir = parts.next().is_some();
            let name = first.as_os_str().to_string_lossy().into_owned();
            *entries.entry(name).or_insert(false) |= is_dir;
        }
        if entries.is_empty() {
            return None;
        }
        Some(
            entries
                .into_iter()
                .map(|(name, is_dir)| DirEntry { name, is_dir })
                .collect(),
        )
    }

    fn modified(&self, path: &Path) -> Option<SystemTime> {
        self.modified.get(path).copied()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn read_text_normalizes_line_endings() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("a.md");
        std::fs::write(&path, b"one\r\ntwo\rthree").unwrap();
        assert_eq!(FsSource.read_text(&path).unwrap(), "one\ntwo\nthree");
    }

    #[test]
    fn missing_paths_are_none() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("nope");
        assert!(FsSource.read_text(&missing).is_none());
        assert!(FsSource.list_dir(&missing).is_none());
        assert!(FsSource.modified(&missing).is_none());
    }

    #[test]
    fn list_dir_sorted_with_kinds() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("b.md"), "").unwrap();
        std::fs::write(dir.path().join("a.md"), "").unwrap();
        std::fs::create_dir(dir.path().join("sub")).unwrap();
        let entries = FsSource.list_dir(dir.path()).unwrap();
        let names: Vec<_> = entries.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["a.md", "b.md", "sub"]);
        assert!(entries[2].is_dir);
        assert!(!entries[0].is_dir);
    }

    #[test]
    fn memory_source_implies_directories() {
        let mut src = MemorySource::new();
        src.insert("/t/a.md", "x\r\ny")
            .insert("/t/sub/b.md", "")
            .touch("/t/m", SystemTime::UNIX_EPOCH);
        assert_eq!(src.read_text(Path::new("/t/a.md")).unwrap(), "x\ny");
        let entries = src.list_dir(Path::new("/t")).unwrap();
        let names: Vec<_> = entries.iter().map(|e| (e.name.as_str(), e.is_dir)).collect();
        assert_eq!(names, vec![("a.md", false), ("m", false), ("sub", true)]);
        assert!(src.list_dir(Path::new("/missing")).is_none());
        assert_eq!(src.modified(Path::new("/t/m")), Some(SystemTime::UNIX_EPOCH));
    }
}
