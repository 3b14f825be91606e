//! Finding log documents.
//!
//! Two scopes exist on purpose. Only the orchestration directory may
//! influence a member's *current* status; old session logs would otherwise
//! make someone look busy for days. Everything else (velocity, history)
//! reads the union of all configured log directories.

use crate::config::SquadConfig;
use crate::io::DocumentSource;
use crate::log::{parse_log, LogEntry};
use crate::paths;
use crate::types::LogScope;
use std::collections::HashSet;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogFile {
    pub path: PathBuf,
    pub name: String,
}

const LOG_EXTENSIONS: &[&str] = &[".md", ".markdown"];

fn is_log_name(name: &str) -> bool {
    !name.starts_with('.') && LOG_EXTENSIONS.iter().any(|ext| name.ends_with(ext))
}

/// Markdown files directly inside `dir`. A missing directory is empty.
pub fn list_log_files(source: &dyn DocumentSource, dir: &Path) -> Vec<LogFile> {
    let Some(entries) = source.list_dir(dir) else {
        return Vec::new();
    };
    entries
        .into_iter()
        .filter(|e| !e.is_dir && is_log_name(&e.name))
        .map(|e| LogFile {
            path: dir.join(&e.name),
            name: e.name,
        })
        .collect()
}

/// Union of the log files in `dirs`, de-duplicated by path, sorted by filename.
pub fn union_log_files(source: &dyn DocumentSource, dirs: &[PathBuf]) -> Vec<LogFile> {
    let mut seen: HashSet<PathBuf> = HashSet::new();
    let mut files: Vec<LogFile> = dirs
        .iter()
        .flat_map(|d| list_log_files(source, d))
        .filter(|f| seen.insert(f.path.clone()))
        .collect();
    files.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.path.cmp(&b.path)));
    files
}

pub struct LogDiscovery<'a> {
    source: &'a dyn DocumentSource,
    status_dir: PathBuf,
    all_dirs: Vec<PathBuf>,
}

impl<'a> LogDiscovery<'a> {
    pub fn new(source: &'a dyn DocumentSource, root: &Path, config: &SquadConfig) -> Self {
        Self {
            source,
            status_dir: paths::status_log_dir(root, config),
            all_dirs: paths::all_log_dirs(root, config),
        }
    }

    /// Log files of the orchestration directory only.
    pub fn status_relevant(&self) -> Vec<LogFile> {
        union_log_files(self.source, std::slice::from_ref(&self.status_dir))
    }

    /// Log files of every configured directory.
    pub fn display_all(&self) -> Vec<LogFile> {
        union_log_files(self.source, &self.all_dirs)
    }

    pub fn files(&self, scope: LogScope) -> Vec<LogFile> {
        match scope {
            LogScope::Status => self.status_relevant(),
            LogScope::All => self.display_all(),
        }
    }

    /// Parse every file; unreadable files are skipped, siblings still parsed.
    pub fn read_entries(&self, files: &[LogFile]) -> Vec<LogEntry> {
        files
            .iter()
            .filter_map(|f| {
                let text = self.source.read_text(&f.path)?;
                Some(parse_log(&f.name, &text))
            })
            .collect()
    }

    pub fn entries(&self, scope: LogScope) -> Vec<LogEntry> {
        self.read_entries(&self.files(scope))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::FsSource;
    use tempfile::TempDir;

    fn setup() -> (TempDir, SquadConfig) {
        let dir = TempDir::new().unwrap();
        let cfg = SquadConfig::default();
        let orch = dir.path().join(".ai-team/orchestration-log");
        let log = dir.path().join(".ai-team/log");
        std::fs::create_dir_all(&orch).unwrap();
        std::fs::create_dir_all(&log).unwrap();
        std::fs::write(orch.join("2026-02-14T0900-route.md"), "| **Agent routed** | Fury (Lead) |").unwrap();
        std::fs::write(log.join("2026-02-10-old-session.md"), "**Participants:** Banner").unwrap();
        std::fs::write(log.join("2026-02-12-later.md"), "**Participants:** Carol").unwrap();
        std::fs::write(log.join("README.txt"), "not a log").unwrap();
        std::fs::write(log.join(".hidden.md"), "hidden").unwrap();
        std::fs::create_dir_all(log.join("nested.md")).unwrap();
        (dir, cfg)
    }

    #[test]
    fn status_relevant_reads_only_orchestration_dir() {
        let (dir, cfg) = setup();
        let discovery = LogDiscovery::new(&FsSource, dir.path(), &cfg);
        let names: Vec<_> = discovery.status_relevant().into_iter().map(|f| f.name).collect();
        assert_eq!(names, vec!["2026-02-14T0900-route.md"]);
    }

    #[test]
    fn display_all_is_sorted_union() {
        let (dir, cfg) = setup();
        let discovery = LogDiscovery::new(&FsSource, dir.path(), &cfg);
        let names: Vec<_> = discovery.display_all().into_iter().map(|f| f.name).collect();
        assert_eq!(
            names,
            vec![
                "2026-02-10-old-session.md",
                "2026-02-12-later.md",
                "2026-02-14T0900-route.md",
            ]
        );
    }

    #[test]
    fn duplicate_directories_do_not_duplicate_files() {
        let (dir, _) = setup();
        let cfg = SquadConfig {
            session_log_dirs: vec!["log".to_string(), "log".to_string()],
            ..SquadConfig::default()
        };
        let discovery = LogDiscovery::new(&FsSource, dir.path(), &cfg);
        assert_eq!(discovery.display_all().len(), 3);
    }

    #[test]
    fn missing_directories_are_empty() {
        let dir = TempDir::new().unwrap();
        let discovery = LogDiscovery::new(&FsSource, dir.path(), &SquadConfig::default());
        assert!(discovery.status_relevant().is_empty());
        assert!(discovery.entries(LogScope::All).is_empty());
    }

    #[test]
    fn entries_parse_each_file() {
        let (dir, cfg) = setup();
        let discovery = LogDiscovery::new(&FsSource, dir.path(), &cfg);
        let entries = discovery.entries(LogScope::All);
        let firsts: Vec<_> = entries.iter().map(|e| e.participants[0].as_str()).collect();
        assert_eq!(firsts, vec!["Banner", "Carol", "Fury"]);
    }
}
