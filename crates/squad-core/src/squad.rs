use crate::config::SquadConfig;
use crate::decision::{load_decisions, DecisionEntry};
use crate::discovery::LogDiscovery;
use crate::error::Result;
use crate::io::{DocumentSource, FsSource};
use crate::log::LogEntry;
use crate::paths;
use crate::roster::{Member, Roster, RosterResolver};
use crate::status::{overlay, FreshMarkers, PreviousStatus};
use crate::task::{derive_tasks_with, TaskDerivation};
use crate::types::LogScope;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

/// One squad checkout: a project root, its configuration, and the source
/// documents are read through. Every call reads afresh; see `SquadCache`
/// for memoized access.
pub struct Squad {
    root: PathBuf,
    config: SquadConfig,
    source: Box<dyn DocumentSource>,
}

impl Squad {
    /// Open `root` on the local filesystem, loading `.ai-team/config.yaml` if present.
    pub fn open(root: &Path) -> Result<Self> {
        let config = SquadConfig::load(root)?;
        Ok(Self::with_source(root, config, FsSource))
    }

    pub fn with_source(root: &Path, config: SquadConfig, source: impl DocumentSource + 'static) -> Self {
        Self {
            root: root.to_path_buf(),
            config,
            source: Box::new(source),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn config(&self) -> &SquadConfig {
        &self.config
    }

    pub fn discovery(&self) -> LogDiscovery<'_> {
        LogDiscovery::new(self.source.as_ref(), &self.root, &self.config)
    }

    pub fn log_entries(&self, scope: LogScope) -> Vec<LogEntry> {
        self.discovery().entries(scope)
    }

    pub fn tasks(&self, scope: LogScope) -> TaskDerivation {
        derive_tasks_with(&self.log_entries(scope), self.config.title_max_len)
    }

    /// Roster members with placeholder status. Log participants, the last
    /// tier, come from display-all discovery.
    pub fn roster(&self) -> Roster {
        RosterResolver::new(self.source.as_ref(), &self.root, &self.config)
            .resolve(|| self.log_entries(LogScope::All))
    }

    pub fn markers(&self, now: SystemTime) -> FreshMarkers {
        FreshMarkers::scan(
            self.source.as_ref(),
            &paths::markers_dir(&self.root, &self.config),
            now,
            self.config.marker_staleness(),
        )
    }

    /// Members with runtime status from status-relevant tasks and markers.
    pub fn members(&self) -> Vec<Member> {
        self.members_with(None, SystemTime::now())
    }

    pub fn members_with(&self, previous: Option<&PreviousStatus>, now: SystemTime) -> Vec<Member> {
        let roster = self.roster();
        let tasks = self.tasks(LogScope::Status);
        overlay(&roster.members, &tasks.tasks, &self.markers(now), previous)
    }

    /// Every decision, most recent first.
    pub fn decisions(&self) -> Vec<DecisionEntry> {
        load_decisions(self.source.as_ref(), &self.root, &self.config)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
