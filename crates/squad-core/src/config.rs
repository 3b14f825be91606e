use crate::error::Result;
use crate::paths;
use serde::{Deserialize, Serialize};
use std::path::{Component, Path};
use std::time::Duration;

// ---------------------------------------------------------------------------
// ConfigWarning / WarnLevel
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigWarning {
    pub level: WarnLevel,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WarnLevel {
    Warning,
    Error,
}

// ---------------------------------------------------------------------------
// SquadConfig
// ---------------------------------------------------------------------------

/// Where squad artifacts live and the few tunables of the engine.
///
/// Every directory is relative to `team_dir`, which is relative to the
/// project root. A missing config file means all defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SquadConfig {
    #[serde(default = "default_team_dir")]
    pub team_dir: String,
    #[serde(default = "default_roster_file")]
    pub roster_file: String,
    #[serde(default = "default_agents_dir")]
    pub agents_dir: String,
    #[serde(default = "default_charter_file")]
    pub charter_file: String,
    #[serde(default = "default_orchestration_log_dir")]
    pub orchestration_log_dir: String,
    #[serde(default = "default_session_log_dirs")]
    pub session_log_dirs: Vec<String>,
    #[serde(default = "default_decisions_file")]
    pub decisions_file: String,
    #[serde(default = "default_decisions_dir")]
    pub decisions_dir: String,
    #[serde(default = "default_markers_dir")]
    pub markers_dir: String,
    #[serde(default = "default_coordinator_role")]
    pub coordinator_role: String,
    #[serde(default = "default_role")]
    pub default_role: String,
    #[serde(default = "default_reserved_agent_dirs")]
    pub reserved_agent_dirs: Vec<String>,
    #[serde(default = "default_marker_staleness_secs")]
    pub marker_staleness_secs: u64,
    #[serde(default = "default_roster_retry_delay_ms")]
    pub roster_retry_delay_ms: u64,
    #[serde(default = "default_title_max_len")]
    pub title_max_len: usize,
}

fn default_team_dir() -> String {
    paths::TEAM_DIR.to_string()
}

fn default_roster_file() -> String {
    "team.md".to_string()
}

fn default_agents_dir() -> String {
    "agents".to_string()
}

fn default_charter_file() -> String {
    "charter.md".to_string()
}

fn default_orchestration_log_dir() -> String {
    "orchestration-log".to_string()
}

fn default_session_log_dirs() -> Vec<String> {
    vec!["log".to_string()]
}

fn default_decisions_file() -> String {
    "decisions.md".to_string()
}

fn default_decisions_dir() -> String {
    "decisions".to_string()
}

fn default_markers_dir() -> String {
    "heartbeat".to_string()
}

fn default_coordinator_role() -> String {
    "Coordinator".to_string()
}

fn default_role() -> String {
    "Squad Member".to_string()
}

fn default_reserved_agent_dirs() -> Vec<String> {
    vec!["_alumni".to_string(), "_templates".to_string()]
}

fn default_marker_staleness_secs() -> u64 {
    300
}

fn default_roster_retry_delay_ms() -> u64 {
    500
}

fn default_title_max_len() -> usize {
    80
}

impl Default for SquadConfig {
    fn default() -> Self {
        Self {
            team_dir: default_team_dir(),
            roster_file: default_roster_file(),
            agents_dir: default_agents_dir(),
            charter_file: default_charter_file(),
            orchestration_log_dir: default_orchestration_log_dir(),
            session_log_dirs: default_session_log_dirs(),
            decisions_file: default_decisions_file(),
            decisions_dir: default_decisions_dir(),
            markers_dir: default_markers_dir(),
            coordinator_role: default_coordinator_role(),
            default_role: default_role(),
            reserved_agent_dirs: default_reserved_agent_dirs(),
            marker_staleness_secs: default_marker_staleness_secs(),
            roster_retry_delay_ms: default_roster_retry_delay_ms(),
            title_max_len: default_title_max_len(),
        }
    }
}

impl SquadConfig {
    pub fn load(root: &Path) -> Result<Self> {
        let path = paths::config_path(root);
        if !path.exists() {
            return Ok(Self::default());
        }
        let data = std::fs::read_to_string(&path)?;
        if data.trim().is_empty() {
            return Ok(Self::default());
        }
        let cfg: SquadConfig = serde_yaml::from_str(&data)?;
        Ok(cfg)
    }

    pub fn marker_staleness(&self) -> Duration {
        Duration::from_secs(self.marker_staleness_secs)
    }

    pub fn roster_retry_delay(&self) -> Duration {
        Duration::from_millis(self.roster_retry_delay_ms)
    }

    // -----------------------------------------------------------------------
    // Validation
    // -----------------------------------------------------------------------

    pub fn validate(&self) -> Vec<ConfigWarning> {
        let mut warnings = Vec::new();

        let dirs = [
            ("team_dir", &self.team_dir),
            ("agents_dir", &self.agents_dir),
            ("orchestration_log_dir", &self.orchestration_log_dir),
            ("decisions_dir", &self.decisions_dir),
            ("markers_dir", &self.markers_dir),
        ];
        let session_dirs = self
            .session_log_dirs
            .iter()
            .map(|d| ("session_log_dirs", d));
        for (key, dir) in dirs.into_iter().chain(session_dirs) {
            if escapes_root(dir) {
                warnings.push(ConfigWarning {
                    level: WarnLevel::Error,
                    message: format!("{key} '{dir}' must be a relative path inside the project"),
                });
            }
        }

        let mut seen = vec![&self.orchestration_log_dir];
        for dir in &self.session_log_dirs {
            if seen.contains(&dir) {
                warnings.push(ConfigWarning {
                    level: WarnLevel::Warning,
                    message: format!("log directory '{dir}' is listed more than once"),
                });
            } else {
                seen.push(dir);
            }
        }

        if self.marker_staleness_secs == 0 {
            warnings.push(ConfigWarning {
                level: WarnLevel::Warning,
                message: "marker_staleness_secs is 0: freshness markers will never apply"
                    .to_string(),
            });
        }

        if self.coordinator_role.trim().is_empty() {
            warnings.push(ConfigWarning {
                level: WarnLevel::Warning,
                message: "coordinator_role is empty: coordinators will be listed as members"
                    .to_string(),
            });
        }

        if self.title_max_len < 8 {
            warnings.push(ConfigWarning {
                level: WarnLevel::Warning,
                message: format!(
                    "title_max_len={} is too short for readable task titles",
                    self.title_max_len
                ),
            });
        }

        warnings
    }
}

fn escapes_root(dir: &str) -> bool {
    let p = Path::new(dir);
    p.is_absolute()
        || p
            .components()
            .any(|c| matches!(c, Component::ParentDir | Component::RootDir | Component::Prefix(_)))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
