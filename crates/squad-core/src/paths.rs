use crate::config::SquadConfig;
use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

// ---------------------------------------------------------------------------
// Directory constants
// ---------------------------------------------------------------------------

pub const TEAM_DIR: &str = ".ai-team";
pub const CONFIG_FILE: &str = ".ai-team/config.yaml";

// ---------------------------------------------------------------------------
// Path helpers
// ---------------------------------------------------------------------------

pub fn config_path(root: &Path) -> PathBuf {
    root.join(CONFIG_FILE)
}

pub fn team_dir(root: &Path, config: &SquadConfig) -> PathBuf {
    root.join(&config.team_dir)
}

pub fn roster_path(root: &Path, config: &SquadConfig) -> PathBuf {
    team_dir(root, config).join(&config.roster_file)
}

pub fn agents_dir(root: &Path, config: &SquadConfig) -> PathBuf {
    team_dir(root, config).join(&config.agents_dir)
}

pub fn charter_path(root: &Path, config: &SquadConfig, agent_dir: &str) -> PathBuf {
    agents_dir(root, config)
        .join(agent_dir)
        .join(&config.charter_file)
}

/// The single directory whose logs may affect current member status.
pub fn status_log_dir(root: &Path, config: &SquadConfig) -> PathBuf {
    team_dir(root, config).join(&config.orchestration_log_dir)
}

/// The status directory followed by every session log directory.
pub fn all_log_dirs(root: &Path, config: &SquadConfig) -> Vec<PathBuf> {
    std::iter::once(status_log_dir(root, config))
        .chain(
            config
                .session_log_dirs
                .iter()
                .map(|d| team_dir(root, config).join(d)),
        )
        .collect()
}

pub fn decisions_path(root: &Path, config: &SquadConfig) -> PathBuf {
    team_dir(root, config).join(&config.decisions_file)
}

pub fn decisions_dir(root: &Path, config: &SquadConfig) -> PathBuf {
    team_dir(root, config).join(&config.decisions_dir)
}

pub fn markers_dir(root: &Path, config: &SquadConfig) -> PathBuf {
    team_dir(root, config).join(&config.markers_dir)
}

// ---------------------------------------------------------------------------
// Slugs
// ---------------------------------------------------------------------------

static NON_ALNUM_RE: OnceLock<Regex> = OnceLock::new();

fn non_alnum_re() -> &'static Regex {
    NON_ALNUM_RE.get_or_init(|| Regex::new(r"[^\p{Alphabetic}\p{N}]+").unwrap())
}

/// Lowercase, collapse non-alphanumeric runs to one hyphen, trim hyphens.
/// `"Dr. Strange"` becomes `"dr-strange"`; accented letters are kept.
pub fn slugify(name: &str) -> String {
    let lower = name.to_lowercase();
    non_alnum_re()
        .replace_all(&lower, "-")
        .trim_matches('-')
        .to_string()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slugify_examples() {
        assert_eq!(slugify("Alice"), "alice");
        assert_eq!(slugify("Dr. Strange"), "dr-strange");
        assert_eq!(slugify("  --Code__Monkey!! "), "code-monkey");
        assert_eq!(slugify("@copilot"), "copilot");
        assert_eq!(slugify("***"), "");
    }

    #[test]
    fn slugify_keeps_non_ascii_letters() {
        assert_eq!(slugify("Élan"), "élan");
        assert_ne!(slugify("Élan"), slugify("Lan"));
        assert_eq!(slugify("Zoë Ng"), "zoë-ng");
    }

    #[test]
    fn path_helpers() {
        let root = Path::new("/tmp/proj");
        let cfg = SquadConfig::default();
        assert_eq!(
            config_path(root),
            PathBuf::from("/tmp/proj/.ai-team/config.yaml")
        );
        assert_eq!(
            roster_path(root, &cfg),
            PathBuf::from("/tmp/proj/.ai-team/team.md")
        );
        assert_eq!(
            charter_path(root, &cfg, "fury"),
            PathBuf::from("/tmp/proj/.ai-team/agents/fury/charter.md")
        );
        assert_eq!(
            all_log_dirs(root, &cfg),
            vec![
                PathBuf::from("/tmp/proj/.ai-team/orchestration-log"),
                PathBuf::from("/tmp/proj/.ai-team/log"),
            ]
        );
    }
}
