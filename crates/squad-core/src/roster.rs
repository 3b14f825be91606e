//! Who is on the team.
//!
//! Membership is resolved through three tiers, each consulted only when the
//! previous produced nobody: the team document's member tables, the agent
//! charter directory, and finally the participants named in logs. Every
//! failure along the way counts as "zero members" and falls through.

use crate::config::SquadConfig;
use crate::extract::{first_match, Document, Extractor};
use crate::io::DocumentSource;
use crate::log::LogEntry;
use crate::paths::{self, slugify};
use crate::text::{heading_key, labeled_value, strip_emphasis, strip_parenthetical, tables, Outline};
use crate::types::{ActivityContext, MemberStatus};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Member {
    pub name: String,
    pub role: String,
    pub status: MemberStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub activity: Option<ActivityContext>,
}

impl Member {
    /// A member with the placeholder status; the status engine fills in the real one.
    pub fn new(name: impl Into<String>, role: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            role: role.into(),
            status: MemberStatus::Idle,
            activity: None,
        }
    }

    pub fn slug(&self) -> String {
        slugify(&self.name)
    }
}

/// Which source produced the roster.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RosterTier {
    TeamDocument,
    AgentCharters,
    LogParticipants,
}

impl fmt::Display for RosterTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            RosterTier::TeamDocument => "team document",
            RosterTier::AgentCharters => "agent charters",
            RosterTier::LogParticipants => "log participants",
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Roster {
    pub members: Vec<Member>,
    /// `None` when every tier came up empty.
    pub tier: Option<RosterTier>,
}

// ---------------------------------------------------------------------------
// Tier 1: team document
// ---------------------------------------------------------------------------

const MEMBER_SECTIONS: &[&str] = &["members", "roster", "coding agent"];

fn is_member_heading(text: &str) -> bool {
    let key = heading_key(text);
    MEMBER_SECTIONS.iter().any(|s| key.contains(s))
}

fn clean_cell(cell: &str) -> String {
    let plain = strip_emphasis(cell);
    strip_parenthetical(plain.trim_matches('`')).to_string()
}

fn is_placeholder(name: &str) -> bool {
    name.is_empty() || name.chars().all(|c| matches!(c, '-' | '—' | '–' | ' '))
}

/// Members listed in the team document's member tables, in document order.
///
/// Tables directly under a "Members"/"Roster" or "Coding Agent" heading are
/// concatenated; a document without such headings falls back to any table
/// with a `Name` column. Coordinator rows are dropped and duplicates (by slug)
/// keep their first appearance.
pub fn parse_roster_document(text: &str, config: &SquadConfig) -> Vec<Member> {
    let outline = Outline::new(text);
    let lines = outline.lines();
    let headings = outline.headings();

    let mut candidate = Vec::new();
    for (i, h) in headings.iter().enumerate() {
        if !is_member_heading(&h.text) {
            continue;
        }
        let end = headings.get(i + 1).map_or(lines.len(), |next| next.line);
        candidate.extend(tables(&lines[h.line + 1..end]));
    }
    if candidate.is_empty() {
        candidate = tables(lines)
            .into_iter()
            .filter(|t| t.column(&["name"]).is_some())
            .collect();
    }

    let mut seen = HashSet::new();
    let mut members = Vec::new();
    for table in candidate {
        let name_col = table.column(&["name"]).unwrap_or(0);
        let role_col = table.column(&["role"]).unwrap_or(1);
        for row in &table.rows {
            let name = row.get(name_col).map(|c| clean_cell(c)).unwrap_or_default();
            if is_placeholder(&name) {
                continue;
            }
            let role = row
                .get(role_col)
                .map(|c| strip_emphasis(c))
                .filter(|r| !is_placeholder(r))
                .unwrap_or_else(|| config.default_role.clone());
            if role.eq_ignore_ascii_case(&config.coordinator_role) {
                tracing::debug!(name = %name, "skipping coordinator row");
                continue;
            }
            if seen.insert(slugify(&name)) {
                members.push(Member::new(name, role));
            }
        }
    }
    members
}

// ---------------------------------------------------------------------------
// Tier 2: agent charters
// ---------------------------------------------------------------------------

pub static CHARTER_ROLE_EXTRACTORS: &[Extractor<String>] = &[
    Extractor {
        id: "role-label",
        extract: role_label,
    },
    Extractor {
        id: "title-suffix",
        extract: title_suffix,
    },
];

fn role_label(doc: &Document<'_>) -> Option<String> {
    doc.outline
        .lines()
        .iter()
        .find_map(|l| labeled_value(l, &["role"]))
        .map(|(_, value)| value)
}

/// `# Fury — Lead` declares the role after the dash.
fn title_suffix(doc: &Document<'_>) -> Option<String> {
    let title = doc.outline.headings().iter().find(|h| h.level == 1)?;
    let (_, role) = title.text.split_once(['—', '–'])?;
    let role = strip_emphasis(role);
    (!role.is_empty()).then_some(role)
}

/// Display form of an agent directory name: first letter upper-cased.
pub fn display_name(dir: &str) -> String {
    let mut chars = dir.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

// ---------------------------------------------------------------------------
// Tier 3: log participants
// ---------------------------------------------------------------------------

/// Union of every entry's participants, first appearance first.
pub fn participants_roster(entries: &[LogEntry], config: &SquadConfig) -> Vec<Member> {
    let mut seen = HashSet::new();
    entries
        .iter()
        .flat_map(|e| e.participants.iter())
        .filter(|name| !name.trim().is_empty() && seen.insert(slugify(name)))
        .map(|name| Member::new(name.clone(), config.default_role.clone()))
        .collect()
}

// ---------------------------------------------------------------------------
// Resolver
// ---------------------------------------------------------------------------

pub struct RosterResolver<'a> {
    source: &'a dyn DocumentSource,
    root: &'a Path,
    config: &'a SquadConfig,
}

impl<'a> RosterResolver<'a> {
    pub fn new(source: &'a dyn DocumentSource, root: &'a Path, config: &'a SquadConfig) -> Self {
        Self {
            source,
            root,
            config,
        }
    }

    /// Members from the team document. A document that exists but parses
    /// empty is read once more after the configured delay, since it may have
    /// been caught mid-write.
    pub fn from_team_document(&self) -> Vec<Member> {
        let path = paths::roster_path(self.root, self.config);
        let Some(text) = self.source.read_text(&path) else {
            return Vec::new();
        };
        let members = parse_roster_document(&text, self.config);
        if !members.is_empty() {
            return members;
        }

        let delay = self.config.roster_retry_delay();
        tracing::info!(path = %path.display(), ?delay, "team document parsed empty; retrying once");
        std::thread::sleep(delay);
        self.source
            .read_text(&path)
            .map(|text| parse_roster_document(&text, self.config))
            .unwrap_or_default()
    }

    /// One member per agent directory, role taken from its charter.
    pub fn from_agent_charters(&self) -> Vec<Member> {
        let dir = paths::agents_dir(self.root, self.config);
        let Some(entries) = self.source.list_dir(&dir) else {
            return Vec::new();
        };
        entries
            .into_iter()
            .filter(|e| e.is_dir && !self.is_reserved(&e.name))
            .map(|e| {
                let role = self
                    .charter_role(&e.name)
                    .unwrap_or_else(|| self.config.default_role.clone());
                Member::new(display_name(&e.name), role)
            })
            .collect()
    }

    fn is_reserved(&self, name: &str) -> bool {
        name.starts_with('_')
            || name.starts_with('.')
            || self.config.reserved_agent_dirs.iter().any(|r| r == name)
    }

    fn charter_role(&self, agent_dir: &str) -> Option<String> {
        let path = paths::charter_path(self.root, self.config, agent_dir);
        let text = self.source.read_text(&path)?;
        let doc = Document::new(agent_dir, &text);
        first_match(CHARTER_ROLE_EXTRACTORS, &doc).map(|(_, role)| role)
    }

    /// Run the tiers in order. `log_entries` is only called when both
    /// document tiers come up empty.
    pub fn resolve(&self, log_entries: impl FnOnce() -> Vec<LogEntry>) -> Roster {
        let members = self.from_team_document();
        if !members.is_empty() {
            return Roster {
                members,
                tier: Some(RosterTier::TeamDocument),
            };
        }
        tracing::info!("team document has no members; trying agent charters");
        let members = self.from_agent_charters();
        if !members.is_empty() {
            return Roster {
                members,
                tier: Some(RosterTier::AgentCharters),
            };
        }
        tracing::info!("no agent charters; deriving members from log participants");
        let members = participants_roster(&log_entries(), self.config);
        if !members.is_empty() {
            return Roster {
                members,
                tier: Some(RosterTier::LogParticipants),
            };
        }
        tracing::debug!("no roster source produced members");
        Roster::default()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
