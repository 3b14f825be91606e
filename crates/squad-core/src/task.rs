use crate::log::LogEntry;
use crate::paths::slugify;
use crate::text::{strip_emphasis, truncate_chars};
use crate::types::{TaskOrigin, TaskStatus};
use chrono::{Duration, NaiveDate};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::sync::OnceLock;

/// Assignee used when an issue-referencing entry names no participant.
pub const UNASSIGNED: &str = "unassigned";

/// Default display length for titles built from summaries.
pub const DEFAULT_TITLE_MAX_LEN: usize = 80;

/// Substrings that mark work as finished. A fixed heuristic: "pass" also
/// matches "passenger", and that is accepted.
pub const COMPLETION_SIGNALS: &[&str] = &["completed", "done", "✅", "pass", "succeeds"];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub id: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub status: TaskStatus,
    pub assignee: String,
    pub origin: TaskOrigin,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub started_at: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<NaiveDate>,
}

impl Task {
    fn dated(mut self, date: NaiveDate) -> Self {
        if self.status.is_completed() {
            self.completed_at = Some(date);
        } else {
            self.started_at = Some(date);
        }
        self
    }

    /// The issue number when this task came from an issue reference.
    pub fn issue_number(&self) -> Option<u32> {
        match self.origin {
            TaskOrigin::Issue => self.id.parse().ok(),
            _ => None,
        }
    }
}

/// A task that lost its id to an earlier writer and was dropped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskCollision {
    pub id: String,
    pub origin: TaskOrigin,
    /// Log filename of the dropped attempt.
    pub source: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskDerivation {
    pub tasks: Vec<Task>,
    pub collisions: Vec<TaskCollision>,
}

// ---------------------------------------------------------------------------
// Ledger: ordered id -> task, first writer wins
// ---------------------------------------------------------------------------

#[derive(Default)]
struct Ledger {
    claimed: HashSet<String>,
    out: TaskDerivation,
}

impl Ledger {
    /// Insert unless the id is taken; returns whether the task was kept.
    fn claim(&mut self, task: Task, source: &str) -> bool {
        if self.claimed.insert(task.id.clone()) {
            self.out.tasks.push(task);
            return true;
        }
        tracing::debug!(id = %task.id, origin = %task.origin, source, "dropping task with claimed id");
        self.out.collisions.push(TaskCollision {
            id: task.id,
            origin: task.origin,
            source: source.to_string(),
        });
        false
    }
}

// ---------------------------------------------------------------------------
// Heuristics
// ---------------------------------------------------------------------------

static ISSUE_REF_RE: OnceLock<Regex> = OnceLock::new();

/// Group 1 marks a pull-request reference (`PR #7`), which is not an issue.
fn issue_ref_re() -> &'static Regex {
    ISSUE_REF_RE.get_or_init(|| {
        Regex::new(r"(?i)(\bPR\s*|\bpull\s+request\s*)?(?:#|/issues/)(\d+)\b").unwrap()
    })
}

/// Case-insensitive check against `COMPLETION_SIGNALS`.
pub fn has_completion_signal(text: &str) -> bool {
    let lower = text.to_lowercase();
    COMPLETION_SIGNALS.iter().any(|s| lower.contains(s))
}

/// Issue numbers referenced in `text`, in order of appearance.
/// Pull-request references are skipped.
pub fn issue_numbers(text: &str) -> Vec<u32> {
    issue_ref_re()
        .captures_iter(text)
        .filter(|c| c.get(1).is_none())
        .filter_map(|c| c[2].parse().ok())
        .collect()
}

fn status_from(text: &str) -> TaskStatus {
    if has_completion_signal(text) {
        TaskStatus::Completed
    } else {
        TaskStatus::InProgress
    }
}

/// Related-issue item text with its reference removed: `#42 — fix parser` -> `fix parser`.
fn title_from_reference(item: &str) -> String {
    let stripped = issue_ref_re().replace_all(item, "");
    strip_emphasis(stripped.trim_matches(|c: char| c.is_whitespace() || "-—–:()".contains(c)))
}

// ---------------------------------------------------------------------------
// Derivation
// ---------------------------------------------------------------------------

/// Derive tasks with the default title length.
pub fn derive_tasks(entries: &[LogEntry]) -> TaskDerivation {
    derive_tasks_with(entries, DEFAULT_TITLE_MAX_LEN)
}

/// Derive tasks from log entries, in three passes:
///
/// 1. every entry's issue references (ids are issue numbers);
/// 2. "What Was Done" items of entries that kept no issue task;
/// 3. one synthetic task for each remaining entry with participants.
///
/// Ids are claimed in that order and the first claim wins, so the output is
/// a pure function of the input order.
pub fn derive_tasks_with(entries: &[LogEntry], title_max_len: usize) -> TaskDerivation {
    let mut ledger = Ledger::default();
    let mut prose_entries: Vec<&LogEntry> = Vec::new();

    for entry in entries {
        if !issue_pass(&mut ledger, entry, title_max_len) && !entry.participants.is_empty() {
            prose_entries.push(entry);
        }
    }

    for entry in &prose_entries {
        for item in &entry.what_was_done {
            let task = Task {
                id: format!("{}-{}", entry.date, slugify(&item.agent)),
                title: truncate_chars(&item.description, title_max_len),
                description: Some(item.description.clone()),
                status: TaskStatus::Completed,
                assignee: item.agent.clone(),
                origin: TaskOrigin::WorkItem,
                started_at: None,
                completed_at: None,
            }
            .dated(entry.date);
            ledger.claim(task, &entry.source);
        }
    }

    for entry in prose_entries.iter().filter(|e| e.what_was_done.is_empty()) {
        let lead = &entry.participants[0];
        let signal_text = std::iter::once(entry.summary.as_str())
            .chain(entry.outcomes.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ");
        let task = Task {
            id: format!("{}-{}", entry.date, slugify(lead)),
            title: truncate_chars(&entry.summary, title_max_len),
            description: Some(entry.summary.clone()),
            status: status_from(&signal_text),
            assignee: lead.clone(),
            origin: TaskOrigin::Synthetic,
            started_at: None,
            completed_at: None,
        }
        .dated(entry.date);
        ledger.claim(task, &entry.source);
    }

    ledger.out
}

/// Issue pass for one entry. Returns whether any of its issue tasks was
/// kept; an entry whose every reference lost to an earlier claim falls
/// through to the prose passes.
fn issue_pass(ledger: &mut Ledger, entry: &LogEntry, title_max_len: usize) -> bool {
    let mut refs: Vec<(u32, String)> = Vec::new();
    for item in &entry.related_issues {
        for n in issue_numbers(item) {
            refs.push((n, title_from_reference(item)));
        }
    }
    for n in issue_numbers(&entry.summary) {
        refs.push((n, String::new()));
    }

    let mut seen = HashSet::new();
    refs.retain(|(n, _)| seen.insert(*n));
    if refs.is_empty() {
        return false;
    }

    let assignee = entry
        .participants
        .first()
        .cloned()
        .unwrap_or_else(|| UNASSIGNED.to_string());
    let outcomes = entry.outcomes.join(" ");

    let mut kept = false;
    for (number, context) in refs {
        let title = if context.is_empty() {
            truncate_chars(&entry.summary, title_max_len)
        } else {
            truncate_chars(&context, title_max_len)
        };
        let signal_text = format!("{context} {} {outcomes}", entry.summary);
        let task = Task {
            id: number.to_string(),
            title,
            description: Some(entry.summary.clone()),
            status: status_from(&signal_text),
            assignee: assignee.clone(),
            origin: TaskOrigin::Issue,
            started_at: None,
            completed_at: None,
        }
        .dated(entry.date);
        kept |= ledger.claim(task, &entry.source);
    }
    kept
}

// ---------------------------------------------------------------------------
// Reporting
// ---------------------------------------------------------------------------

/// Human-readable summary: "3/5 completed, 1 in progress, 1 pending"
pub fn summarize(tasks: &[Task]) -> String {
    let total = tasks.len();
    let count = |s: TaskStatus| tasks.iter().filter(|t| t.status == s).count();
    format!(
        "{}/{total} completed, {} in progress, {} pending",
        count(TaskStatus::Completed),
        count(TaskStatus::InProgress),
        count(TaskStatus::Pending)
    )
}

/// Completed tasks per day for the `days` days ending at `end` (inclusive),
/// oldest first. Days without completions are present with a zero count.
/// A window reaching past the representable calendar is empty.
pub fn velocity(tasks: &[Task], end: NaiveDate, days: u32) -> Vec<(NaiveDate, usize)> {
    if days == 0 {
        return Vec::new();
    }
    let start = Duration::try_days(i64::from(days) - 1).and_then(|d| end.checked_sub_signed(d));
    let Some(start) = start else {
        tracing::debug!(days, %end, "velocity window out of calendar range");
        return Vec::new();
    };
    let mut counts: BTreeMap<NaiveDate, usize> = BTreeMap::new();
    let mut day = start;
    while day <= end {
        counts.insert(day, 0);
        day += Duration::days(1);
    }
    for date in tasks.iter().filter_map(|t| t.completed_at) {
        if let Some(n) = counts.get_mut(&date) {
            *n += 1;
        }
    }
    counts.into_iter().collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
