//! Runtime status of roster members.
//!
//! The roster only says who exists. Status comes from status-relevant tasks
//! and, last, from freshness markers that an active agent keeps touching.
//! The overlay never mutates its input: callers get a fresh member list.

use crate::io::DocumentSource;
use crate::paths::slugify;
use crate::roster::Member;
use crate::task::Task;
use crate::types::{ActivityContext, MemberStatus};
use regex::Regex;
use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::OnceLock;
use std::time::{Duration, SystemTime};

/// Default freshness window for marker files.
pub const DEFAULT_MARKER_STALENESS: Duration = Duration::from_secs(5 * 60);

/// Status a member had on the previous read, keyed by member slug.
pub type PreviousStatus = HashMap<String, (MemberStatus, Option<ActivityContext>)>;

// ---------------------------------------------------------------------------
// Freshness markers
// ---------------------------------------------------------------------------

/// Slugs of agents whose marker file was modified within the window.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FreshMarkers {
    slugs: HashSet<String>,
}

impl FreshMarkers {
    /// Scan `dir` for markers. A marker's slug is its file stem; a missing
    /// directory or unreadable timestamp simply means "not fresh".
    pub fn scan(source: &dyn DocumentSource, dir: &Path, now: SystemTime, window: Duration) -> Self {
        let mut slugs = HashSet::new();
        for entry in source.list_dir(dir).unwrap_or_default() {
            if entry.is_dir || entry.name.starts_with('.') {
                continue;
            }
            let Some(modified) = source.modified(&dir.join(&entry.name)) else {
                continue;
            };
            // Timestamps in the future count as fresh.
            let age = now.duration_since(modified).unwrap_or(Duration::ZERO);
            if age > window {
                continue;
            }
            let stem = Path::new(&entry.name)
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_else(|| entry.name.clone());
            slugs.insert(slugify(&stem));
        }
        Self { slugs }
    }

    pub fn from_slugs<I, S>(slugs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            slugs: slugs.into_iter().map(Into::into).collect(),
        }
    }

    pub fn is_fresh(&self, member: &Member) -> bool {
        self.slugs.contains(&member.slug())
    }

    pub fn is_empty(&self) -> bool {
        self.slugs.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Activity classification
// ---------------------------------------------------------------------------

static REVIEW_PR_RE: OnceLock<Regex> = OnceLock::new();

fn review_pr_re() -> &'static Regex {
    REVIEW_PR_RE.get_or_init(|| {
        Regex::new(r"(?i)\breview(?:ing|ed)?\b[^#\n]*?\b(?:PR|pull request)\s*#?(\d+)").unwrap()
    })
}

static WAITING_REVIEW_RE: OnceLock<Regex> = OnceLock::new();

fn waiting_review_re() -> &'static Regex {
    WAITING_REVIEW_RE
        .get_or_init(|| Regex::new(r"(?i)\b(?:waiting|awaiting)\s+(?:for\s+)?review\b").unwrap())
}

/// Rich status for a member whose active task is `task`.
pub fn classify_activity(task: &Task) -> (MemberStatus, ActivityContext) {
    let text = format!("{} {}", task.title, task.description.as_deref().unwrap_or(""));

    if let Some(number) = task.issue_number() {
        return (
            MemberStatus::WorkingOnIssue,
            ActivityContext {
                description: task.title.clone(),
                short_label: format!("#{number}"),
                number: Some(number),
            },
        );
    }
    if let Some(number) = review_pr_re()
        .captures(&text)
        .and_then(|c| c[1].parse::<u32>().ok())
    {
        return (
            MemberStatus::ReviewingPr,
            ActivityContext {
                description: task.title.clone(),
                short_label: format!("PR #{number}"),
                number: Some(number),
            },
        );
    }
    if waiting_review_re().is_match(&text) {
        return (
            MemberStatus::WaitingReview,
            ActivityContext {
                description: task.title.clone(),
                short_label: "waiting review".to_string(),
                number: None,
            },
        );
    }
    (
        MemberStatus::Working,
        ActivityContext {
            description: task.title.clone(),
            short_label: "working".to_string(),
            number: None,
        },
    )
}

// ---------------------------------------------------------------------------
// Overlay
// ---------------------------------------------------------------------------

fn task_date(task: &Task) -> Option<chrono::NaiveDate> {
    task.started_at.or(task.completed_at)
}

/// Members with status derived from `tasks` and `markers`.
///
/// - any unfinished task: working, with the richest status the most recent
///   unfinished task supports;
/// - tasks, all finished: idle;
/// - no tasks: the previous status if known, else working. Absence of
///   parseable work is not evidence of inactivity;
/// - a fresh marker forces a working status, applied last.
pub fn overlay(
    members: &[Member],
    tasks: &[Task],
    markers: &FreshMarkers,
    previous: Option<&PreviousStatus>,
) -> Vec<Member> {
    let mut by_assignee: HashMap<String, Vec<&Task>> = HashMap::new();
    for task in tasks {
        by_assignee.entry(slugify(&task.assignee)).or_default().push(task);
    }

    members
        .iter()
        .map(|member| {
            let slug = member.slug();
            let mine = by_assignee.get(&slug).map(Vec::as_slice).unwrap_or_default();
            let (mut status, mut activity) = derive_status(mine, previous.and_then(|p| p.get(&slug)));

            if markers.is_fresh(member) && !status.is_working() {
                tracing::debug!(member = %member.name, "fresh marker overrides status");
                status = MemberStatus::Working;
                activity = None;
            }

            Member {
                name: member.name.clone(),
                role: member.role.clone(),
                status,
                activity,
            }
        })
        .collect()
}

fn derive_status(
    tasks: &[&Task],
    previous: Option<&(MemberStatus, Option<ActivityContext>)>,
) -> (MemberStatus, Option<ActivityContext>) {
    if tasks.is_empty() {
        return match previous {
            Some((status, activity)) => (*status, activity.clone()),
            None => (MemberStatus::Working, None),
        };
    }

    // Latest unfinished task; ties go to the later task in derivation order.
    let active = tasks
        .iter()
        .enumerate()
        .filter(|(_, t)| !t.status.is_completed())
        .max_by_key(|(i, t)| (task_date(t), *i))
        .map(|(_, t)| *t);

    match active {
        Some(task) => {
            let (status, activity) = classify_activity(task);
            (status, Some(activity))
        }
        None => (MemberStatus::Idle, None),
    }
}

/// Previous-status map built from an overlaid member list.
pub fn snapshot(members: &[Member]) -> PreviousStatus {
    members
        .iter()
        .map(|m| (m.slug(), (m.status, m.activity.clone())))
        .collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::MemorySource;
    use crate::log::parse_log_at;
    use crate::task::derive_tasks;
    use crate::types::{TaskOrigin, TaskStatus};
    use chrono::NaiveDate;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 2, d).unwrap()
    }

    fn task(id: &str, assignee: &str, status: TaskStatus, origin: TaskOrigin, d: u32) -> Task {
        Task {
            id: id.to_string(),
            title: format!("task {id}"),
            description: None,
            status,
            assignee: assignee.to_string(),
            origin,
            started_at: (!status.is_completed()).then(|| day(d)),
            completed_at: status.is_completed().then(|| day(d)),
        }
    }

    fn fury() -> Vec<Member> {
        vec![Member::new("Fury", "Lead")]
    }

    #[test]
    fn issue_task_is_working_on_issue() {
        let tasks = vec![task("42", "Fury", TaskStatus::InProgress, TaskOrigin::Issue, 14)];
        let out = overlay(&fury(), &tasks, &FreshMarkers::default(), None);
        assert_eq!(out[0].status, MemberStatus::WorkingOnIssue);
        assert!(out[0].status.is_working());
        let activity = out[0].activity.as_ref().unwrap();
        assert_eq!(activity.short_label, "#42");
        assert_eq!(activity.number, Some(42));
    }

    #[test]
    fn all_completed_is_idle() {
        let tasks = vec![
            task("42", "Fury", TaskStatus::Completed, TaskOrigin::Issue, 14),
            task("2026-02-15-fury", "fury", TaskStatus::Completed, TaskOrigin::Synthetic, 15),
        ];
        let out = overlay(&fury(), &tasks, &FreshMarkers::default(), None);
        assert_eq!(out[0].status, MemberStatus::Idle);
        assert!(out[0].activity.is_none());
    }

    #[test]
    fn fresh_marker_forces_working() {
        let tasks = vec![task("42", "Fury", TaskStatus::Completed, TaskOrigin::Issue, 14)];
        let markers = FreshMarkers::from_slugs(["fury"]);
        let out = overlay(&fury(), &tasks, &markers, None);
        assert_eq!(out[0].status, MemberStatus::Working);

        let active = vec![task("42", "Fury", TaskStatus::InProgress, TaskOrigin::Issue, 14)];
        let out = overlay(&fury(), &active, &markers, None);
        assert_eq!(out[0].status, MemberStatus::WorkingOnIssue);
    }

    #[test]
    fn no_tasks_keeps_previous_or_working() {
        let out = overlay(&fury(), &[], &FreshMarkers::default(), None);
        assert_eq!(out[0].status, MemberStatus::Working);

        let mut previous = PreviousStatus::new();
        previous.insert("fury".to_string(), (MemberStatus::Idle, None));
        let out = overlay(&fury(), &[], &FreshMarkers::default(), Some(&previous));
        assert_eq!(out[0].status, MemberStatus::Idle);
    }

    #[test]
    fn most_recent_unfinished_task_drives_activity() {
        let today = NaiveDate::from_ymd_opt(2026, 3, 1).unwrap();
        let entries = vec![
            parse_log_at(
                "2026-02-14T0900-triage.md",
                "| Field | Value |\n|---|---|\n| **Agent routed** | Fury (Lead) |\n| **Outcome** | Picked up #42 |\n",
                today,
            ),
            parse_log_at(
                "2026-02-16T1100-review.md",
                "| Field | Value |\n|---|---|\n| **Agent routed** | Fury (Lead) |\n| **Outcome** | Reviewing PR #7 for Banner |\n",
                today,
            ),
        ];
        let tasks = derive_tasks(&entries).tasks;
        assert_eq!(tasks[1].origin, TaskOrigin::Synthetic);

        let out = overlay(&fury(), &tasks, &FreshMarkers::default(), None);
        assert_eq!(out[0].status, MemberStatus::ReviewingPr);
        let activity = out[0].activity.as_ref().unwrap();
        assert_eq!(activity.short_label, "PR #7");
        assert_eq!(activity.number, Some(7));
    }

    #[test]
    fn waiting_review_and_plain_working() {
        let mut t = task("2026-02-16-fury", "Fury", TaskStatus::InProgress, TaskOrigin::Synthetic, 16);
        t.title = "Parser rewrite, awaiting review".to_string();
        assert_eq!(classify_activity(&t).0, MemberStatus::WaitingReview);
        t.title = "Parser rewrite".to_string();
        let (status, activity) = classify_activity(&t);
        assert_eq!(status, MemberStatus::Working);
        assert_eq!(activity.description, "Parser rewrite");
    }

    #[test]
    fn overlay_does_not_mutate_input() {
        let members = fury();
        let tasks = vec![task("1", "Fury", TaskStatus::InProgress, TaskOrigin::Issue, 14)];
        let out = overlay(&members, &tasks, &FreshMarkers::default(), None);
        assert_eq!(members[0].status, MemberStatus::Idle);
        assert_ne!(out[0].status, members[0].status);
    }

    #[test]
    fn markers_respect_staleness_window() {
        let now = SystemTime::UNIX_EPOCH + Duration::from_secs(10_000);
        let mut src = MemorySource::new();
        src.touch("/m/fury", now - Duration::from_secs(60))
            .touch("/m/banner.md", now - Duration::from_secs(301))
            .touch("/m/dr-strange.txt", now - Duration::from_secs(299));
        let markers = FreshMarkers::scan(&src, Path::new("/m"), now, DEFAULT_MARKER_STALENESS);
        assert!(markers.is_fresh(&Member::new("Fury", "Lead")));
        assert!(markers.is_fresh(&Member::new("Dr. Strange", "Mage")));
        assert!(!markers.is_fresh(&Member::new("Banner", "Dev")));

        let none = FreshMarkers::scan(&src, Path::new("/nope"), now, DEFAULT_MARKER_STALENESS);
        assert!(none.is_empty());
    }

    #[test]
    fn snapshot_round_trips_into_previous() {
        let tasks = vec![task("9", "Fury", TaskStatus::InProgress, TaskOrigin::Issue, 14)];
        let first = overlay(&fury(), &tasks, &FreshMarkers::default(), None);
        let previous = snapshot(&first);
        let second = overlay(&fury(), &[], &FreshMarkers::default(), Some(&previous));
        assert_eq!(second, first);
    }
}
