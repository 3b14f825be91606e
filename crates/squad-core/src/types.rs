use crate::error::SquadError;
use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// TaskStatus
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Pending,
    InProgress,
    Completed,
}

impl TaskStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            TaskStatus::Pending => "pending",
            TaskStatus::InProgress => "in_progress",
            TaskStatus::Completed => "completed",
        }
    }

    pub fn is_completed(self) -> bool {
        matches!(self, TaskStatus::Completed)
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for TaskStatus {
    type Err = SquadError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(TaskStatus::Pending),
            "in_progress" | "in-progress" => Ok(TaskStatus::InProgress),
            "completed" => Ok(TaskStatus::Completed),
            _ => Err(SquadError::InvalidTaskStatus(s.to_string())),
        }
    }
}

// ---------------------------------------------------------------------------
// TaskOrigin
// ---------------------------------------------------------------------------

/// Which derivation pass produced a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskOrigin {
    /// A numeric issue reference; the id is the issue number.
    Issue,
    /// One `- **Agent:** description` item of a "What Was Done" section.
    WorkItem,
    /// One task per log entry when nothing more specific is available.
    Synthetic,
}

impl fmt::Display for TaskOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TaskOrigin::Issue => "issue",
            TaskOrigin::WorkItem => "work_item",
            TaskOrigin::Synthetic => "synthetic",
        };
        f.write_str(s)
    }
}

// ---------------------------------------------------------------------------
// MemberStatus
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MemberStatus {
    WorkingOnIssue,
    ReviewingPr,
    WaitingReview,
    Working,
    Idle,
}

impl MemberStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            MemberStatus::WorkingOnIssue => "working-on-issue",
            MemberStatus::ReviewingPr => "reviewing-pr",
            MemberStatus::WaitingReview => "waiting-review",
            MemberStatus::Working => "working",
            MemberStatus::Idle => "idle",
        }
    }

    /// Every status except `Idle` counts as actively working.
    pub fn is_working(self) -> bool {
        !matches!(self, MemberStatus::Idle)
    }
}

impl fmt::Display for MemberStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for MemberStatus {
    type Err = SquadError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "working-on-issue" => Ok(MemberStatus::WorkingOnIssue),
            "reviewing-pr" => Ok(MemberStatus::ReviewingPr),
            "waiting-review" => Ok(MemberStatus::WaitingReview),
            "working" => Ok(MemberStatus::Working),
            "idle" => Ok(MemberStatus::Idle),
            _ => Err(SquadError::InvalidMemberStatus(s.to_string())),
        }
    }
}

// ---------------------------------------------------------------------------
// ActivityContext
// ---------------------------------------------------------------------------

/// What a working member is doing, for display next to their status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivityContext {
    pub description: String,
    pub short_label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub number: Option<u32>,
}

// ---------------------------------------------------------------------------
// LogScope / LogKind
// ---------------------------------------------------------------------------

/// Which directories log discovery reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogScope {
    /// Only the orchestration directory; allowed to affect current status.
    Status,
    /// Union of every configured log directory; history and reporting only.
    All,
}

impl fmt::Display for LogScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            LogScope::Status => "status",
            LogScope::All => "all",
        })
    }
}

impl std::str::FromStr for LogScope {
    type Err = SquadError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "status" => Ok(LogScope::Status),
            "all" => Ok(LogScope::All),
            _ => Err(SquadError::InvalidLogScope(s.to_string())),
        }
    }
}

/// Routing logs carry a `Thhmm` time in their filename; session logs do not.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogKind {
    Routing,
    Session,
}

impl fmt::Display for LogKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            LogKind::Routing => "routing",
            LogKind::Session => "session",
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
