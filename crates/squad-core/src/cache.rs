//! Caller-owned memoization over a `Squad`.
//!
//! The engine itself holds no state. A host that watches the team directory
//! keeps one `SquadCache`, reads through it, and calls `invalidate()` when
//! something changed on disk. Member statuses computed before an
//! invalidation are fed back as "previous" statuses afterwards, so members
//! without visible tasks keep what they had.

use crate::decision::DecisionEntry;
use crate::log::LogEntry;
use crate::roster::{Member, Roster};
use crate::squad::Squad;
use crate::status::{overlay, snapshot, PreviousStatus};
use crate::task::TaskDerivation;
use crate::types::LogScope;
use std::time::SystemTime;

#[derive(Default)]
struct Slots {
    status_entries: Option<Vec<LogEntry>>,
    all_entries: Option<Vec<LogEntry>>,
    status_tasks: Option<TaskDerivation>,
    all_tasks: Option<TaskDerivation>,
    roster: Option<Roster>,
    members: Option<Vec<Member>>,
    decisions: Option<Vec<DecisionEntry>>,
}

pub struct SquadCache {
    squad: Squad,
    slots: Slots,
    previous: Option<PreviousStatus>,
    generation: u64,
}

impl SquadCache {
    pub fn new(squad: Squad) -> Self {
        Self {
            squad,
            slots: Slots::default(),
            previous: None,
            generation: 0,
        }
    }

    pub fn squad(&self) -> &Squad {
        &self.squad
    }

    /// Number of invalidations so far.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn log_entries(&mut self, scope: LogScope) -> &[LogEntry] {
        let squad = &self.squad;
        let slot = match scope {
            LogScope::Status => &mut self.slots.status_entries,
            LogScope::All => &mut self.slots.all_entries,
        };
        slot.get_or_insert_with(|| squad.log_entries(scope))
    }

    pub fn tasks(&mut self, scope: LogScope) -> &TaskDerivation {
        let squad = &self.squad;
        let slot = match scope {
            LogScope::Status => &mut self.slots.status_tasks,
            LogScope::All => &mut self.slots.all_tasks,
        };
        slot.get_or_insert_with(|| squad.tasks(scope))
    }

    pub fn roster(&mut self) -> &Roster {
        let squad = &self.squad;
        self.slots.roster.get_or_insert_with(|| squad.roster())
    }

    /// Members overlaid from the cached roster and status-relevant tasks.
    pub fn members(&mut self) -> &[Member] {
        if self.slots.members.is_none() {
            let squad = &self.squad;
            let roster = self.slots.roster.get_or_insert_with(|| squad.roster());
            let tasks = self
                .slots
                .status_tasks
                .get_or_insert_with(|| squad.tasks(LogScope::Status));
            let markers = squad.markers(SystemTime::now());
            let members = overlay(&roster.members, &tasks.tasks, &markers, self.previous.as_ref());
            self.slots.members = Some(members);
        }
        self.slots.members.as_deref().unwrap_or_default()
    }

    pub fn decisions(&mut self) -> &[DecisionEntry] {
        let squad = &self.squad;
        self.slots.decisions.get_or_insert_with(|| squad.decisions())
    }

    /// Drop every memoized result. Computed member statuses are kept as the
    /// previous statuses for the next read.
    pub fn invalidate(&mut self) {
        if let Some(members) = &self.slots.members {
            self.previous = Some(snapshot(members));
        }
        self.slots = Slots::default();
        self.generation += 1;
        tracing::debug!(generation = self.generation, "squad cache invalidated");
    }

    /// Invalidate and eagerly recompute members and decisions.
    pub fn refresh(&mut self) {
        self.invalidate();
        self.members();
        self.decisions();
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
