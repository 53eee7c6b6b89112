//! Delayed Task Scheduler
//!
//! Timers the frame loop needs (invulnerability expiry, overlay delays,
//! results hand-off) kept as plain data against a millisecond clock.
//! Every task carries the id of the session that scheduled it; tasks from
//! a replaced session are dropped instead of fired.

use std::collections::BTreeMap;
use std::time::Duration;

use crate::game::state::{InvulnerabilityWindow, SessionId};

/// Slot a task occupies. One pending task per slot.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum TaskKind {
    /// End of the post-hit invulnerability window
    ExpireInvulnerability,
    /// Question overlay linger after an answer
    HideQuestion,
    /// Game-over screen delay
    ShowGameOver,
    /// Results hand-off delay
    PublishResults,
}

/// Work to run when a task comes due.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Task {
    /// Expire this invulnerability window.
    ExpireInvulnerability(InvulnerabilityWindow),
    /// Hide the question overlay and resume play.
    HideQuestion,
    /// Show the game-over screen.
    ShowGameOver,
    /// Publish results to the sink.
    PublishResults,
}

impl Task {
    /// Slot for this task.
    pub fn kind(&self) -> TaskKind {
        match self {
            Task::ExpireInvulnerability(_) => TaskKind::ExpireInvulnerability,
            Task::HideQuestion => TaskKind::HideQuestion,
            Task::ShowGameOver => TaskKind::ShowGameOver,
            Task::PublishResults => TaskKind::PublishResults,
        }
    }
}

/// A task waiting for its due time.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ScheduledTask {
    /// Session that scheduled it.
    pub session: SessionId,
    /// Clock time (ms) at which it fires.
    pub due_ms: u64,
    /// What to do.
    pub task: Task,
}

/// Session-tagged delayed tasks.
#[derive(Debug)]
pub struct Scheduler {
    /// Live session; tasks for any other id are stale.
    session: SessionId,
    /// Pending tasks by slot
    pending: BTreeMap<TaskKind, ScheduledTask>,
}

impl Scheduler {
    /// Scheduler for `session`.
    pub fn new(session: SessionId) -> Self {
        Self { session, pending: BTreeMap::new() }
    }

    /// Live session id.
    pub fn session(&self) -> SessionId {
        self.session
    }

    /// Switch to a new live session. Tasks already pending for the old one
    /// stay queued but will never fire.
    pub fn bind(&mut self, session: SessionId) {
        self.session = session;
    }

    /// Schedule `task` to fire `delay` after `now_ms`, replacing any task
    /// pending in the same slot.
    pub fn schedule(&mut self, task: Task, now_ms: u64, delay: Duration) -> ScheduledTask {
        let scheduled = ScheduledTask {
            session: self.session,
            due_ms: now_ms.saturating_add(delay.as_millis() as u64),
            task,
        };
        if let Some(replaced) = self.pending.insert(task.kind(), scheduled) {
            tracing::trace!(kind = ?replaced.task.kind(), due_ms = replaced.due_ms, "task replaced");
        }
        scheduled
    }

    /// Drop the pending task in `kind`'s slot.
    pub fn cancel(&mut self, kind: TaskKind) -> Option<ScheduledTask> {
        self.pending.remove(&kind)
    }

    /// Is a task pending in this slot?
    pub fn is_pending(&self, kind: TaskKind) -> bool {
        self.pending.contains_key(&kind)
    }

    /// Pending task in this slot.
    pub fn get(&self, kind: TaskKind) -> Option<&ScheduledTask> {
        self.pending.get(&kind)
    }

    /// Number of pending tasks (stale ones included until the next advance).
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    /// No pending tasks?
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Remove and return every live task due at `now_ms`, earliest first.
    ///
    /// Tasks tagged with a replaced session are discarded.
    pub fn advance(&mut self, now_ms: u64) -> Vec<Task> {
        let live = self.session;
        let mut due = Vec::new();

        self.pending.retain(|kind, scheduled| {
            if scheduled.session != live {
                tracing::debug!(
                    kind = ?kind,
                    session = %scheduled.session,
                    "dropping task from replaced session"
                );
                return false;
            }
            if scheduled.due_ms <= now_ms {
                due.push(*scheduled);
                return false;
            }
            true
        });

        due.sort_by_key(|s| (s.due_ms, s.task.kind()));
        due.into_iter().map(|s| s.task).collect()
    }
}
