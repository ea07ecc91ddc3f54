//! Trailing-edge debounce for queue saves.
//!
//! Every edit schedules a check `delay` later. A check only asks for a save
//! when no newer edit arrived in the meantime, so a burst of edits collapses
//! into one write issued `delay` after the last of them.

use std::collections::VecDeque;

use tokio::time::{Duration, Instant};
use tracing::debug;

pub const DEFAULT_SAVE_DELAY: Duration = Duration::from_millis(2000);
pub const DEFAULT_SAVE_GUARD: Duration = Duration::from_millis(100);

#[derive(Debug, Clone)]
pub struct PersistenceScheduler {
    delay: Duration,
    guard: Duration,
    last_edit: Option<Instant>,
    checks: VecDeque<Instant>,
    saved: bool,
}

impl PersistenceScheduler {
    pub fn new(delay: Duration, guard: Duration) -> Self {
        Self {
            delay,
            guard: guard.min(delay),
            last_edit: None,
            checks: VecDeque::new(),
            saved: true,
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    pub fn is_saved(&self) -> bool {
        self.saved
    }

    /// Marks the queue dirty and schedules a check. Returns when it is due.
    pub fn record_edit(&mut self, now: Instant) -> Instant {
        self.saved = false;
        self.last_edit = Some(now);
        let due = now + self.delay;
        self.checks.push_back(due);
        due
    }

    pub fn next_check(&self) -> Option<Instant> {
        self.checks.front().copied()
    }

    /// Consumes every check due at `now`. Returns true when the quiet period
    /// since the last edit is long enough to persist.
    pub fn fire_due_checks(&mut self, now: Instant) -> bool {
        let mut fired = false;
        while self.checks.front().is_some_and(|due| *due <= now) {
            self.checks.pop_front();
            fired = true;
        }
        if !fired {
            return false;
        }

        let Some(last_edit) = self.last_edit else {
            return false;
        };
        let quiet = now.saturating_duration_since(last_edit);
        let due = quiet >= self.delay - self.guard;
        debug!(quiet_ms = quiet.as_millis() as u64, due, "debounce check");
        due
    }

    /// A write of `persisted` finished. The dirty flag only clears when no edit
    /// happened after the snapshot was taken.
    pub fn mark_saved(&mut self, persisted: u64, current: u64) -> bool {
        if persisted == current {
            self.saved = true;
        }
        self.saved
    }

    /// Schedules another attempt after a failed write.
    pub fn retry(&mut self, now: Instant) -> Instant {
        self.record_edit(now)
    }

    /// Drops pending checks, e.g. when the queue is replaced by another account's.
    pub fn reset(&mut self) {
        self.last_edit = None;
        self.checks.clear();
        self.saved = true;
    }
}

impl Default for PersistenceScheduler {
    fn default() -> Self {
        Self::new(DEFAULT_SAVE_DELAY, DEFAULT_SAVE_GUARD)
    }
}

#[cfg(test)]
#[path = "tests/persistence_tests.rs"]
mod tests;
