use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

/// Quiet window between the last document change and the reparse it
/// triggers.
pub const QUIET_WINDOW: Duration = Duration::from_millis(300);

/// Pending reparses behind a single delayed trigger.
///
/// Each scheduled change pushes the shared deadline out by the full
/// window, so a burst of saves to any mix of documents drains as one
/// batch once the burst goes quiet. The clock is passed in by the
/// caller, never read here, so tests drive the queue with virtual
/// instants.
#[derive(Debug)]
pub struct ReparseQueue {
    pending: BTreeSet<PathBuf>,
    deadline: Option<Instant>,
    window: Duration,
}

impl ReparseQueue {
    pub fn new() -> Self {
        Self::with_window(QUIET_WINDOW)
    }

    pub fn with_window(window: Duration) -> Self {
        ReparseQueue {
            pending: BTreeSet::new(),
            deadline: None,
            window,
        }
    }

    /// Mark `path` as needing a reparse and restart the quiet window.
    pub fn schedule(&mut self, path: &Path, now: Instant) {
        self.pending.insert(path.to_path_buf());
        self.deadline = Some(now + self.window);
    }

    /// Forget a pending path (its document is gone).
    pub fn discard(&mut self, path: &Path) {
        self.pending.remove(path);
        if self.pending.is_empty() {
            self.deadline = None;
        }
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// When the queue next wants a call to `drain_due`, if ever.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Take every pending path once the deadline has passed. All or
    /// nothing: before the deadline this returns nothing, after it the
    /// whole batch comes out and the queue resets.
    pub fn drain_due(&mut self, now: Instant) -> Vec<PathBuf> {
        match self.deadline {
            Some(deadline) if now >= deadline => {
                self.deadline = None;
                std::mem::take(&mut self.pending).into_iter().collect()
            }
            _ => Vec::new(),
        }
    }
}

impl Default for ReparseQueue {
    fn default() -> Self {
        Self::new()
    }
}
