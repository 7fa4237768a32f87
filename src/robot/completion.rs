//! Stale-safe completion slots for asynchronous robot commands.
//!
//! A state issues a command with a callback from [`CommandTracker::track`]
//! and keeps the matching [`Completion`]. The callback may fire on any thread
//! and only writes the slot; the state reads it during `update`. Cancelling
//! the tracker in `exit` turns any late callback into a no-op.

use crate::robot::CompletionCallback;
use parking_lot::Mutex;
use std::sync::Arc;

/// Observed state of one command.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CommandStatus {
    Pending,
    Succeeded,
    Failed,
    /// The issuer stopped waiting; any later result is discarded.
    Cancelled,
}

impl CommandStatus {
    /// Succeeded or failed.
    pub fn is_finished(self) -> bool {
        matches!(self, Self::Succeeded | Self::Failed)
    }
}

#[derive(Debug)]
enum Slot {
    Pending,
    Done(bool),
    Cancelled,
}

/// Shared handle to a command's outcome.
#[derive(Clone, Debug)]
pub struct Completion {
    slot: Arc<Mutex<Slot>>,
}

impl Completion {
    fn new() -> Self {
        Self {
            slot: Arc::new(Mutex::new(Slot::Pending)),
        }
    }

    pub fn status(&self) -> CommandStatus {
        match *self.slot.lock() {
            Slot::Pending => CommandStatus::Pending,
            Slot::Done(true) => CommandStatus::Succeeded,
            Slot::Done(false) => CommandStatus::Failed,
            Slot::Cancelled => CommandStatus::Cancelled,
        }
    }

    /// The success flag once the command finished.
    pub fn result(&self) -> Option<bool> {
        match *self.slot.lock() {
            Slot::Done(success) => Some(success),
            _ => None,
        }
    }

    pub fn is_pending(&self) -> bool {
        matches!(*self.slot.lock(), Slot::Pending)
    }

    /// Stop waiting. Returns true if the command was still pending.
    pub fn cancel(&self) -> bool {
        let mut slot = self.slot.lock();
        if matches!(*slot, Slot::Pending) {
            *slot = Slot::Cancelled;
            true
        } else {
            false
        }
    }

    fn callback(&self) -> CompletionCallback {
        let slot = Arc::clone(&self.slot);
        Box::new(move |success| {
            let mut slot = slot.lock();
            if matches!(*slot, Slot::Pending) {
                *slot = Slot::Done(success);
            }
        })
    }
}

/// Issues completion callbacks for one state and cancels them together.
#[derive(Debug, Default)]
pub struct CommandTracker {
    issued: Vec<Completion>,
}

impl CommandTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// A new pending completion and the callback that resolves it.
    pub fn track(&mut self) -> (Completion, CompletionCallback) {
        self.issued.retain(Completion::is_pending);
        let completion = Completion::new();
        let callback = completion.callback();
        self.issued.push(completion.clone());
        (completion, callback)
    }

    /// Number of tracked commands still waiting on a result.
    pub fn pending(&self) -> usize {
        self.issued.iter().filter(|c| c.is_pending()).count()
    }

    /// Cancel every pending completion; returns how many were pending.
    pub fn cancel_all(&mut self) -> usize {
        let cancelled = self.issued.iter().filter(|c| c.cancel()).count();
        self.issued.clear();
        cancelled
    }
}
