//! Transition history tracking.
//!
//! Every transition a machine applies is recorded as a [`TransitionRecord`].
//! The history is bounded: once full, the oldest record is dropped.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::fmt;

/// Which stack operation produced a transition.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TransitionKind {
    /// Leaf replaced by a sibling.
    SetNext,
    /// Child pushed over a suspended parent.
    Push,
    /// Leaf exited, parent current again.
    Pop,
}

impl fmt::Display for TransitionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::SetNext => "set_next",
            Self::Push => "push",
            Self::Pop => "pop",
        };
        f.write_str(name)
    }
}

/// Record of a single applied transition.
///
/// `from` is `None` when a state was entered on an empty machine.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TransitionRecord {
    pub kind: TransitionKind,
    pub from: Option<String>,
    pub to: String,
    /// Stack depth after the transition.
    pub depth: usize,
    pub timestamp: DateTime<Utc>,
}

/// Bounded, ordered history of transitions.
///
/// # Example
///
/// ```rust
/// use chrono::Utc;
/// use turnstack::core::{TransitionHistory, TransitionKind, TransitionRecord};
///
/// let mut history = TransitionHistory::with_capacity(8);
/// history.record(TransitionRecord {
///     kind: TransitionKind::SetNext,
///     from: None,
///     to: "Idle".to_string(),
///     depth: 1,
///     timestamp: Utc::now(),
/// });
/// history.record(TransitionRecord {
///     kind: TransitionKind::Push,
///     from: Some("Idle".to_string()),
///     to: "Countdown".to_string(),
///     depth: 2,
///     timestamp: Utc::now(),
/// });
///
/// assert_eq!(history.path(), vec!["Idle", "Countdown"]);
/// ```
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TransitionHistory {
    records: VecDeque<TransitionRecord>,
    capacity: usize,
}

impl TransitionHistory {
    pub const DEFAULT_CAPACITY: usize = 64;

    /// Create an empty history keeping at most `capacity` records.
    ///
    /// A capacity of zero disables recording.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            records: VecDeque::with_capacity(capacity.min(Self::DEFAULT_CAPACITY)),
            capacity,
        }
    }

    pub fn record(&mut self, record: TransitionRecord) {
        if self.capacity == 0 {
            return;
        }
        if self.records.len() == self.capacity {
            self.records.pop_front();
        }
        self.records.push_back(record);
    }

    pub fn records(&self) -> impl Iterator<Item = &TransitionRecord> {
        self.records.iter()
    }

    pub fn last(&self) -> Option<&TransitionRecord> {
        self.records.back()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// States that became current, in order.
    ///
    /// Starts with the `from` of the oldest retained record when there is one,
    /// then the `to` of every record.
    pub fn path(&self) -> Vec<&str> {
        let mut path = Vec::with_capacity(self.records.len() + 1);
        if let Some(from) = self.records.front().and_then(|r| r.from.as_deref()) {
            path.push(from);
        }
        path.extend(self.records.iter().map(|r| r.to.as_str()));
        path
    }

    pub fn clear(&mut self) {
        self.records.clear();
    }
}

impl Default for TransitionHistory {
    fn default() -> Self {
        Self::with_capacity(Self::DEFAULT_CAPACITY)
    }
}
