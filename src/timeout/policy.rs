//! Arming and polling of an idle timeout.

use crate::core::TimerGate;
use std::time::{Duration, Instant};

/// An idle timer a state can embed.
///
/// The policy starts unarmed. [`set_timeout_duration`](Self::set_timeout_duration)
/// arms it from the given instant; [`poll`](Self::poll) reports expiry exactly
/// once per arming.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TimeoutPolicy {
    gate: Option<TimerGate>,
    fired: bool,
}

impl TimeoutPolicy {
    pub fn new() -> Self {
        Self::default()
    }

    /// A policy already armed at `now`.
    pub fn armed(now: Instant, duration: Duration) -> Self {
        let mut policy = Self::new();
        policy.set_timeout_duration(now, duration);
        policy
    }

    /// Arm, or re-arm, the timer from `now`.
    ///
    /// Re-arming resets the clock; call it on player input to extend the idle
    /// window.
    pub fn set_timeout_duration(&mut self, now: Instant, duration: Duration) {
        self.gate = Some(TimerGate::new(now, duration));
        self.fired = false;
    }

    pub fn disarm(&mut self) {
        self.gate = None;
        self.fired = false;
    }

    pub fn is_armed(&self) -> bool {
        self.gate.is_some()
    }

    pub fn has_fired(&self) -> bool {
        self.fired
    }

    pub fn gate(&self) -> Option<&TimerGate> {
        self.gate.as_ref()
    }

    /// Remaining time, or `None` when unarmed.
    pub fn remaining(&self, now: Instant) -> Option<Duration> {
        self.gate.map(|gate| gate.remaining(now))
    }

    /// True on the first poll at or after expiry, false otherwise.
    pub fn poll(&mut self, now: Instant) -> bool {
        match self.gate {
            Some(gate) if !self.fired && gate.is_expired(now) => {
                self.fired = true;
                true
            }
            _ => false,
        }
    }
}
