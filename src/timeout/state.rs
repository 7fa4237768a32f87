//! Timeout decorator for states.

use crate::core::{PauseReason, ReactionaryBehavior, State};
use crate::machine::StateContext;
use crate::timeout::TimeoutPolicy;
use std::any::Any;
use tracing::{debug, warn};

/// A state that owns a [`TimeoutPolicy`] and reacts when it expires.
///
/// Wrap it in [`CanTimeoutState`] to have the policy checked before every
/// update.
pub trait CanTimeout<G: 'static>: State<G> {
    fn timeout_policy(&mut self) -> &mut TimeoutPolicy;

    /// Called once when the armed timer expires.
    ///
    /// The default requests the machine's idle state. Override to re-arm
    /// (extend the idle window), resend the same state, or go elsewhere.
    fn handle_timeout(&mut self, ctx: &mut StateContext<'_, G>) {
        if !ctx.request_idle_state() {
            warn!(
                machine = ctx.machine_name(),
                state = self.name(),
                "Timed out but machine has no idle state configured"
            );
        }
    }
}

/// Runs the timeout check of a [`CanTimeout`] state ahead of its update.
///
/// If the timeout handler leaves a transition pending, the inner update is
/// skipped for that tick so it cannot overwrite the fallback.
///
/// # Example
///
/// ```rust
/// use std::sync::Arc;
/// use std::time::Duration;
/// use turnstack::core::{ManualClock, State};
/// use turnstack::machine::{StateContext, StateMachine};
/// use turnstack::timeout::{CanTimeout, CanTimeoutState, TimeoutPolicy};
///
/// struct Idle;
///
/// impl State<()> for Idle {
///     fn name(&self) -> &str {
///         "Idle"
///     }
///
///     fn update(&mut self, _ctx: &mut StateContext<'_, ()>) {}
/// }
///
/// struct WaitForTap {
///     timeout: TimeoutPolicy,
/// }
///
/// impl State<()> for WaitForTap {
///     fn name(&self) -> &str {
///         "WaitForTap"
///     }
///
///     fn enter(&mut self, ctx: &mut StateContext<'_, ()>) {
///         self.timeout.set_timeout_duration(ctx.now(), Duration::from_secs(10));
///     }
///
///     fn update(&mut self, _ctx: &mut StateContext<'_, ()>) {}
/// }
///
/// impl CanTimeout<()> for WaitForTap {
///     fn timeout_policy(&mut self) -> &mut TimeoutPolicy {
///         &mut self.timeout
///     }
/// }
///
/// let clock = ManualClock::new();
/// let mut machine = StateMachine::new("tap", ()).with_clock(Arc::new(clock.clone()));
/// machine.set_idle_state(|| Idle);
/// machine.set_next_state(CanTimeoutState::new(WaitForTap {
///     timeout: TimeoutPolicy::new(),
/// }));
///
/// machine.update_current();
/// clock.advance(Duration::from_secs(10));
/// machine.update_current();
/// machine.update_current();
///
/// assert_eq!(machine.current_state_name(), Some("Idle"));
/// ```
pub struct CanTimeoutState<S> {
    inner: S,
}

impl<S> CanTimeoutState<S> {
    pub fn new(inner: S) -> Self {
        Self { inner }
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }

    pub fn inner_mut(&mut self) -> &mut S {
        &mut self.inner
    }

    pub fn into_inner(self) -> S {
        self.inner
    }
}

impl<G: 'static, S: CanTimeout<G>> State<G> for CanTimeoutState<S> {
    fn name(&self) -> &str {
        self.inner.name()
    }

    fn enter(&mut self, ctx: &mut StateContext<'_, G>) {
        self.inner.enter(ctx);
    }

    fn update(&mut self, ctx: &mut StateContext<'_, G>) {
        let now = ctx.now();
        if self.inner.timeout_policy().poll(now) {
            debug!(machine = ctx.machine_name(), state = self.inner.name(), "State timed out");
            let had_pending = ctx.has_pending();
            self.inner.handle_timeout(ctx);
            if ctx.has_pending() && !had_pending {
                return;
            }
        }
        self.inner.update(ctx);
    }

    fn exit(&mut self, ctx: &mut StateContext<'_, G>) {
        self.inner.exit(ctx);
    }

    fn pause(
        &mut self,
        reason: PauseReason,
        behavior: &ReactionaryBehavior,
        ctx: &mut StateContext<'_, G>,
    ) {
        self.inner.pause(reason, behavior, ctx);
    }

    fn resume(
        &mut self,
        reason: PauseReason,
        behavior: &ReactionaryBehavior,
        ctx: &mut StateContext<'_, G>,
    ) {
        self.inner.resume(reason, behavior, ctx);
    }

    fn as_inner_any(&self) -> &dyn Any {
        self.inner.as_inner_any()
    }

    fn as_inner_any_mut(&mut self) -> &mut dyn Any {
        self.inner.as_inner_any_mut()
    }
}
