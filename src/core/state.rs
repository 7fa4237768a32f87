//! Core State trait for stack machine states.
//!
//! A state is a single behavioral unit driven by its owning
//! [`StateMachine`](crate::machine::StateMachine). Every lifecycle call
//! receives a [`StateContext`] which is the state's only window onto the
//! machine: the shared game value, the suspended parent, the clock and the
//! transition-request slot.

use crate::machine::StateContext;
use serde::{Deserialize, Serialize};
use std::any::Any;
use std::fmt;

/// Why a state machine was paused from outside its own transition protocol.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PauseReason {
    /// The robot engine reported a reactionary behavior taking control.
    EngineMessage,
    /// The host application was backgrounded or suspended.
    Application,
}

/// Name of the reactive robot behavior that seized control.
///
/// The core treats it as an opaque tag; only the host knows the catalogue of
/// behaviors its robot can run.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ReactionaryBehavior(String);

impl ReactionaryBehavior {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ReactionaryBehavior {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Upcast helper so boxed states can be downcast to their concrete type.
///
/// Implemented for every `'static` type; never implement it by hand.
pub trait AsAny: Any {
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<T: Any> AsAny for T {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// Trait for states run by a [`StateMachine<G>`](crate::machine::StateMachine).
///
/// `G` is the game/context type owned by the machine. States never hold a
/// reference to it; they reach it through the context passed to each call.
///
/// # Lifecycle
///
/// - [`enter`](State::enter) runs exactly once when the state becomes current,
///   after the previous state's [`exit`](State::exit) has returned.
/// - [`update`](State::update) runs once per tick while the state is the leaf.
/// - [`exit`](State::exit) runs exactly once when the state stops being
///   current: replaced, popped, or the machine stopped. It must cancel robot
///   commands the state still waits on and stop continuous effects.
/// - [`pause`](State::pause) / [`resume`](State::resume) bracket an external
///   interruption. A state suspended by a pushed sub-state is neither paused
///   nor exited.
///
/// Transition requests made from any lifecycle call are applied at the start
/// of the next tick.
///
/// # Example
///
/// ```rust
/// use turnstack::core::State;
/// use turnstack::machine::StateContext;
///
/// struct Score(u32);
///
/// struct CountUp {
///     ticks: u32,
/// }
///
/// impl State<Score> for CountUp {
///     fn name(&self) -> &str {
///         "CountUp"
///     }
///
///     fn update(&mut self, ctx: &mut StateContext<'_, Score>) {
///         self.ticks += 1;
///         ctx.game_mut().0 += 1;
///     }
/// }
/// ```
pub trait State<G>: AsAny {
    /// Name used in logs and transition history.
    fn name(&self) -> &str;

    fn enter(&mut self, _ctx: &mut StateContext<'_, G>) {}

    fn update(&mut self, ctx: &mut StateContext<'_, G>);

    fn exit(&mut self, _ctx: &mut StateContext<'_, G>) {}

    /// Called on the leaf when a reactive behavior takes over the robot.
    ///
    /// Default is a no-op: the interruption is assumed transient and any
    /// outstanding completions are expected to still arrive.
    fn pause(
        &mut self,
        _reason: PauseReason,
        _behavior: &ReactionaryBehavior,
        _ctx: &mut StateContext<'_, G>,
    ) {
    }

    fn resume(
        &mut self,
        _reason: PauseReason,
        _behavior: &ReactionaryBehavior,
        _ctx: &mut StateContext<'_, G>,
    ) {
    }

    /// The user state behind any wrapper, for typed parent and leaf lookups.
    ///
    /// Wrappers such as
    /// [`CanTimeoutState`](crate::timeout::CanTimeoutState) return their inner
    /// state; every other state returns itself.
    fn as_inner_any(&self) -> &dyn Any {
        self.as_any()
    }

    fn as_inner_any_mut(&mut self) -> &mut dyn Any {
        self.as_any_mut()
    }
}

/// Downcast a state to `T`, looking through wrappers first.
pub(crate) fn downcast_state<'a, G: 'static, T: Any>(
    state: &'a (dyn State<G> + 'static),
) -> Option<&'a T> {
    state
        .as_inner_any()
        .downcast_ref::<T>()
        .or_else(|| state.as_any().downcast_ref::<T>())
}

pub(crate) fn downcast_state_mut<'a, G: 'static, T: Any>(
    state: &'a mut (dyn State<G> + 'static),
) -> Option<&'a mut T> {
    if state.as_inner_any().is::<T>() {
        state.as_inner_any_mut().downcast_mut::<T>()
    } else {
        state.as_any_mut().downcast_mut::<T>()
    }
}
