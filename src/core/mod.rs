//! Core state machine types.
//!
//! This module contains the building blocks every machine is made of:
//! - The `State` trait and its lifecycle
//! - Clocks and the `TimerGate` timeout primitive
//! - Bounded transition history

mod history;
mod state;
mod timer;

pub use history::{TransitionHistory, TransitionKind, TransitionRecord};
pub(crate) use state::{downcast_state, downcast_state_mut};
pub use state::{AsAny, PauseReason, ReactionaryBehavior, State};
pub use timer::{Clock, ManualClock, SystemClock, TimerGate};
