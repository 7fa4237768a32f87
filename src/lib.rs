//! Turnstack: a hierarchical, stack-based turn state machine
//!
//! Turnstack sequences interactive robot behavior one tick at a time. Each
//! step of a turn is a state that issues asynchronous robot commands and
//! polls their completions; sub-states can be pushed over a state and popped
//! later without losing its progress; reactive robot behaviors can pause a
//! machine; idle players are handled by timeout fallbacks.
//!
//! # Core Concepts
//!
//! - **State**: a lifecycle (`enter`/`update`/`exit`/`pause`/`resume`) run
//!   against a typed `StateContext`
//! - **StateMachine**: a stack of states with a single pending transition
//!   slot applied at the start of each tick
//! - **CanTimeoutState**: a decorator firing an overridable fallback once an
//!   idle timer expires
//! - **StateMachineManager**: several named machines ticked in order
//! - **Robot**: the command capability, with stale-safe completions
//!
//! # Example
//!
//! ```rust
//! use turnstack::core::State;
//! use turnstack::machine::{StateContext, StateMachine};
//!
//! #[derive(Default)]
//! struct Game {
//!     countdown_done: bool,
//! }
//!
//! struct Idle {
//!     started: bool,
//! }
//!
//! impl State<Game> for Idle {
//!     fn name(&self) -> &str {
//!         "Idle"
//!     }
//!
//!     fn update(&mut self, ctx: &mut StateContext<'_, Game>) {
//!         if !self.started {
//!             self.started = true;
//!             ctx.push_sub_state(Countdown { remaining: 3 });
//!         }
//!     }
//! }
//!
//! struct Countdown {
//!     remaining: u32,
//! }
//!
//! impl State<Game> for Countdown {
//!     fn name(&self) -> &str {
//!         "Countdown"
//!     }
//!
//!     fn update(&mut self, ctx: &mut StateContext<'_, Game>) {
//!         self.remaining -= 1;
//!         if self.remaining == 0 {
//!             ctx.game_mut().countdown_done = true;
//!             ctx.pop_state();
//!         }
//!     }
//! }
//!
//! let mut machine = StateMachine::new("intro", Game::default());
//! machine.set_next_state(Idle { started: false });
//!
//! for _ in 0..5 {
//!     machine.update_current();
//! }
//!
//! assert_eq!(machine.current_state_name(), Some("Idle"));
//! assert!(machine.game().countdown_done);
//! ```

pub mod builder;
pub mod config;
pub mod core;
pub mod logging;
pub mod machine;
pub mod manager;
pub mod robot;
pub mod timeout;

// Re-export commonly used types
pub use crate::builder::{BuildError, StateMachineBuilder};
pub use crate::core::{Clock, ManualClock, PauseReason, ReactionaryBehavior, State, TimerGate};
pub use crate::machine::{MachineError, StateContext, StateMachine};
pub use crate::manager::{ManagerError, StateMachineManager};
pub use crate::robot::{CommandStatus, CommandTracker, Completion, Robot};
pub use crate::timeout::{CanTimeout, CanTimeoutState, TimeoutPolicy};
