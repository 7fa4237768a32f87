//! Builder API for ergonomic state machine construction.
//!
//! # Example
//!
//! ```rust
//! use turnstack::builder::StateMachineBuilder;
//! use turnstack::core::State;
//! use turnstack::machine::StateContext;
//!
//! struct Lobby;
//!
//! impl State<()> for Lobby {
//!     fn name(&self) -> &str {
//!         "Lobby"
//!     }
//!
//!     fn update(&mut self, _ctx: &mut StateContext<'_, ()>) {}
//! }
//!
//! let mut machine = StateMachineBuilder::new()
//!     .name("lobby")
//!     .initial(Lobby)
//!     .idle_state(|| Lobby)
//!     .build(())
//!     .unwrap();
//!
//! machine.update_current();
//! assert_eq!(machine.current_state_name(), Some("Lobby"));
//! ```

pub mod error;
pub mod machine;

pub use error::BuildError;
pub use machine::StateMachineBuilder;
