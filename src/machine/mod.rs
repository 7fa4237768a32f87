//! The stack machine and its transition protocol.
//!
//! # Key Concepts
//!
//! - **Leaf**: the state on top of the stack, the only one updated
//! - **Push / Pop**: suspend the leaf under a sub-state and later return to it
//!   without re-entering it
//! - **Set next**: replace the leaf with a sibling, exiting it
//! - **Pending slot**: one request per machine, last write wins, applied at
//!   the start of the following tick

mod context;
#[allow(clippy::module_inception)]
mod machine;
mod transition;

pub use context::{StateContext, StateFactory};
pub use machine::{MachineId, StateMachine};
pub use transition::{MachineError, TransitionRequest};
