//! Idle timeouts for states.
//!
//! Timeouts are composed, not inherited: a state embeds a [`TimeoutPolicy`],
//! implements [`CanTimeout`], and is wrapped in [`CanTimeoutState`] when it is
//! handed to the machine.

mod policy;
mod state;

pub use policy::TimeoutPolicy;
pub use state::{CanTimeout, CanTimeoutState};
