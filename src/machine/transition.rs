//! Transition requests and the errors raised while resolving them.

use crate::core::{State, TransitionKind};
use std::fmt;

/// A pending stack mutation.
///
/// A machine holds at most one of these. It is consumed at the start of the
/// next tick; a later request made before then replaces an earlier one.
pub enum TransitionRequest<G> {
    /// Exit the leaf and enter the given state in its place.
    SetNext(Box<dyn State<G>>),
    /// Suspend the leaf and enter the given state above it.
    Push(Box<dyn State<G>>),
    /// Exit the leaf and make its parent current again.
    Pop,
}

impl<G: 'static> TransitionRequest<G> {
    pub fn kind(&self) -> TransitionKind {
        match self {
            Self::SetNext(_) => TransitionKind::SetNext,
            Self::Push(_) => TransitionKind::Push,
            Self::Pop => TransitionKind::Pop,
        }
    }

    /// Name of the state this request would enter, if any.
    pub fn target_name(&self) -> Option<&str> {
        match self {
            Self::SetNext(state) | Self::Push(state) => Some(state.name()),
            Self::Pop => None,
        }
    }
}

impl<G: 'static> fmt::Debug for TransitionRequest<G> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.target_name() {
            Some(target) => write!(f, "{}({})", self.kind(), target),
            None => write!(f, "{}", self.kind()),
        }
    }
}

/// Errors that can occur while resolving a transition request.
///
/// These are programmer errors; the machine logs them and leaves its stack
/// untouched.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum MachineError {
    #[error("Cannot pop root state '{state}' on machine '{machine}'")]
    PopRoot { machine: String, state: String },

    #[error("Cannot pop on machine '{machine}': no active state")]
    EmptyStack { machine: String },
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::machine::StateContext;

    struct Named(&'static str);

    impl State<()> for Named {
        fn name(&self) -> &str {
            self.0
        }

        fn update(&mut self, _ctx: &mut StateContext<'_, ()>) {}
    }

    #[test]
    fn request_reports_kind_and_target() {
        let set: TransitionRequest<()> = TransitionRequest::SetNext(Box::new(Named("Idle")));
        let push: TransitionRequest<()> = TransitionRequest::Push(Box::new(Named("Countdown")));
        let pop: TransitionRequest<()> = TransitionRequest::Pop;

        assert_eq!(set.kind(), TransitionKind::SetNext);
        assert_eq!(set.target_name(), Some("Idle"));
        assert_eq!(push.kind(), TransitionKind::Push);
        assert_eq!(pop.target_name(), None);
    }

    #[test]
    fn request_debug_names_target() {
        let push: TransitionRequest<()> = TransitionRequest::Push(Box::new(Named("Countdown")));
        assert_eq!(format!("{push:?}"), "push(Countdown)");
        assert_eq!(format!("{:?}", TransitionRequest::<()>::Pop), "pop");
    }

    #[test]
    fn errors_name_the_machine() {
        let err = MachineError::PopRoot {
            machine: "simon".to_string(),
            state: "Idle".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Cannot pop root state 'Idle' on machine 'simon'"
        );
    }
}
