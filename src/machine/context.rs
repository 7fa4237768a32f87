//! Per-call context handed to state lifecycle methods.

use crate::core::{downcast_state, downcast_state_mut, Clock, State};
use crate::machine::transition::TransitionRequest;
use crate::machine::MachineId;
use std::any::Any;
use std::time::{Duration, Instant};
use tracing::debug;

/// Builds a fresh state, used for the machine's idle fallback.
pub type StateFactory<G> = Box<dyn Fn() -> Box<dyn State<G>>>;

/// A state's view of its machine for the duration of one lifecycle call.
///
/// The context borrows the machine's game value, the suspended parent (if
/// the current state was pushed) and the pending-transition slot. Requests
/// written here are applied at the start of the next tick; only the last
/// one written before then is honored.
pub struct StateContext<'a, G> {
    pub(crate) machine_name: &'a str,
    pub(crate) machine_id: MachineId,
    pub(crate) game: &'a mut G,
    pub(crate) parent: Option<&'a mut (dyn State<G> + 'static)>,
    pub(crate) pending: &'a mut Option<TransitionRequest<G>>,
    pub(crate) clock: &'a dyn Clock,
    pub(crate) idle: Option<&'a StateFactory<G>>,
    pub(crate) idle_timeout: Option<Duration>,
}

impl<'a, G: 'static> StateContext<'a, G> {
    pub fn machine_name(&self) -> &str {
        self.machine_name
    }

    pub fn machine_id(&self) -> MachineId {
        self.machine_id
    }

    pub fn game(&self) -> &G {
        &*self.game
    }

    pub fn game_mut(&mut self) -> &mut G {
        &mut *self.game
    }

    pub fn now(&self) -> Instant {
        self.clock.now()
    }

    /// Idle timeout configured on the machine, if any.
    pub fn idle_timeout(&self) -> Option<Duration> {
        self.idle_timeout
    }

    /// The state suspended directly below the current one.
    pub fn parent_state(&self) -> Option<&(dyn State<G> + 'static)> {
        match &self.parent {
            Some(parent) => Some(&**parent),
            None => None,
        }
    }

    pub fn parent_state_mut(&mut self) -> Option<&mut (dyn State<G> + 'static)> {
        match &mut self.parent {
            Some(parent) => Some(&mut **parent),
            None => None,
        }
    }

    /// The parent state downcast to `T`; `None` if there is no parent or it
    /// has another type. A parent wrapped in
    /// [`CanTimeoutState`](crate::timeout::CanTimeoutState) matches both the
    /// wrapper and the wrapped type.
    pub fn parent<T: Any>(&self) -> Option<&T> {
        downcast_state(self.parent_state()?)
    }

    pub fn parent_mut<T: Any>(&mut self) -> Option<&mut T> {
        downcast_state_mut(self.parent_state_mut()?)
    }

    /// Replace the current state with `state` at the next tick.
    pub fn set_next_state<S: State<G>>(&mut self, state: S) {
        self.request(TransitionRequest::SetNext(Box::new(state)));
    }

    /// Suspend the current state and push `state` above it at the next tick.
    pub fn push_sub_state<S: State<G>>(&mut self, state: S) {
        self.request(TransitionRequest::Push(Box::new(state)));
    }

    /// Exit the current state and resume its parent at the next tick.
    pub fn pop_state(&mut self) {
        self.request(TransitionRequest::Pop);
    }

    /// Replace the current state with a fresh idle state.
    ///
    /// Returns `false` when the machine has no idle state configured; nothing
    /// is requested in that case.
    pub fn request_idle_state(&mut self) -> bool {
        match self.idle {
            Some(factory) => {
                self.request(TransitionRequest::SetNext(factory()));
                true
            }
            None => false,
        }
    }

    pub fn request(&mut self, request: TransitionRequest<G>) {
        store_request(self.machine_name, self.pending, request);
    }

    pub fn has_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Drop any request made so far this tick.
    pub fn cancel_pending(&mut self) -> bool {
        self.pending.take().is_some()
    }
}

/// Write into the single pending slot, last write wins.
pub(crate) fn store_request<G: 'static>(
    machine: &str,
    slot: &mut Option<TransitionRequest<G>>,
    request: TransitionRequest<G>,
) {
    if let Some(previous) = slot.as_ref() {
        debug!(
            machine = machine,
            discarded = ?previous,
            requested = ?request,
            "Replacing pending transition request"
        );
    }
    *slot = Some(request);
}
