//! Stack-based state machine driven by an external tick.

use crate::core::{
    downcast_state, downcast_state_mut, Clock, PauseReason, ReactionaryBehavior, State,
    SystemClock, TransitionHistory, TransitionKind, TransitionRecord,
};
use crate::machine::context::{store_request, StateContext, StateFactory};
use crate::machine::transition::{MachineError, TransitionRequest};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, trace, warn};
use uuid::Uuid;

/// Identity of one machine instance, used to correlate log lines.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MachineId(Uuid);

impl MachineId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for MachineId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for MachineId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Who paused the machine and why.
#[derive(Clone, Debug, PartialEq)]
struct PauseInfo {
    reason: PauseReason,
    behavior: ReactionaryBehavior,
}

/// A stack of states sharing one game value `G`.
///
/// The bottom of the stack is the root, the top is the current leaf. Only the
/// leaf is updated. Transition requests are stored in a single slot and
/// applied at the start of the next [`update_current`](Self::update_current),
/// so a state never sees the stack change under it mid-call.
///
/// # Example
///
/// ```rust
/// use turnstack::core::State;
/// use turnstack::machine::{StateContext, StateMachine};
///
/// #[derive(Default)]
/// struct Game {
///     rounds: u32,
/// }
///
/// struct Round;
///
/// impl State<Game> for Round {
///     fn name(&self) -> &str {
///         "Round"
///     }
///
///     fn update(&mut self, ctx: &mut StateContext<'_, Game>) {
///         ctx.game_mut().rounds += 1;
///     }
/// }
///
/// let mut machine = StateMachine::new("rounds", Game::default());
/// machine.set_next_state(Round);
///
/// machine.update_current();
/// machine.update_current();
///
/// assert_eq!(machine.current_state_name(), Some("Round"));
/// assert_eq!(machine.game().rounds, 2);
/// ```
pub struct StateMachine<G: 'static> {
    name: String,
    id: MachineId,
    game: G,
    stack: Vec<Box<dyn State<G>>>,
    pending: Option<TransitionRequest<G>>,
    clock: Arc<dyn Clock>,
    idle: Option<StateFactory<G>>,
    idle_timeout: Option<Duration>,
    history: TransitionHistory,
    paused: Option<PauseInfo>,
}

impl<G: 'static> StateMachine<G> {
    /// Create an inactive machine; it starts once a state is requested.
    pub fn new(name: impl Into<String>, game: G) -> Self {
        Self {
            name: name.into(),
            id: MachineId::new(),
            game,
            stack: Vec::new(),
            pending: None,
            clock: Arc::new(SystemClock),
            idle: None,
            idle_timeout: None,
            history: TransitionHistory::default(),
            paused: None,
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_history_capacity(mut self, capacity: usize) -> Self {
        self.history = TransitionHistory::with_capacity(capacity);
        self
    }

    pub fn with_idle_timeout(mut self, timeout: Duration) -> Self {
        self.idle_timeout = Some(timeout);
        self
    }

    /// Configure the state used as the default timeout fallback.
    pub fn set_idle_state<S, F>(&mut self, factory: F)
    where
        S: State<G>,
        F: Fn() -> S + 'static,
    {
        self.idle = Some(Box::new(move || Box::new(factory()) as Box<dyn State<G>>));
    }

    pub(crate) fn set_idle_factory(&mut self, factory: Option<StateFactory<G>>) {
        self.idle = factory;
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn id(&self) -> MachineId {
        self.id
    }

    pub fn game(&self) -> &G {
        &self.game
    }

    pub fn game_mut(&mut self) -> &mut G {
        &mut self.game
    }

    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }

    pub fn idle_timeout(&self) -> Option<Duration> {
        self.idle_timeout
    }

    pub fn history(&self) -> &TransitionHistory {
        &self.history
    }

    /// True while at least one state is on the stack.
    pub fn is_active(&self) -> bool {
        !self.stack.is_empty()
    }

    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    pub fn has_pending(&self) -> bool {
        self.pending.is_some()
    }

    pub fn current_state(&self) -> Option<&dyn State<G>> {
        self.stack.last().map(|s| &**s)
    }

    pub fn current_state_name(&self) -> Option<&str> {
        self.stack.last().map(|s| s.name())
    }

    /// The leaf downcast to `T`.
    pub fn current<T: State<G>>(&self) -> Option<&T> {
        downcast_state(&**self.stack.last()?)
    }

    pub fn current_mut<T: State<G>>(&mut self) -> Option<&mut T> {
        downcast_state_mut(&mut **self.stack.last_mut()?)
    }

    /// The state directly below the leaf.
    pub fn parent_state(&self) -> Option<&dyn State<G>> {
        let below = self.stack.len().checked_sub(2)?;
        self.stack.get(below).map(|s| &**s)
    }

    /// Names from root to leaf.
    pub fn state_names(&self) -> Vec<&str> {
        self.stack.iter().map(|s| s.name()).collect()
    }

    /// Request a sibling replacement of the leaf at the next tick.
    pub fn set_next_state<S: State<G>>(&mut self, state: S) {
        self.request(TransitionRequest::SetNext(Box::new(state)));
    }

    /// Request that `state` be pushed over the leaf at the next tick.
    pub fn push_sub_state<S: State<G>>(&mut self, state: S) {
        self.request(TransitionRequest::Push(Box::new(state)));
    }

    /// Request that the leaf be popped at the next tick.
    pub fn pop_state(&mut self) {
        self.request(TransitionRequest::Pop);
    }

    pub fn request(&mut self, request: TransitionRequest<G>) {
        store_request(&self.name, &mut self.pending, request);
    }

    /// Run one tick: apply the pending request, then update the leaf.
    ///
    /// Does nothing while the machine is paused. A rejected request is
    /// logged and dropped; the stack is left as it was.
    pub fn update_current(&mut self) {
        if let Some(pause) = &self.paused {
            trace!(
                machine = %self.name,
                behavior = %pause.behavior,
                "Skipping update while paused"
            );
            return;
        }

        if let Err(err) = self.resolve_pending() {
            warn!(machine = %self.name, id = %self.id, error = %err, "Rejected transition request");
        }

        self.with_leaf(|leaf, ctx| leaf.update(ctx));
    }

    /// Hand control to a reactive behavior.
    ///
    /// The leaf's [`State::pause`] runs once; further pauses are ignored until
    /// [`resume`](Self::resume).
    pub fn pause(&mut self, reason: PauseReason, behavior: ReactionaryBehavior) {
        if let Some(current) = &self.paused {
            debug!(
                machine = %self.name,
                paused_by = %current.behavior,
                ignored = %behavior,
                "Machine already paused"
            );
            return;
        }

        debug!(machine = %self.name, reason = ?reason, behavior = %behavior, "Pausing machine");
        self.with_leaf(|leaf, ctx| leaf.pause(reason, &behavior, ctx));
        self.paused = Some(PauseInfo { reason, behavior });
    }

    pub fn resume(&mut self, reason: PauseReason, behavior: ReactionaryBehavior) {
        let Some(pause) = self.paused.take() else {
            debug!(machine = %self.name, behavior = %behavior, "Resume ignored, machine not paused");
            return;
        };

        if pause.behavior != behavior {
            debug!(
                machine = %self.name,
                paused_by = %pause.behavior,
                resumed_by = %behavior,
                "Resumed by a different behavior than the one that paused"
            );
        }

        debug!(machine = %self.name, reason = ?reason, behavior = %behavior, "Resuming machine");
        self.with_leaf(|leaf, ctx| leaf.resume(reason, &behavior, ctx));
    }

    pub fn is_paused(&self) -> bool {
        self.paused.is_some()
    }

    /// The behavior that paused the machine, if paused.
    pub fn paused_by(&self) -> Option<&ReactionaryBehavior> {
        self.paused.as_ref().map(|p| &p.behavior)
    }

    pub fn pause_reason(&self) -> Option<PauseReason> {
        self.paused.as_ref().map(|p| p.reason)
    }

    /// Exit every state from leaf to root and drop any pending request.
    ///
    /// The machine is inactive afterwards; requesting a state restarts it.
    pub fn stop(&mut self) {
        self.pending = None;
        self.paused = None;
        if self.stack.is_empty() {
            return;
        }

        debug!(machine = %self.name, depth = self.stack.len(), "Stopping machine");
        while !self.stack.is_empty() {
            self.exit_leaf();
        }
        // Requests made from exit have nowhere to land.
        self.pending = None;
    }

    fn resolve_pending(&mut self) -> Result<Option<TransitionKind>, MachineError> {
        let Some(request) = self.pending.take() else {
            return Ok(None);
        };

        let kind = request.kind();
        match request {
            TransitionRequest::SetNext(next) => {
                let from = self.exit_leaf();
                self.enter_leaf(next, kind, from);
            }
            TransitionRequest::Push(child) => {
                let from = self.current_state_name().map(str::to_string);
                self.enter_leaf(child, kind, from);
            }
            TransitionRequest::Pop => {
                match self.stack.len() {
                    0 => {
                        return Err(MachineError::EmptyStack {
                            machine: self.name.clone(),
                        })
                    }
                    1 => {
                        return Err(MachineError::PopRoot {
                            machine: self.name.clone(),
                            state: self.stack[0].name().to_string(),
                        })
                    }
                    _ => {}
                }
                let from = self.exit_leaf();
                let to = self.current_state_name().unwrap_or_default().to_string();
                self.record(kind, from, to);
            }
        }
        Ok(Some(kind))
    }

    /// Exit and remove the leaf, returning its name.
    fn exit_leaf(&mut self) -> Option<String> {
        self.with_leaf(|leaf, ctx| leaf.exit(ctx))?;
        let leaf = self.stack.pop()?;
        debug!(machine = %self.name, state = leaf.name(), "Exited state");
        Some(leaf.name().to_string())
    }

    fn enter_leaf(&mut self, state: Box<dyn State<G>>, kind: TransitionKind, from: Option<String>) {
        let to = state.name().to_string();
        self.stack.push(state);
        debug!(machine = %self.name, state = %to, kind = %kind, depth = self.stack.len(), "Entering state");
        self.with_leaf(|leaf, ctx| leaf.enter(ctx));
        self.record(kind, from, to);
    }

    fn record(&mut self, kind: TransitionKind, from: Option<String>, to: String) {
        self.history.record(TransitionRecord {
            kind,
            from,
            to,
            depth: self.stack.len(),
            timestamp: Utc::now(),
        });
    }

    /// Run `f` on the leaf with a context borrowing the rest of the machine.
    fn with_leaf<R>(
        &mut self,
        f: impl FnOnce(&mut (dyn State<G> + 'static), &mut StateContext<'_, G>) -> R,
    ) -> Option<R> {
        let Self {
            name,
            id,
            game,
            stack,
            pending,
            clock,
            idle,
            idle_timeout,
            ..
        } = self;

        let (leaf, below) = stack.split_last_mut()?;
        let mut ctx = StateContext {
            machine_name: name.as_str(),
            machine_id: *id,
            game,
            parent: below.last_mut().map(|parent| &mut **parent),
            pending,
            clock: &**clock,
            idle: idle.as_ref(),
            idle_timeout: *idle_timeout,
        };
        Some(f(&mut **leaf, &mut ctx))
    }
}

impl<G: 'static> Drop for StateMachine<G> {
    fn drop(&mut self) {
        self.stop();
    }
}

impl<G: 'static> fmt::Debug for StateMachine<G> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StateMachine")
            .field("name", &self.name)
            .field("id", &self.id)
            .field("stack", &self.state_names())
            .field("pending", &self.pending)
            .field("paused", &self.paused)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Journal {
        events: Vec<String>,
    }

    impl Journal {
        fn log(&mut self, event: impl Into<String>) {
            self.events.push(event.into());
        }
    }

    /// Records every lifecycle call and runs a scripted request on a given
    /// update count.
    struct Scripted {
        name: &'static str,
        updates: usize,
        script: Vec<(usize, Action)>,
    }

    #[derive(Clone, Copy)]
    enum Action {
        SetNext(&'static str),
        Push(&'static str),
        Pop,
        SetThenPush(&'static str, &'static str),
    }

    impl Scripted {
        fn new(name: &'static str) -> Self {
            Self {
                name,
                updates: 0,
                script: Vec::new(),
            }
        }

        fn on(mut self, update: usize, action: Action) -> Self {
            self.script.push((update, action));
            self
        }
    }

    impl State<Journal> for Scripted {
        fn name(&self) -> &str {
            self.name
        }

        fn enter(&mut self, ctx: &mut StateContext<'_, Journal>) {
            ctx.game_mut().log(format!("enter {}", self.name));
        }

        fn update(&mut self, ctx: &mut StateContext<'_, Journal>) {
            self.updates += 1;
            ctx.game_mut().log(format!("update {}", self.name));
            let due: Vec<Action> = self
                .script
                .iter()
                .filter(|(at, _)| *at == self.updates)
                .map(|(_, action)| *action)
                .collect();
            for action in due {
                match action {
                    Action::SetNext(name) => ctx.set_next_state(Scripted::new(name)),
                    Action::Push(name) => ctx.push_sub_state(Scripted::new(name)),
                    Action::Pop => ctx.pop_state(),
                    Action::SetThenPush(next, child) => {
                        ctx.set_next_state(Scripted::new(next));
                        ctx.push_sub_state(Scripted::new(child));
                    }
                }
            }
        }

        fn exit(&mut self, ctx: &mut StateContext<'_, Journal>) {
            ctx.game_mut().log(format!("exit {}", self.name));
        }

        fn pause(
            &mut self,
            _reason: PauseReason,
            behavior: &ReactionaryBehavior,
            ctx: &mut StateContext<'_, Journal>,
        ) {
            ctx.game_mut().log(format!("pause {} by {}", self.name, behavior));
        }

        fn resume(
            &mut self,
            _reason: PauseReason,
            behavior: &ReactionaryBehavior,
            ctx: &mut StateContext<'_, Journal>,
        ) {
            ctx.game_mut().log(format!("resume {} by {}", self.name, behavior));
        }
    }

    fn machine_with(root: Scripted) -> StateMachine<Journal> {
        let mut machine = StateMachine::new("test", Journal::default());
        machine.set_next_state(root);
        machine
    }

    fn events(machine: &StateMachine<Journal>) -> Vec<&str> {
        machine.game().events.iter().map(String::as_str).collect()
    }

    #[test]
    fn new_machine_is_inactive() {
        let machine = StateMachine::new("empty", ());
        assert!(!machine.is_active());
        assert_eq!(machine.depth(), 0);
        assert!(machine.current_state_name().is_none());
        assert!(machine.parent_state().is_none());
    }

    #[test]
    fn first_tick_enters_then_updates_root() {
        let mut machine = machine_with(Scripted::new("Idle"));
        machine.update_current();

        assert_eq!(events(&machine), vec!["enter Idle", "update Idle"]);
        assert_eq!(machine.current_state_name(), Some("Idle"));
    }

    #[test]
    fn set_next_exits_before_entering() {
        let mut machine = machine_with(Scripted::new("A").on(1, Action::SetNext("B")));
        machine.update_current();
        assert_eq!(machine.current_state_name(), Some("A"));

        machine.update_current();
        assert_eq!(
            events(&machine),
            vec!["enter A", "update A", "exit A", "enter B", "update B"]
        );
        assert_eq!(machine.current_state_name(), Some("B"));
        assert_eq!(machine.depth(), 1);
    }

    #[test]
    fn push_suspends_parent_and_pop_resumes_without_reenter() {
        let mut machine = machine_with(Scripted::new("Idle").on(1, Action::Push("Child")));
        machine.update_current();
        machine.update_current();
        assert_eq!(machine.state_names(), vec!["Idle", "Child"]);
        assert_eq!(machine.parent_state().map(|s| s.name()), Some("Idle"));

        machine.pop_state();
        machine.update_current();

        assert_eq!(machine.current_state_name(), Some("Idle"));
        assert_eq!(
            events(&machine),
            vec![
                "enter Idle",
                "update Idle",
                "enter Child",
                "update Child",
                "exit Child",
                "update Idle",
            ]
        );
    }

    #[test]
    fn set_next_inside_sub_state_replaces_only_the_top() {
        let mut machine = machine_with(Scripted::new("Root").on(1, Action::Push("Step1")));
        machine.update_current();
        machine.update_current();

        machine.set_next_state(Scripted::new("Step2"));
        machine.update_current();

        assert_eq!(machine.state_names(), vec!["Root", "Step2"]);
        let enters = events(&machine)
            .into_iter()
            .filter(|e| e.starts_with("enter Root"))
            .count();
        assert_eq!(enters, 1);
    }

    #[test]
    fn sub_state_pops_itself_back_to_parent() {
        let mut machine = machine_with(Scripted::new("Root"));
        machine.update_current();
        machine.push_sub_state(Scripted::new("Child").on(2, Action::Pop));

        machine.update_current();
        machine.update_current();
        assert_eq!(machine.current_state_name(), Some("Child"));

        machine.update_current();

        assert_eq!(machine.state_names(), vec!["Root"]);
        assert_eq!(
            events(&machine),
            vec![
                "enter Root",
                "update Root",
                "enter Child",
                "update Child",
                "update Child",
                "exit Child",
                "update Root",
            ]
        );
    }

    #[test]
    fn last_request_in_one_update_wins() {
        let mut machine = machine_with(Scripted::new("A").on(1, Action::SetThenPush("B", "C")));
        machine.update_current();
        machine.update_current();

        assert_eq!(machine.state_names(), vec!["A", "C"]);
        assert!(!events(&machine).contains(&"enter B"));
        assert!(!events(&machine).contains(&"exit A"));
    }

    #[test]
    fn popping_root_is_rejected_and_leaves_stack() {
        let mut machine = machine_with(Scripted::new("Root"));
        machine.update_current();

        machine.pop_state();
        let result = machine.resolve_pending();

        assert_eq!(
            result,
            Err(MachineError::PopRoot {
                machine: "test".to_string(),
                state: "Root".to_string(),
            })
        );
        assert_eq!(machine.current_state_name(), Some("Root"));
        assert!(!machine.has_pending());
        assert!(!events(&machine).contains(&"exit Root"));
    }

    #[test]
    fn popping_empty_machine_is_rejected() {
        let mut machine: StateMachine<Journal> = StateMachine::new("empty", Journal::default());
        machine.pop_state();

        assert!(matches!(
            machine.resolve_pending(),
            Err(MachineError::EmptyStack { .. })
        ));
        machine.update_current();
        assert!(!machine.is_active());
    }

    #[test]
    fn push_on_empty_machine_becomes_root() {
        let mut machine = StateMachine::new("test", Journal::default());
        machine.push_sub_state(Scripted::new("Only"));
        machine.update_current();

        assert_eq!(machine.state_names(), vec!["Only"]);
        assert!(machine.parent_state().is_none());
    }

    #[test]
    fn paused_machine_neither_resolves_nor_updates() {
        let mut machine = machine_with(Scripted::new("Idle"));
        machine.update_current();

        let cliff = ReactionaryBehavior::new("ReactToCliff");
        machine.pause(PauseReason::EngineMessage, cliff.clone());
        machine.set_next_state(Scripted::new("Other"));
        machine.update_current();
        machine.update_current();

        assert!(machine.is_paused());
        assert_eq!(machine.paused_by(), Some(&cliff));
        assert_eq!(machine.pause_reason(), Some(PauseReason::EngineMessage));
        assert_eq!(machine.current_state_name(), Some("Idle"));

        machine.resume(PauseReason::EngineMessage, cliff);
        machine.update_current();

        assert_eq!(machine.current_state_name(), Some("Other"));
        assert_eq!(
            events(&machine),
            vec![
                "enter Idle",
                "update Idle",
                "pause Idle by ReactToCliff",
                "resume Idle by ReactToCliff",
                "exit Idle",
                "enter Other",
                "update Other",
            ]
        );
    }

    #[test]
    fn double_pause_calls_state_once() {
        let mut machine = machine_with(Scripted::new("Idle"));
        machine.update_current();

        machine.pause(PauseReason::EngineMessage, ReactionaryBehavior::new("A"));
        machine.pause(PauseReason::EngineMessage, ReactionaryBehavior::new("B"));

        assert_eq!(machine.paused_by().map(|b| b.as_str()), Some("A"));
        let pauses = events(&machine)
            .into_iter()
            .filter(|e| e.starts_with("pause"))
            .count();
        assert_eq!(pauses, 1);

        machine.resume(PauseReason::EngineMessage, ReactionaryBehavior::new("A"));
        machine.resume(PauseReason::EngineMessage, ReactionaryBehavior::new("A"));
        let resumes = events(&machine)
            .into_iter()
            .filter(|e| e.starts_with("resume"))
            .count();
        assert_eq!(resumes, 1);
    }

    #[test]
    fn stop_exits_leaf_to_root() {
        let mut machine = machine_with(Scripted::new("Root").on(1, Action::Push("Child")));
        machine.update_current();
        machine.update_current();

        machine.stop();

        assert!(!machine.is_active());
        let tail: Vec<&str> = events(&machine).into_iter().rev().take(2).collect();
        assert_eq!(tail, vec!["exit Root", "exit Child"]);
    }

    #[test]
    fn history_records_every_applied_transition() {
        let mut machine = machine_with(Scripted::new("Idle").on(1, Action::Push("Child")));
        machine.update_current();
        machine.update_current();
        machine.pop_state();
        machine.update_current();

        let kinds: Vec<TransitionKind> = machine.history().records().map(|r| r.kind).collect();
        assert_eq!(
            kinds,
            vec![TransitionKind::SetNext, TransitionKind::Push, TransitionKind::Pop]
        );
        assert_eq!(machine.history().path(), vec!["Idle", "Child", "Idle"]);
    }

    #[test]
    fn current_downcasts_leaf() {
        let mut machine = machine_with(Scripted::new("Idle"));
        machine.update_current();

        assert_eq!(machine.current::<Scripted>().map(|p| p.updates), Some(1));
        if let Some(scripted) = machine.current_mut::<Scripted>() {
            scripted.updates = 10;
        }
        assert_eq!(machine.current::<Scripted>().map(|p| p.updates), Some(10));
    }
}
