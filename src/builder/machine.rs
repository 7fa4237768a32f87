//! Builder for constructing state machines.

use crate::builder::error::BuildError;
use crate::config::MachineConfig;
use crate::core::{Clock, State, SystemClock, TransitionHistory};
use crate::machine::{StateFactory, StateMachine};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Builder for constructing state machines with a fluent API.
pub struct StateMachineBuilder<G: 'static> {
    name: Option<String>,
    initial: Option<Box<dyn State<G>>>,
    idle: Option<StateFactory<G>>,
    idle_timeout: Option<Duration>,
    clock: Arc<dyn Clock>,
    history_capacity: usize,
}

impl<G: 'static> StateMachineBuilder<G> {
    /// Create a new builder.
    pub fn new() -> Self {
        Self {
            name: None,
            initial: None,
            idle: None,
            idle_timeout: None,
            clock: Arc::new(SystemClock),
            history_capacity: TransitionHistory::DEFAULT_CAPACITY,
        }
    }

    /// Start from a configuration, validating it first.
    pub fn from_config(config: MachineConfig) -> Result<Self, BuildError> {
        let config = config.validated()?;
        let mut builder = Self::new()
            .name(config.name.clone())
            .history_capacity(config.history_capacity);
        builder.idle_timeout = config.idle_timeout();
        Ok(builder)
    }

    /// Set the machine name (required).
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Set the root state entered on the first tick (required).
    pub fn initial<S: State<G>>(mut self, state: S) -> Self {
        self.initial = Some(Box::new(state));
        self
    }

    /// Set the factory for the default timeout fallback state.
    pub fn idle_state<S, F>(mut self, factory: F) -> Self
    where
        S: State<G>,
        F: Fn() -> S + 'static,
    {
        self.idle = Some(Box::new(move || Box::new(factory()) as Box<dyn State<G>>));
        self
    }

    pub fn idle_timeout(mut self, timeout: Duration) -> Self {
        self.idle_timeout = Some(timeout);
        self
    }

    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn history_capacity(mut self, capacity: usize) -> Self {
        self.history_capacity = capacity;
        self
    }

    /// Build the state machine around `game`.
    /// Returns an error if required fields are missing.
    ///
    /// The initial state is queued, not entered: it is entered on the first
    /// `update_current`.
    pub fn build(self, game: G) -> Result<StateMachine<G>, BuildError> {
        let name = self.name.ok_or(BuildError::MissingName)?;
        let initial = self.initial.ok_or(BuildError::MissingInitialState)?;

        let mut machine = StateMachine::new(name, game)
            .with_clock(self.clock)
            .with_history_capacity(self.history_capacity);
        if let Some(timeout) = self.idle_timeout {
            machine = machine.with_idle_timeout(timeout);
        }
        machine.set_idle_factory(self.idle);
        debug!(machine = machine.name(), initial = initial.name(), "Built state machine");
        machine.request(crate::machine::TransitionRequest::SetNext(initial));

        Ok(machine)
    }
}

impl<G: 'static> Default for StateMachineBuilder<G> {
    fn default() -> Self {
        Self::new()
    }
}
