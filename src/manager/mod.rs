//! Registry driving several machines from one tick.
//!
//! A screen typically runs one behavior machine plus one input machine. The
//! manager updates them in registration order, which is the only ordering
//! guarantee between machines: register producers before consumers.

use crate::core::{AsAny, PauseReason, ReactionaryBehavior};
use crate::machine::StateMachine;
use thiserror::Error;
use tracing::{debug, warn};

/// Errors that can occur when registering machines.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ManagerError {
    #[error("A state machine named '{name}' is already registered")]
    DuplicateMachine { name: String },
}

/// Object-safe view of a [`StateMachine<G>`] for any `G`.
pub trait ManagedMachine: AsAny {
    fn update_current(&mut self);
    fn pause(&mut self, reason: PauseReason, behavior: ReactionaryBehavior);
    fn resume(&mut self, reason: PauseReason, behavior: ReactionaryBehavior);
    fn stop(&mut self);
    fn current_state_name(&self) -> Option<&str>;
    fn is_active(&self) -> bool;
}

impl<G: 'static> ManagedMachine for StateMachine<G> {
    fn update_current(&mut self) {
        StateMachine::update_current(self);
    }

    fn pause(&mut self, reason: PauseReason, behavior: ReactionaryBehavior) {
        StateMachine::pause(self, reason, behavior);
    }

    fn resume(&mut self, reason: PauseReason, behavior: ReactionaryBehavior) {
        StateMachine::resume(self, reason, behavior);
    }

    fn stop(&mut self) {
        StateMachine::stop(self);
    }

    fn current_state_name(&self) -> Option<&str> {
        StateMachine::current_state_name(self)
    }

    fn is_active(&self) -> bool {
        StateMachine::is_active(self)
    }
}

/// Named machines, updated in the order they were added.
#[derive(Default)]
pub struct StateMachineManager {
    machines: Vec<(String, Box<dyn ManagedMachine>)>,
}

impl StateMachineManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `machine` under `name`.
    ///
    /// A duplicate name is rejected and the machine already registered under
    /// it is kept.
    pub fn add_state_machine<G: 'static>(
        &mut self,
        name: impl Into<String>,
        machine: StateMachine<G>,
    ) -> Result<(), ManagerError> {
        let name = name.into();
        if self.contains(&name) {
            warn!(machine = %name, "Rejected duplicate state machine registration");
            return Err(ManagerError::DuplicateMachine { name });
        }
        debug!(machine = %name, position = self.machines.len(), "Registered state machine");
        self.machines.push((name, Box::new(machine)));
        Ok(())
    }

    /// Tick every machine once, in registration order.
    pub fn update_all_machines(&mut self) {
        for (_, machine) in &mut self.machines {
            machine.update_current();
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.machines.iter().any(|(n, _)| n == name)
    }

    pub fn len(&self) -> usize {
        self.machines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.machines.is_empty()
    }

    /// Registered names in update order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.machines.iter().map(|(n, _)| n.as_str())
    }

    pub fn get(&self, name: &str) -> Option<&dyn ManagedMachine> {
        self.machines
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, m)| &**m)
    }

    /// Typed lookup; `None` if absent or registered with another game type.
    pub fn machine<G: 'static>(&self, name: &str) -> Option<&StateMachine<G>> {
        self.get(name)?.as_any().downcast_ref::<StateMachine<G>>()
    }

    pub fn machine_mut<G: 'static>(&mut self, name: &str) -> Option<&mut StateMachine<G>> {
        let (_, machine) = self.machines.iter_mut().find(|(n, _)| n == name)?;
        (**machine).as_any_mut().downcast_mut::<StateMachine<G>>()
    }

    pub fn pause_all(&mut self, reason: PauseReason, behavior: &ReactionaryBehavior) {
        for (_, machine) in &mut self.machines {
            machine.pause(reason, behavior.clone());
        }
    }

    pub fn resume_all(&mut self, reason: PauseReason, behavior: &ReactionaryBehavior) {
        for (_, machine) in &mut self.machines {
            machine.resume(reason, behavior.clone());
        }
    }

    pub fn stop_all(&mut self) {
        for (_, machine) in &mut self.machines {
            machine.stop();
        }
    }
}
