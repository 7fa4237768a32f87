//! In-memory robot for tests and simulation.

use crate::robot::{ActionType, CommandId, CompletionCallback, ObjectId, Robot};
use tracing::debug;

/// A command as the mock received it.
#[derive(Clone, Debug, PartialEq)]
pub enum RobotCommand {
    Animation {
        id: CommandId,
        trigger: String,
    },
    DriveWheels {
        left_mmps: f32,
        right_mmps: f32,
    },
    HeadAngle {
        id: CommandId,
        radians: f32,
    },
    TurnTowards {
        id: CommandId,
        target: ObjectId,
        max_turn_angle: f32,
    },
    Cancel(ActionType),
}

struct PendingCallback {
    id: CommandId,
    action: ActionType,
    callback: CompletionCallback,
}

/// Records commands and holds their callbacks until the test completes them.
///
/// `cancel_action` behaves like the engine: matching in-flight commands
/// complete with `success = false`.
#[derive(Default)]
pub struct MockRobot {
    next_id: u32,
    pending: Vec<PendingCallback>,
    log: Vec<RobotCommand>,
    wheels: (f32, f32),
    head_angle: f32,
}

impl MockRobot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn commands(&self) -> &[RobotCommand] {
        &self.log
    }

    pub fn wheel_speeds(&self) -> (f32, f32) {
        self.wheels
    }

    pub fn is_driving(&self) -> bool {
        self.wheels != (0.0, 0.0)
    }

    pub fn head_angle(&self) -> f32 {
        self.head_angle
    }

    /// Ids of commands whose callbacks have not fired yet.
    pub fn pending_commands(&self) -> Vec<CommandId> {
        self.pending.iter().map(|p| p.id).collect()
    }

    pub fn last_command_id(&self) -> Option<CommandId> {
        self.next_id.checked_sub(1).map(CommandId)
    }

    /// Fire the callback for `id`. Returns false if it is unknown or
    /// already fired.
    pub fn complete(&mut self, id: CommandId, success: bool) -> bool {
        match self.take_callback(id) {
            Some(callback) => {
                callback(success);
                true
            }
            None => false,
        }
    }

    /// Fire every outstanding callback in issue order.
    pub fn complete_all(&mut self, success: bool) -> usize {
        let pending = std::mem::take(&mut self.pending);
        let count = pending.len();
        for entry in pending {
            (entry.callback)(success);
        }
        count
    }

    /// Remove the callback for `id` without firing it, e.g. to deliver it
    /// from another thread.
    pub fn take_callback(&mut self, id: CommandId) -> Option<CompletionCallback> {
        let index = self.pending.iter().position(|p| p.id == id)?;
        Some(self.pending.remove(index).callback)
    }

    /// Forget every outstanding callback without firing it.
    pub fn cancel_all_callbacks(&mut self) -> usize {
        let count = self.pending.len();
        self.pending.clear();
        count
    }

    fn issue(
        &mut self,
        action: ActionType,
        on_complete: Option<CompletionCallback>,
    ) -> CommandId {
        let id = CommandId(self.next_id);
        self.next_id = self.next_id.wrapping_add(1);
        if let Some(callback) = on_complete {
            self.pending.push(PendingCallback {
                id,
                action,
                callback,
            });
        }
        id
    }
}

impl Robot for MockRobot {
    fn send_animation(
        &mut self,
        trigger: &str,
        on_complete: Option<CompletionCallback>,
    ) -> CommandId {
        let id = self.issue(ActionType::PlayAnimation, on_complete);
        self.log.push(RobotCommand::Animation {
            id,
            trigger: trigger.to_string(),
        });
        id
    }

    fn drive_wheels(&mut self, left_mmps: f32, right_mmps: f32) {
        self.wheels = (left_mmps, right_mmps);
        self.log.push(RobotCommand::DriveWheels {
            left_mmps,
            right_mmps,
        });
    }

    fn set_head_angle(
        &mut self,
        radians: f32,
        on_complete: Option<CompletionCallback>,
    ) -> CommandId {
        let id = self.issue(ActionType::MoveHeadToAngle, on_complete);
        self.head_angle = radians;
        self.log.push(RobotCommand::HeadAngle { id, radians });
        id
    }

    fn turn_towards_object(
        &mut self,
        target: ObjectId,
        max_turn_angle: f32,
        on_complete: Option<CompletionCallback>,
    ) -> CommandId {
        let id = self.issue(ActionType::TurnTowardsObject, on_complete);
        self.log.push(RobotCommand::TurnTowards {
            id,
            target,
            max_turn_angle,
        });
        id
    }

    fn cancel_action(&mut self, action: ActionType) {
        self.log.push(RobotCommand::Cancel(action));
        let (cancelled, kept): (Vec<_>, Vec<_>) = std::mem::take(&mut self.pending)
            .into_iter()
            .partition(|p| action.matches(p.action));
        self.pending = kept;
        debug!(action = ?action, cancelled = cancelled.len(), "Cancelling robot actions");
        for entry in cancelled {
            (entry.callback)(false);
        }
    }
}
