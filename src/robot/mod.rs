//! The robot capability states drive.
//!
//! The core never talks to hardware itself. States call a [`Robot`]
//! implementation reachable from their game value and wait on completions
//! issued by a [`CommandTracker`].

mod completion;
mod mock;

pub use completion::{CommandStatus, CommandTracker, Completion};
pub use mock::{MockRobot, RobotCommand};

use serde::{Deserialize, Serialize};
use std::fmt;

/// Invoked at most once with the command's success flag, possibly from
/// another thread and possibly after the issuing state has exited.
pub type CompletionCallback = Box<dyn FnOnce(bool) + Send + 'static>;

/// Tag the robot assigns to a queued command.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CommandId(pub u32);

impl fmt::Display for CommandId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Identifier of an object the robot can see (cube, face, charger).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ObjectId(pub i32);

/// Action categories, used to cancel in-flight commands.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ActionType {
    /// Matches every action.
    Unknown,
    PlayAnimation,
    MoveHeadToAngle,
    TurnTowardsObject,
}

impl ActionType {
    pub fn matches(self, other: ActionType) -> bool {
        self == ActionType::Unknown || self == other
    }
}

/// Commands a state can issue to the robot.
///
/// Commands that take an `on_complete` report their outcome through it
/// exactly once when one is given. Wheel motion is continuous until changed,
/// so a state that drives must stop the wheels in its `exit`.
pub trait Robot {
    fn send_animation(
        &mut self,
        trigger: &str,
        on_complete: Option<CompletionCallback>,
    ) -> CommandId;

    fn drive_wheels(&mut self, left_mmps: f32, right_mmps: f32);

    fn stop_wheels(&mut self) {
        self.drive_wheels(0.0, 0.0);
    }

    fn set_head_angle(
        &mut self,
        radians: f32,
        on_complete: Option<CompletionCallback>,
    ) -> CommandId;

    fn turn_towards_object(
        &mut self,
        target: ObjectId,
        max_turn_angle: f32,
        on_complete: Option<CompletionCallback>,
    ) -> CommandId;

    /// Cancel in-flight actions of the given type; `Unknown` cancels all.
    fn cancel_action(&mut self, action: ActionType);
}
