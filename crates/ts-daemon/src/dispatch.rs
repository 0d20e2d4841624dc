//! Host events and the table that maps them to agent commands.
//!
//! Routing is a pure function of the event: it decides *what* to run,
//! never touches state or I/O. [`crate::agent::Agent`] executes the
//! resulting commands in order.

use serde::{Deserialize, Serialize};

use crate::consent::PROMPT_ID;
use crate::scheduler::TimerName;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Lifecycle {
    /// First run on this machine.
    Installed,
    /// Ordinary process start.
    Startup,
    /// Configuration reload or wake from suspension.
    Reloaded,
}

/// Everything the host can deliver to the agent, one at a time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "data", rename_all = "snake_case")]
pub enum HostEvent {
    Lifecycle(Lifecycle),
    Alarm(TimerName),
    ButtonClicked {
        notification_id: String,
        button_index: usize,
    },
}

/// The human's answer to the consent prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Choice {
    Apply,
    Decline,
}

impl Choice {
    /// Button 0 applies; any other button declines.
    pub fn from_button(index: usize) -> Self {
        if index == 0 {
            Choice::Apply
        } else {
            Choice::Decline
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    ArmTimers,
    PollOnce,
    SendHeartbeat,
    Resolve(Choice),
}

pub fn route(event: &HostEvent) -> Vec<Command> {
    match event {
        HostEvent::Lifecycle(_) => vec![Command::ArmTimers, Command::PollOnce, Command::SendHeartbeat],
        HostEvent::Alarm(TimerName::Poll) => vec![Command::PollOnce],
        HostEvent::Alarm(TimerName::Heartbeat) => vec![Command::SendHeartbeat],
        HostEvent::ButtonClicked {
            notification_id,
            button_index,
        } if notification_id == PROMPT_ID => vec![Command::Resolve(Choice::from_button(*button_index))],
        HostEvent::ButtonClicked { .. } => Vec::new(),
    }
}
