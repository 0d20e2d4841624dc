use std::time::Duration;

use ts_core::cooldown::CooldownGate;

use crate::consent::PromptSlot;

/// The only mutable state the agent carries between events.
///
/// Lives for the process lifetime and is not persisted. The poll routine
/// reads the cooldown and writes the prompt slot; the consent coordinator
/// clears the slot and records applied actions.
#[derive(Debug, Clone)]
pub struct AgentState {
    pub cooldown: CooldownGate,
    pub prompt: PromptSlot,
}

impl AgentState {
    pub fn new(cooldown_window: Duration) -> Self {
        Self {
            cooldown: CooldownGate::new(cooldown_window),
            prompt: PromptSlot::default(),
        }
    }
}
