use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use ts_core::cooldown::Clock;
use ts_core::types::{Notice, Payload, Priority};

use crate::dispatch::Choice;
use crate::executor::{ActionExecutor, ActionReport};
use crate::host::Notifier;
use crate::state::AgentState;

/// Fixed identifier of the consent prompt. A new prompt overwrites the old.
pub const PROMPT_ID: &str = "chrome-saver-notice";

pub const PROMPT_TITLE: &str = "Battery draining fast";
pub const APPLY_BUTTON: &str = "Yes — Apply Battery Saver";
pub const DECLINE_BUTTON: &str = "No — I'll handle it";
pub const APPLIED_TITLE: &str = "Battery Saver applied";
pub const ERROR_TITLE: &str = "Battery Saver error";
pub const TIP_TITLE: &str = "Tip to save battery";

// ---------------------------------------------------------------------------
// Prompt tracking
// ---------------------------------------------------------------------------

/// Identity of one shown prompt. The host only knows [`PROMPT_ID`]; the
/// generation distinguishes successive prompts shown under it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromptToken {
    pub generation: u64,
}

impl PromptToken {
    pub fn id(&self) -> &'static str {
        PROMPT_ID
    }
}

/// The single live-prompt slot.
#[derive(Debug, Clone, Default)]
pub struct PromptSlot {
    live: Option<PromptToken>,
    issued: u64,
}

impl PromptSlot {
    /// Issue a token for a new prompt, returning it together with the
    /// unanswered prompt it supersedes, if any.
    pub fn issue(&mut self) -> (PromptToken, Option<PromptToken>) {
        self.issued += 1;
        let token = PromptToken {
            generation: self.issued,
        };
        (token, self.live.replace(token))
    }

    pub fn live(&self) -> Option<PromptToken> {
        self.live
    }

    pub fn take(&mut self) -> Option<PromptToken> {
        self.live.take()
    }

    /// Number of prompts issued over the process lifetime.
    pub fn issued(&self) -> u64 {
        self.issued
    }
}

// ---------------------------------------------------------------------------
// Notices
// ---------------------------------------------------------------------------

pub fn prompt_notice(payload: &Payload, icon: &str) -> Notice {
    Notice::new(
        PROMPT_TITLE,
        format!("{}\nReduce Chrome load?", payload.summary()),
        Priority::High,
    )
    .with_icon(icon)
    .with_buttons([APPLY_BUTTON, DECLINE_BUTTON])
    .requiring_interaction()
}

fn applied_notice(icon: &str) -> Notice {
    Notice::new(
        APPLIED_TITLE,
        "Muted tabs and suspended background tabs. Close unused windows for more savings.",
        Priority::Low,
    )
    .with_icon(icon)
}

fn error_notice(description: &str, icon: &str) -> Notice {
    Notice::new(ERROR_TITLE, description, Priority::High).with_icon(icon)
}

fn tip_notice(icon: &str) -> Notice {
    Notice::new(
        TIP_TITLE,
        "Close unused windows, pause video/audio, or quit Chrome when possible.",
        Priority::Zero,
    )
    .with_icon(icon)
}

// ---------------------------------------------------------------------------
// ConsentCoordinator
// ---------------------------------------------------------------------------

/// Result of showing the consent prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Presented {
    pub token: PromptToken,
    pub replaced: Option<PromptToken>,
    /// Whether the host accepted the notification.
    pub displayed: bool,
}

/// How a click on the prompt was resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    Applied(ActionReport),
    /// The executor failed; carries its description.
    Failed(String),
    Declined,
}

/// Shows the consent prompt and acts on the answer.
pub struct ConsentCoordinator {
    notifier: Arc<dyn Notifier>,
    executor: ActionExecutor,
    clock: Arc<dyn Clock>,
    icon: String,
}

impl ConsentCoordinator {
    pub fn new(
        notifier: Arc<dyn Notifier>,
        executor: ActionExecutor,
        clock: Arc<dyn Clock>,
        icon: impl Into<String>,
    ) -> Self {
        Self {
            notifier,
            executor,
            clock,
            icon: icon.into(),
        }
    }

    /// Show the prompt under [`PROMPT_ID`], superseding any unanswered one.
    pub async fn present(&self, payload: &Payload, slot: &mut PromptSlot) -> Presented {
        let (token, replaced) = slot.issue();
        if let Some(old) = replaced {
            debug!(old = old.generation, new = token.generation, "replacing unanswered prompt");
        }

        let notice = prompt_notice(payload, &self.icon);
        let displayed = match self.notifier.create(Some(PROMPT_ID), &notice).await {
            Ok(_) => true,
            Err(e) => {
                warn!(error = %e, "failed to show consent prompt");
                false
            }
        };

        info!(generation = token.generation, message = %notice.message, "consent prompt shown");
        Presented {
            token,
            replaced,
            displayed,
        }
    }

    /// Act on the user's answer, then dismiss the prompt whatever happened.
    pub async fn resolve(&self, choice: Choice, state: &mut AgentState) -> Resolution {
        let token = state.prompt.take();
        match token {
            Some(token) => debug!(?choice, id = token.id(), generation = token.generation, "resolving prompt"),
            None => debug!(?choice, "resolving click without a live prompt"),
        }

        let resolution = match choice {
            Choice::Apply => match self.executor.apply().await {
                Ok(report) => {
                    state.cooldown.record_action(self.clock.now());
                    self.show(applied_notice(&self.icon)).await;
                    Resolution::Applied(report)
                }
                Err(e) => {
                    let description = e.to_string();
                    warn!(error = %description, "battery saver failed, cooldown not engaged");
                    self.show(error_notice(&description, &self.icon)).await;
                    Resolution::Failed(description)
                }
            },
            Choice::Decline => {
                self.show(tip_notice(&self.icon)).await;
                Resolution::Declined
            }
        };

        if let Err(e) = self.notifier.clear(PROMPT_ID).await {
            warn!(error = %e, "failed to dismiss consent prompt");
        }
        resolution
    }

    async fn show(&self, notice: Notice) {
        if let Err(e) = self.notifier.create(None, &notice).await {
            warn!(title = %notice.title, error = %e, "failed to show notification");
        }
    }
}
