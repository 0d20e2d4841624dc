use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tracing::{debug, info};
use ts_core::cooldown::{Clock, CooldownGate};
use ts_core::types::Status;
use ts_relay::Relay;

use crate::consent::{ConsentCoordinator, Presented};
use crate::state::AgentState;

/// What a status reading calls for, before any further I/O.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollDecision {
    /// The relay is not asserting the terminate signal.
    NoSignal,
    /// Signal present but an action was applied too recently.
    CoolingDown { remaining: Duration },
    /// Signal present and the gate is open.
    Prompt,
}

pub fn evaluate(status: &Status, gate: &CooldownGate, now: DateTime<Utc>) -> PollDecision {
    if !status.is_terminate() {
        return PollDecision::NoSignal;
    }
    let remaining = gate.remaining(now);
    if !remaining.is_zero() {
        return PollDecision::CoolingDown { remaining };
    }
    PollDecision::Prompt
}

/// How one poll ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollOutcome {
    NoSignal,
    CoolingDown { remaining: Duration },
    Prompted {
        presented: Presented,
        /// Payload fell back to unknown readings.
        payload_degraded: bool,
        /// The relay acknowledged the clear.
        cleared: bool,
    },
}

/// One pass of: status → gate → payload → prompt → clear.
pub struct PollRoutine {
    relay: Arc<dyn Relay>,
    clock: Arc<dyn Clock>,
}

impl PollRoutine {
    pub fn new(relay: Arc<dyn Relay>, clock: Arc<dyn Clock>) -> Self {
        Self { relay, clock }
    }

    pub async fn poll_once(&self, state: &mut AgentState, consent: &ConsentCoordinator) -> PollOutcome {
        let status = self.relay.fetch_status().await.into_value();

        match evaluate(&status, &state.cooldown, self.clock.now()) {
            PollDecision::NoSignal => {
                debug!(signal = ?status.signal, "no battery signal");
                PollOutcome::NoSignal
            }
            PollDecision::CoolingDown { remaining } => {
                // The relay keeps asserting; it is deliberately not cleared here.
                debug!(remaining_secs = remaining.as_secs(), "signal ignored during cooldown");
                PollOutcome::CoolingDown { remaining }
            }
            PollDecision::Prompt => {
                if let Some(version) = status.relay_version.as_deref() {
                    debug!(relay_version = version, "battery signal received");
                }
                let payload = self.relay.fetch_payload().await;
                let payload_degraded = payload.is_degraded();

                let presented = consent.present(payload.value(), &mut state.prompt).await;

                // Showing the prompt is the acknowledgement, not the answer.
                let cleared = !self.relay.send_clear().await.is_degraded();
                info!(
                    generation = presented.token.generation,
                    payload_degraded,
                    cleared,
                    "battery signal handled"
                );

                PollOutcome::Prompted {
                    presented,
                    payload_degraded,
                    cleared,
                }
            }
        }
    }
}
