use std::sync::Arc;

use tracing::{debug, info_span, Instrument};
use ts_core::config::Config;
use ts_core::cooldown::Clock;
use ts_relay::Relay;

use crate::consent::{ConsentCoordinator, Resolution};
use crate::dispatch::{route, Command, HostEvent};
use crate::executor::ActionExecutor;
use crate::host::Host;
use crate::poll::{PollOutcome, PollRoutine};
use crate::scheduler::Scheduler;
use crate::state::AgentState;

/// Version reported in heartbeats.
pub const AGENT_VERSION: &str = env!("CARGO_PKG_VERSION");

/// What running one command produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Armed,
    Polled(PollOutcome),
    Heartbeat { delivered: bool },
    Resolved(Resolution),
}

/// The agent: owns all mutable state and handles host events one at a time.
///
/// `handle` takes `&mut self`, so a poll and a button click can never
/// interleave against the same cooldown or prompt slot.
pub struct Agent {
    scheduler: Scheduler,
    relay: Arc<dyn Relay>,
    poll: PollRoutine,
    consent: ConsentCoordinator,
    state: AgentState,
    version: String,
}

impl Agent {
    pub fn new(config: &Config, relay: Arc<dyn Relay>, host: Host, clock: Arc<dyn Clock>) -> Self {
        let executor = ActionExecutor::new(host.tabs.clone());
        Self {
            scheduler: Scheduler::from_config(host.timers.clone(), &config.schedule),
            poll: PollRoutine::new(relay.clone(), clock.clone()),
            consent: ConsentCoordinator::new(
                host.notifier.clone(),
                executor,
                clock,
                config.notifications.icon.clone(),
            ),
            relay,
            state: AgentState::new(config.cooldown.window()),
            version: AGENT_VERSION.to_string(),
        }
    }

    /// Override the version sent in heartbeats.
    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }

    pub fn state(&self) -> &AgentState {
        &self.state
    }

    pub fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }

    /// Route `event` and run the resulting commands in order.
    pub async fn handle(&mut self, event: HostEvent) -> Vec<Outcome> {
        if let HostEvent::Alarm(name) = event {
            self.scheduler.acknowledge(name);
        }
        let commands = route(&event);
        if commands.is_empty() {
            debug!(?event, "event ignored");
            return Vec::new();
        }

        let span = info_span!("event", ?event);
        async {
            let mut outcomes = Vec::with_capacity(commands.len());
            for command in commands {
                outcomes.push(self.run_command(command).await);
            }
            outcomes
        }
        .instrument(span)
        .await
    }

    pub async fn run_command(&mut self, command: Command) -> Outcome {
        match command {
            Command::ArmTimers => {
                self.scheduler.arm();
                Outcome::Armed
            }
            Command::PollOnce => Outcome::Polled(self.poll.poll_once(&mut self.state, &self.consent).await),
            Command::SendHeartbeat => {
                let reply = self.relay.send_heartbeat(&self.version).await;
                Outcome::Heartbeat {
                    delivered: !reply.is_degraded(),
                }
            }
            Command::Resolve(choice) => Outcome::Resolved(self.consent.resolve(choice, &mut self.state).await),
        }
    }
}
