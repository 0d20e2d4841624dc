use tracing::{debug, info};

use crate::agent::{Agent, Outcome};
use crate::dispatch::{HostEvent, Lifecycle};
use crate::shutdown::ShutdownSignal;

/// Why the event loop stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    Shutdown,
    /// Every event sender was dropped.
    ChannelClosed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    pub events_handled: u64,
    pub stopped: StopReason,
}

/// Feeds host events to the agent, one at a time, until shutdown.
///
/// Timers, console input and signal handlers all post into the same
/// channel; this loop is the only place the agent is driven from.
pub struct Daemon {
    agent: Agent,
    events: flume::Receiver<HostEvent>,
    shutdown: ShutdownSignal,
}

impl Daemon {
    pub fn new(agent: Agent, events: flume::Receiver<HostEvent>) -> Self {
        Self {
            agent,
            events,
            shutdown: ShutdownSignal::new(),
        }
    }

    /// A handle that stops [`Daemon::run`] when triggered.
    pub fn shutdown_handle(&self) -> ShutdownSignal {
        self.shutdown.clone()
    }

    pub fn agent(&self) -> &Agent {
        &self.agent
    }

    /// Handle `initial`, then every queued event until shutdown or until the
    /// channel closes. Timers are disarmed on the way out.
    pub async fn run(&mut self, initial: Lifecycle) -> RunSummary {
        info!(lifecycle = ?initial, "agent starting");
        self.dispatch(HostEvent::Lifecycle(initial)).await;
        let mut events_handled = 1;

        let stopped = loop {
            if self.shutdown.is_shutting_down() {
                break StopReason::Shutdown;
            }
            tokio::select! {
                biased;
                _ = self.shutdown.wait() => break StopReason::Shutdown,
                received = self.events.recv_async() => match received {
                    Ok(event) => {
                        self.dispatch(event).await;
                        events_handled += 1;
                    }
                    Err(_) => break StopReason::ChannelClosed,
                },
            }
        };

        self.agent.scheduler().disarm();
        info!(events_handled, ?stopped, "agent stopped");
        RunSummary {
            events_handled,
            stopped,
        }
    }

    async fn dispatch(&mut self, event: HostEvent) {
        for outcome in self.agent.handle(event).await {
            match outcome {
                Outcome::Heartbeat { delivered: false } => debug!("heartbeat not delivered"),
                other => debug!(outcome = ?other, "command finished"),
            }
        }
    }
}
