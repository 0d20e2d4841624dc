use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;
use ts_core::config::ScheduleConfig;

use crate::host::Timers;

/// The two periodic triggers the agent runs on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimerName {
    /// Relay status poll.
    Poll,
    /// Versioned heartbeat to the relay.
    Heartbeat,
}

impl TimerName {
    pub fn as_str(self) -> &'static str {
        match self {
            TimerName::Poll => "poll",
            TimerName::Heartbeat => "hb",
        }
    }
}

impl fmt::Display for TimerName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Arms the poll and heartbeat timers on the host.
///
/// Arming is idempotent: each timer is cleared by name before it is
/// recreated, so however many lifecycle events (install, startup, wake)
/// re-arm the scheduler, exactly one timer of each name stays active.
pub struct Scheduler {
    timers: Arc<dyn Timers>,
    poll_period: Duration,
    heartbeat_period: Duration,
}

impl Scheduler {
    pub fn new(timers: Arc<dyn Timers>, poll_period: Duration, heartbeat_period: Duration) -> Self {
        Self {
            timers,
            poll_period,
            heartbeat_period,
        }
    }

    pub fn from_config(timers: Arc<dyn Timers>, config: &ScheduleConfig) -> Self {
        Self::new(timers, config.poll_period(), config.heartbeat_period())
    }

    /// The timers this scheduler maintains, with their periods.
    pub fn plan(&self) -> [(TimerName, Duration); 2] {
        [
            (TimerName::Poll, self.poll_period),
            (TimerName::Heartbeat, self.heartbeat_period),
        ]
    }

    pub fn arm(&self) {
        for (name, period) in self.plan() {
            let replaced = self.timers.clear(name);
            self.timers.create(name, period);
            debug!(timer = %name, period_secs = period.as_secs_f64(), replaced, "timer armed");
        }
    }

    /// Let `name` post its next alarm.
    pub fn acknowledge(&self, name: TimerName) {
        self.timers.acknowledge(name);
    }

    pub fn disarm(&self) {
        for (name, _) in self.plan() {
            self.timers.clear(name);
        }
    }
}
