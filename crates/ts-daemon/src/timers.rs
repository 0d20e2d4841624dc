use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::debug;

use crate::dispatch::HostEvent;
use crate::host::Timers;
use crate::scheduler::TimerName;

/// One "alarm is queued" flag per timer name.
#[derive(Debug, Default)]
struct Pending {
    poll: AtomicBool,
    heartbeat: AtomicBool,
}

impl Pending {
    fn flag(&self, name: TimerName) -> &AtomicBool {
        match name {
            TimerName::Poll => &self.poll,
            TimerName::Heartbeat => &self.heartbeat,
        }
    }
}

/// [`Timers`] backed by tokio intervals that post alarms to the event channel.
///
/// Must be used from within a tokio runtime. At most one alarm per name sits
/// in the channel: ticks that land while the previous alarm is still
/// unacknowledged are dropped, as are ticks missed while the process was
/// suspended. A slow consumer therefore never sees a burst of stale alarms.
pub struct TokioTimers {
    events: flume::Sender<HostEvent>,
    handles: Mutex<HashMap<TimerName, JoinHandle<()>>>,
    pending: Arc<Pending>,
}

impl TokioTimers {
    pub fn new(events: flume::Sender<HostEvent>) -> Self {
        Self {
            events,
            handles: Mutex::new(HashMap::new()),
            pending: Arc::new(Pending::default()),
        }
    }

    /// Whether an alarm for `name` is queued and not yet acknowledged.
    pub fn is_pending(&self, name: TimerName) -> bool {
        self.pending.flag(name).load(Ordering::Acquire)
    }
}

impl Timers for TokioTimers {
    fn create(&self, name: TimerName, period: Duration) {
        let events = self.events.clone();
        let pending = self.pending.clone();
        let handle = tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
            // The first tick completes immediately; alarms start one period out.
            interval.tick().await;
            loop {
                interval.tick().await;
                if pending.flag(name).swap(true, Ordering::AcqRel) {
                    debug!(timer = %name, "previous alarm still queued, tick dropped");
                    continue;
                }
                if events.send_async(HostEvent::Alarm(name)).await.is_err() {
                    debug!(timer = %name, "event channel closed, timer exiting");
                    break;
                }
            }
        });

        let mut handles = self.handles.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(previous) = handles.insert(name, handle) {
            previous.abort();
        }
    }

    fn clear(&self, name: TimerName) -> bool {
        let mut handles = self.handles.lock().unwrap_or_else(|e| e.into_inner());
        match handles.remove(&name) {
            Some(handle) => {
                let was_running = !handle.is_finished();
                handle.abort();
                was_running
            }
            None => false,
        }
    }

    fn active(&self) -> Vec<TimerName> {
        let handles = self.handles.lock().unwrap_or_else(|e| e.into_inner());
        handles
            .iter()
            .filter(|(_, h)| !h.is_finished())
            .map(|(name, _)| *name)
            .collect()
    }

    fn acknowledge(&self, name: TimerName) {
        self.pending.flag(name).store(false, Ordering::Release);
    }
}

impl Drop for TokioTimers {
    fn drop(&mut self) {
        let handles = self.handles.get_mut().unwrap_or_else(|e| e.into_inner());
        for (_, handle) in handles.drain() {
            handle.abort();
        }
    }
}
