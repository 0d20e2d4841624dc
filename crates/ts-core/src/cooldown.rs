use std::sync::Mutex;
use std::time::Duration;

use chrono::{DateTime, Utc};

/// Source of "now" for anything that compares timestamps.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A clock that only moves when told to.
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(start),
        }
    }

    pub fn advance(&self, by: Duration) {
        let Ok(step) = chrono::Duration::from_std(by) else {
            return;
        };
        let mut now = self.now.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(next) = now.checked_add_signed(step) {
            *now = next;
        }
    }

    pub fn set(&self, to: DateTime<Utc>) {
        *self.now.lock().unwrap_or_else(|e| e.into_inner()) = to;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap_or_else(|e| e.into_inner())
    }
}

// ---------------------------------------------------------------------------
// CooldownGate
// ---------------------------------------------------------------------------

/// Suppresses new consent prompts for a fixed window after an applied action.
///
/// The gate is open iff no action was ever recorded or
/// `now - last_action_at >= window`. Only successful actions close it.
#[derive(Debug, Clone)]
pub struct CooldownGate {
    window: Duration,
    last_action_at: Option<DateTime<Utc>>,
}

impl CooldownGate {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            last_action_at: None,
        }
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    pub fn last_action_at(&self) -> Option<DateTime<Utc>> {
        self.last_action_at
    }

    pub fn is_open(&self, now: DateTime<Utc>) -> bool {
        self.remaining(now).is_zero()
    }

    /// Time left until the gate reopens; zero when it is already open.
    ///
    /// A clock that stepped backwards past the last action counts as
    /// zero elapsed, keeping the gate closed for the full window.
    pub fn remaining(&self, now: DateTime<Utc>) -> Duration {
        let Some(last) = self.last_action_at else {
            return Duration::ZERO;
        };
        let elapsed = now
            .signed_duration_since(last)
            .to_std()
            .unwrap_or(Duration::ZERO);
        self.window.saturating_sub(elapsed)
    }

    pub fn record_action(&mut self, now: DateTime<Utc>) {
        self.last_action_at = Some(now);
    }
}
