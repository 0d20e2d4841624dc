//! Capabilities the agent consumes from its host environment.
//!
//! The agent never talks to a browser or a desktop directly. Notification
//! display, tab enumeration/mutation and periodic timers are reached through
//! the traits below; [`console`] and [`memory`] provide reference
//! implementations used by the standalone daemon and by tests.

pub mod console;
pub mod memory;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;
use ts_core::types::{Notice, Tab, TabId, Window};

use crate::scheduler::TimerName;

// ---------------------------------------------------------------------------
// Error
// ---------------------------------------------------------------------------

/// A host primitive refused or failed an operation.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum HostError {
    #[error("no tab with id {0}")]
    NoSuchTab(TabId),

    #[error("{operation} failed: {message}")]
    Operation {
        operation: &'static str,
        message: String,
    },

    #[error("host unavailable: {0}")]
    Unavailable(String),
}

// ---------------------------------------------------------------------------
// Capability traits
// ---------------------------------------------------------------------------

#[async_trait]
pub trait Notifier: Send + Sync {
    /// Show `notice`.
    ///
    /// With `Some(id)` any notice already shown under that id is replaced
    /// (last write wins); with `None` the host picks a fresh id. Returns the
    /// id the notice is shown under.
    async fn create(&self, id: Option<&str>, notice: &Notice) -> Result<String, HostError>;

    /// Dismiss the notice with `id`. Returns whether one was showing.
    async fn clear(&self, id: &str) -> Result<bool, HostError>;
}

#[async_trait]
pub trait TabHost: Send + Sync {
    /// Every open tab across all windows.
    async fn query_tabs(&self) -> Result<Vec<Tab>, HostError>;

    async fn set_muted(&self, tab: TabId, muted: bool) -> Result<(), HostError>;

    /// All windows with their tabs populated.
    async fn windows_with_tabs(&self) -> Result<Vec<Window>, HostError>;

    /// Free the tab's runtime resources, keeping its navigation state.
    async fn discard(&self, tab: TabId) -> Result<(), HostError>;
}

/// Named periodic timers. Firing is delivered out of band as an alarm event.
///
/// Creating a timer under a name that is already active replaces it. An
/// implementation may hold back further alarms for a name until the last one
/// delivered has been acknowledged.
pub trait Timers: Send + Sync {
    fn create(&self, name: TimerName, period: Duration);

    /// Stop the timer. Returns whether one was active.
    fn clear(&self, name: TimerName) -> bool;

    /// Names of the timers currently active.
    fn active(&self) -> Vec<TimerName>;

    /// The alarm for `name` has been taken off the event queue.
    fn acknowledge(&self, _name: TimerName) {}
}

/// The full set of host capabilities handed to the agent.
#[derive(Clone)]
pub struct Host {
    pub notifier: Arc<dyn Notifier>,
    pub tabs: Arc<dyn TabHost>,
    pub timers: Arc<dyn Timers>,
}
