//! The tabsaver agent: watches the battery relay and, with the user's
//! consent, mutes and suspends browser tabs while the battery drains fast.
//!
//! - Host capabilities (notifications, tabs, timers) behind traits
//! - Event routing and the single-owner agent that runs commands
//! - Poll routine, consent prompt and the battery-saver executor
//! - The daemon loop and shutdown coordination

pub mod agent;
pub mod consent;
pub mod daemon;
pub mod dispatch;
pub mod executor;
pub mod host;
pub mod poll;
pub mod scheduler;
pub mod shutdown;
pub mod state;
pub mod timers;
