//! Client for the local battery relay.
//!
//! The relay exposes four endpoints (status, payload, heartbeat, clear).
//! Every call here degrades instead of failing: callers always receive a
//! [`Reply`] carrying a usable value, plus the absorbed error if the relay
//! was unreachable or answered with garbage. The next scheduled tick is the
//! only retry.

pub mod client;
pub mod error;
pub mod reply;

pub use client::{Relay, RelayClient};
pub use error::RelayError;
pub use reply::Reply;
