//! Logging setup shared by the tabsaver binaries.
//!
//! Everything in tabsaver logs through `tracing`; this crate owns the one
//! place where a subscriber is installed, in either human-readable or JSON
//! form, filtered by `RUST_LOG` or a configured default level.

pub mod logging;
