//! Shared configuration, domain types and the cooldown gate for tabsaver.

pub mod config;
pub mod cooldown;
pub mod types;
