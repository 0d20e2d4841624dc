use std::collections::HashSet;
use std::sync::Arc;

use futures_util::future::join_all;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};
use ts_core::types::{TabId, Window};

use crate::host::{HostError, TabHost};

/// Counts from one battery-saver run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionReport {
    /// Tabs enumerated at the start of the run.
    pub tabs_seen: usize,
    pub muted: usize,
    pub mute_failures: usize,
    /// Active tabs exempted from discarding.
    pub kept_active: usize,
    pub discarded: usize,
    pub discard_failures: usize,
}

/// A failure outside the per-tab guarded sections. Aborts the run.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ExecutorError {
    #[error("failed to enumerate tabs: {0}")]
    TabQuery(#[source] HostError),

    #[error("failed to enumerate windows: {0}")]
    WindowQuery(#[source] HostError),
}

/// Applies the battery saver: mute every tab, then discard every tab that
/// is not the active tab of its window.
///
/// Per-tab failures are absorbed and counted; one tab refusing never stops
/// the remaining tabs from being attempted. The mute phase finishes
/// completely before the discard phase starts.
pub struct ActionExecutor {
    tabs: Arc<dyn TabHost>,
}

impl ActionExecutor {
    pub fn new(tabs: Arc<dyn TabHost>) -> Self {
        Self { tabs }
    }

    pub async fn apply(&self) -> Result<ActionReport, ExecutorError> {
        let tabs = self.tabs.query_tabs().await.map_err(ExecutorError::TabQuery)?;
        let mut report = ActionReport {
            tabs_seen: tabs.len(),
            ..ActionReport::default()
        };

        // Phase 1: mute everything, concurrently, each outcome independent.
        let results = join_all(tabs.iter().map(|tab| self.tabs.set_muted(tab.id, true))).await;
        for (tab, result) in tabs.iter().zip(results) {
            match result {
                Ok(()) => report.muted += 1,
                Err(e) => {
                    debug!(tab_id = tab.id, error = %e, "mute failed, continuing");
                    report.mute_failures += 1;
                }
            }
        }

        // Phase 2: discard background tabs.
        let windows = self
            .tabs
            .windows_with_tabs()
            .await
            .map_err(ExecutorError::WindowQuery)?;
        let active = active_tab_ids(&windows);

        for tab in &tabs {
            if active.contains(&tab.id) {
                report.kept_active += 1;
                continue;
            }
            match self.tabs.discard(tab.id).await {
                Ok(()) => report.discarded += 1,
                Err(e) => {
                    debug!(tab_id = tab.id, error = %e, "discard failed, continuing");
                    report.discard_failures += 1;
                }
            }
        }

        info!(
            tabs = report.tabs_seen,
            muted = report.muted,
            mute_failures = report.mute_failures,
            discarded = report.discarded,
            discard_failures = report.discard_failures,
            kept_active = report.kept_active,
            "battery saver applied"
        );
        Ok(report)
    }
}

/// The focused tab of each window.
pub fn active_tab_ids(windows: &[Window]) -> HashSet<TabId> {
    windows
        .iter()
        .filter_map(Window::active_tab)
        .map(|tab| tab.id)
        .collect()
}
