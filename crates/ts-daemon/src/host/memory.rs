use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use serde::Deserialize;
use ts_core::types::{Notice, Tab, TabId, Window};
use uuid::Uuid;

use super::{HostError, Notifier, TabHost};

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|e| e.into_inner())
}

// ---------------------------------------------------------------------------
// MemoryBrowser
// ---------------------------------------------------------------------------

/// On-disk description of a browsing session for [`MemoryBrowser::load`].
#[derive(Debug, Deserialize)]
struct SessionFile {
    windows: Vec<Window>,
}

#[derive(Debug, Default)]
struct BrowserState {
    windows: Vec<Window>,
    fail_query: bool,
    fail_windows: bool,
    fail_mute: HashSet<TabId>,
    fail_discard: HashSet<TabId>,
    mute_attempts: Vec<TabId>,
    discard_attempts: Vec<TabId>,
}

impl BrowserState {
    fn tab_mut(&mut self, id: TabId) -> Option<&mut Tab> {
        self.windows
            .iter_mut()
            .flat_map(|w| w.tabs.iter_mut())
            .find(|t| t.id == id)
    }
}

/// An in-memory browsing session of windows and tabs.
///
/// Records every mute/discard attempt and can be told to fail individual
/// tabs or whole enumerations.
#[derive(Debug, Default)]
pub struct MemoryBrowser {
    state: Mutex<BrowserState>,
}

impl MemoryBrowser {
    pub fn new(windows: Vec<Window>) -> Self {
        Self {
            state: Mutex::new(BrowserState {
                windows,
                ..BrowserState::default()
            }),
        }
    }

    /// Parse a session document: `{"windows": [{"id": 1, "tabs": [...]}]}`.
    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        let session: SessionFile = serde_json::from_str(text)?;
        Ok(Self::new(session.windows))
    }

    pub fn load(path: &Path) -> Result<Self, HostError> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            HostError::Unavailable(format!("cannot read session {}: {e}", path.display()))
        })?;
        Self::from_json(&text).map_err(|e| {
            HostError::Unavailable(format!("invalid session {}: {e}", path.display()))
        })
    }

    pub fn fail_mute_for(&self, tab: TabId) {
        lock(&self.state).fail_mute.insert(tab);
    }

    pub fn fail_discard_for(&self, tab: TabId) {
        lock(&self.state).fail_discard.insert(tab);
    }

    /// Make `query_tabs` fail.
    pub fn fail_tab_query(&self, fail: bool) {
        lock(&self.state).fail_query = fail;
    }

    /// Make `windows_with_tabs` fail.
    pub fn fail_window_query(&self, fail: bool) {
        lock(&self.state).fail_windows = fail;
    }

    pub fn mute_attempts(&self) -> Vec<TabId> {
        lock(&self.state).mute_attempts.clone()
    }

    pub fn discard_attempts(&self) -> Vec<TabId> {
        lock(&self.state).discard_attempts.clone()
    }

    pub fn tab(&self, id: TabId) -> Option<Tab> {
        let mut state = lock(&self.state);
        state.tab_mut(id).map(|t| t.clone())
    }

    pub fn tab_count(&self) -> usize {
        lock(&self.state).windows.iter().map(|w| w.tabs.len()).sum()
    }
}

#[async_trait]
impl TabHost for MemoryBrowser {
    async fn query_tabs(&self) -> Result<Vec<Tab>, HostError> {
        let state = lock(&self.state);
        if state.fail_query {
            return Err(HostError::Unavailable("tab query rejected".into()));
        }
        Ok(state.windows.iter().flat_map(|w| w.tabs.clone()).collect())
    }

    async fn set_muted(&self, tab: TabId, muted: bool) -> Result<(), HostError> {
        let mut state = lock(&self.state);
        state.mute_attempts.push(tab);
        if state.fail_mute.contains(&tab) {
            return Err(HostError::Operation {
                operation: "mute",
                message: format!("tab {tab} refused"),
            });
        }
        let entry = state.tab_mut(tab).ok_or(HostError::NoSuchTab(tab))?;
        entry.muted = muted;
        Ok(())
    }

    async fn windows_with_tabs(&self) -> Result<Vec<Window>, HostError> {
        let state = lock(&self.state);
        if state.fail_windows {
            return Err(HostError::Unavailable("window query rejected".into()));
        }
        Ok(state.windows.clone())
    }

    async fn discard(&self, tab: TabId) -> Result<(), HostError> {
        let mut state = lock(&self.state);
        state.discard_attempts.push(tab);
        if state.fail_discard.contains(&tab) {
            return Err(HostError::Operation {
                operation: "discard",
                message: format!("tab {tab} refused"),
            });
        }
        let entry = state.tab_mut(tab).ok_or(HostError::NoSuchTab(tab))?;
        entry.discarded = true;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// MemoryNotifier
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
struct Board {
    showing: HashMap<String, Notice>,
    history: Vec<(String, Notice)>,
    cleared: Vec<String>,
    fail_create: bool,
}

/// Keeps the set of notices currently showing, plus a history of
/// everything ever shown and cleared.
#[derive(Debug, Default)]
pub struct MemoryNotifier {
    board: Mutex<Board>,
}

impl MemoryNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent `create` fail.
    pub fn fail_create(&self, fail: bool) {
        lock(&self.board).fail_create = fail;
    }

    pub fn showing(&self, id: &str) -> Option<Notice> {
        lock(&self.board).showing.get(id).cloned()
    }

    pub fn showing_count(&self) -> usize {
        lock(&self.board).showing.len()
    }

    /// Every notice ever shown, oldest first.
    pub fn history(&self) -> Vec<(String, Notice)> {
        lock(&self.board).history.clone()
    }

    pub fn shown_titled(&self, title: &str) -> Vec<Notice> {
        lock(&self.board)
            .history
            .iter()
            .filter(|(_, n)| n.title == title)
            .map(|(_, n)| n.clone())
            .collect()
    }

    pub fn cleared(&self) -> Vec<String> {
        lock(&self.board).cleared.clone()
    }
}

#[async_trait]
impl Notifier for MemoryNotifier {
    async fn create(&self, id: Option<&str>, notice: &Notice) -> Result<String, HostError> {
        let mut board = lock(&self.board);
        if board.fail_create {
            return Err(HostError::Operation {
                operation: "notify",
                message: "notifications disabled".into(),
            });
        }
        let id = id
            .map(str::to_string)
            .unwrap_or_else(|| Uuid::new_v4().to_string());
        board.showing.insert(id.clone(), notice.clone());
        board.history.push((id.clone(), notice.clone()));
        Ok(id)
    }

    async fn clear(&self, id: &str) -> Result<bool, HostError> {
        let mut board = lock(&self.board);
        board.cleared.push(id.to_string());
        Ok(board.showing.remove(id).is_some())
    }
}
