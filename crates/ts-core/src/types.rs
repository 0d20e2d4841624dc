use serde::{Deserialize, Deserializer, Serialize};

/// The exact signal string the relay asserts when battery-saving action
/// should be offered. Anything else, including absence, means "no signal".
pub const TERMINATE_SIGNAL: &str = "terminate-chrome";

/// Placeholder rendered for telemetry the relay did not report.
pub const UNKNOWN_READING: &str = "?";

// ---------------------------------------------------------------------------
// Relay documents
// ---------------------------------------------------------------------------

/// Response of the relay's status endpoint. Never cached beyond one tick.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Status {
    #[serde(default)]
    pub signal: Option<String>,
    /// Reported by newer relays; informational only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub relay_version: Option<String>,
}

impl Status {
    pub fn with_signal(signal: impl Into<String>) -> Self {
        Self {
            signal: Some(signal.into()),
            relay_version: None,
        }
    }

    /// Returns `true` only for the exact terminate signal.
    pub fn is_terminate(&self) -> bool {
        self.signal.as_deref() == Some(TERMINATE_SIGNAL)
    }
}

/// Battery telemetry shown in the consent prompt.
///
/// Each reading is independently optional: absent, `null`, or non-numeric
/// fields decode to `None` instead of failing the whole document.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Payload {
    #[serde(default, deserialize_with = "lenient_number")]
    pub battery_pct: Option<f64>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub drop_per_min: Option<f64>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub watts: Option<f64>,
}

impl Payload {
    pub fn new(battery_pct: f64, drop_per_min: f64, watts: f64) -> Self {
        Self {
            battery_pct: Some(battery_pct),
            drop_per_min: Some(drop_per_min),
            watts: Some(watts),
        }
    }

    /// One-line telemetry summary, e.g. `Battery 12% • 3%/min • 9W`.
    pub fn summary(&self) -> String {
        format!(
            "Battery {}% • {}%/min • {}W",
            reading(self.battery_pct),
            reading(self.drop_per_min),
            reading(self.watts)
        )
    }
}

fn reading(value: Option<f64>) -> String {
    match value {
        Some(v) => v.to_string(),
        None => UNKNOWN_READING.to_string(),
    }
}

fn lenient_number<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(value
        .and_then(|v| match v {
            serde_json::Value::Number(n) => n.as_f64(),
            serde_json::Value::String(s) => s.trim().parse::<f64>().ok(),
            _ => None,
        })
        .filter(|n| n.is_finite()))
}

// ---------------------------------------------------------------------------
// Browser session
// ---------------------------------------------------------------------------

pub type TabId = i64;
pub type WindowId = i64;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tab {
    pub id: TabId,
    pub window_id: WindowId,
    #[serde(default)]
    pub title: String,
    /// The focused tab of its window.
    #[serde(default)]
    pub active: bool,
    #[serde(default)]
    pub muted: bool,
    #[serde(default)]
    pub discarded: bool,
}

impl Tab {
    pub fn new(id: TabId, window_id: WindowId, title: impl Into<String>) -> Self {
        Self {
            id,
            window_id,
            title: title.into(),
            active: false,
            muted: false,
            discarded: false,
        }
    }

    pub fn activated(mut self) -> Self {
        self.active = true;
        self
    }
}

/// A browser window with its tabs populated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Window {
    pub id: WindowId,
    #[serde(default)]
    pub tabs: Vec<Tab>,
}

impl Window {
    /// The focused tab of this window, if any tab is marked active.
    pub fn active_tab(&self) -> Option<&Tab> {
        self.tabs.iter().find(|t| t.active)
    }
}

// ---------------------------------------------------------------------------
// Notifications
// ---------------------------------------------------------------------------

/// Display priority of a notification, mirroring the host's 0..=2 scale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Zero = 0,
    Low = 1,
    High = 2,
}

impl Priority {
    pub fn level(self) -> u8 {
        self as u8
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notice {
    pub title: String,
    pub message: String,
    pub icon: String,
    /// Button labels in display order; a click reports the index.
    #[serde(default)]
    pub buttons: Vec<String>,
    /// Keep the notice on screen until the user answers it.
    #[serde(default)]
    pub require_interaction: bool,
    pub priority: Priority,
}

impl Notice {
    pub fn new(title: impl Into<String>, message: impl Into<String>, priority: Priority) -> Self {
        Self {
            title: title.into(),
            message: message.into(),
            icon: String::new(),
            buttons: Vec::new(),
            require_interaction: false,
            priority,
        }
    }

    pub fn with_icon(mut self, icon: impl Into<String>) -> Self {
        self.icon = icon.into();
        self
    }

    pub fn with_buttons<I, S>(mut self, buttons: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.buttons = buttons.into_iter().map(Into::into).collect();
        self
    }

    pub fn requiring_interaction(mut self) -> Self {
        self.require_interaction = true;
        self
    }
}
