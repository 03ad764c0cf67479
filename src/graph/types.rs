//! Entity and health types matching the feed payloads.

use egui::{Color32, Pos2};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::theme;

/// An entity exactly as the service configuration delivers it.
///
/// Key lists arrive as comma-separated strings (`"k1,k2"`).
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RawEntity {
    pub key: String,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub icon_url: Option<String>,
    #[serde(default)]
    pub depends_on: Option<String>,
    #[serde(default)]
    pub connected_to: Option<String>,
}

/// A monitored service shown as a node in the topology view
#[derive(Debug, Clone, PartialEq)]
pub struct Entity {
    pub key: String,
    pub display_name: String,
    pub icon_ref: Option<String>,
    /// Ordered, duplicate-free dependency keys
    pub depends_on: Vec<String>,
    /// Peer connection keys; the relation is symmetric
    pub connected_to: Vec<String>,
}

impl Entity {
    pub fn new(key: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            display_name: display_name.into(),
            icon_ref: None,
            depends_on: Vec::new(),
            connected_to: Vec::new(),
        }
    }

    pub fn with_depends_on(mut self, keys: &str) -> Self {
        self.depends_on = parse_key_list(keys, &self.key);
        self
    }

    pub fn with_connected_to(mut self, keys: &str) -> Self {
        self.connected_to = parse_key_list(keys, &self.key);
        self
    }

    /// Up to two initials for the node face when no icon is available
    pub fn initials(&self) -> String {
        let words: Vec<&str> = self
            .display_name
            .split(|c: char| c.is_whitespace() || c == '-' || c == '_')
            .filter(|w| !w.is_empty())
            .collect();
        let initials: String = match words.as_slice() {
            [] => self.key.chars().take(2).collect(),
            [only] => only.chars().take(2).collect(),
            [first, second, ..] => first.chars().take(1).chain(second.chars().take(1)).collect(),
        };
        initials.to_uppercase()
    }
}

impl From<RawEntity> for Entity {
    fn from(raw: RawEntity) -> Self {
        let key = raw.key.trim().to_string();
        let display_name = raw
            .display_name
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty())
            .unwrap_or_else(|| key.clone());
        let depends_on = raw
            .depends_on
            .as_deref()
            .map(|s| parse_key_list(s, &key))
            .unwrap_or_default();
        let connected_to = raw
            .connected_to
            .as_deref()
            .map(|s| parse_key_list(s, &key))
            .unwrap_or_default();
        Self {
            key,
            display_name,
            icon_ref: raw.icon_url.filter(|u| !u.trim().is_empty()),
            depends_on,
            connected_to,
        }
    }
}

/// Split a comma-separated key list.
///
/// Entries are trimmed; empties, repeats and references to `own_key`
/// are dropped. First-seen order is kept.
pub fn parse_key_list(raw: &str, own_key: &str) -> Vec<String> {
    let mut keys: Vec<String> = Vec::new();
    for part in raw.split(',') {
        let key = part.trim();
        if key.is_empty() || key == own_key || keys.iter().any(|k| k == key) {
            continue;
        }
        keys.push(key.to_string());
    }
    keys
}

/// Parse the entity list payload.
pub fn parse_entities(json: &str) -> serde_json::Result<Vec<Entity>> {
    let raw: Vec<RawEntity> = serde_json::from_str(json)?;
    Ok(raw.into_iter().map(Entity::from).collect())
}

/// Latest monitoring result for an entity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum HealthState {
    #[default]
    Unknown,
    Up,
    Down,
    Degraded,
    Disabled,
}

impl HealthState {
    /// Every state, in status-bar display order
    pub const ALL: [HealthState; 5] = [
        HealthState::Up,
        HealthState::Degraded,
        HealthState::Down,
        HealthState::Disabled,
        HealthState::Unknown,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            HealthState::Unknown => "Unknown",
            HealthState::Up => "Operational",
            HealthState::Down => "Down",
            HealthState::Degraded => "Degraded",
            HealthState::Disabled => "Disabled",
        }
    }

    pub fn color(&self) -> Color32 {
        match self {
            HealthState::Unknown => theme::health::UNKNOWN,
            HealthState::Up => theme::health::UP,
            HealthState::Down => theme::health::DOWN,
            HealthState::Degraded => theme::health::DEGRADED,
            HealthState::Disabled => theme::health::DISABLED,
        }
    }

    pub fn is_up(&self) -> bool {
        *self == HealthState::Up
    }

    fn severity(&self) -> u8 {
        match self {
            HealthState::Up => 0,
            HealthState::Degraded => 1,
            HealthState::Unknown => 2,
            HealthState::Disabled => 3,
            HealthState::Down => 4,
        }
    }

    /// State of an edge given both endpoint states: the worse of the two.
    pub fn combine(self, other: HealthState) -> HealthState {
        if other.severity() > self.severity() {
            other
        } else {
            self
        }
    }
}

/// Health entry exactly as the poller delivers it
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RawHealth {
    #[serde(default)]
    pub ok: bool,
    #[serde(default)]
    pub degraded: Option<bool>,
    #[serde(default)]
    pub disabled: Option<bool>,
    #[serde(default)]
    pub ms: Option<f64>,
}

/// Live health map keyed by entity key
pub type RawHealthMap = HashMap<String, RawHealth>;

/// Parse the live health payload.
pub fn parse_health(json: &str) -> serde_json::Result<RawHealthMap> {
    serde_json::from_str(json)
}

/// Resolved health for one entity
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct HealthSnapshot {
    pub state: HealthState,
    pub latency_ms: Option<f64>,
}

impl From<&RawHealth> for HealthSnapshot {
    fn from(raw: &RawHealth) -> Self {
        let state = if raw.disabled.unwrap_or(false) {
            HealthState::Disabled
        } else if raw.degraded.unwrap_or(false) {
            HealthState::Degraded
        } else if raw.ok {
            HealthState::Up
        } else {
            HealthState::Down
        };
        Self {
            state,
            latency_ms: raw.ms.filter(|ms| ms.is_finite() && *ms >= 0.0),
        }
    }
}

/// Screen placement of a node, derived by the layout pass
#[derive(Debug, Clone, PartialEq)]
pub struct NodePosition {
    pub key: String,
    /// Index into the engine's entity list
    pub index: usize,
    pub pos: Pos2,
    pub status: HealthState,
    /// Animation phase offset in `[0, 1)`
    pub phase: f32,
}

/// Format a latency for display
pub fn format_latency(ms: f64) -> String {
    if ms >= 1000.0 {
        format!("{:.2} s", ms / 1000.0)
    } else {
        format!("{:.0} ms", ms)
    }
}
