//! Notification Data Model
//!
//! Types exchanged with the notification endpoints and the
//! instance-level badge state.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of a notification as sent by the server.
///
/// The list endpoint serializes the database id as a number, while older
/// deployments send strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ItemId {
    Number(u64),
    Text(String),
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ItemId::Number(n) => write!(f, "{}", n),
            ItemId::Text(s) => f.write_str(s),
        }
    }
}

/// Severity level attached to a notification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Success,
    Info,
    Warning,
    Error,
    #[serde(other)]
    Unknown,
}

impl Level {
    /// CSS class suffix for known levels
    pub fn css_class(&self) -> Option<&'static str> {
        match self {
            Level::Success => Some("level-success"),
            Level::Info => Some("level-info"),
            Level::Warning => Some("level-warning"),
            Level::Error => Some("level-error"),
            Level::Unknown => None,
        }
    }
}

/// A single notification as returned by the list endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct NotificationItem {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<ItemId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slug: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub level: Option<Level>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actor: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub verb: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action_object: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub forward_link: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timesince: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
    #[serde(default)]
    pub unread: bool,
}

impl NotificationItem {
    /// Key used to address this item in toggle requests and on the surface.
    ///
    /// The slug wins over the raw id. Returns `None` for items the server
    /// sent without any identifier; those render without a toggle action.
    pub fn key(&self) -> Option<String> {
        self.slug
            .as_ref()
            .filter(|s| !s.is_empty())
            .cloned()
            .or_else(|| self.id.as_ref().map(|id| id.to_string()))
    }

    /// Display string for the age of the notification
    pub fn age(&self) -> Option<String> {
        match (&self.timesince, &self.timestamp) {
            (Some(since), _) => Some(format!("{} ago", since)),
            (None, Some(ts)) => Some(ts.format("%Y-%m-%d %H:%M").to_string()),
            (None, None) => None,
        }
    }
}

/// Unread badge state for one widget instance
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationBadgeState {
    pub unread_count: u32,
}

// ============================================
// Endpoint payloads
// ============================================

/// Response of the unread count endpoint
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CountResponse {
    #[serde(default)]
    pub unread_count: u32,
}

/// Response of the list endpoint
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ListResponse {
    #[serde(default)]
    pub list: Vec<NotificationItem>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unread_count: Option<u32>,
}

/// Response of the toggle endpoint
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ToggleResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<ItemId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    /// New unread flag, when the server reports it
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unread: Option<bool>,
}

/// Response of the mark-all endpoint
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct MarkAllResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}
