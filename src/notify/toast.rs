//! Toast message types

use crate::config::NotificationConfig;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ToastKind {
    /// Work in progress; stays until replaced or hidden
    Pending,
    Success,
    Error,
    Info,
}

impl fmt::Display for ToastKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ToastKind::Pending => write!(f, "pending"),
            ToastKind::Success => write!(f, "success"),
            ToastKind::Error => write!(f, "error"),
            ToastKind::Info => write!(f, "info"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ToastMessage {
    /// Identity of this display; a replaced message never comes back with the same id
    pub id: u64,
    pub kind: ToastKind,
    pub text: String,
    pub created_at: DateTime<Utc>,
    pub auto_dismiss_ms: Option<u64>,
}

impl ToastMessage {
    pub fn same_content(&self, kind: ToastKind, text: &str) -> bool {
        self.kind == kind && self.text == text
    }
}

/// Change to the visible slot
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToastEvent {
    Shown(ToastMessage),
    /// Message with this id was hidden or auto-dismissed
    Hidden(u64),
}

/// Auto-dismiss delay per kind
#[derive(Debug, Clone)]
pub struct ToastDurations {
    pub success: Duration,
    pub info: Duration,
    pub error: Duration,
}

impl ToastDurations {
    pub fn for_kind(&self, kind: ToastKind) -> Option<Duration> {
        match kind {
            ToastKind::Pending => None,
            ToastKind::Success => Some(self.success),
            ToastKind::Info => Some(self.info),
            ToastKind::Error => Some(self.error),
        }
    }
}

impl From<&NotificationConfig> for ToastDurations {
    fn from(config: &NotificationConfig) -> Self {
        Self {
            success: Duration::from_millis(config.success_ms),
            info: Duration::from_millis(config.info_ms),
            error: Duration::from_millis(config.error_ms),
        }
    }
}

impl Default for ToastDurations {
    fn default() -> Self {
        Self::from(&NotificationConfig::default())
    }
}
