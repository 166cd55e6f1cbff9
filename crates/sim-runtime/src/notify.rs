//! Notification sink for command outcomes.

use serde::Serialize;
use std::fmt;

/// How an outcome should be presented.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    /// Action completed.
    Success,
    /// Action rejected; state unchanged.
    Error,
    /// Neutral information such as a level-up or a status read.
    Info,
}

/// One message for the presentation layer.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Notification {
    /// Human-readable text.
    pub message: String,
    /// Presentation hint.
    pub severity: Severity,
}

impl Notification {
    /// Build a notification.
    pub fn new(message: impl Into<String>, severity: Severity) -> Self {
        Self {
            message: message.into(),
            severity,
        }
    }
}

impl fmt::Display for Notification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tag = match self.severity {
            Severity::Success => "ok",
            Severity::Error => "error",
            Severity::Info => "info",
        };
        write!(f, "[{tag}] {}", self.message)
    }
}

/// Receives every outcome. Fire-and-forget.
pub trait NotificationSink {
    /// Deliver one notification.
    fn notify(&mut self, notification: Notification);
}

impl NotificationSink for Vec<Notification> {
    fn notify(&mut self, notification: Notification) {
        self.push(notification);
    }
}

/// Discards everything.
#[derive(Clone, Copy, Debug, Default)]
pub struct NullSink;

impl NotificationSink for NullSink {
    fn notify(&mut self, _notification: Notification) {}
}
