use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationLevel {
    Info,
    Success,
    Error,
}

/// A user-facing toast. Every failure path in the workbench ends in one
/// of these plus a stable, recoverable state.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub id: String,
    pub level: NotificationLevel,
    pub text: String,
    pub emitted_at: DateTime<Utc>,
}

impl Notification {
    pub fn new(level: NotificationLevel, text: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            level,
            text: text.into(),
            emitted_at: Utc::now(),
        }
    }

    pub fn info(text: impl Into<String>) -> Self {
        Self::new(NotificationLevel::Info, text)
    }

    pub fn success(text: impl Into<String>) -> Self {
        Self::new(NotificationLevel::Success, text)
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self::new(NotificationLevel::Error, text)
    }
}

pub trait Notifier: Send + Sync {
    fn emit(&self, notification: Notification);
}

#[derive(Clone, Default)]
pub struct InMemoryNotifier {
    notifications: Arc<Mutex<Vec<Notification>>>,
}

impl InMemoryNotifier {
    pub fn notifications(&self) -> Vec<Notification> {
        match self.notifications.lock() {
            Ok(notifications) => notifications.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

impl Notifier for InMemoryNotifier {
    fn emit(&self, notification: Notification) {
        match self.notifications.lock() {
            Ok(mut notifications) => notifications.push(notification),
            Err(poisoned) => poisoned.into_inner().push(notification),
        }
    }
}
