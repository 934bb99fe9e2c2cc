use crate::domain::NotificationId;
use serde::{Deserialize, Serialize};

pub const DEFAULT_NOTIFICATION_TTL_SECS: i64 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationKind {
    Success,
    Warning,
    Error,
}

impl NotificationKind {
    pub fn label(self) -> &'static str {
        match self {
            NotificationKind::Success => "success",
            NotificationKind::Warning => "warning",
            NotificationKind::Error => "error",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub id: NotificationId,
    pub kind: NotificationKind,
    pub message: String,
    pub created_at: i64,
    pub expires_at: i64,
}

impl Notification {
    pub fn is_expired(&self, now: i64) -> bool {
        now >= self.expires_at
    }
}

/// Holds at most one visible notification.
///
/// Every raise hands out a fresh id; a clear scheduled for an older id is a
/// no-op so a superseded timer can never wipe a newer message.
#[derive(Debug, Clone)]
pub struct Notifier {
    current: Option<Notification>,
    next_id: u64,
    ttl_secs: i64,
}

impl Default for Notifier {
    fn default() -> Self {
        Self::new(DEFAULT_NOTIFICATION_TTL_SECS)
    }
}

impl Notifier {
    pub fn new(ttl_secs: i64) -> Self {
        Self {
            current: None,
            next_id: 1,
            ttl_secs: ttl_secs.max(1),
        }
    }

    pub fn ttl_secs(&self) -> i64 {
        self.ttl_secs
    }

    pub fn raise(
        &mut self,
        now: i64,
        kind: NotificationKind,
        message: impl Into<String>,
    ) -> NotificationId {
        let id = NotificationId(self.next_id);
        self.next_id += 1;
        self.current = Some(Notification {
            id,
            kind,
            message: message.into(),
            created_at: now,
            expires_at: now.saturating_add(self.ttl_secs),
        });
        id
    }

    pub fn current(&self, now: i64) -> Option<&Notification> {
        self.current
            .as_ref()
            .filter(|notification| !notification.is_expired(now))
    }

    pub fn clear(&mut self, id: NotificationId) -> bool {
        if self.current.as_ref().map(|n| n.id) == Some(id) {
            self.current = None;
            return true;
        }
        false
    }

    pub fn expire(&mut self, now: i64) -> bool {
        match &self.current {
            Some(notification) if notification.is_expired(now) => {
                self.current = None;
                true
            }
            _ => false,
        }
    }
}
