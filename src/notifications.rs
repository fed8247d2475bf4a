//! Transient, dismissible notifications.
//!
//! Entries live in a moka cache whose time-to-live is the auto-dismiss
//! delay, so expired notifications disappear without a timer task.

use crate::display::escape_html;
use chrono::{DateTime, Utc};
use moka::future::Cache;
use serde::Serialize;
use std::time::Duration;
use utoipa::ToSchema;
use uuid::Uuid;

/// Default auto-dismiss delay.
pub const DEFAULT_NOTIFICATION_TTL: Duration = Duration::from_secs(5);

/// Bootstrap alert level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum NotificationLevel {
    Info,
    Success,
    Warning,
    Danger,
}

impl NotificationLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationLevel::Info => "info",
            NotificationLevel::Success => "success",
            NotificationLevel::Warning => "warning",
            NotificationLevel::Danger => "danger",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct Notification {
    pub id: Uuid,
    pub message: String,
    pub level: NotificationLevel,
    pub created_at: DateTime<Utc>,
}

impl Notification {
    /// Dismissible Bootstrap alert markup.
    pub fn to_html(&self) -> String {
        format!(
            concat!(
                r#"<div class="alert alert-{level} alert-dismissible fade show" data-notification-id="{id}">"#,
                r#"{message}"#,
                r#"<button type="button" class="btn-close" data-bs-dismiss="alert" aria-label="Close"></button>"#,
                r#"</div>"#,
            ),
            level = self.level.as_str(),
            id = self.id,
            message = escape_html(&self.message),
        )
    }
}

/// Holds the notifications currently on screen.
#[derive(Clone)]
pub struct NotificationCenter {
    active: Cache<Uuid, Notification>,
}

impl NotificationCenter {
    pub fn new(ttl: Duration) -> Self {
        Self {
            active: Cache::builder()
                .time_to_live(ttl)
                .max_capacity(100)
                .build(),
        }
    }

    /// Shows a notification; it dismisses itself once the TTL elapses.
    pub async fn show(&self, message: impl Into<String>, level: NotificationLevel) -> Uuid {
        let notification = Notification {
            id: Uuid::new_v4(),
            message: message.into(),
            level,
            created_at: Utc::now(),
        };
        let id = notification.id;
        tracing::debug!("Notification {} [{}]: {}", id, level.as_str(), notification.message);
        self.active.insert(id, notification).await;
        id
    }

    /// Dismisses a notification. Returns false when it was already gone.
    pub async fn dismiss(&self, id: Uuid) -> bool {
        self.active.remove(&id).await.is_some()
    }

    /// Live notifications, oldest first.
    pub async fn active(&self) -> Vec<Notification> {
        let ids: Vec<Uuid> = self.active.iter().map(|(id, _)| *id).collect();
        let mut live = Vec::with_capacity(ids.len());
        for id in ids {
            if let Some(n) = self.active.get(&id).await {
                live.push(n);
            }
        }
        live.sort_by_key(|n| n.created_at);
        live
    }
}

impl Default for NotificationCenter {
    fn default() -> Self {
        Self::new(DEFAULT_NOTIFICATION_TTL)
    }
}
