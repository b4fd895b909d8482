//! Notification fan-out
//!
//! Durable rows are written first, then a best-effort realtime push is
//! attempted for whoever is connected. Fan-out failures are logged and
//! swallowed: the domain mutation that triggered them has already
//! committed and must not be rolled back or failed.

use chrono::Utc;
use tracing::{debug, error, info};
use uuid::Uuid;

use crate::models::notification::NotificationKind;
use crate::realtime::{ConnectionRegistry, PushEvent};
use crate::repositories::NotificationRepository;

/// Fan-out engine coupling the notification store to the realtime registry
#[derive(Clone)]
pub struct Notifier {
    notifications: NotificationRepository,
    registry: ConnectionRegistry,
}

impl Notifier {
    /// Create a new notifier
    pub fn new(notifications: NotificationRepository, registry: ConnectionRegistry) -> Self {
        Self {
            notifications,
            registry,
        }
    }

    /// Notify a single user: one row, then a push if they are connected
    pub async fn notify_user(
        &self,
        user_id: Uuid,
        kind: NotificationKind,
        title: &str,
        message: &str,
        resource_id: Option<Uuid>,
    ) {
        let notification = match self
            .notifications
            .create(user_id, kind, title, message, resource_id)
            .await
        {
            Ok(notification) => notification,
            Err(e) => {
                error!("Failed to create notification for user {}: {}", user_id, e);
                return;
            }
        };

        if let Some(sender) = self.registry.lookup(user_id).await {
            if let Err(e) = sender.try_send(notification.into()) {
                debug!("Push to user {} not delivered: {}", user_id, e);
            }
        }
    }

    /// Notify every registered user: one bulk insert, then a push to every
    /// currently-connected identity
    pub async fn notify_all(
        &self,
        kind: NotificationKind,
        title: &str,
        message: &str,
        resource_id: Option<Uuid>,
    ) {
        let inserted = match self
            .notifications
            .create_for_all_users(kind, title, message, resource_id)
            .await
        {
            Ok(inserted) => inserted,
            Err(e) => {
                error!("Failed to store broadcast notification: {}", e);
                return;
            }
        };

        info!("Broadcast \"{}\" stored for {} users", title, inserted);

        for (user_id, sender) in self.registry.connected().await {
            let event = PushEvent::Notification {
                id: None,
                kind,
                title: title.to_string(),
                message: message.to_string(),
                resource_id,
                read: false,
                created_at: Utc::now(),
            };
            if let Err(e) = sender.try_send(event) {
                debug!("Push to user {} not delivered: {}", user_id, e);
            }
        }
    }
}
